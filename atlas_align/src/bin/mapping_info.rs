//! Inspect a saved mapping-state blob.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use glam::DVec2;

use atlas_align::MappingState;

#[derive(Parser, Debug)]
#[command(author, version, about = "Print the contents of a section-to-atlas mapping file.")]
struct Args {
    /// Mapping file written by a warp session
    #[arg()]
    mapping: PathBuf,

    /// Section-space point to push through both splines, as `x,y`
    #[arg(long = "eval", value_parser = parse_point)]
    points: Vec<DVec2>,

    /// Base log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory for rolling log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn parse_point(s: &str) -> Result<DVec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate `{v}`: {e}"))
    };
    Ok(DVec2::new(parse(x)?, parse(y)?))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    common::log_setup::setup_logging(&args.log_level, &args.log_dir, "mapping_info")?;

    let state = MappingState::load_from_file(&args.mapping)
        .with_context(|| format!("Failed to load {}", args.mapping.display()))?;
    tracing::debug!(path = %args.mapping.display(), "Loaded mapping state");

    let section = state.section();
    println!("plane:            {}", state.plane());
    println!("resolution:       {}", state.resolution());
    println!("section origin:   {:?}", section.origin);
    println!("section u:        {:?}", section.u);
    println!("section v:        {:?}", section.v);
    println!("section normal:   {:?}", section.normal());
    println!("section pose:     {:?}", state.section_pose().coefficients());
    println!("reference pose:   {:?}", state.reference_pose().coefficients());
    println!(
        "forward spline:   {} control points, bending energy {:.6}",
        state.forward().num_control_points(),
        state.forward().bending_energy()
    );
    println!(
        "backward spline:  {} control points, bending energy {:.6}",
        state.backward().num_control_points(),
        state.backward().bending_energy()
    );

    for p in &args.points {
        let forward = state.forward().transform(*p);
        let backward = state.backward().transform(*p);
        println!(
            "({:.3}, {:.3}) -> forward ({:.3}, {:.3}), backward ({:.3}, {:.3}), volume {:?}",
            p.x,
            p.y,
            forward.x,
            forward.y,
            backward.x,
            backward.y,
            section.point_at(*p)
        );
    }
    Ok(())
}
