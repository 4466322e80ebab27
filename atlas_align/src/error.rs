//! Error types for the registration core.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the registration core.
///
/// Nothing here is recovered locally; the caller aborts the current warp
/// cycle and keeps the last successful state.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Malformed mask: {reason}")]
    MalformedMask { reason: String },

    #[error("Outline length mismatch: reference has {reference} points, section has {section}")]
    LengthMismatch { reference: usize, section: usize },

    #[error("Correspondence set has no boundary pairs")]
    EmptyCorrespondence,

    #[error("Singular thin-plate spline system: {reason}")]
    SingularSystem { reason: String },

    #[error("Corrupt mapping blob: {reason}")]
    CorruptMapping { reason: String },

    #[error("Unsupported mapping format version {found} (supported: {supported})")]
    VersionMismatch { found: u16, supported: u16 },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        a_width: usize,
        a_height: usize,
        b_width: usize,
        b_height: usize,
    },

    #[error("No registration has been computed yet")]
    NoRegistration,

    #[error("Invalid results record: {0}")]
    InvalidRecord(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    pub fn malformed_mask(reason: impl Into<String>) -> Self {
        Self::MalformedMask {
            reason: reason.into(),
        }
    }

    pub fn singular(reason: impl Into<String>) -> Self {
        Self::SingularSystem {
            reason: reason.into(),
        }
    }

    pub fn corrupt_mapping(reason: impl fmt::Display) -> Self {
        Self::CorruptMapping {
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Pipeline step at which a warp cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SampleReference,
    SampleSection,
    Match,
    FilterOutliers,
    FitForward,
    FitBackward,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SampleReference => "sample reference outline",
            Stage::SampleSection => "sample section outline",
            Stage::Match => "match outlines",
            Stage::FilterOutliers => "filter outliers",
            Stage::FitForward => "fit forward transform",
            Stage::FitBackward => "fit backward transform",
        };
        f.write_str(name)
    }
}

/// A failed warp cycle: which step failed, and why.
#[derive(Debug, Error)]
#[error("Warp cycle failed at '{stage}': {source}")]
pub struct SessionError {
    pub stage: Stage,
    #[source]
    pub source: RegistrationError,
}

impl SessionError {
    pub fn new(stage: Stage, source: RegistrationError) -> Self {
        Self { stage, source }
    }
}
