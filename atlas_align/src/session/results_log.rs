//! Append-only `;`-separated log of image differences.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{RegistrationError, Result};
use crate::mapping::PlaneOfSection;

pub const RESULTS_HEADER: &str = "path;plane;section;NSSD;warped";

/// One difference measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceRecord {
    pub path: String,
    pub plane: PlaneOfSection,
    pub section_index: usize,
    pub nssd: f64,
    /// Whether the reference had been warped onto the section.
    pub warped: bool,
}

impl DifferenceRecord {
    /// The path is the only free-text field; it must not contain the field
    /// separator or a line break.
    fn validate(&self) -> Result<()> {
        if let Some(c) = self.path.chars().find(|c| matches!(c, ';' | '\n' | '\r')) {
            return Err(RegistrationError::InvalidRecord(format!(
                "path {:?} contains {c:?}",
                self.path
            )));
        }
        Ok(())
    }

    fn to_line(&self) -> String {
        format!(
            "{};{};{};{};{}",
            self.path, self.plane, self.section_index, self.nssd, self.warped
        )
    }
}

/// Results file. The header is written when the file is first created;
/// every record adds exactly one line.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &DifferenceRecord) -> Result<()> {
        record.validate()?;
        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RegistrationError::io(&self.path, e))?;

        let mut text = String::new();
        if is_new {
            text.push_str(RESULTS_HEADER);
            text.push('\n');
        }
        text.push_str(&record.to_line());
        text.push('\n');

        file.write_all(text.as_bytes())
            .map_err(|e| RegistrationError::io(&self.path, e))
    }
}
