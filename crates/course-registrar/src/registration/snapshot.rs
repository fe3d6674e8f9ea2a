use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{Course, SpecialRegistrationRequest, StaffMember, Student};

/// Full registrar state as a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrarSnapshot {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub advisors: Vec<StaffMember>,
    #[serde(default)]
    pub administrators: Vec<StaffMember>,
    #[serde(default)]
    pub requests: Vec<SpecialRegistrationRequest>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistrarSnapshot {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
