//! Versioned binary artifacts
//!
//! Every artifact is a `bincode` envelope: magic bytes, format version, the
//! artifact kind, an FNV-1a checksum of the payload and the payload itself.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, ScorecastError};

/// What an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Model,
    Preprocessor,
}

/// On-disk wrapper around a serialized object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub magic: [u8; 4],
    pub format_version: u32,
    pub kind: ArtifactKind,
    pub checksum: u64,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub const MAGIC: [u8; 4] = *b"SCST";
    pub const VERSION: u32 = 1;

    pub fn new(kind: ArtifactKind, payload: Vec<u8>) -> Self {
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            kind,
            checksum: fnv1a(&payload),
            payload,
        }
    }

    /// Reject anything this build cannot read back as `expected`
    pub fn validate(&self, expected: ArtifactKind, path: &Path) -> Result<()> {
        let reason = if self.magic != Self::MAGIC {
            Some("not a scorecast artifact".to_string())
        } else if self.format_version != Self::VERSION {
            Some(format!(
                "format version {} (supported: {})",
                self.format_version,
                Self::VERSION
            ))
        } else if self.kind != expected {
            Some(format!("holds a {:?}, expected a {:?}", self.kind, expected))
        } else if fnv1a(&self.payload) != self.checksum {
            Some("checksum mismatch".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ScorecastError::IncompatibleArtifact {
                path: path.to_path_buf(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// FNV-1a over the payload
fn fnv1a(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Write `bytes` to `path` so readers only ever see the old or the new file
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| ScorecastError::io(&parent, e))?;

    let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| ScorecastError::io(&parent, e))?;
    tmp.write_all(bytes).map_err(|e| ScorecastError::io(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| ScorecastError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| ScorecastError::io(path, e.error))?;
    Ok(())
}

/// Serialize `value` as a `kind` artifact at `path`, creating parent directories
pub fn save_artifact<T: Serialize>(value: &T, kind: ArtifactKind, path: &Path) -> Result<()> {
    let serialization = |e: bincode::Error| ScorecastError::Serialization {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let payload = bincode::serialize(value).map_err(serialization)?;
    let bytes = bincode::serialize(&Envelope::new(kind, payload)).map_err(serialization)?;
    write_atomic(path, &bytes)?;

    debug!(path = %path.display(), kind = ?kind, bytes = bytes.len(), "Artifact written");
    Ok(())
}

/// Read back a `kind` artifact written by `save_artifact`
pub fn load_artifact<T: DeserializeOwned>(kind: ArtifactKind, path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| ScorecastError::io(path, e))?;

    let envelope: Envelope =
        bincode::deserialize(&bytes).map_err(|e| ScorecastError::IncompatibleArtifact {
            path: path.to_path_buf(),
            reason: format!("unreadable header: {}", e),
        })?;
    envelope.validate(kind, path)?;

    bincode::deserialize(&envelope.payload).map_err(|e| ScorecastError::Serialization {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Objects persisted as artifacts of a fixed kind
pub trait Artifact: Serialize + DeserializeOwned + Sized {
    const KIND: ArtifactKind;

    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_artifact(self, Self::KIND, path.as_ref())
    }

    fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_artifact(Self::KIND, path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestModel {
        weights: Vec<f64>,
        bias: f64,
    }

    impl Artifact for TestModel {
        const KIND: ArtifactKind = ArtifactKind::Model;
    }

    fn sample() -> TestModel {
        TestModel {
            weights: vec![1.0, 2.0, 3.0],
            bias: 0.5,
        }
    }

    #[test]
    fn test_envelope_checksum() {
        let envelope = Envelope::new(ArtifactKind::Model, vec![1, 2, 3, 4, 5]);
        assert!(envelope.validate(ArtifactKind::Model, Path::new("x")).is_ok());

        let mut corrupted = envelope.clone();
        corrupted.payload[0] = 99;
        let err = corrupted
            .validate(ArtifactKind::Model, Path::new("x"))
            .unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_save_creates_parents_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("model.bin");
        sample().save(&path).unwrap();
        assert_eq!(TestModel::load(&path).unwrap(), sample());
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        sample().save(&path).unwrap();
        sample().save(&path).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        save_artifact(&sample(), ArtifactKind::Preprocessor, &path).unwrap();
        let err = TestModel::load(&path).unwrap_err();
        assert!(matches!(err, ScorecastError::IncompatibleArtifact { .. }));
    }

    #[test]
    fn test_foreign_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"definitely not an artifact, just some text").unwrap();
        let err = TestModel::load(&path).unwrap_err();
        assert!(matches!(err, ScorecastError::IncompatibleArtifact { .. }));
    }

    #[test]
    fn test_missing_file_is_io() {
        let err = TestModel::load("/nonexistent/dir/model.bin").unwrap_err();
        assert!(matches!(err, ScorecastError::Io { .. }));
    }
}
