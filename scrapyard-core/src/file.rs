use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// One unit of work: a game file on disk.
///
/// The base name and suffix are split once at construction. Descriptors are
/// never mutated after they are queued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileDescriptor {
    path: PathBuf,
    file_name: String,
    base_name: String,
    suffix: String,
}

impl FileDescriptor {
    /// Build a descriptor for `path`. Fails when the path has no file name.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::invalid_path(path.display().to_string()))?
            .to_string();
        let base_name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or(&file_name)
            .to_string();
        let suffix = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            path,
            file_name,
            base_name,
            suffix,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name with extension (e.g., "Super Game (USA).zip").
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without extension (e.g., "Super Game (USA)").
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Extension without the dot, as it appears on disk.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Absolute, symlink-resolved path, falling back to the stored path
    /// when the file cannot be resolved.
    pub fn canonical_path(&self) -> PathBuf {
        std::fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone())
    }
}

impl std::fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name)
    }
}

/// Stable fingerprint correlating a file with its cached resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheRecordId(String);

impl CacheRecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheRecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_splits_name() {
        let file = FileDescriptor::new("/roms/snes/Super Game (USA).zip").unwrap();
        assert_eq!(file.file_name(), "Super Game (USA).zip");
        assert_eq!(file.base_name(), "Super Game (USA)");
        assert_eq!(file.suffix(), "zip");
    }

    #[test]
    fn test_descriptor_without_extension() {
        let file = FileDescriptor::new("/roms/README").unwrap();
        assert_eq!(file.base_name(), "README");
        assert_eq!(file.suffix(), "");
    }

    #[test]
    fn test_descriptor_rejects_root() {
        assert!(FileDescriptor::new("/").is_err());
    }
}
