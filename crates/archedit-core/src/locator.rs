//! File locators and patch results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifies a DSL file: a repository root, a package directory relative to
/// it, and a file name inside the package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocator {
    /// Repository root on disk.
    pub repository: PathBuf,
    /// Package directory, relative to `repository`.
    pub dir: PathBuf,
    /// File name inside the package directory.
    pub filename: String,
}

impl FileLocator {
    pub fn new(
        repository: impl Into<PathBuf>,
        dir: impl Into<PathBuf>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            dir: dir.into(),
            filename: filename.into(),
        }
    }

    /// Absolute (or repository-relative) path of the package directory.
    pub fn package_dir(&self) -> PathBuf {
        self.repository.join(&self.dir)
    }

    /// Full path of the file.
    pub fn path(&self) -> PathBuf {
        self.package_dir().join(&self.filename)
    }
}

/// Outcome of a successful edit: the canonical content that was written and
/// where it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchResult {
    pub content: String,
    pub locator: FileLocator,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_path() {
        let locator = FileLocator::new("/repo", "design/model", "model.go");
        assert_eq!(locator.package_dir(), PathBuf::from("/repo/design/model"));
        assert_eq!(locator.path(), PathBuf::from("/repo/design/model/model.go"));
    }
}
