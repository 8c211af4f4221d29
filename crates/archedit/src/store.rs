//! Package files on disk.
//!
//! A package is one directory of model files. Files are read fresh on every
//! request and written atomically: the new content goes to a temporary file
//! in the package directory which is then renamed over the target, so a
//! reader never observes a truncated file.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};
use tempfile::NamedTempFile;

use archedit_core::locator::FileLocator;

use crate::{config::EditorConfig, error::EditError};

/// A model file and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub filename: String,
    pub content: String,
}

/// Model files of one package directory.
#[derive(Debug, Clone)]
pub struct PackageStore {
    repository: PathBuf,
    dir: PathBuf,
}

impl PackageStore {
    pub fn new(repository: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            dir: dir.into(),
        }
    }

    pub fn locator(&self, filename: &str) -> FileLocator {
        FileLocator::new(&self.repository, &self.dir, filename)
    }

    pub fn repository(&self) -> &Path {
        &self.repository
    }

    pub fn package_dir(&self) -> PathBuf {
        self.repository.join(&self.dir)
    }

    /// Names of the package's model files, sorted. A missing package
    /// directory has no files.
    pub fn list(&self, config: &EditorConfig) -> Result<Vec<String>, EditError> {
        let dir = self.package_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(EditError::io(dir, err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| EditError::io(&dir, err))?;
            let is_file = entry
                .file_type()
                .map_err(|err| EditError::io(entry.path(), err))?
                .is_file();
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_file && config.is_model_file(&name) {
                names.push(name);
            }
        }
        names.sort();

        trace!(dir:? = dir, files:? = names; "Listed package");
        Ok(names)
    }

    /// Content of `filename`, `None` if it does not exist.
    pub fn read(&self, filename: &str) -> Result<Option<String>, EditError> {
        let path = self.locator(filename).path();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(EditError::io(path, err)),
        }
    }

    /// Every model file of the package, in filename order.
    pub fn load(&self, config: &EditorConfig) -> Result<Vec<PackageFile>, EditError> {
        let mut files = Vec::new();
        for filename in self.list(config)? {
            // Skip files removed between listing and reading.
            if let Some(content) = self.read(&filename)? {
                files.push(PackageFile { filename, content });
            }
        }
        Ok(files)
    }

    /// Atomically replace `filename` with `content`, creating the package
    /// directory if needed.
    pub fn write(&self, filename: &str, content: &str) -> Result<FileLocator, EditError> {
        let dir = self.package_dir();
        fs::create_dir_all(&dir).map_err(|err| EditError::io(&dir, err))?;

        let locator = self.locator(filename);
        let path = locator.path();

        let mut file = NamedTempFile::new_in(&dir).map_err(|err| EditError::io(&dir, err))?;
        file.write_all(content.as_bytes())
            .map_err(|err| EditError::io(file.path(), err))?;
        file.persist(&path)
            .map_err(|err| EditError::io(&path, err.error))?;

        debug!(path:? = path, bytes = content.len(); "Wrote model file");
        Ok(locator)
    }
}

/// Directories below `repository` holding at least one model file that
/// imports the DSL, relative to `repository` and sorted. The root itself is
/// the empty path. Hidden directories are skipped, and so are files whose
/// header does not parse.
pub fn discover_packages(
    repository: &Path,
    config: &EditorConfig,
) -> Result<Vec<PathBuf>, EditError> {
    let mut packages = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        let dir = repository.join(&relative);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if relative.as_os_str().is_empty() => return Err(EditError::io(dir, err)),
            Err(err) => {
                warn!(dir:? = dir, err:%; "Skipping unreadable directory");
                continue;
            }
        };

        let mut is_package = false;
        for entry in entries {
            let entry = entry.map_err(|err| EditError::io(&dir, err))?;
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if file_type.is_dir() {
                if !name.starts_with('.') {
                    pending.push(relative.join(name));
                }
            } else if file_type.is_file() && !is_package && config.is_model_file(&name) {
                is_package = imports_dsl(&entry.path(), config)?;
            }
        }

        if is_package {
            packages.push(relative);
        }
    }
    packages.sort();

    debug!(repository:? = repository, packages:? = packages; "Discovered packages");
    Ok(packages)
}

fn imports_dsl(path: &Path, config: &EditorConfig) -> Result<bool, EditError> {
    let content = fs::read_to_string(path).map_err(|err| EditError::io(path, err))?;
    match archedit_parser::parse_header(&content) {
        Ok(header) => Ok(header
            .imports
            .iter()
            .any(|import| import.path.inner() == config.dsl_import())),
        Err(err) => {
            warn!(path:? = path, err:%; "Skipping file with unreadable header");
            Ok(false)
        }
    }
}
