//! Configuration for the model editor.
//!
//! [`EditorConfig`] implements [`serde::Deserialize`] with every field
//! defaulted, so a partial TOML table is a valid configuration.
//!
//! # Example
//!
//! ```
//! # use archedit::config::EditorConfig;
//! let config = EditorConfig::default();
//! assert_eq!(config.default_filename(), "model.go");
//! assert!(config.verify_destination());
//! ```

use serde::Deserialize;

fn default_filename() -> String {
    "model.go".to_string()
}

fn default_package_name() -> String {
    "model".to_string()
}

fn default_dsl_import() -> String {
    "goa.design/model/dsl".to_string()
}

fn default_file_extension() -> String {
    "go".to_string()
}

fn default_true() -> bool {
    true
}

/// Settings shared by every editing operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditorConfig {
    /// File created when a package has no `Design` yet.
    #[serde(default = "default_filename")]
    default_filename: String,

    /// Package clause of newly created files when the package has no other
    /// file to copy it from.
    #[serde(default = "default_package_name")]
    package_name: String,

    /// Import path of the DSL, dot-imported by new files.
    #[serde(default = "default_dsl_import")]
    dsl_import: String,

    /// Extension of model files, without the dot.
    #[serde(default = "default_file_extension")]
    file_extension: String,

    /// Require relationship destinations to exist in the package.
    #[serde(default = "default_true")]
    verify_destination: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_filename: default_filename(),
            package_name: default_package_name(),
            dsl_import: default_dsl_import(),
            file_extension: default_file_extension(),
            verify_destination: true,
        }
    }
}

impl EditorConfig {
    pub fn default_filename(&self) -> &str {
        &self.default_filename
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn dsl_import(&self) -> &str {
        &self.dsl_import
    }

    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    pub fn verify_destination(&self) -> bool {
        self.verify_destination
    }

    /// Returns a copy with destination verification switched on or off.
    pub fn with_verify_destination(mut self, verify: bool) -> Self {
        self.verify_destination = verify;
        self
    }

    /// Whether `filename` names a model file: the configured extension,
    /// excluding Go test files.
    pub fn is_model_file(&self, filename: &str) -> bool {
        let Some(stem) = filename
            .strip_suffix(self.file_extension.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
        else {
            return false;
        };
        !stem.is_empty() && !stem.ends_with("_test")
    }
}
