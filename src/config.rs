//! sqlfix configuration
//!
//! Every field has a built-in default, so an empty config (or none at all)
//! reproduces the fixed behavior: `import-data.sql`, client blocks, and a
//! `Designer 4 You` -> `JJ` rename.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{FixError, FixResult};

/// Default target file, relative to the working directory.
pub const DEFAULT_FILE: &str = "import-data.sql";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    /// File to patch in place
    pub file: PathBuf,

    /// Block delimiters for the line scanner
    pub markers: Markers,

    /// Company rename applied by both passes
    pub rename: Rename,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_FILE),
            markers: Markers::default(),
            rename: Rename::default(),
        }
    }
}

/// Marker substrings that drive the block scanner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Opens a block
    pub block_start: String,
    /// Ends the rewritable part of a block
    pub block_end: String,
    /// Closes the block
    pub terminal: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            block_start: "INSERT INTO clients".to_string(),
            block_end: "WHERE NOT EXISTS".to_string(),
            terminal: "RETURNING".to_string(),
        }
    }
}

/// Literal company rename.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

impl Default for Rename {
    fn default() -> Self {
        Self {
            from: "Designer 4 You".to_string(),
            to: "JJ".to_string(),
        }
    }
}

impl FixConfig {
    /// Create a new configuration builder
    pub fn builder() -> FixConfigBuilder {
        FixConfigBuilder::default()
    }

    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> FixResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| FixError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> FixResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| FixError::read(path, e))?;
        Self::from_toml(&text)
    }

    /// `<config_dir>/sqlfix/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sqlfix").join("config.toml"))
    }

    /// Load from an explicit path, else from the default path when it
    /// exists, else fall back to built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> FixResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Layer command-line overrides on top of a discovered config file.
    ///
    /// Precedence: built-in defaults < TOML file < overrides.
    pub fn resolve(config_path: Option<&Path>, overrides: &Overrides) -> FixResult<Self> {
        let base = Self::discover(config_path)?;
        FixConfigBuilder::from_config(base).overrides(overrides).build()
    }

    /// Reject configs the scanner cannot act on.
    pub fn validate(&self) -> FixResult<()> {
        let m = &self.markers;
        for (name, value) in [
            ("markers.block_start", &m.block_start),
            ("markers.block_end", &m.block_end),
            ("markers.terminal", &m.terminal),
            ("rename.from", &self.rename.from),
        ] {
            if value.is_empty() {
                return Err(FixError::config(format!("{} must not be empty", name)));
            }
        }
        if self.rename.from.contains('\'') || self.rename.to.contains('\'') {
            return Err(FixError::config("company names must not contain single quotes"));
        }
        Ok(())
    }
}

/// Values given on the command line; `None` keeps the config file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub file: Option<PathBuf>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Builder for FixConfig
#[derive(Debug, Default)]
pub struct FixConfigBuilder {
    config: FixConfig,
}

impl FixConfigBuilder {
    /// Start from an existing config instead of the defaults
    pub fn from_config(config: FixConfig) -> Self {
        Self { config }
    }

    /// Set the target file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.file = path.into();
        self
    }

    /// Set the old company name
    pub fn rename_from(mut self, name: impl Into<String>) -> Self {
        self.config.rename.from = name.into();
        self
    }

    /// Set the new company name
    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.config.rename.to = name.into();
        self
    }

    /// Set all three block markers
    pub fn markers(mut self, markers: Markers) -> Self {
        self.config.markers = markers;
        self
    }

    /// Apply every override that is set
    pub fn overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(file) = &overrides.file {
            self = self.file(file);
        }
        if let Some(from) = &overrides.from {
            self = self.rename_from(from);
        }
        if let Some(to) = &overrides.to {
            self = self.rename_to(to);
        }
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> FixResult<FixConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_constants() {
        let config = FixConfig::default();
        assert_eq!(config.file, PathBuf::from("import-data.sql"));
        assert_eq!(config.markers.block_start, "INSERT INTO clients");
        assert_eq!(config.markers.block_end, "WHERE NOT EXISTS");
        assert_eq!(config.markers.terminal, "RETURNING");
        assert_eq!(config.rename.from, "Designer 4 You");
        assert_eq!(config.rename.to, "JJ");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FixConfig::from_toml(
            r#"
            file = "seed.sql"

            [rename]
            to = "Acme"
            "#,
        )
        .unwrap();
        assert_eq!(config.file, PathBuf::from("seed.sql"));
        assert_eq!(config.rename.from, "Designer 4 You");
        assert_eq!(config.rename.to, "Acme");
        assert_eq!(config.markers, Markers::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(FixConfig::from_toml("").unwrap(), FixConfig::default());
    }

    #[test]
    fn test_empty_marker_rejected() {
        let err = FixConfig::from_toml("[markers]\nterminal = \"\"").unwrap_err();
        assert!(matches!(err, FixError::Config(_)));
    }

    #[test]
    fn test_unknown_shape_rejected() {
        let err = FixConfig::from_toml("rename = 3").unwrap_err();
        assert!(matches!(err, FixError::Config(_)));
    }

    #[test]
    fn test_builder_overrides() {
        let config = FixConfig::builder()
            .file("other.sql")
            .rename_from("Old Co")
            .rename_to("New Co")
            .build()
            .unwrap();
        assert_eq!(config.file, PathBuf::from("other.sql"));
        assert_eq!(config.rename.from, "Old Co");
        assert_eq!(config.rename.to, "New Co");
    }

    #[test]
    fn test_unset_overrides_keep_config() {
        let base = FixConfig::builder().rename_to("Acme").build().unwrap();
        let config = FixConfigBuilder::from_config(base.clone())
            .overrides(&Overrides::default())
            .build()
            .unwrap();
        assert_eq!(config, base);
    }

    #[test]
    fn test_builder_rejects_quoted_name() {
        let err = FixConfig::builder().rename_to("O'Brien").build().unwrap_err();
        assert!(matches!(err, FixError::Config(_)));
    }
}
