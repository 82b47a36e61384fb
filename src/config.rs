//! @ai:module:intent Configuration structs for the escape highlighter
//! @ai:module:layer infrastructure
//! @ai:module:public_api Config, BuildConfig, AnnotationConfig
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::finding::{RegionStyle, DRAW_NO_FILL, DRAW_NO_OUTLINE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// @ai:intent Main configuration for the highlighter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Quiet period after the last edit before analysis runs.
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub annotations: AnnotationConfig,
}

/// @ai:intent Command line used to produce escape-analysis diagnostics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

/// @ai:intent How flagged lines are named and drawn in the editor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationConfig {
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quiet_period_ms: default_quiet_period_ms(),
            build: BuildConfig::default(),
            annotations: AnnotationConfig::default(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
        }
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            scope: default_scope(),
            icon: default_icon(),
        }
    }
}

fn default_quiet_period_ms() -> u64 {
    2500
}

fn default_program() -> String {
    "go".to_string()
}

fn default_args() -> Vec<String> {
    vec!["build".to_string(), "-gcflags".to_string(), "-m".to_string()]
}

fn default_key() -> String {
    "go_heap_allocations".to_string()
}

fn default_scope() -> String {
    "invalid".to_string()
}

fn default_icon() -> String {
    "dot".to_string()
}

impl Config {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Load from `path` when given, defaults otherwise
    /// @ai:effects fs:read
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

impl AnnotationConfig {
    /// @ai:intent Region style handed to the editor
    /// @ai:effects pure
    pub fn style(&self) -> RegionStyle {
        RegionStyle {
            scope: self.scope.clone(),
            icon: self.icon.clone(),
            flags: DRAW_NO_FILL | DRAW_NO_OUTLINE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.quiet_period(), Duration::from_millis(2500));
        assert_eq!(config.build.program, "go");
        assert_eq!(config.build.args, vec!["build", "-gcflags", "-m"]);
        assert_eq!(config.annotations.key, "go_heap_allocations");
        assert_eq!(config.annotations.style(), RegionStyle::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
quiet_period_ms = 500

[build]
args = ["build", "-gcflags", "-m=2"]
"#,
        )
        .unwrap();

        assert_eq!(config.quiet_period_ms, 500);
        assert_eq!(config.build.program, "go");
        assert_eq!(config.build.args[2], "-m=2");
        assert_eq!(config.annotations, AnnotationConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("highlighter.toml");

        let mut config = Config::default();
        config.annotations.scope = "region.redish".to_string();
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "quiet_period_ms = \"soon\"").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::ConfigParse(_))));
    }
}
