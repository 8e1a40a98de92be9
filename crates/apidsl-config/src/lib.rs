use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid source pattern {pattern}: {source}")]
    SourcePatternError {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Failed to expand source pattern {pattern}: {source}")]
    SourceGlobError {
        pattern: String,
        source: glob::GlobError,
    },
}

/// Options handed through to renderers untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub indent: usize,
}

impl Default for RenderingOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            package_name: None,
            base_url: None,
            indent: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Emit writer projections for entities with mutable fields
    pub writers: bool,
    /// Emit mock factories
    pub mocks: bool,
    /// Reject undeclared keys when asserting responses
    pub strict_assertions: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            writers: true,
            mocks: true,
            strict_assertions: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source files or glob patterns.
    pub sources: Vec<PathBuf>,
    pub rendering: RenderingOptions,
    pub features: FeatureFlags,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde, then anchor relative sources at the config file
        let base = config_path.parent().unwrap_or(Path::new(""));
        config.sources = config
            .sources
            .into_iter()
            .map(|source| {
                let expanded = Self::expand_path(&source).unwrap_or(source);
                if expanded.is_relative() {
                    base.join(expanded)
                } else {
                    expanded
                }
            })
            .collect();
        if let Some(output_dir) = config.rendering.output_dir.take() {
            config.rendering.output_dir = Some(Self::expand_path(&output_dir).unwrap_or(output_dir));
        }

        Ok(Some(config))
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Default location, `~/.config/apidsl/config.toml`.
    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/apidsl");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Expand `sources` into concrete files.
    ///
    /// Entries containing glob characters are matched against the file
    /// system and sorted; plain paths are passed through as written.
    pub fn source_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();
        for source in &self.sources {
            let pattern = source.to_string_lossy();
            if !pattern.contains(['*', '?', '[']) {
                files.push(source.clone());
                continue;
            }

            let entries =
                glob::glob(&pattern).map_err(|source| ConfigError::SourcePatternError {
                    pattern: pattern.to_string(),
                    source,
                })?;
            let mut matched = entries
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| ConfigError::SourceGlobError {
                    pattern: pattern.to_string(),
                    source,
                })?;
            matched.sort();
            files.extend(matched);
        }
        Ok(files)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
