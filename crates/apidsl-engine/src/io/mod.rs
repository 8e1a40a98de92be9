use apidsl_config::{Config, ConfigError};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("Source file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Read one schema source file
pub fn read_source(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| IoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read every file the config's `sources` expand to, as `(uri, text)` pairs
pub fn read_sources(config: &Config) -> Result<Vec<(String, String)>, IoError> {
    let files = config.source_files()?;
    log::debug!("reading {} source file(s)", files.len());

    files
        .iter()
        .map(|path| Ok((path.to_string_lossy().into_owned(), read_source(path)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_read_source_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.api");

        let err = read_source(&missing).unwrap_err();

        assert!(matches!(err, IoError::NotFound(path) if path == missing));
    }

    #[test]
    fn test_read_sources_in_glob_order() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("b.api"), "entity B {}").unwrap();
        std::fs::write(temp_dir.path().join("a.api"), "entity A {}").unwrap();
        let config = Config {
            sources: vec![temp_dir.path().join("*.api")],
            ..Config::default()
        };

        let sources = read_sources(&config).unwrap();

        let texts: Vec<_> = sources.iter().map(|(_, text)| text.as_str()).collect();
        assert_eq!(texts, vec!["entity A {}", "entity B {}"]);
        assert!(sources[0].0.ends_with("a.api"));
    }

    #[test]
    fn test_read_sources_missing_explicit_file() {
        let config = Config {
            sources: vec![PathBuf::from("/definitely/not/here.api")],
            ..Config::default()
        };

        let err = read_sources(&config).unwrap_err();

        assert!(matches!(err, IoError::NotFound(_)));
    }
}
