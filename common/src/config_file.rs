//! Loading of serde-backed configuration files.
//!
//! The format is picked from the file extension.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Failed to get file extension for '{0}'")]
    MissingFileExtension(PathBuf),
    #[error("Unsupported config file extension for '{0}'")]
    UnsupportedFileExtension(PathBuf),
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid YAML in '{path}': {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yml::Error,
    },
    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type ConfigFileResult<T> = Result<T, ConfigFileError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> ConfigFileResult<Self> {
        let ext = path
            .extension()
            .and_then(|os_str| os_str.to_str())
            .ok_or_else(|| ConfigFileError::MissingFileExtension(path.to_path_buf()))?;

        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(ConfigFileError::UnsupportedFileExtension(path.to_path_buf()))
        }
    }
}

pub fn from_str<T: DeserializeOwned>(
    text: &str,
    format: ConfigFormat,
    path: &Path,
) -> ConfigFileResult<T> {
    match format {
        ConfigFormat::Yaml => serde_yml::from_str(text).map_err(|source| ConfigFileError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        ConfigFormat::Json => serde_json::from_str(text).map_err(|source| ConfigFileError::Json {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads and deserializes `path`.
pub fn load<T: DeserializeOwned>(path: &Path) -> ConfigFileResult<T> {
    let format = ConfigFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_str(&text, format, path)
}

/// Serializes `value` into `path`, creating or truncating it.
pub fn save<T: Serialize>(value: &T, path: &Path) -> ConfigFileResult<()> {
    let text = match ConfigFormat::from_path(path)? {
        ConfigFormat::Yaml => serde_yml::to_string(value).map_err(|source| ConfigFileError::Yaml {
            path: path.to_path_buf(),
            source,
        })?,
        ConfigFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|source| ConfigFileError::Json {
                path: path.to_path_buf(),
                source,
            })?
        }
    };
    std::fs::write(path, text).map_err(|source| ConfigFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        scale: f64,
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("b.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("c.json")).unwrap(),
            ConfigFormat::Json
        );
    }

    #[test]
    fn test_format_rejects_unknown_or_missing_extension() {
        assert!(matches!(
            ConfigFormat::from_path(Path::new("config")),
            Err(ConfigFileError::MissingFileExtension(_))
        ));
        assert!(matches!(
            ConfigFormat::from_path(Path::new("config.toml")),
            Err(ConfigFileError::UnsupportedFileExtension(_))
        ));
    }

    #[test]
    fn test_save_then_load_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let value = Sample {
            name: "spheroid".to_string(),
            scale: 0.9,
        };

        for name in ["cfg.yaml", "cfg.json"] {
            let path = dir.path().join(name);
            save(&value, &path).unwrap();
            let loaded: Sample = load(&path).unwrap();
            assert_eq!(loaded, value, "mismatch for {}", name);
        }
    }

    #[test]
    fn test_invalid_yaml_names_the_file() {
        let err = from_str::<Sample>("name: [", ConfigFormat::Yaml, Path::new("bad.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }
}
