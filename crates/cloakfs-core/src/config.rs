use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CloakError, CloakResult};

/// Top-level configuration (loaded from cloakfs.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloakConfig {
    pub logging: LoggingConfig,
    pub kdf: KdfConfig,
}

impl CloakConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error: defaults are returned and a warning is logged.
    pub fn load(path: &Path) -> CloakResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CloakError::Config(format!("parsing {}: {e}", path.display())))?;

        tracing::debug!(
            scrypt_cost = config.kdf.scrypt_cost,
            scrypt_block_size = config.kdf.scrypt_block_size,
            "loaded config from {}",
            path.display()
        );
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or EnvFilter directive (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

/// Passphrase key derivation parameters (scrypt, parallelism fixed at 1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// scrypt cost parameter N, a power of two (default: 32768)
    pub scrypt_cost: u64,
    /// scrypt block size r (default: 8)
    pub scrypt_block_size: u32,
    /// Derived key length in bytes (default: 32)
    pub key_length: usize,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            scrypt_cost: 32768,
            scrypt_block_size: 8,
            key_length: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[logging]
level = "debug"
format = "json"

[kdf]
scrypt_cost = 16384
scrypt_block_size = 4
key_length = 64
"#;
        let config: CloakConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.kdf.scrypt_cost, 16384);
        assert_eq!(config.kdf.scrypt_block_size, 4);
        assert_eq!(config.kdf.key_length, 64);
    }

    #[test]
    fn test_parse_defaults() {
        let config: CloakConfig = toml::from_str("").unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.kdf.scrypt_cost, 32768);
        assert_eq!(config.kdf.scrypt_block_size, 8);
        assert_eq!(config.kdf.key_length, 32);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[kdf]
scrypt_cost = 1024
"#;
        let config: CloakConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.kdf.scrypt_cost, 1024);
        // Defaults
        assert_eq!(config.kdf.scrypt_block_size, 8);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = CloakConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: CloakConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = CloakConfig::load(&tmp.path().join("absent.toml")).unwrap();

        assert_eq!(config, CloakConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nformat = \"json\"").unwrap();

        let config = CloakConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.kdf, KdfConfig::default());
    }

    #[test]
    fn test_load_unreadable_path_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();

        let err = CloakConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(err, CloakError::Io(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[kdf]\nscrypt_cost = \"lots\"").unwrap();

        let err = CloakConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, CloakError::Config(_)));
    }
}
