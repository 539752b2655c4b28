//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod server;

pub use server::ServerConfig;

use serde::Deserialize;

use crate::archive::ArchiveConfig;
use crate::index::IndexConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "IMPRESSIONS_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "IMPRESSIONS";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "IMPRESSIONS_LOG";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Object archive backend.
    pub archive: ArchiveConfig,
    /// Metadata index backend.
    pub index: IndexConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix, `__` separated
    ///    (e.g. `IMPRESSIONS__ARCHIVE__S3__BUCKET`)
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;
    use crate::archive::ArchiveType;
    use crate::index::IndexType;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.archive.archive_type, ArchiveType::Filesystem);
        assert_eq!(config.index.index_type, IndexType::Memory);
        assert_eq!(config.index.memory.page_size, 100);
    }

    #[test]
    fn test_config_yaml_sections() {
        let yaml = r#"
server:
  host: 127.0.0.1
  port: 3000
archive:
  type: memory
index:
  type: memory
  memory:
    page_size: 25
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.archive.archive_type, ArchiveType::Memory);
        assert_eq!(config.index.memory.page_size, 25);
    }

    #[test]
    fn test_config_rejects_unknown_backend() {
        let yaml = "archive:\n  type: tape\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    #[serial]
    fn test_load_file_then_env_override() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "server:\n  port: 7000\narchive:\n  type: memory").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        std::env::set_var("IMPRESSIONS__SERVER__PORT", "7001");
        let loaded = Config::load(Some(&path));
        std::env::remove_var("IMPRESSIONS__SERVER__PORT");

        let config = loaded.unwrap();
        assert_eq!(config.server.port, 7001);
        assert_eq!(config.archive.archive_type, ArchiveType::Memory);
    }

    #[test]
    #[serial]
    fn test_load_nested_env_key() {
        std::env::set_var("IMPRESSIONS__ARCHIVE__FILESYSTEM__BASE_PATH", "/srv/impressions");
        let loaded = Config::load(None);
        std::env::remove_var("IMPRESSIONS__ARCHIVE__FILESYSTEM__BASE_PATH");

        let config = loaded.unwrap();
        assert_eq!(
            config.archive.filesystem.base_path,
            std::path::PathBuf::from("/srv/impressions")
        );
    }

    #[test]
    #[serial]
    fn test_load_missing_explicit_file_fails() {
        assert!(Config::load(Some("/nonexistent/impressions.yaml")).is_err());
    }
}
