//! Server settings.
//!
//! Loaded with the following priority (highest to lowest):
//! 1. Environment variables (`MEDIASHARE__PORT`, `MEDIASHARE__DATABASE_URL`, ...)
//! 2. Config file (`mediashare.toml`, optional)
//! 3. Default values

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Directory the local store shards uploads into
    pub upload_dir: String,
    /// URL path the upload directory is served under
    pub upload_url_prefix: String,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite:mediashare.db".to_string(),
            max_connections: 5,
            upload_dir: "./data/uploads".to_string(),
            upload_url_prefix: "/static/uploads".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("mediashare.toml")
    }

    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("MEDIASHARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::load_from_path("does-not-exist.toml").unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.upload_url_prefix, "/static/uploads");
    }

    #[test]
    #[serial]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = 9000\nupload_dir = \"/srv/media\"").unwrap();

        let settings = Settings::load_from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.upload_dir, "/srv/media");
        assert_eq!(settings.max_connections, 5);
    }

    #[test]
    #[serial]
    fn environment_overrides_everything() {
        std::env::set_var("MEDIASHARE__MAX_CONNECTIONS", "12");
        let settings = Settings::load_from_path("does-not-exist.toml");
        std::env::remove_var("MEDIASHARE__MAX_CONNECTIONS");

        assert_eq!(settings.unwrap().max_connections, 12);
    }
}
