use fintrack_core::crypto::KEY_ENV;
use fintrack_core::{DataCipher, JsonStore, StoreError, StoreOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking.
///
/// The encryption key is only ever taken from the environment and is never
/// serialized.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the JSON data file
    pub data_path: ConfigValue<PathBuf>,
    /// Port the HTTP server listens on
    pub port: ConfigValue<u16>,
    /// Session lifetime in minutes
    pub session_ttl_minutes: ConfigValue<u64>,
    /// Accept a plaintext data file while a key is configured
    pub allow_plaintext: ConfigValue<bool>,
    /// Whether an encryption key was found in the environment
    pub encryption_enabled: ConfigValue<bool>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    #[serde(skip)]
    cipher: DataCipher,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_path: Option<PathBuf>,
    port: Option<u16>,
    session_ttl_minutes: Option<u64>,
    allow_plaintext: Option<bool>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::load`] with an explicit environment lookup.
    pub fn load_with_env(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut data_path = ConfigValue::new(
            Self::default_data_dir().join("db.json"),
            ConfigSource::Default,
        );
        let mut port = ConfigValue::new(8080u16, ConfigSource::Default);
        let mut session_ttl_minutes = ConfigValue::new(60u64, ConfigSource::Default);
        let mut allow_plaintext = ConfigValue::new(true, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(file_data_path) = file_config.data_path {
                // Relative paths are relative to the config file
                let resolved = if file_data_path.is_relative() {
                    path.parent()
                        .map(|p| p.join(&file_data_path))
                        .unwrap_or(file_data_path)
                } else {
                    file_data_path
                };
                data_path = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(value) = file_config.port {
                port = ConfigValue::new(value, ConfigSource::File);
            }
            if let Some(value) = file_config.session_ttl_minutes {
                session_ttl_minutes = ConfigValue::new(value, ConfigSource::File);
            }
            if let Some(value) = file_config.allow_plaintext {
                allow_plaintext = ConfigValue::new(value, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Some(value) = env("FINTRACK_DATA_PATH") {
            data_path = ConfigValue::new(PathBuf::from(value), ConfigSource::Environment);
        }
        if let Some(value) = env("FINTRACK_PORT") {
            port = ConfigValue::new(parse_env("FINTRACK_PORT", &value)?, ConfigSource::Environment);
        }
        if let Some(value) = env("FINTRACK_SESSION_TTL_MINUTES") {
            session_ttl_minutes = ConfigValue::new(
                parse_env("FINTRACK_SESSION_TTL_MINUTES", &value)?,
                ConfigSource::Environment,
            );
        }
        if let Some(value) = env("FINTRACK_ALLOW_PLAINTEXT") {
            allow_plaintext = ConfigValue::new(
                parse_env("FINTRACK_ALLOW_PLAINTEXT", &value)?,
                ConfigSource::Environment,
            );
        }

        let cipher = DataCipher::new(env(KEY_ENV));
        let encryption_enabled = if cipher.is_enabled() {
            ConfigValue::new(true, ConfigSource::Environment)
        } else {
            ConfigValue::new(false, ConfigSource::Default)
        };

        Ok(Self {
            data_path,
            port,
            session_ttl_minutes,
            allow_plaintext,
            encryption_enabled,
            config_file,
            cipher,
        })
    }

    pub fn cipher(&self) -> DataCipher {
        self.cipher.clone()
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            allow_plaintext: self.allow_plaintext.value,
        }
    }

    /// Store handle for the configured data file, without touching disk.
    pub fn store(&self) -> JsonStore {
        JsonStore::with_options(
            self.data_path.value.clone(),
            self.cipher(),
            self.store_options(),
        )
    }

    /// Opens (and if needed creates) the data file.
    pub fn open_store(&self) -> Result<JsonStore, StoreError> {
        let store = self.store();
        store.initialize()?;
        Ok(store)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/fintrack/
    /// - macOS: ~/Library/Application Support/fintrack/
    /// - Windows: %APPDATA%/fintrack/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fintrack")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/fintrack/
    /// - macOS: ~/Library/Application Support/fintrack/
    /// - Windows: %APPDATA%/fintrack/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fintrack")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name, value.to_string()))
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value '{}' for {}", value, name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert!(config.data_path.value.to_string_lossy().contains("db.json"));
        assert_eq!(config.data_path.source, ConfigSource::Default);
        assert_eq!(config.port.value, 8080);
        assert_eq!(config.session_ttl_minutes.value, 60);
        assert!(config.allow_plaintext.value);
        assert!(!config.encryption_enabled.value);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_path: /custom/path/db.json").unwrap();
        writeln!(file, "port: 9000").unwrap();
        writeln!(file, "allow_plaintext: false").unwrap();

        let config = Config::load_with_env(Some(config_path.clone()), no_env).unwrap();
        assert_eq!(config.data_path.value, PathBuf::from("/custom/path/db.json"));
        assert_eq!(config.data_path.source, ConfigSource::File);
        assert_eq!(config.port.value, 9000);
        assert_eq!(config.port.source, ConfigSource::File);
        assert!(!config.store_options().allow_plaintext);
        assert_eq!(config.session_ttl_minutes.source, ConfigSource::Default);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_path_resolves_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_path: data/db.json\n").unwrap();

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert_eq!(config.data_path.value, temp_dir.path().join("data/db.json"));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "port: 9000\nsession_ttl_minutes: 5\n").unwrap();

        let env = env_from(&[
            ("FINTRACK_PORT", "7000"),
            ("FINTRACK_DATA_PATH", "/env/db.json"),
            ("FINTRACK_ALLOW_PLAINTEXT", "false"),
        ]);
        let config = Config::load_with_env(Some(config_path), env).unwrap();

        assert_eq!(config.port.value, 7000);
        assert_eq!(config.port.source, ConfigSource::Environment);
        assert_eq!(config.data_path.value, PathBuf::from("/env/db.json"));
        assert_eq!(config.session_ttl_minutes.value, 5);
        assert_eq!(config.session_ttl_minutes.source, ConfigSource::File);
        assert!(!config.allow_plaintext.value);
    }

    #[test]
    fn test_invalid_env_value() {
        let temp_dir = tempdir().unwrap();
        let env = env_from(&[("FINTRACK_PORT", "eighty")]);

        let err = Config::load_with_env(Some(temp_dir.path().join("none.yaml")), env).unwrap_err();
        assert!(err.to_string().contains("FINTRACK_PORT"));
    }

    #[test]
    fn test_key_enables_encryption_and_is_not_serialized() {
        let temp_dir = tempdir().unwrap();
        let key = DataCipher::generate_key();
        let env = env_from(&[(KEY_ENV, key.as_str())]);

        let config = Config::load_with_env(Some(temp_dir.path().join("none.yaml")), env).unwrap();
        assert!(config.encryption_enabled.value);
        assert!(config.cipher().is_enabled());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains(&key));
        assert!(!format!("{:?}", config).contains(&key));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load_with_env(Some(config_path), no_env);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_open_store_creates_data_file() {
        let temp_dir = tempdir().unwrap();
        let data_path = temp_dir.path().join("store/db.json");
        let env = env_from(&[("FINTRACK_DATA_PATH", data_path.to_str().unwrap())]);

        let config = Config::load_with_env(Some(temp_dir.path().join("none.yaml")), env).unwrap();
        let store = config.open_store().unwrap();
        assert!(data_path.exists());
        assert!(store.read().unwrap().users.is_empty());
    }
}
