use fueltrack_core::DailyGoals;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_LOG_LEVEL: &str = "fueltrack=warn,fueltrack_core=warn";
const DEFAULT_USER: &str = "default";

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

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the Automerge documents
    pub data_dir: ConfigValue<PathBuf>,
    /// User id the commands act for
    pub user: ConfigValue<String>,
    /// tracing filter used when RUST_LOG is unset
    pub log_level: ConfigValue<String>,
    pub goals: ConfigValue<DailyGoals>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Partial goal override; missing fields keep their defaults.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GoalsFile {
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fats: Option<f64>,
}

impl GoalsFile {
    fn apply(&self, mut goals: DailyGoals) -> DailyGoals {
        if let Some(calories) = self.calories {
            goals.calories = calories;
        }
        if let Some(protein) = self.protein {
            goals.protein = protein;
        }
        if let Some(carbs) = self.carbs {
            goals.carbs = carbs;
        }
        if let Some(fats) = self.fats {
            goals.fats = fats;
        }
        goals
    }
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    user: Option<String>,
    log_level: Option<String>,
    goals: Option<GoalsFile>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    fn load_with_env(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut user = ConfigValue::new(DEFAULT_USER.to_string(), ConfigSource::Default);
        let mut log_level = ConfigValue::new(DEFAULT_LOG_LEVEL.to_string(), ConfigSource::Default);
        let mut goals = ConfigValue::new(DailyGoals::default(), ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            if let Some(dir) = file_config.data_dir {
                data_dir.set(resolve_relative(&path, dir), ConfigSource::File);
            }
            if let Some(name) = file_config.user {
                user.set(name, ConfigSource::File);
            }
            if let Some(level) = file_config.log_level {
                log_level.set(level, ConfigSource::File);
            }
            if let Some(overrides) = file_config.goals {
                goals.set(overrides.apply(goals.value), ConfigSource::File);
            }

            config_file = Some(path);
        }

        if let Some(dir) = env("FUELTRACK_DATA_DIR") {
            data_dir.set(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(name) = env("FUELTRACK_USER") {
            user.set(name, ConfigSource::Environment);
        }
        if let Some(level) = env("FUELTRACK_LOG") {
            log_level.set(level, ConfigSource::Environment);
        }

        if user.value.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "user",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            data_dir,
            user,
            log_level,
            goals,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/fueltrack/
    /// - macOS: ~/Library/Application Support/fueltrack/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fueltrack")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/fueltrack/
    /// - macOS: ~/Library/Application Support/fueltrack/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fueltrack")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

/// Relative paths in the file are relative to the file's directory.
fn resolve_relative(config_path: &Path, dir: PathBuf) -> PathBuf {
    if dir.is_relative() {
        config_path
            .parent()
            .map(|parent| parent.join(&dir))
            .unwrap_or(dir)
    } else {
        dir
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue { key: &'static str, reason: String },
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
            ConfigError::InvalidValue { key, reason } => {
                write!(f, "Invalid config value for '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
