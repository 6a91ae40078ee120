use serde::{Deserialize, Serialize};
use std::fs;

use cardroom_engine::color_clash::DEFAULT_HAND_SIZE;
use cardroom_sync::SyncSettings;

pub const CONFIG_ENV: &str = "CARDROOM_CONFIG";
pub const SEED_ENV: &str = "CARDROOM_SEED";
pub const MAX_RETRIES_ENV: &str = "CARDROOM_MAX_RETRIES";
pub const TURN_TIMEOUT_ENV: &str = "CARDROOM_TURN_TIMEOUT";
pub const HAND_SIZE_ENV: &str = "CARDROOM_HAND_SIZE";

/// Largest Color Clash hand the CLI deals.
pub const MAX_HAND_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub seed: Option<u64>,
    pub max_commit_retries: u32,
    pub turn_timeout_secs: u64,
    pub hand_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSources {
    pub seed: ValueSource,
    pub max_commit_retries: ValueSource,
    pub turn_timeout_secs: ValueSource,
    pub hand_size: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            seed: ValueSource::Default,
            max_commit_retries: ValueSource::Default,
            turn_timeout_secs: ValueSource::Default,
            hand_size: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

impl Default for Config {
    fn default() -> Self {
        let sync = SyncSettings::default();
        Self {
            seed: None,
            max_commit_retries: sync.max_commit_retries,
            turn_timeout_secs: sync.turn_timeout_secs,
            hand_size: DEFAULT_HAND_SIZE,
        }
    }
}

impl Config {
    /// Commit protocol settings with this config's overrides applied.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            max_commit_retries: self.max_commit_retries,
            turn_timeout_secs: self.turn_timeout_secs,
            ..SyncSettings::default()
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "cannot parse config file: {}", e),
            ConfigError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

pub fn load() -> Result<Config, ConfigError> {
    load_with_sources().map(|resolved| resolved.config)
}

/// Resolves the configuration: defaults, then the TOML file named by
/// `CARDROOM_CONFIG`, then the individual environment variables.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    if let Some(path) = env_value(CONFIG_ENV) {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = f.max_commit_retries {
            cfg.max_commit_retries = v;
            sources.max_commit_retries = ValueSource::File;
        }
        if let Some(v) = f.turn_timeout_secs {
            cfg.turn_timeout_secs = v;
            sources.turn_timeout_secs = ValueSource::File;
        }
        if let Some(v) = f.hand_size {
            cfg.hand_size = v;
            sources.hand_size = ValueSource::File;
        }
    }

    if let Some(seed) = env_value(SEED_ENV) {
        cfg.seed = Some(parse_env(SEED_ENV, &seed)?);
        sources.seed = ValueSource::Env;
    }
    if let Some(retries) = env_value(MAX_RETRIES_ENV) {
        cfg.max_commit_retries = parse_env(MAX_RETRIES_ENV, &retries)?;
        sources.max_commit_retries = ValueSource::Env;
    }
    if let Some(timeout) = env_value(TURN_TIMEOUT_ENV) {
        cfg.turn_timeout_secs = parse_env(TURN_TIMEOUT_ENV, &timeout)?;
        sources.turn_timeout_secs = ValueSource::Env;
    }
    if let Some(hand) = env_value(HAND_SIZE_ENV) {
        cfg.hand_size = parse_env(HAND_SIZE_ENV, &hand)?;
        sources.hand_size = ValueSource::Env;
    }

    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    max_commit_retries: Option<u32>,
    #[serde(default)]
    turn_timeout_secs: Option<u64>,
    #[serde(default)]
    hand_size: Option<usize>,
}

/// Set and non-empty.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("Invalid {}: {:?}", key, raw)))
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    cfg.sync_settings()
        .validate()
        .map_err(|e| ConfigError::Invalid(format!("Invalid configuration: {}", e)))?;
    if cfg.hand_size == 0 || cfg.hand_size > MAX_HAND_SIZE {
        return Err(ConfigError::Invalid(format!(
            "Invalid configuration: hand_size must be between 1 and {}",
            MAX_HAND_SIZE
        )));
    }
    Ok(())
}
