use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub telegram: Option<TelegramConfig>,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Usernames or numeric user ids allowed to talk to the bot.
    /// Empty means open to everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

/// Credentials and market parameters for the affiliate gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub app_key: String,
    #[serde(default)]
    pub app_secret: String,
    /// Optional session token; sent as the `session` param when present.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// ISO currency code quoted back to users.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Two-letter language code, lowercase. Doubles as the reply locale.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_ship_to_country")]
    pub ship_to_country: String,
    /// Multiplicative surcharge on quoted prices, e.g. 0.1 for +10%.
    /// Absent means prices pass through untouched.
    #[serde(default)]
    pub tax_rate: Option<f64>,
    #[serde(default = "default_catalog_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_catalog_retries")]
    pub retries: u32,
    #[serde(default = "default_catalog_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_base_url() -> String {
    "https://api.aliexpress.com/sync".into()
}

fn default_currency() -> String {
    "USD".into()
}

fn default_language() -> String {
    "ar".into()
}

fn default_ship_to_country() -> String {
    "DZ".into()
}

fn default_catalog_timeout_secs() -> u64 {
    30
}

fn default_catalog_retries() -> u32 {
    2
}

fn default_catalog_backoff_ms() -> u64 {
    500
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            app_secret: String::new(),
            access_token: None,
            base_url: default_base_url(),
            currency: default_currency(),
            language: default_language(),
            ship_to_country: default_ship_to_country(),
            tax_rate: None,
            timeout_secs: default_catalog_timeout_secs(),
            retries: default_catalog_retries(),
            retry_backoff_ms: default_catalog_backoff_ms(),
        }
    }
}

impl CatalogConfig {
    pub fn require_credentials(&self) -> std::result::Result<(), ConfigError> {
        if self.app_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.app_key is not set (ALIEXPRESS_APP_KEY)".into(),
            ));
        }
        if self.app_secret.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.app_secret is not set (ALIEXPRESS_APP_SECRET)".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Cap on `Location` hops when expanding short links.
    #[serde(default = "default_max_redirect_hops")]
    pub max_redirect_hops: u32,
    #[serde(default = "default_resolver_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_redirect_hops() -> u32 {
    5
}

fn default_resolver_timeout_secs() -> u64 {
    10
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_redirect_hops: default_max_redirect_hops(),
            timeout_secs: default_resolver_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_listener_backoff_secs")]
    pub listener_initial_backoff_secs: u64,
    #[serde(default = "default_listener_backoff_max_secs")]
    pub listener_max_backoff_secs: u64,
}

fn default_listener_backoff_secs() -> u64 {
    2
}

fn default_listener_backoff_max_secs() -> u64 {
    60
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            listener_initial_backoff_secs: default_listener_backoff_secs(),
            listener_max_backoff_secs: default_listener_backoff_max_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let souqbot_dir = home.join(".souqbot");

        Self {
            config_path: souqbot_dir.join("config.toml"),
            telegram: None,
            catalog: CatalogConfig::default(),
            resolver: ResolverConfig::default(),
            reliability: ReliabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let souqbot_dir = home.join(".souqbot");
        let config_path = souqbot_dir.join("config.toml");

        if !souqbot_dir.exists() {
            fs::create_dir_all(&souqbot_dir).context("Failed to create .souqbot directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).map_err(|e| ConfigError::Load(e.to_string()))?;
            config.config_path = config_path;
            Ok(config)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Environment variables override file values so deployments can run
    /// off a vanilla config with secrets injected at launch.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            if !token.is_empty() {
                match self.telegram.as_mut() {
                    Some(telegram) => telegram.bot_token = token,
                    None => {
                        self.telegram = Some(TelegramConfig {
                            bot_token: token,
                            allowed_users: Vec::new(),
                        });
                    }
                }
            }
        }

        if let Ok(users) = std::env::var("TELEGRAM_ALLOWED_USERS") {
            if !users.is_empty() {
                let parsed: Vec<String> = users
                    .split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(String::from)
                    .collect();
                if let Some(telegram) = self.telegram.as_mut() {
                    telegram.allowed_users = parsed;
                }
            }
        }

        if let Ok(key) = std::env::var("ALIEXPRESS_APP_KEY") {
            if !key.is_empty() {
                self.catalog.app_key = key;
            }
        }

        if let Ok(secret) = std::env::var("ALIEXPRESS_APP_SECRET") {
            if !secret.is_empty() {
                self.catalog.app_secret = secret;
            }
        }

        if let Ok(token) = std::env::var("ALIEXPRESS_ACCESS_TOKEN") {
            if !token.is_empty() {
                self.catalog.access_token = Some(token);
            }
        }

        if let Ok(base_url) = std::env::var("ALIEXPRESS_API_BASE_URL") {
            if !base_url.is_empty() {
                self.catalog.base_url = base_url;
            }
        }

        if let Ok(currency) = std::env::var("TARGET_CURRENCY") {
            if !currency.is_empty() {
                self.catalog.currency = currency.to_ascii_uppercase();
            }
        }

        if let Ok(language) = std::env::var("TARGET_LANGUAGE") {
            if !language.is_empty() {
                self.catalog.language = language.to_ascii_lowercase();
            }
        }

        if let Ok(country) = std::env::var("SHIP_TO_COUNTRY") {
            if !country.is_empty() {
                self.catalog.ship_to_country = country.to_ascii_uppercase();
            }
        }

        if let Ok(rate_str) = std::env::var("TAX_RATE") {
            if let Ok(rate) = rate_str.parse::<f64>() {
                if (0.0..=1.0).contains(&rate) {
                    self.catalog.tax_rate = Some(rate);
                }
            }
        }
    }

    pub fn require_telegram(&self) -> std::result::Result<&TelegramConfig, ConfigError> {
        self.telegram
            .as_ref()
            .filter(|t| !t.bot_token.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::Validation("telegram.bot_token is not set (TELEGRAM_BOT_TOKEN)".into())
            })
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).map_err(ConfigError::Io)?;
        Ok(())
    }
}
