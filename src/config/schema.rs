use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub onboarding: OnboardingConfig,
}

// ── Identity provider ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the identity provider's REST API.
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
    /// Project API key, sent as a query parameter on every call.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_identity_base_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: default_identity_base_url(),
            api_key: None,
        }
    }
}

// ── Document store ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the document store's REST API.
    #[serde(default = "default_store_base_url")]
    pub base_url: String,
    /// Project the document collections live under.
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default = "default_waitlist_collection")]
    pub waitlist_collection: String,
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
}

fn default_store_base_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_project_id() -> String {
    "nexgen-university-001".to_string()
}

fn default_waitlist_collection() -> String {
    "waitlists".to_string()
}

fn default_users_collection() -> String {
    "users".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_store_base_url(),
            project_id: default_project_id(),
            waitlist_collection: default_waitlist_collection(),
            users_collection: default_users_collection(),
        }
    }
}

// ── Write reliability ─────────────────────────────────────────────

/// Retry policy knobs for the waitlist write path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Generic retry attempts after the primary (and possible fallback)
    /// attempt failed.
    #[serde(default = "default_max_generic_retries")]
    pub max_generic_retries: u32,
    /// Base delay for the linear backoff before each generic retry.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_max_generic_retries() -> u32 {
    1
}

fn default_backoff_base_ms() -> u64 {
    500
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_generic_retries: default_max_generic_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

// ── Onboarding page ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Start of the onboarding window.
    #[serde(default = "default_launch_date")]
    pub launch_date: DateTime<Utc>,
    /// Length of the onboarding window; the countdown targets its end.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_whatsapp_link")]
    pub whatsapp_link: String,
    #[serde(default = "default_telegram_link")]
    pub telegram_link: String,
}

fn default_launch_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 30, 0, 0, 0).unwrap()
}

fn default_window_days() -> u32 {
    30
}

fn default_whatsapp_link() -> String {
    "https://chat.whatsapp.com/KXqYxYvuk1g45maj5caJro".to_string()
}

fn default_telegram_link() -> String {
    "https://t.me/+lTmNsF5i6TM5NmQ0".to_string()
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            launch_date: default_launch_date(),
            window_days: default_window_days(),
            whatsapp_link: default_whatsapp_link(),
            telegram_link: default_telegram_link(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            identity: IdentityConfig::default(),
            store: StoreConfig::default(),
            reliability: ReliabilityConfig::default(),
            onboarding: OnboardingConfig::default(),
        }
    }
}

impl Config {
    /// Load `~/.nexgenu/config.toml`, writing defaults on first run.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Self::load_or_init_in(&home.join(".nexgenu"))
    }

    /// Same as [`Config::load_or_init`] but rooted at an explicit directory.
    pub fn load_or_init_in(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");

        if !dir.exists() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create config directory: {}", dir.display())
            })?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            // Set computed paths that are skipped during serialization
            config.config_path.clone_from(&config_path);
            config.validate()?;
            Ok(config)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.identity.base_url)
            .with_context(|| format!("identity.base_url is not a URL: {}", self.identity.base_url))?;
        Url::parse(&self.store.base_url)
            .with_context(|| format!("store.base_url is not a URL: {}", self.store.base_url))?;
        anyhow::ensure!(
            self.reliability.backoff_base_ms > 0,
            "reliability.backoff_base_ms must be positive"
        );
        anyhow::ensure!(
            self.onboarding.window_days > 0,
            "onboarding.window_days must be positive"
        );
        Ok(())
    }

    /// Directory holding the config file and the session store.
    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("."))
    }
}
