//! Configuration types, defaults, loading, and validation.

use super::secrets::SecretString;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Lead service connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// The clinic this funnel collects leads for
    #[serde(default)]
    pub clinic: ClinicConfig,

    /// Funnel behaviour
    #[serde(default)]
    pub funnel: FunnelConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Lead service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the lead service, e.g. `https://api.example.com/v1`.
    /// When unset the funnel can only run in demo mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Per-request timeout in seconds (default: 15)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Clinic identity sent with `startLead`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicConfig {
    #[serde(default = "default_clinic_id")]
    pub id: String,

    #[serde(default = "default_clinic_slug")]
    pub slug: String,

    /// Display name, also used as the email subject
    #[serde(default = "default_clinic_name")]
    pub name: String,

    #[serde(default)]
    pub contact: ClinicContactConfig,
}

fn default_clinic_id() -> String {
    "demo-clinic".to_string()
}

fn default_clinic_slug() -> String {
    "demo-clinic".to_string()
}

fn default_clinic_name() -> String {
    "Demo Clinic".to_string()
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            id: default_clinic_id(),
            slug: default_clinic_slug(),
            name: default_clinic_name(),
            contact: ClinicContactConfig::default(),
        }
    }
}

/// Where handoff links point. Read-only to the funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicContactConfig {
    /// International number, digits with optional `+` and spacing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,

    /// Number for `sms:` links. Required unless `sms_use_platform_reply`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_number: Option<String>,

    /// The clinic's messaging platform texts the patient instead of the
    /// patient composing an SMS (default: true)
    #[serde(default = "default_true")]
    pub sms_use_platform_reply: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ClinicContactConfig {
    fn default() -> Self {
        Self {
            whatsapp_number: None,
            sms_number: None,
            sms_use_platform_reply: true,
            email: None,
        }
    }
}

impl ClinicContactConfig {
    /// Check that every configured channel can actually be served.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref number) = self.whatsapp_number {
            let digits = count_digits(number);
            if !(7..=15).contains(&digits) {
                anyhow::bail!("Invalid whatsapp_number: {}", number);
            }
        }

        match self.sms_number {
            Some(ref number) => {
                let digits = count_digits(number);
                if !(7..=15).contains(&digits) {
                    anyhow::bail!("Invalid sms_number: {}", number);
                }
            }
            None if !self.sms_use_platform_reply => {
                anyhow::bail!(
                    "sms_number is required when sms_use_platform_reply is false \
                     (the WhatsApp number is not used for SMS)"
                );
            }
            None => {}
        }

        if let Some(ref email) = self.email
            && !email.contains('@')
        {
            anyhow::bail!("Invalid clinic email: {}", email);
        }

        Ok(())
    }
}

fn count_digits(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Funnel behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelConfig {
    /// Seconds before "resend code" is enabled again (default: 30)
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_secs: u32,

    /// Country used for the default dial code when nothing is detected
    #[serde(default = "default_country")]
    pub default_country: String,

    /// Skip locale detection and use this country
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_override: Option<String>,
}

fn default_resend_cooldown() -> u32 {
    30
}

fn default_country() -> String {
    "GB".to_string()
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            resend_cooldown_secs: default_resend_cooldown(),
            default_country: default_country(),
            country_override: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error (default: info)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Directory for debug log files (default: ~/.leadfunnel/logs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn log_dir(&self) -> PathBuf {
        self.dir
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| leadfunnel_home().join("logs"))
    }
}

fn expand_tilde(p: &Path) -> PathBuf {
    if let Ok(rest) = p.strip_prefix("~") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest)
    } else {
        p.to_path_buf()
    }
}

/// Base directory: `~/.leadfunnel/`
pub fn leadfunnel_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".leadfunnel")
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.leadfunnel/config.toml
    /// 3. Local config: ./leadfunnel.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::read_file(&system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::read_file(&local_config_path)?;
        }

        config = Self::apply_env_overrides(config);

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then environment
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let config = Self::apply_env_overrides(Self::read_file(path)?);

        tracing::debug!("Configuration loaded successfully from custom path");
        Ok(config)
    }

    /// Get the system config path: ~/.leadfunnel/config.toml
    pub fn system_config_path() -> Option<PathBuf> {
        Some(leadfunnel_home().join("config.toml"))
    }

    fn local_config_path() -> PathBuf {
        PathBuf::from("./leadfunnel.toml")
    }

    /// Later files replace earlier ones wholesale; sections they omit fall
    /// back to defaults.
    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    fn apply_env_overrides(mut config: Self) -> Self {
        if let Ok(url) = std::env::var("LEADFUNNEL_BACKEND_URL") {
            config.backend.base_url = Some(url);
        }

        if let Ok(key) = std::env::var("LEADFUNNEL_API_KEY")
            && !key.is_empty()
        {
            config.backend.api_key = Some(SecretString::new(key));
        }

        if let Ok(country) = std::env::var("LEADFUNNEL_COUNTRY") {
            config.funnel.country_override = Some(country);
        }

        if let Ok(level) = std::env::var("LEADFUNNEL_LOG_LEVEL") {
            config.logging.level = level;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        if let Some(ref url) = self.backend.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            anyhow::bail!("backend.base_url must be an http(s) URL: {}", url);
        }

        if self.backend.timeout_secs == 0 {
            anyhow::bail!("backend.timeout_secs must be greater than zero");
        }

        if self.funnel.resend_cooldown_secs == 0 {
            anyhow::bail!("funnel.resend_cooldown_secs must be greater than zero");
        }

        if crate::otp::country_by_iso(&self.funnel.default_country).is_none() {
            anyhow::bail!(
                "Unknown funnel.default_country: {}",
                self.funnel.default_country
            );
        }

        if self.clinic.id.trim().is_empty() || self.clinic.slug.trim().is_empty() {
            anyhow::bail!("clinic.id and clinic.slug must not be empty");
        }

        self.clinic
            .contact
            .validate()
            .context("Invalid clinic.contact configuration")?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file.
    ///
    /// The API key only ever serializes as a placeholder, so a config that
    /// holds one is refused rather than written back with a bogus token.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.backend.api_key.is_some() {
            anyhow::bail!(
                "Refusing to save a config holding backend.api_key; set LEADFUNNEL_API_KEY or edit {:?} by hand",
                path
            );
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}
