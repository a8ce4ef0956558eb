use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub booking: BookingConfig,
    pub promo: PromoConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    /// Catalog JSON file; `None` uses the embedded catalog.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct BookingConfig {
    pub relay_url: Option<String>,
    pub relay_api_key: Option<SecretString>,
    pub relay_timeout_secs: u64,
    /// Destination for WhatsApp quote hand-off, digits only.
    pub whatsapp_phone: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PromoConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub relay_url: Option<String>,
    pub relay_api_key: Option<String>,
    pub whatsapp_phone: Option<String>,
    pub promo_endpoint: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig { path: None },
            booking: BookingConfig {
                relay_url: None,
                relay_api_key: None,
                relay_timeout_secs: 10,
                whatsapp_phone: None,
            },
            promo: PromoConfig { endpoint: None, timeout_secs: 5 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("pricebook.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(PathBuf::from(path));
            }
        }

        if let Some(booking) = patch.booking {
            if let Some(relay_url) = booking.relay_url {
                self.booking.relay_url = Some(relay_url);
            }
            if let Some(relay_api_key_value) = booking.relay_api_key {
                self.booking.relay_api_key = Some(secret_value(relay_api_key_value));
            }
            if let Some(relay_timeout_secs) = booking.relay_timeout_secs {
                self.booking.relay_timeout_secs = relay_timeout_secs;
            }
            if let Some(whatsapp_phone) = booking.whatsapp_phone {
                self.booking.whatsapp_phone = Some(whatsapp_phone);
            }
        }

        if let Some(promo) = patch.promo {
            if let Some(endpoint) = promo.endpoint {
                self.promo.endpoint = Some(endpoint);
            }
            if let Some(timeout_secs) = promo.timeout_secs {
                self.promo.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PRICEBOOK_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("PRICEBOOK_RELAY_URL") {
            self.booking.relay_url = Some(value);
        }
        if let Some(value) = read_env("PRICEBOOK_RELAY_API_KEY") {
            self.booking.relay_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PRICEBOOK_RELAY_TIMEOUT_SECS") {
            self.booking.relay_timeout_secs = parse_u64("PRICEBOOK_RELAY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PRICEBOOK_WHATSAPP_PHONE") {
            self.booking.whatsapp_phone = Some(value);
        }

        if let Some(value) = read_env("PRICEBOOK_PROMO_URL") {
            self.promo.endpoint = Some(value);
        }
        if let Some(value) = read_env("PRICEBOOK_PROMO_TIMEOUT_SECS") {
            self.promo.timeout_secs = parse_u64("PRICEBOOK_PROMO_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("PRICEBOOK_LOGGING_LEVEL").or_else(|| read_env("PRICEBOOK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PRICEBOOK_LOGGING_FORMAT").or_else(|| read_env("PRICEBOOK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(relay_url) = overrides.relay_url {
            self.booking.relay_url = Some(relay_url);
        }
        if let Some(relay_api_key) = overrides.relay_api_key {
            self.booking.relay_api_key = Some(secret_value(relay_api_key));
        }
        if let Some(whatsapp_phone) = overrides.whatsapp_phone {
            self.booking.whatsapp_phone = Some(whatsapp_phone);
        }
        if let Some(promo_endpoint) = overrides.promo_endpoint {
            self.promo.endpoint = Some(promo_endpoint);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_booking(&self.booking)?;
        validate_promo(&self.promo)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("pricebook.toml"), PathBuf::from("config/pricebook.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_booking(booking: &BookingConfig) -> Result<(), ConfigError> {
    if let Some(relay_url) = &booking.relay_url {
        if !relay_url.starts_with("http://") && !relay_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "booking.relay_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if booking.relay_api_key.is_some() && booking.relay_url.is_none() {
        return Err(ConfigError::Validation(
            "booking.relay_api_key is set but booking.relay_url is missing".to_string(),
        ));
    }

    if let Some(api_key) = &booking.relay_api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "booking.relay_api_key must not be blank".to_string(),
            ));
        }
    }

    if booking.relay_timeout_secs == 0 || booking.relay_timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "booking.relay_timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if let Some(phone) = &booking.whatsapp_phone {
        let digits_only = !phone.is_empty() && phone.chars().all(|ch| ch.is_ascii_digit());
        if !digits_only || phone.len() > 15 {
            return Err(ConfigError::Validation(
                "booking.whatsapp_phone must be digits only in international form, e.g. 971501234567"
                    .to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_promo(promo: &PromoConfig) -> Result<(), ConfigError> {
    if let Some(endpoint) = &promo.endpoint {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Validation(
                "promo.endpoint must start with http:// or https://".to_string(),
            ));
        }
    }

    if promo.timeout_secs == 0 || promo.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "promo.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    booking: Option<BookingPatch>,
    promo: Option<PromoPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingPatch {
    relay_url: Option<String>,
    relay_api_key: Option<String>,
    relay_timeout_secs: Option<u64>,
    whatsapp_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PromoPatch {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
