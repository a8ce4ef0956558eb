use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::CommandResult;
use pricebook_core::config::{AppConfig, LoadOptions};

pub fn run(load: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(load.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult { exit_code: 2, output: format!("config validation failed: {error}") };
        }
    };

    let config_file_path = detect_config_path(load.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let catalog_path = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<embedded seeds>".to_string());
    lines.push(render_line(
        "catalog.path",
        &catalog_path,
        source("catalog.path", &["PRICEBOOK_CATALOG_PATH"]),
    ));

    lines.push(render_line(
        "booking.relay_url",
        config.booking.relay_url.as_deref().unwrap_or("<unset>"),
        source("booking.relay_url", &["PRICEBOOK_RELAY_URL"]),
    ));

    let relay_api_key = config
        .booking
        .relay_api_key
        .as_ref()
        .map(|key| redact_key(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "booking.relay_api_key",
        &relay_api_key,
        source("booking.relay_api_key", &["PRICEBOOK_RELAY_API_KEY"]),
    ));

    lines.push(render_line(
        "booking.relay_timeout_secs",
        &config.booking.relay_timeout_secs.to_string(),
        source("booking.relay_timeout_secs", &["PRICEBOOK_RELAY_TIMEOUT_SECS"]),
    ));
    lines.push(render_line(
        "booking.whatsapp_phone",
        config.booking.whatsapp_phone.as_deref().unwrap_or("<unset>"),
        source("booking.whatsapp_phone", &["PRICEBOOK_WHATSAPP_PHONE"]),
    ));

    lines.push(render_line(
        "promo.endpoint",
        config.promo.endpoint.as_deref().unwrap_or("<unset>"),
        source("promo.endpoint", &["PRICEBOOK_PROMO_URL"]),
    ));
    lines.push(render_line(
        "promo.timeout_secs",
        &config.promo.timeout_secs.to_string(),
        source("promo.timeout_secs", &["PRICEBOOK_PROMO_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["PRICEBOOK_LOGGING_LEVEL", "PRICEBOOK_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["PRICEBOOK_LOGGING_FORMAT", "PRICEBOOK_LOG_FORMAT"]),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("pricebook.toml"), PathBuf::from("config/pricebook.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
