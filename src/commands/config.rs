//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config set`: Set a configuration value
//! - `config get`: Print one configuration value

use owo_colors::OwoColorize;
use secrecy::ExposeSecret;
use serde_json::json;

use super::print_json;
use crate::config::Config;
use crate::error::{ReelError, Result};
use crate::paths::config_path;

const VALID_KEYS: &[&str] = &[
    "backend.url",
    "backend.anon_key",
    "catalog.api_key",
    "catalog.base_url",
    "search.debounce_ms",
    "search.trending_limit",
    "remote_timeout",
];

const SECRET_KEYS: &[&str] = &["backend.anon_key", "catalog.api_key"];

fn validate_config_key(key: &str) -> Result<&str> {
    if VALID_KEYS.contains(&key) {
        Ok(key)
    } else {
        Err(ReelError::Config(format!(
            "unknown config key '{key}'. Valid keys: {}",
            VALID_KEYS.join(", ")
        )))
    }
}

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse::<T>().map_err(|_| {
        ReelError::Config(format!(
            "invalid value '{value}' for {key}. Expected a non-negative integer"
        ))
    })
}

fn parse_timeout(key: &str, value: &str) -> Result<u64> {
    match parse_number::<u64>(key, value)? {
        0 => Err(ReelError::Config(format!(
            "invalid value '{value}' for {key}. Expected at least 1 second"
        ))),
        secs => Ok(secs),
    }
}

/// Effective value of `key`, with environment overrides applied
fn lookup(config: &Config, key: &str) -> Option<String> {
    match key {
        "backend.url" => config.backend_url().ok(),
        "backend.anon_key" => config
            .backend_key()
            .ok()
            .map(|k| k.expose_secret().to_string()),
        "catalog.api_key" => config
            .catalog_api_key()
            .ok()
            .map(|k| k.expose_secret().to_string()),
        "catalog.base_url" => Some(config.catalog.base_url.clone()),
        "search.debounce_ms" => Some(config.search.debounce_ms.to_string()),
        "search.trending_limit" => Some(config.search.trending_limit.to_string()),
        "remote_timeout" => Some(config.remote_timeout.to_string()),
        _ => None,
    }
}

/// Show current configuration
pub fn cmd_config_show(output_json: bool) -> Result<()> {
    let config = Config::load()?;

    let backend_url = config.backend_url().ok();
    let backend_key_configured = config.backend_key().is_ok();
    let catalog_key_configured = config.catalog_api_key().is_ok();

    if output_json {
        return print_json(&json!({
            "backend": {
                "url": backend_url,
                "anon_key_configured": backend_key_configured,
            },
            "catalog": {
                "base_url": config.catalog.base_url,
                "api_key_configured": catalog_key_configured,
            },
            "search": {
                "debounce_ms": config.search.debounce_ms,
                "trending_limit": config.search.trending_limit,
            },
            "remote_timeout": config.remote_timeout,
            "config_file": config_path().to_string_lossy(),
        }));
    }

    let status = |configured: bool| {
        if configured {
            "configured".green().to_string()
        } else {
            "not configured".dimmed().to_string()
        }
    };

    println!("{}\n", "Configuration:".cyan().bold());

    println!("{}:", "backend".cyan());
    match backend_url {
        Some(url) => println!("  url: {url}"),
        None => println!("  url: {}", "not configured".dimmed()),
    }
    println!("  anon_key: {}", status(backend_key_configured));
    println!();

    println!("{}:", "catalog".cyan());
    println!("  base_url: {}", config.catalog.base_url);
    println!("  api_key: {}", status(catalog_key_configured));
    println!();

    println!("{}:", "search".cyan());
    println!("  debounce_ms: {}", config.search.debounce_ms);
    println!("  trending_limit: {}", config.search.trending_limit);
    println!();

    println!("{}: {}s", "remote_timeout".cyan(), config.remote_timeout);
    println!();
    println!(
        "{}",
        format!("Config file: {}", config_path().display()).dimmed()
    );
    Ok(())
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output_json: bool) -> Result<()> {
    validate_config_key(key)?;
    let mut config = Config::load()?;

    match key {
        "backend.url" => {
            url::Url::parse(value)?;
            config.backend.url = Some(value.to_string());
        }
        "backend.anon_key" => config.backend.anon_key = Some(value.to_string()),
        "catalog.api_key" => config.set_catalog_api_key(value.to_string()),
        "catalog.base_url" => {
            url::Url::parse(value)?;
            config.catalog.base_url = value.to_string();
        }
        "search.debounce_ms" => config.search.debounce_ms = parse_number(key, value)?,
        "search.trending_limit" => config.search.trending_limit = parse_number(key, value)?,
        "remote_timeout" => config.remote_timeout = parse_timeout(key, value)?,
        other => return Err(ReelError::Config(format!("unknown config key '{other}'"))),
    }
    config.save()?;

    if output_json {
        let shown = if SECRET_KEYS.contains(&key) {
            mask_sensitive_value(value)
        } else {
            value.to_string()
        };
        return print_json(&json!({
            "action": "config_set",
            "key": key,
            "value": shown,
            "success": true,
        }));
    }
    println!("Set {}", key.cyan());
    Ok(())
}

/// Get a specific configuration value
pub fn cmd_config_get(key: &str, output_json: bool) -> Result<()> {
    validate_config_key(key)?;
    let config = Config::load()?;

    let value = lookup(&config, key);
    let masked = SECRET_KEYS.contains(&key);
    let shown = value.as_deref().map(|v| {
        if masked {
            mask_sensitive_value(v)
        } else {
            v.to_string()
        }
    });

    if output_json {
        return print_json(&json!({
            "key": key,
            "value": shown,
            "configured": value.is_some(),
            "masked": masked && value.is_some(),
        }));
    }

    match shown {
        Some(v) if masked => println!("{v} (masked - showing first 2 and last 2 characters)"),
        Some(v) => println!("{v}"),
        None => {
            return Err(ReelError::Config(format!("{key} is not set")));
        }
    }
    Ok(())
}
