//! Configuration loader: merges env vars, .env file, and config.toml.

use std::path::Path;

use common::config::BotConfig;
use common::Error;
use rain_alerts::Interpreter;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn validate_config(config: &BotConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.server_url.trim().is_empty() {
        issues.push("SATAAKO_SERVER_URL is required (set in .env or environment)".into());
    } else if !config.server_url.starts_with("http://")
        && !config.server_url.starts_with("https://")
    {
        issues.push("server_url must start with http:// or https://".into());
    }

    if config.timing.query_interval_secs == 0 {
        issues.push("timing.query_interval_secs must be > 0".into());
    }
    if config.timing.request_timeout_secs == 0 {
        issues.push("timing.request_timeout_secs must be > 0".into());
    }

    if let Err(e) = Interpreter::from_config(&config.display) {
        issues.push(format!("display: {e}"));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Apply environment overrides through `lookup` (highest priority).
fn apply_env_overrides(
    config: &mut BotConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), Error> {
    if let Some(url) = lookup("SATAAKO_SERVER_URL") {
        config.server_url = url;
    }
    if let Some(raw) = lookup("RAIN_WARNING_QUERY_INTERVAL") {
        config.timing.query_interval_secs =
            parse_positive_u64(&raw, "RAIN_WARNING_QUERY_INTERVAL")?;
    }
    if let Some(raw) = lookup("SATAAKO_REQUEST_TIMEOUT_SECS") {
        config.timing.request_timeout_secs =
            parse_positive_u64(&raw, "SATAAKO_REQUEST_TIMEOUT_SECS")?;
    }
    if let Some(tz) = lookup("SATAAKO_DISPLAY_TIMEZONE") {
        config.display.timezone = tz.trim().to_string();
    }
    if let Some(url) = lookup("SATAAKO_FALLBACK_IMAGE_URL") {
        config.rain_map.fallback_image_url = url.trim().to_string();
    }

    config.server_url = config.server_url.trim().trim_end_matches('/').to_string();
    Ok(())
}

/// Load bot configuration from environment and optional config file.
pub fn load_config() -> Result<BotConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = BotConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables.
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = BotConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SATAAKO_SERVER_URL", "https://sataako.example/ "),
                ("RAIN_WARNING_QUERY_INTERVAL", "300"),
                ("SATAAKO_DISPLAY_TIMEZONE", "UTC"),
            ]),
        )
        .expect("overrides apply");

        assert_eq!(config.server_url, "https://sataako.example");
        assert_eq!(config.timing.query_interval_secs, 300);
        assert_eq!(config.display.timezone, "UTC");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = BotConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("RAIN_WARNING_QUERY_INTERVAL", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("RAIN_WARNING_QUERY_INTERVAL"));

        let err = apply_env_overrides(&mut config, env(&[("RAIN_WARNING_QUERY_INTERVAL", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validation_collects_all_issues() {
        let mut config = BotConfig::default();
        config.timing.request_timeout_secs = 0;
        config.display.timezone = "Atlantis/Capital".into();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("SATAAKO_SERVER_URL is required"));
        assert!(message.contains("request_timeout_secs"));
        assert!(message.contains("Atlantis/Capital"));
    }

    #[test]
    fn test_toml_file_shape() {
        let config: BotConfig = toml::from_str(
            r#"
            server_url = "http://localhost:5000"

            [timing]
            query_interval_secs = 60

            [display]
            timezone = "Europe/Stockholm"
            "#,
        )
        .expect("toml parses");

        assert_eq!(config.timing.query_interval_secs, 60);
        assert_eq!(config.timing.request_timeout_secs, 5);
        assert_eq!(config.display.timezone, "Europe/Stockholm");
        assert_eq!(config.display.eta_format, "%H:%M");
        assert!(validate_config(&config).is_ok());
    }
}
