use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use std::path::Path;

use super::schema::Config;
use crate::error::{ConfigError, Result};

pub async fn load_from_env_or_file() -> Result<Config> {
    let config: Config = Figment::new()
        // Try to load from various config files
        .merge(Toml::file("recorder.toml"))
        .merge(Json::file("recorder.json"))
        .merge(Yaml::file("recorder.yaml"))
        .merge(Yaml::file("recorder.yml"))
        // Override with environment variables (RECORDER_ prefix)
        .merge(Env::prefixed("RECORDER_").split("_"))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    validate(&config)?;
    let config = apply_env_substitutions(config)?;

    Ok(config)
}

pub async fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("RECORDER_").split("_"))
            .extract(),
        Some("json") => Figment::new()
            .merge(Json::file(path))
            .merge(Env::prefixed("RECORDER_").split("_"))
            .extract(),
        Some("yaml") | Some("yml") => Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("RECORDER_").split("_"))
            .extract(),
        _ => {
            return Err(ConfigError::Parse(
                "Unsupported config file format. Use .toml, .json, .yaml, or .yml".into(),
            )
            .into())
        }
    };

    let config = config.map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;
    let config = apply_env_substitutions(config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        return Err(ConfigError::Validation("Server port must be non-zero".into()).into());
    }

    if config.kafka.enabled {
        if config.kafka.brokers.is_empty() {
            return Err(ConfigError::Validation(
                "Kafka is enabled but no brokers are configured".into(),
            )
            .into());
        }
        if config.kafka.brokers.iter().any(|broker| broker.is_empty()) {
            return Err(ConfigError::Validation("Kafka broker address is empty".into()).into());
        }
        if config.kafka.topic.is_empty() {
            return Err(ConfigError::Validation(
                "Kafka is enabled but no topic is configured".into(),
            )
            .into());
        }
        if config.kafka.connect_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Kafka connect timeout must be non-zero".into(),
            )
            .into());
        }
    }

    Ok(())
}

fn apply_env_substitutions(mut config: Config) -> Result<Config> {
    config.server.host = substitute_env_vars(&config.server.host)?;

    for broker in &mut config.kafka.brokers {
        *broker = substitute_env_vars(broker)?;
    }
    config.kafka.topic = substitute_env_vars(&config.kafka.topic)?;

    Ok(config)
}

fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(&cap[0], &value);
            }
            Err(_) => {
                // Check if there's a default value (e.g., ${VAR:-default})
                if let Some((name, default)) = var_name.split_once(":-") {
                    match std::env::var(name) {
                        Ok(value) => result = result.replace(&cap[0], &value),
                        Err(_) => result = result.replace(&cap[0], default),
                    }
                } else {
                    return Err(ConfigError::EnvVar(format!(
                        "Environment variable '{var_name}' not found"
                    ))
                    .into());
                }
            }
        }
    }

    Ok(result)
}
