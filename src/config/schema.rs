use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConfig {
    #[serde(default = "default_kafka_enabled")]
    pub enabled: bool,
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_flush_timeout")]
    pub flush_timeout_ms: u64,
    #[serde(default = "default_message_timeout")]
    pub message_timeout_ms: u64,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            enabled: default_kafka_enabled(),
            brokers: default_brokers(),
            topic: default_topic(),
            connect_timeout_ms: default_connect_timeout(),
            flush_timeout_ms: default_flush_timeout(),
            message_timeout_ms: default_message_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    #[serde(default)]
    pub log_exchanges: bool,
    #[serde(default)]
    pub on_connect_failure: ConnectFailurePolicy,
}

/// What bootstrap does when a configured transport cannot connect.
///
/// `Fail` aborts startup (no traffic is served that cannot be recorded);
/// `Degrade` drops the transport and serves anyway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectFailurePolicy {
    #[default]
    Fail,
    Degrade,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_kafka_enabled() -> bool {
    true
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9092".to_string()]
}

fn default_topic() -> String {
    "http_recordings".to_string()
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_flush_timeout() -> u64 {
    5000
}

fn default_message_timeout() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.kafka.enabled);
        assert_eq!(config.kafka.brokers, vec!["localhost:9092".to_string()]);
        assert_eq!(config.kafka.topic, "http_recordings");
        assert!(!config.capture.log_exchanges);
        assert_eq!(config.capture.on_connect_failure, ConnectFailurePolicy::Fail);
    }

    #[test]
    fn test_connect_failure_policy_is_camel_case_on_the_wire() {
        assert_eq!(
            serde_json::from_str::<ConnectFailurePolicy>("\"degrade\"").unwrap(),
            ConnectFailurePolicy::Degrade
        );
        assert_eq!(
            serde_json::to_string(&ConnectFailurePolicy::Fail).unwrap(),
            "\"fail\""
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config =
            serde_json::from_str("{\"kafka\":{\"topic\":\"custom_topic\"}}").unwrap();

        assert_eq!(config.kafka.topic, "custom_topic");
        assert_eq!(config.kafka.brokers, vec!["localhost:9092".to_string()]);
        assert_eq!(config.server.port, 3000);
    }
}
