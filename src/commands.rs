use tokio::time::{timeout, Duration};
use tracing::{error, info};

use crate::config::Config;
use crate::error::{RecorderError, Result};
use crate::transport::create_transports;

/// `check` subcommand: validate configuration and optionally probe the
/// configured transports.
pub async fn run_config_check(config: Config, probe: bool) -> Result<()> {
    info!("Checking configuration...");

    crate::config::validate(&config)?;
    info!("✓ Configuration is valid");

    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server"
    );
    if config.kafka.enabled {
        info!(
            brokers = %config.kafka.brokers.join(","),
            topic = %config.kafka.topic,
            "Kafka transport enabled"
        );
    } else {
        info!("Kafka transport disabled");
    }

    if !probe {
        return Ok(());
    }

    let transports = create_transports(&config);
    info!("Probing {} transport(s)...", transports.len());

    let mut all_ok = true;
    for transport in &transports {
        let connect_timeout = Duration::from_millis(config.kafka.connect_timeout_ms);
        match timeout(connect_timeout, transport.connect()).await {
            Ok(Ok(())) => {
                info!("✓ Transport '{}' connected", transport.name());
                if let Err(e) = transport.close().await {
                    error!("✗ Transport '{}' failed to close: {}", transport.name(), e);
                    all_ok = false;
                }
            }
            Ok(Err(e)) => {
                error!("✗ Transport '{}' failed to connect: {}", transport.name(), e);
                all_ok = false;
            }
            Err(_) => {
                error!("✗ Transport '{}' connect timed out", transport.name());
                all_ok = false;
            }
        }
    }

    if all_ok {
        info!("✓ All checks passed");
        Ok(())
    } else {
        Err(RecorderError::Config(crate::error::ConfigError::Validation(
            "One or more transports failed checks".to_string(),
        )))
    }
}
