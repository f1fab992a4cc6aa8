use super::{
    InfluxDbCloudSender, InfluxDbHttpSender, InfluxDbTcpSender, InfluxDbUdpSender,
    InfluxDbV3Sender, InfluxSender, Precision, SenderError,
};
use crate::config::{InfluxDbConfig, Mode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Missing mandatory property: {0}")]
    MissingProperty(&'static str),
    #[error("Unknown transport mode")]
    UnknownMode,
    #[error("Sender construction failed: {0}")]
    Construction(#[from] SenderError),
}

/// Builds the one sender this plugin instance will use.
///
/// The effective wire-protocol generation is the explicit `version`
/// property when present, otherwise inferred from the mode: `cloud`
/// implies v2, everything else v1. Any failure is logged here (short
/// message at ERROR, full error at DEBUG) and surfaced to the caller,
/// which must treat it as "no sender available".
pub fn build_sender(config: &InfluxDbConfig) -> Result<InfluxSender, FactoryError> {
    match try_build(config) {
        Ok(sender) => Ok(sender),
        Err(error) => {
            error!("Not able to start InfluxDB sender, please check your configuration: {error}");
            debug!("Original error: {error:?}");
            Err(error)
        }
    }
}

fn try_build(config: &InfluxDbConfig) -> Result<InfluxSender, FactoryError> {
    let mode = config.mode().ok_or(FactoryError::UnknownMode)?;
    let version = config.version().unwrap_or(match mode {
        Mode::Cloud => 2,
        _ => 1,
    });

    let host = config.host().ok_or(FactoryError::MissingProperty("host"))?;
    let port = config.port().ok_or(FactoryError::MissingProperty("port"))?;
    let database = config.database();
    let timeout = Duration::from_millis(config.connect_timeout());
    let precision = Precision::Seconds;

    let default_protocol = match mode {
        Mode::Cloud => "https",
        _ => "http",
    };

    let sender = match version {
        2 => {
            let bucket = config
                .bucket()
                .ok_or(FactoryError::MissingProperty("bucket"))?;
            let organization = config
                .organization()
                .ok_or(FactoryError::MissingProperty("organization"))?;
            let auth = config.auth().ok_or(FactoryError::MissingProperty("auth"))?;
            info!(
                "Creating InfluxDB Cloud sender for endpoint {host}, bucket {bucket}, organization {organization}"
            );
            InfluxSender::Cloud(InfluxDbCloudSender::new(
                &config.protocol_or_default(default_protocol),
                host,
                port,
                auth,
                precision,
                timeout,
                timeout,
                organization,
                bucket,
            )?)
        }
        3 => {
            info!("Creating InfluxDB v3 sender for server {host}:{port} and database {database}");
            InfluxSender::V3(InfluxDbV3Sender::new(
                &config.protocol_or_default(default_protocol),
                host,
                port,
                &database,
                config.auth(),
                precision,
                timeout,
                timeout,
            )?)
        }
        _ => match mode {
            Mode::Http => {
                info!("Creating InfluxDB HTTP sender for server {host}:{port} and database {database}");
                InfluxSender::Http(InfluxDbHttpSender::new(
                    &config.protocol_or_default("http"),
                    host,
                    port,
                    &database,
                    config.auth(),
                    precision,
                    timeout,
                    timeout,
                )?)
            }
            Mode::Tcp => {
                info!("Creating InfluxDB TCP sender for server {host}:{port} and database {database}");
                InfluxSender::Tcp(InfluxDbTcpSender::new(host, port, timeout))
            }
            Mode::Udp => {
                info!("Creating InfluxDB UDP sender for server {host}:{port} and database {database}");
                InfluxSender::Udp(InfluxDbUdpSender::new(host, port, timeout))
            }
            Mode::Cloud => {
                // Explicit v1 combined with cloud mode degrades to a
                // plain HTTPS sender.
                warn!(
                    "InfluxDB version 1 configured together with cloud mode, falling back to an HTTP sender for server {host}:{port}"
                );
                InfluxSender::Http(InfluxDbHttpSender::new(
                    &config.protocol_or_default("https"),
                    host,
                    port,
                    &database,
                    config.auth(),
                    precision,
                    timeout,
                    timeout,
                )?)
            }
        },
    };

    Ok(sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Properties;

    fn config(text: &str) -> InfluxDbConfig {
        InfluxDbConfig::new(Properties::parse(text))
    }

    #[test]
    fn default_mode_builds_a_v1_http_sender() {
        let sender = build_sender(&config("host=localhost\nport=8086\n")).unwrap();
        assert!(matches!(sender, InfluxSender::Http(_)));
    }

    #[test]
    fn tcp_and_udp_modes_build_socket_senders() {
        let sender = build_sender(&config("host=localhost\nport=4444\nmode=tcp\n")).unwrap();
        assert!(matches!(sender, InfluxSender::Tcp(_)));

        let sender = build_sender(&config("host=localhost\nport=4444\nmode=udp\n")).unwrap();
        assert!(matches!(sender, InfluxSender::Udp(_)));
    }

    #[test]
    fn cloud_mode_infers_version_2() {
        let sender = build_sender(&config(
            "host=localhost\nport=8086\nmode=cloud\nauth=token\nbucket=b\norganization=org\n",
        ))
        .unwrap();
        assert!(matches!(sender, InfluxSender::Cloud(_)));
    }

    #[test]
    fn version_2_requires_bucket_organization_and_auth() {
        let base = "host=localhost\nport=8086\nmode=cloud\n";

        let result = build_sender(&config(&format!("{base}auth=t\norganization=org\n")));
        assert!(matches!(result, Err(FactoryError::MissingProperty("bucket"))));

        let result = build_sender(&config(&format!("{base}auth=t\nbucket=b\n")));
        assert!(matches!(
            result,
            Err(FactoryError::MissingProperty("organization"))
        ));

        let result = build_sender(&config(&format!("{base}bucket=b\norganization=org\n")));
        assert!(matches!(result, Err(FactoryError::MissingProperty("auth"))));
    }

    #[test]
    fn explicit_version_2_works_outside_cloud_mode() {
        let sender = build_sender(&config(
            "host=localhost\nport=8086\nversion=2\nauth=t\nbucket=b\norganization=org\n",
        ))
        .unwrap();
        assert!(matches!(sender, InfluxSender::Cloud(_)));
    }

    #[test]
    fn version_3_builds_the_write_lp_sender() {
        let sender =
            build_sender(&config("host=localhost\nport=8086\nversion=3\n")).unwrap();
        assert!(matches!(sender, InfluxSender::V3(_)));

        // v3 auth stays optional
        let sender = build_sender(&config(
            "host=localhost\nport=8086\nversion=3\nauth=tok\n",
        ))
        .unwrap();
        assert!(matches!(sender, InfluxSender::V3(_)));
    }

    #[test]
    fn version_1_with_cloud_mode_degrades_to_http() {
        let sender = build_sender(&config(
            "host=localhost\nport=8086\nmode=cloud\nversion=1\nauth=t\n",
        ))
        .unwrap();
        assert!(matches!(sender, InfluxSender::Http(_)));
    }

    #[test]
    fn unknown_mode_yields_no_sender() {
        let result = build_sender(&config("host=localhost\nport=8086\nmode=smoke-signals\n"));
        assert!(matches!(result, Err(FactoryError::UnknownMode)));
    }

    #[test]
    fn missing_host_or_port_yields_no_sender() {
        let result = build_sender(&config("port=8086\n"));
        assert!(matches!(result, Err(FactoryError::MissingProperty("host"))));

        let result = build_sender(&config("host=localhost\n"));
        assert!(matches!(result, Err(FactoryError::MissingProperty("port"))));
    }
}
