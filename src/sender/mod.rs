pub mod factory;

mod cloud;
mod http;
mod socket;
mod v3;

pub use cloud::InfluxDbCloudSender;
pub use factory::{FactoryError, build_sender};
pub use http::InfluxDbHttpSender;
pub use socket::{InfluxDbTcpSender, InfluxDbUdpSender};
pub use v3::InfluxDbV3Sender;

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Server returned HTTP response code: {status} for URL: {url} with content :'{body}'")]
    HttpStatus { status: u16, url: String, body: String },
}

/// Timestamp precision carried in the write URL and applied to batch
/// timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Seconds,
    Milliseconds,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
        }
    }

    /// Converts a duration since the UNIX epoch into a timestamp in
    /// this precision.
    pub fn timestamp(self, since_epoch: Duration) -> u64 {
        match self {
            Self::Seconds => since_epoch.as_secs(),
            Self::Milliseconds => since_epoch.as_millis() as u64,
        }
    }
}

/// The five transport variants behind one write capability. Exactly one
/// is constructed per plugin instance; the reporter serializes calls.
#[derive(Debug)]
pub enum InfluxSender {
    Http(InfluxDbHttpSender),
    Tcp(InfluxDbTcpSender),
    Udp(InfluxDbUdpSender),
    Cloud(InfluxDbCloudSender),
    V3(InfluxDbV3Sender),
}

impl InfluxSender {
    /// Transmits one encoded batch. Returns the HTTP status for the
    /// HTTP family and 0 for the socket family, which has no response
    /// channel.
    pub async fn write_data(&self, batch: Bytes) -> Result<u16, SenderError> {
        match self {
            Self::Http(sender) => sender.write_data(batch).await,
            Self::Tcp(sender) => sender.write_data(&batch),
            Self::Udp(sender) => sender.write_data(&batch),
            Self::Cloud(sender) => sender.write_data(batch).await,
            Self::V3(sender) => sender.write_data(batch).await,
        }
    }
}

pub(crate) fn build_client(
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<reqwest::Client, SenderError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(read_timeout)
        .build()
        .map_err(|e| SenderError::InvalidConfiguration(format!("Failed to build HTTP client: {e}")))
}

pub(crate) fn gzip(batch: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(batch)?;
    encoder.finish()
}

pub(crate) async fn check_response(
    response: reqwest::Response,
    url: &Url,
) -> Result<u16, SenderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(status.as_u16());
    }

    let body = response.text().await.unwrap_or_default();
    Err(SenderError::HttpStatus {
        status: status.as_u16(),
        url: url.to_string(),
        body,
    })
}
