use super::{Precision, SenderError, build_client, check_response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;
use url::Url;

/// InfluxDB v1 sender: plain line-protocol POST to `/write`.
///
/// The auth credential is a single opaque string sent as
/// `Authorization: Basic base64(auth)` when present and non-empty.
#[derive(Debug)]
pub struct InfluxDbHttpSender {
    client: Client,
    write_url: Url,
    auth_header: Option<String>,
}

impl InfluxDbHttpSender {
    pub fn new(
        protocol: &str,
        host: &str,
        port: u16,
        database: &str,
        auth: Option<&str>,
        precision: Precision,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, SenderError> {
        let mut write_url = Url::parse(&format!("{protocol}://{host}:{port}/write"))
            .map_err(|e| SenderError::InvalidConfiguration(format!("Invalid write URL: {e}")))?;
        write_url
            .query_pairs_mut()
            .append_pair("db", database)
            .append_pair("precision", precision.as_str());

        let auth_header = auth
            .filter(|auth| !auth.is_empty())
            .map(|auth| format!("Basic {}", BASE64.encode(auth)));

        Ok(Self {
            client: build_client(connect_timeout, read_timeout)?,
            write_url,
            auth_header,
        })
    }

    pub async fn write_data(&self, batch: Bytes) -> Result<u16, SenderError> {
        let mut request = self.client.post(self.write_url.clone()).body(batch);
        if let Some(auth) = &self.auth_header {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        check_response(response, &self.write_url).await
    }
}
