use super::{Precision, SenderError, build_client, check_response, gzip};
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING};
use std::time::Duration;
use url::Url;

/// InfluxDB v3 sender targeting the `/api/v3/write_lp` endpoint.
///
/// Covers InfluxDB 3 Core, Enterprise and Cloud. The Bearer header is
/// only attached when a token is configured and non-empty; an empty
/// token and an absent token both leave the request unauthenticated.
#[derive(Debug)]
pub struct InfluxDbV3Sender {
    client: Client,
    write_url: Url,
    auth_header: Option<String>,
}

impl InfluxDbV3Sender {
    pub fn new(
        protocol: &str,
        host: &str,
        port: u16,
        database: &str,
        auth_token: Option<&str>,
        precision: Precision,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, SenderError> {
        let mut write_url = Url::parse(&format!("{protocol}://{host}:{port}/api/v3/write_lp"))
            .map_err(|e| SenderError::InvalidConfiguration(format!("Invalid write URL: {e}")))?;
        write_url
            .query_pairs_mut()
            .append_pair("precision", precision.as_str())
            .append_pair("db", database);

        let auth_header = auth_token
            .filter(|token| !token.is_empty())
            .map(|token| format!("Bearer {token}"));

        Ok(Self {
            client: build_client(connect_timeout, read_timeout)?,
            write_url,
            auth_header,
        })
    }

    pub async fn write_data(&self, batch: Bytes) -> Result<u16, SenderError> {
        let compressed = gzip(&batch)?;

        let mut request = self
            .client
            .post(self.write_url.clone())
            .header(CONTENT_ENCODING, "gzip")
            .body(compressed);
        if let Some(auth) = &self.auth_header {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        check_response(response, &self.write_url).await
    }
}
