use super::{Precision, SenderError, build_client, check_response, gzip};
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING};
use std::time::Duration;
use url::Url;

/// InfluxDB v2 sender targeting the bucket/org write API.
///
/// Batches are gzip-compressed and authenticated with
/// `Authorization: Token <auth>` on every request.
#[derive(Debug)]
pub struct InfluxDbCloudSender {
    client: Client,
    write_url: Url,
    auth_header: String,
}

impl InfluxDbCloudSender {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        protocol: &str,
        host: &str,
        port: u16,
        auth_token: &str,
        precision: Precision,
        connect_timeout: Duration,
        read_timeout: Duration,
        organization: &str,
        bucket: &str,
    ) -> Result<Self, SenderError> {
        let mut write_url = Url::parse(&format!("{protocol}://{host}:{port}/api/v2/write"))
            .map_err(|e| SenderError::InvalidConfiguration(format!("Invalid write URL: {e}")))?;
        write_url
            .query_pairs_mut()
            .append_pair("precision", precision.as_str())
            .append_pair("org", organization)
            .append_pair("bucket", bucket);

        Ok(Self {
            client: build_client(connect_timeout, read_timeout)?,
            write_url,
            auth_header: format!("Token {auth_token}"),
        })
    }

    pub async fn write_data(&self, batch: Bytes) -> Result<u16, SenderError> {
        let compressed = gzip(&batch)?;

        let response = self
            .client
            .post(self.write_url.clone())
            .header(AUTHORIZATION, &self.auth_header)
            .header(CONTENT_ENCODING, "gzip")
            .body(compressed)
            .send()
            .await?;

        check_response(response, &self.write_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_url_carries_precision_org_and_bucket() {
        let sender = InfluxDbCloudSender::new(
            "https",
            "eu-central-1-1.aws.cloud2.influxdata.com",
            443,
            "token",
            Precision::Seconds,
            Duration::from_millis(5000),
            Duration::from_millis(5000),
            "my org",
            "hivemq-metrics",
        )
        .unwrap();
        assert_eq!(
            sender.write_url.as_str(),
            "https://eu-central-1-1.aws.cloud2.influxdata.com:443/api/v2/write?precision=s&org=my+org&bucket=hivemq-metrics"
        );
    }

    #[test]
    fn token_header_is_always_present() {
        let sender = InfluxDbCloudSender::new(
            "https",
            "localhost",
            8086,
            "secret",
            Precision::Milliseconds,
            Duration::from_millis(100),
            Duration::from_millis(100),
            "org",
            "bucket",
        )
        .unwrap();
        assert_eq!(sender.auth_header, "Token secret");
    }
}
