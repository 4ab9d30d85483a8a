use std::time::{Duration, Instant};

use reqwest::Client;

use crate::config::EndpointConfig;
use crate::dispatch::{EndpointRequest, EndpointResponse, PayloadKey};
use crate::error::GleanError;

const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// Posts input text to the remote analysis endpoint and returns its raw body.
pub struct EndpointClient {
    client: Client,
    url: String,
    api_token: Option<String>,
    payload_key: PayloadKey,
    timeout: Duration,
}

impl EndpointClient {
    pub fn new(config: &EndpointConfig, url: String) -> Result<Self, GleanError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| GleanError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            api_token: config.api_token.clone(),
            payload_key: config.payload_key,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        })
    }

    /// Host part of the endpoint URL, used to label errors without leaking paths.
    pub fn endpoint_label(&self) -> String {
        reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "endpoint".to_string())
    }

    pub async fn send(&self, req: &EndpointRequest) -> Result<EndpointResponse, GleanError> {
        let start = Instant::now();
        let endpoint = self.endpoint_label();

        let mut body = serde_json::Map::new();
        body.insert(
            self.payload_key.as_str().to_string(),
            serde_json::Value::String(req.text.clone()),
        );

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body);
        if let Some(ref token) = self.api_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        tracing::debug!(batch = req.batch_index, bytes = req.text.len(), "posting batch");
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GleanError::RateLimited { endpoint });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(GleanError::AuthFailed {
                endpoint,
                message: format!("{status}"),
            });
        }

        // Error bodies are capped at MAX_RESPONSE_BYTES.
        if !status.is_success() {
            let error_bytes = response.bytes().await.unwrap_or_default();
            let truncated = &error_bytes[..error_bytes.len().min(MAX_RESPONSE_BYTES)];
            let text = String::from_utf8_lossy(truncated);
            return Err(GleanError::Upstream {
                endpoint,
                message: format!("{status}: {text}"),
                status: Some(status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| GleanError::Upstream {
            endpoint: endpoint.clone(),
            message: format!("failed to read response body: {e}"),
            status: None,
        })?;

        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(GleanError::Upstream {
                endpoint,
                message: format!(
                    "response too large: {} bytes (max {})",
                    bytes.len(),
                    MAX_RESPONSE_BYTES
                ),
                status: None,
            });
        }

        Ok(EndpointResponse {
            body: String::from_utf8_lossy(&bytes).into_owned(),
            status: status.as_u16(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
