//! HTTP client for a running comparison service.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::types::ComparisonRequest;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Posts comparison requests to `{server_url}/compare`.
#[derive(Debug, Clone)]
pub struct CompareClient {
    http: Client,
    endpoint: String,
}

impl CompareClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            http: Client::new(),
            endpoint: format!("{}/compare", server_url.trim_end_matches('/')),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.server_url)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `request` and return the HTML fragment on success.
    pub async fn compare(&self, request: &ComparisonRequest) -> Result<String, ClientError> {
        debug!(endpoint = %self.endpoint, option_count = request.options.len(), "Posting comparison");
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ClientError::Transport {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Like [`compare`](Self::compare), but abandons the request as soon as
    /// `cancel` fires.
    pub async fn compare_cancellable(
        &self,
        request: &ComparisonRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ClientError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.compare(request) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OptionInput;

    #[test]
    fn test_endpoint_trailing_slash() {
        assert_eq!(
            CompareClient::new("http://localhost:8787/").endpoint(),
            "http://localhost:8787/compare"
        );
        assert_eq!(
            CompareClient::from_config(&ClientConfig::default()).endpoint(),
            "http://127.0.0.1:8787/compare"
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let client = CompareClient::new("http://127.0.0.1:9");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = ComparisonRequest::new(vec![OptionInput::new("A", "x")]);
        let err = client.compare_cancellable(&request, &cancel).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }
}
