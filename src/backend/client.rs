//! Synchronous `ureq` implementation of [`MarketBackend`].
//!
//! Created from the resolved [`BackendConfig`] and reused for the lifetime
//! of a CLI invocation or a dashboard session.
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    ErrorBody, HistoricalEnvelope, HistoricalRequest, PredictEnvelope, PredictRequest,
    TreeEnvelope,
};
use super::{
    BackendError, HISTORICAL_FAILED, HistoricalPrices, MarketBackend, PREDICT_FAILED, Prediction,
    TREE_FAILED,
};
use crate::config::schema::BackendConfig;
use crate::diagnostic::DiagnosticTree;

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    fn url(&self, path: &str) -> String {
        // On Windows, "localhost" may try IPv6 (::1) first, causing delays
        // when the backend only binds to IPv4.
        format!("{}{}", self.base_url, path).replace("://localhost", "://127.0.0.1")
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T, BackendError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let result = ureq::get(&url).timeout(self.timeout).call();
        decode(result, fallback)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, BackendError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let result = ureq::post(&url).timeout(self.timeout).send_json(body);
        decode(result, fallback)
    }
}

impl MarketBackend for BackendClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Any HTTP response counts, including 4xx/5xx; only transport failures
    /// mean unreachable. Uses a short timeout so `health` never stalls.
    fn is_reachable(&self) -> bool {
        let url = self.url("/");
        match ureq::get(&url).timeout(Duration::from_secs(3)).call() {
            Ok(_) | Err(ureq::Error::Status(..)) => true,
            Err(ureq::Error::Transport(_)) => false,
        }
    }

    fn diagnostic_tree(&self) -> Result<DiagnosticTree, BackendError> {
        let env: TreeEnvelope = self.get_json("/api/knowledge/diagnostic-tree", TREE_FAILED)?;
        match (env.success, env.data) {
            (true, Some(tree)) => Ok(tree),
            _ => Err(rejected(env.error, TREE_FAILED)),
        }
    }

    fn historical(&self, commodity: &str, range: u32) -> Result<HistoricalPrices, BackendError> {
        let body = HistoricalRequest { commodity, range };
        let env: HistoricalEnvelope =
            self.post_json("/api/market/historical", &body, HISTORICAL_FAILED)?;
        if !env.success {
            return Err(rejected(env.error, HISTORICAL_FAILED));
        }
        Ok(HistoricalPrices {
            labels: env.labels,
            prices: env.prices,
        })
    }

    fn predict(&self, commodity: &str, date: &str) -> Result<Prediction, BackendError> {
        let body = PredictRequest { commodity, date };
        let env: PredictEnvelope = self.post_json("/api/market/predict", &body, PREDICT_FAILED)?;
        match (env.success, env.data) {
            (true, Some(prediction)) => Ok(prediction),
            _ => Err(rejected(env.error, PREDICT_FAILED)),
        }
    }
}

/// Turn a `ureq` result into a decoded body or a [`BackendError`].
fn decode<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
    fallback: &str,
) -> Result<T, BackendError> {
    match result {
        Ok(resp) => resp
            .into_json::<T>()
            .map_err(|e| BackendError::Connection(format!("invalid response body: {e}"))),
        Err(ureq::Error::Status(code, resp)) => {
            let message = resp
                .into_json::<ErrorBody>()
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| fallback.to_string());
            Err(BackendError::Backend {
                status: Some(code),
                message,
            })
        }
        Err(ureq::Error::Transport(t)) => Err(BackendError::Connection(t.to_string())),
    }
}

/// Error for a 2xx response that reported `success: false` (or no data).
fn rejected(error: Option<String>, fallback: &str) -> BackendError {
    BackendError::Backend {
        status: None,
        message: error
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let client = BackendClient::from_config(&BackendConfig::default());
        assert_eq!(client.base_url, "http://127.0.0.1:5000");
        assert_eq!(client.timeout, Duration::from_millis(15_000));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:5000/".to_string(),
            ..BackendConfig::default()
        };
        let client = BackendClient::from_config(&config);
        assert_eq!(client.url("/api/x"), "http://127.0.0.1:5000/api/x");
    }

    #[test]
    fn localhost_is_pinned_to_ipv4() {
        let config = BackendConfig {
            base_url: "http://localhost:5000".to_string(),
            ..BackendConfig::default()
        };
        let client = BackendClient::from_config(&config);
        assert_eq!(client.url("/api/x"), "http://127.0.0.1:5000/api/x");
    }

    #[test]
    fn rejected_uses_backend_message_when_present() {
        let err = rejected(Some("Komoditas tidak valid".to_string()), PREDICT_FAILED);
        assert_eq!(
            err,
            BackendError::Backend {
                status: None,
                message: "Komoditas tidak valid".to_string()
            }
        );
    }

    #[test]
    fn rejected_falls_back_to_default_message() {
        let err = rejected(None, HISTORICAL_FAILED);
        assert_eq!(err.to_string(), HISTORICAL_FAILED);
        let err = rejected(Some(String::new()), PREDICT_FAILED);
        assert_eq!(err.to_string(), PREDICT_FAILED);
    }

    #[test]
    fn unreachable_backend_is_a_connection_error() {
        // Port 9 (discard) on localhost is closed on test machines.
        let config = BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 500,
        };
        let client = BackendClient::from_config(&config);
        let err = client.historical("cabai_rawit", 30).unwrap_err();
        assert!(matches!(err, BackendError::Connection(_)));
        assert!(!client.is_reachable());
    }
}
