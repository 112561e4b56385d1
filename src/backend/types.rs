//! Request and response bodies of the backend API.
use serde::{Deserialize, Serialize};

use crate::diagnostic::DiagnosticTree;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct HistoricalRequest<'a> {
    pub commodity: &'a str,
    pub range: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictRequest<'a> {
    pub commodity: &'a str,
    pub date: &'a str,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Envelope of `GET /api/knowledge/diagnostic-tree`.
#[derive(Debug, Deserialize)]
pub(crate) struct TreeEnvelope {
    pub success: bool,
    pub data: Option<DiagnosticTree>,
    pub error: Option<String>,
}

/// Body of `POST /api/market/historical`. The price arrays sit at the top
/// level next to `success`, not under `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct HistoricalEnvelope {
    pub success: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub prices: Vec<f64>,
    pub error: Option<String>,
}

/// Envelope of `POST /api/market/predict`.
#[derive(Debug, Deserialize)]
pub(crate) struct PredictEnvelope {
    pub success: bool,
    pub data: Option<Prediction>,
    pub error: Option<String>,
}

/// Minimal shape used to pull an error message out of any failed response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

/// Date labels and prices, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPrices {
    pub labels: Vec<String>,
    pub prices: Vec<f64>,
}

/// A single forecast plus the history it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction_date: String,
    pub predicted_price: f64,
    pub current_price: f64,
    /// Free-text trend label, e.g. `"Naik"`.
    pub trend: String,
    pub insight: String,
    pub historical_data: HistoricalPrices,
}
