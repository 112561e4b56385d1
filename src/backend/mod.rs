//! HTTP/JSON client for the prediction and knowledge backend.
//!
//! The backend is a black box: it serves the diagnostic tree, historical
//! commodity prices and price predictions, each wrapped in a
//! `{ "success": bool, ... }` envelope. Calls are synchronous (`ureq`) and
//! never retried. Every failure is terminal for that interaction and is
//! reported to the user, who may try again.
//!
//! The presentation adapter only sees the [`MarketBackend`] trait, so it can
//! be driven by a fake in tests.

pub mod client;
pub mod types;

use thiserror::Error;

use crate::diagnostic::DiagnosticTree;

pub use client::BackendClient;
pub use types::{HistoricalPrices, Prediction};

/// Message shown when a historical-price request fails without detail.
pub const HISTORICAL_FAILED: &str = "Gagal memuat data";
/// Message shown when a prediction request fails without detail.
pub const PREDICT_FAILED: &str = "Gagal melakukan prediksi";
/// Message shown when the diagnostic tree cannot be loaded without detail.
pub const TREE_FAILED: &str = "Gagal memuat data diagnostik";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Non-2xx status or `success: false`.
    #[error("{message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },
    /// Network failure, timeout, or an undecodable body.
    #[error("connection error: {0}")]
    Connection(String),
}

/// The backend calls the dashboard depends on.
pub trait MarketBackend {
    /// Where requests are sent, for display.
    fn base_url(&self) -> &str;

    /// Whether the backend answers at all.
    fn is_reachable(&self) -> bool;

    /// `GET /api/knowledge/diagnostic-tree`
    fn diagnostic_tree(&self) -> Result<DiagnosticTree, BackendError>;

    /// `POST /api/market/historical` with `{commodity, range}`.
    fn historical(&self, commodity: &str, range: u32) -> Result<HistoricalPrices, BackendError>;

    /// `POST /api/market/predict` with `{commodity, date}`.
    fn predict(&self, commodity: &str, date: &str) -> Result<Prediction, BackendError>;
}
