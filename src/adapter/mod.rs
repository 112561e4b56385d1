//! Presentation adapter: owns the per-flow state the surfaces render.
//!
//! Each flow is a plain struct held by whoever drives the UI (the CLI
//! command or the dashboard's `DashboardState`) and passed around by `&mut`.
//! Nothing here is global.
//!
//! - [`DiagnosticFlow`] fetches the diagnostic tree on first use and walks it.
//! - [`TrendFlow`] fetches price history / predictions and keeps the chart
//!   currently on screen.

pub mod diagnostic_flow;
pub mod guard;
pub mod trend_flow;

use thiserror::Error;

use crate::backend::BackendError;
use crate::diagnostic::DiagnosticError;
use crate::trend::TrendError;

pub use diagnostic_flow::DiagnosticFlow;
pub use guard::{RequestGuard, Ticket};
pub use trend_flow::{Applied, PredictionSummary, TrendFlow, validate_prediction_date};

/// Everything a flow can report back to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error(transparent)]
    Diagnostic(#[from] DiagnosticError),
    #[error(transparent)]
    Trend(#[from] TrendError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("invalid prediction date '{date}': {reason}")]
    InvalidDate { date: String, reason: String },
    #[error("unsupported history range: {0} days")]
    InvalidRange(u32),
    #[error("no commodity selected")]
    MissingCommodity,
}

impl FlowError {
    /// Caller mistakes (bad key, bad date, ...) as opposed to failures of the
    /// backend or the network.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }
}
