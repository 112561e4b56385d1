//! Price-trend chart data.
//!
//! Turns the backend's historical price arrays (and an optional single
//! forecast point) into a [`ChartSeries`]: one shared label axis plus one or
//! two datasets that a line-chart renderer can draw directly.

pub mod composer;
pub mod direction;

use serde::Serialize;
use thiserror::Error;

pub use composer::{compose_historical, compose_with_prediction};
pub use direction::{TrendDirection, format_axis_tick};

/// Legend label of the historical dataset.
pub const HISTORICAL_LABEL: &str = "Harga Historis";
/// Legend label of the forecast dataset.
pub const PREDICTION_LABEL: &str = "Prediksi AI";

// ---------------------------------------------------------------------------
// Chart model
// ---------------------------------------------------------------------------

/// Everything a line chart needs: the x-axis labels and the datasets plotted
/// against them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSeries {
    pub fn dataset(&self, kind: DatasetKind) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.kind == kind)
    }

    pub fn has_prediction(&self) -> bool {
        self.dataset(DatasetKind::Prediction).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Historical,
    Prediction,
}

/// One plotted line. `None` entries are gaps the renderer skips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub label: String,
    pub data: Vec<Option<f64>>,
    pub style: DatasetStyle,
}

/// Rendering hints carried alongside the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStyle {
    pub border_color: String,
    pub background_color: Option<String>,
    /// Dash pattern; empty for a solid line.
    pub border_dash: Vec<u32>,
    pub border_width: u32,
    pub point_radius: u32,
    /// Point fill; `None` means the line colour.
    pub point_background_color: Option<String>,
    /// Point outline; `None` means the line colour.
    pub point_border_color: Option<String>,
    pub point_border_width: u32,
    pub tension: f64,
    pub fill: bool,
}

impl DatasetStyle {
    /// Solid green area line.
    pub fn historical() -> Self {
        Self {
            border_color: "#4caf50".to_string(),
            background_color: Some("rgba(76, 175, 80, 0.1)".to_string()),
            border_dash: Vec::new(),
            border_width: 2,
            point_radius: 2,
            point_background_color: None,
            point_border_color: None,
            point_border_width: 1,
            tension: 0.3,
            fill: true,
        }
    }

    /// Dashed orange segment with prominent points.
    pub fn prediction() -> Self {
        Self {
            border_color: "#ff9800".to_string(),
            background_color: None,
            border_dash: vec![5, 5],
            border_width: 2,
            point_radius: 5,
            point_background_color: Some("#ff9800".to_string()),
            point_border_color: Some("#fff".to_string()),
            point_border_width: 2,
            tension: 0.0,
            fill: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrendError {
    #[error("label/price length mismatch: {labels} labels vs {prices} prices")]
    LengthMismatch { labels: usize, prices: usize },
    #[error("no historical prices to anchor the prediction to")]
    EmptyHistory,
}
