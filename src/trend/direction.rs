//! Trend badge and axis formatting for the price chart.

use serde::Serialize;

/// Direction of the backend's trend label.
///
/// The backend reports the trend as free text in Indonesian ("Naik",
/// "Turun Tajam", "Stabil", ...). Anything that is neither rising nor
/// falling is treated as stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn from_label(trend: &str) -> Self {
        if trend.contains("Naik") {
            Self::Up
        } else if trend.contains("Turun") {
            Self::Down
        } else {
            Self::Stable
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Up => "↗",
            Self::Down => "↘",
            Self::Stable => "→",
        }
    }

    /// CSS class used by the dashboard badge.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Up => "trend-up",
            Self::Down => "trend-down",
            Self::Stable => "trend-stable",
        }
    }

    /// Arrow followed by the backend label, e.g. `↗ Naik`.
    pub fn badge(self, trend: &str) -> String {
        format!("{} {}", self.arrow(), trend)
    }
}

/// Y-axis tick in thousands: `12500` → `12.5k`.
pub fn format_axis_tick(value: f64) -> String {
    format!("{}k", value / 1000.0)
}
