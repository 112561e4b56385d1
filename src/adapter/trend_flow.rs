use chrono::{Local, Months, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

use super::{FlowError, RequestGuard, Ticket};
use crate::backend::{HistoricalPrices, MarketBackend, Prediction};
use crate::config::schema::MarketConfig;
use crate::trend::{ChartSeries, TrendDirection, compose_historical, compose_with_prediction};
use crate::utils::currency::CurrencyFormat;

/// Outcome of finishing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Applied {
    /// The response replaced the current chart.
    Rendered,
    /// A newer request was issued meanwhile; the response was dropped.
    Stale,
}

/// Prediction details ready for display next to the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub prediction_date: String,
    pub predicted_price: f64,
    pub predicted_price_text: String,
    pub current_price: f64,
    pub current_price_text: String,
    pub trend: String,
    pub direction: TrendDirection,
    pub badge: String,
    pub badge_class: String,
    pub insight: String,
}

impl PredictionSummary {
    pub fn from_prediction(prediction: &Prediction, currency: &CurrencyFormat) -> Self {
        let direction = TrendDirection::from_label(&prediction.trend);
        Self {
            prediction_date: prediction.prediction_date.clone(),
            predicted_price: prediction.predicted_price,
            predicted_price_text: currency.format(prediction.predicted_price),
            current_price: prediction.current_price,
            current_price_text: currency.format(prediction.current_price),
            trend: prediction.trend.clone(),
            direction,
            badge: direction.badge(&prediction.trend),
            badge_class: direction.css_class().to_string(),
            insight: prediction.insight.clone(),
        }
    }
}

/// The price-trend flow: history monitoring plus forecasting.
///
/// Holds the chart currently shown and replaces it wholesale on every
/// applied response.
#[derive(Debug)]
pub struct TrendFlow {
    ranges: Vec<u32>,
    currency: CurrencyFormat,
    guard: RequestGuard,
    chart: Option<ChartSeries>,
    prediction: Option<PredictionSummary>,
}

impl TrendFlow {
    pub fn new(market: &MarketConfig, currency: CurrencyFormat) -> Self {
        Self {
            ranges: market.ranges.clone(),
            currency,
            guard: RequestGuard::new(),
            chart: None,
            prediction: None,
        }
    }

    pub fn chart(&self) -> Option<&ChartSeries> {
        self.chart.as_ref()
    }

    pub fn prediction(&self) -> Option<&PredictionSummary> {
        self.prediction.as_ref()
    }

    pub fn currency(&self) -> &CurrencyFormat {
        &self.currency
    }

    /// Issue a ticket for a new request. Any older outstanding request
    /// becomes stale.
    pub fn begin(&mut self) -> Ticket {
        self.guard.issue()
    }

    // -----------------------------------------------------------------------
    // Historical prices
    // -----------------------------------------------------------------------

    /// Fetch `range` days of history for `commodity` and show it.
    pub fn load_historical(
        &mut self,
        backend: &impl MarketBackend,
        commodity: &str,
        range: u32,
    ) -> Result<Applied, FlowError> {
        let ticket = self.begin();
        self.fetch_historical(backend, ticket, commodity, range)
    }

    pub fn fetch_historical(
        &mut self,
        backend: &impl MarketBackend,
        ticket: Ticket,
        commodity: &str,
        range: u32,
    ) -> Result<Applied, FlowError> {
        check_commodity(commodity)?;
        if !self.ranges.contains(&range) {
            return Err(FlowError::InvalidRange(range));
        }

        if !self.guard.is_current(ticket) {
            return Ok(self.stale(ticket));
        }

        debug!(commodity, range, ticket = ticket.id(), "requesting price history");
        let prices = backend.historical(commodity, range)?;
        self.finish_historical(ticket, prices)
    }

    /// Apply a history response. Clears any prediction on screen.
    pub fn finish_historical(
        &mut self,
        ticket: Ticket,
        prices: HistoricalPrices,
    ) -> Result<Applied, FlowError> {
        if !self.guard.is_current(ticket) {
            return Ok(self.stale(ticket));
        }
        let chart = compose_historical(&prices.labels, &prices.prices)?;
        self.chart = Some(chart);
        self.prediction = None;
        Ok(Applied::Rendered)
    }

    // -----------------------------------------------------------------------
    // Prediction
    // -----------------------------------------------------------------------

    /// Ask the backend for a forecast on `date` and show it on the chart.
    pub fn load_prediction(
        &mut self,
        backend: &impl MarketBackend,
        commodity: &str,
        date: &str,
    ) -> Result<Applied, FlowError> {
        let ticket = self.begin();
        self.fetch_prediction(backend, ticket, commodity, date)
    }

    pub fn fetch_prediction(
        &mut self,
        backend: &impl MarketBackend,
        ticket: Ticket,
        commodity: &str,
        date: &str,
    ) -> Result<Applied, FlowError> {
        check_commodity(commodity)?;
        validate_prediction_date(date, Local::now().date_naive())?;

        if !self.guard.is_current(ticket) {
            return Ok(self.stale(ticket));
        }

        debug!(commodity, date, ticket = ticket.id(), "requesting prediction");
        let prediction = backend.predict(commodity, date)?;
        self.finish_prediction(ticket, prediction)
    }

    /// Apply a prediction response: chart with forecast segment plus summary.
    pub fn finish_prediction(
        &mut self,
        ticket: Ticket,
        prediction: Prediction,
    ) -> Result<Applied, FlowError> {
        if !self.guard.is_current(ticket) {
            return Ok(self.stale(ticket));
        }
        let history = &prediction.historical_data;
        let chart = compose_with_prediction(
            &history.labels,
            &history.prices,
            &prediction.prediction_date,
            prediction.predicted_price,
        )?;
        self.prediction = Some(PredictionSummary::from_prediction(&prediction, &self.currency));
        self.chart = Some(chart);
        Ok(Applied::Rendered)
    }

    fn stale(&self, ticket: Ticket) -> Applied {
        info!(ticket = ticket.id(), "dropping stale response");
        Applied::Stale
    }
}

fn check_commodity(commodity: &str) -> Result<(), FlowError> {
    if commodity.trim().is_empty() {
        return Err(FlowError::MissingCommodity);
    }
    Ok(())
}

/// Check a `YYYY-MM-DD` prediction date against `today`.
///
/// The date must be after today and at most one year ahead.
pub fn validate_prediction_date(date: &str, today: NaiveDate) -> Result<NaiveDate, FlowError> {
    let invalid = |reason: &str| FlowError::InvalidDate {
        date: date.to_string(),
        reason: reason.to_string(),
    };

    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| invalid("expected YYYY-MM-DD"))?;
    if parsed <= today {
        return Err(invalid("must be after today"));
    }
    let limit = today
        .checked_add_months(Months::new(12))
        .ok_or_else(|| invalid("date out of range"))?;
    if parsed > limit {
        return Err(invalid("must be within one year"));
    }
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn flow() -> TrendFlow {
        TrendFlow::new(&MarketConfig::default(), CurrencyFormat::default())
    }

    fn history(n: usize) -> HistoricalPrices {
        HistoricalPrices {
            labels: (1..=n).map(|i| format!("2025-01-{i:02}")).collect(),
            prices: (1..=n).map(|i| 1000.0 * i as f64).collect(),
        }
    }

    fn prediction() -> Prediction {
        Prediction {
            prediction_date: "2025-01-10".to_string(),
            predicted_price: 52_500.0,
            current_price: 48_000.0,
            trend: "Naik".to_string(),
            insight: "Harga cenderung naik.".to_string(),
            historical_data: history(3),
        }
    }

    #[test]
    fn date_must_be_in_the_future() {
        let today = day("2025-06-15");
        assert!(validate_prediction_date("2025-06-16", today).is_ok());
        assert!(validate_prediction_date("2025-06-15", today).is_err());
        assert!(validate_prediction_date("2020-01-01", today).is_err());
    }

    #[test]
    fn date_must_be_within_a_year() {
        let today = day("2025-06-15");
        assert!(validate_prediction_date("2026-06-15", today).is_ok());
        assert!(validate_prediction_date("2026-06-16", today).is_err());
    }

    #[test]
    fn date_must_parse() {
        let today = day("2025-06-15");
        let err = validate_prediction_date("25/12/2025", today).unwrap_err();
        assert!(matches!(err, FlowError::InvalidDate { .. }));
    }

    #[test]
    fn finish_historical_replaces_chart_and_clears_prediction() {
        let mut flow = flow();
        let t = flow.begin();
        flow.finish_prediction(t, prediction()).unwrap();
        assert!(flow.prediction().is_some());

        let t = flow.begin();
        assert_eq!(flow.finish_historical(t, history(5)).unwrap(), Applied::Rendered);
        assert_eq!(flow.chart().unwrap().labels.len(), 5);
        assert!(flow.prediction().is_none());
    }

    #[test]
    fn stale_response_is_dropped() {
        let mut flow = flow();
        let old = flow.begin();
        let new = flow.begin();

        assert_eq!(flow.finish_historical(new, history(4)).unwrap(), Applied::Rendered);
        assert_eq!(flow.finish_historical(old, history(2)).unwrap(), Applied::Stale);
        assert_eq!(flow.chart().unwrap().labels.len(), 4);
    }

    #[test]
    fn stale_response_is_dropped_even_if_malformed() {
        let mut flow = flow();
        let old = flow.begin();
        let _new = flow.begin();
        let broken = HistoricalPrices {
            labels: vec!["a".to_string()],
            prices: vec![],
        };
        assert_eq!(flow.finish_historical(old, broken).unwrap(), Applied::Stale);
    }

    #[test]
    fn finish_prediction_builds_summary() {
        let mut flow = flow();
        let t = flow.begin();
        flow.finish_prediction(t, prediction()).unwrap();

        let chart = flow.chart().unwrap();
        assert_eq!(chart.labels.last().map(String::as_str), Some("2025-01-10"));
        assert!(chart.has_prediction());

        let summary = flow.prediction().unwrap();
        assert_eq!(summary.predicted_price_text, "Rp 52.500");
        assert_eq!(summary.current_price_text, "Rp 48.000");
        assert_eq!(summary.direction, TrendDirection::Up);
        assert_eq!(summary.badge, "↗ Naik");
        assert_eq!(summary.badge_class, "trend-up");
    }

    #[test]
    fn malformed_history_is_reported() {
        let mut flow = flow();
        let t = flow.begin();
        let broken = HistoricalPrices {
            labels: vec!["a".to_string(), "b".to_string()],
            prices: vec![1.0],
        };
        let err = flow.finish_historical(t, broken).unwrap_err();
        assert!(matches!(err, FlowError::Trend(_)));
        assert!(flow.chart().is_none());
    }
}
