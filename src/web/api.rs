//! JSON API handlers for the web dashboard.
//!
//! Each handler decodes its typed request body, drives one flow in the
//! [`DashboardState`], and returns a [`Reply`]. Successful replies carry
//! `"success": true`; failures carry `{ "success": false, "error": ... }`
//! with the status picked by [`error_status`].

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::adapter::{Applied, FlowError, PredictionSummary};
use crate::backend::{BackendError, MarketBackend};
use crate::diagnostic::{Prompt, Step, humanize_key};
use crate::trend::ChartSeries;

use super::{DashboardState, Reply};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /api/diagnostic/start` and `/restart`. May be empty.
#[derive(Debug, Default, Deserialize)]
struct SeqRequest {
    #[serde(default)]
    seq: Option<u64>,
}

/// Body of `POST /api/diagnostic/choose`. With `path` (the keys this
/// client chose so far) the walk resumes from there first; without it the
/// key applies to the current walk.
#[derive(Debug, Deserialize)]
struct ChooseRequest {
    key: String,
    #[serde(default)]
    path: Option<Vec<String>>,
    #[serde(default)]
    seq: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct HistoricalRequest {
    commodity: String,
    range: u32,
    #[serde(default)]
    seq: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    commodity: String,
    date: String,
    #[serde(default)]
    seq: Option<u64>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Successful reply: `success` and the echoed `seq` next to the payload.
#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    seq: Option<u64>,
    #[serde(flatten)]
    data: T,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    success: bool,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seq: Option<u64>,
}

#[derive(Debug, Serialize)]
struct OptionView {
    key: String,
    label: String,
}

/// One diagnostic step as the page renders it.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum StepView {
    Question {
        question: String,
        options: Vec<OptionView>,
    },
    Diagnosis {
        diagnosis: String,
    },
}

impl From<Prompt> for StepView {
    fn from(prompt: Prompt) -> Self {
        Self::Question {
            question: prompt.question,
            options: prompt
                .options
                .into_iter()
                .map(|key| OptionView {
                    label: humanize_key(&key),
                    key,
                })
                .collect(),
        }
    }
}

impl From<Step> for StepView {
    fn from(step: Step) -> Self {
        match step {
            Step::Continue(prompt) => prompt.into(),
            Step::Terminal { diagnosis } => Self::Diagnosis { diagnosis },
        }
    }
}

/// Chart reply. `chart` is omitted when the response was stale.
#[derive(Serialize)]
struct ChartResponse<'a> {
    applied: Applied,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<&'a ChartSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prediction: Option<&'a PredictionSummary>,
}

#[derive(Serialize)]
struct FormatResponse {
    amount: f64,
    text: String,
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    backend_url: &'a str,
    backend_reachable: bool,
    default_commodity: &'a str,
    default_range: u32,
    ranges: &'a [u32],
    config_exists: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success reply.
fn json_response<T: Serialize>(seq: Option<u64>, data: T) -> Result<Reply> {
    let body = serde_json::to_string(&Envelope {
        success: true,
        seq,
        data,
    })
    .context("failed to serialize JSON response")?;
    Ok(Reply::json(200, body))
}

/// Build a JSON error reply.
pub(crate) fn error_response(status: u16, message: &str, seq: Option<u64>) -> Result<Reply> {
    let body = serde_json::to_string(&ErrorResponse {
        success: false,
        error: message,
        seq,
    })
    .context("failed to serialize JSON error")?;
    Ok(Reply::json(status, body))
}

fn flow_error(error: &FlowError, seq: Option<u64>) -> Result<Reply> {
    let status = error_status(error);
    if status >= 500 {
        warn!(%error, status, "backend request failed");
    }
    error_response(status, &error.to_string(), seq)
}

/// HTTP status for a flow failure: backend rejections are 502, transport
/// failures 504, everything the caller got wrong 400.
pub(crate) fn error_status(error: &FlowError) -> u16 {
    match error {
        FlowError::Backend(BackendError::Backend { .. }) => 502,
        FlowError::Backend(BackendError::Connection(_)) => 504,
        _ => 400,
    }
}

/// Decode a JSON body. An absent or blank body decodes as `{}`.
fn decode<T: DeserializeOwned>(body: Option<&str>) -> Result<T, String> {
    let text = body.map(str::trim).filter(|b| !b.is_empty()).unwrap_or("{}");
    serde_json::from_str(text).map_err(|e| format!("invalid request body: {e}"))
}

/// Parse a `?name=value` query parameter from a URL.
fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    url.split_once('?')?.1.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then_some(v)
    })
}

/// `?amount=N` as a number.
fn parse_amount(url: &str) -> Option<f64> {
    query_param(url, "amount")?.parse().ok()
}

fn chart_reply<B: MarketBackend>(state: &DashboardState<B>, applied: Applied, seq: Option<u64>) -> Result<Reply> {
    let rendered = applied == Applied::Rendered;
    json_response(
        seq,
        ChartResponse {
            applied,
            chart: state.trend.chart().filter(|_| rendered),
            prediction: state.trend.prediction().filter(|_| rendered),
        },
    )
}

// ---------------------------------------------------------------------------
// API Handlers: diagnosis
// ---------------------------------------------------------------------------

/// `POST /api/diagnostic/start`: fetch the tree if needed and show the root.
pub fn post_diagnostic_start<B: MarketBackend>(
    state: &mut DashboardState<B>,
    body: Option<&str>,
) -> Result<Reply> {
    let req: SeqRequest = match decode(body) {
        Ok(req) => req,
        Err(msg) => return error_response(400, &msg, None),
    };
    match state.diagnostic.start(&state.backend) {
        Ok(prompt) => json_response(req.seq, StepView::from(prompt)),
        Err(e) => flow_error(&e, req.seq),
    }
}

/// `POST /api/diagnostic/choose`: `{ "key": "...", "path": [...] }`, `path` optional.
pub fn post_diagnostic_choose<B: MarketBackend>(
    state: &mut DashboardState<B>,
    body: Option<&str>,
) -> Result<Reply> {
    let req: ChooseRequest = match decode(body) {
        Ok(req) => req,
        Err(msg) => return error_response(400, &msg, None),
    };
    let result = match &req.path {
        Some(path) => state
            .diagnostic
            .resume(&state.backend, path)
            .and_then(|_| state.diagnostic.choose(&req.key)),
        None => state.diagnostic.choose(&req.key),
    };
    match result {
        Ok(step) => json_response(req.seq, StepView::from(step)),
        Err(e) => flow_error(&e, req.seq),
    }
}

/// `POST /api/diagnostic/restart`: back to the root question.
pub fn post_diagnostic_restart<B: MarketBackend>(
    state: &mut DashboardState<B>,
    body: Option<&str>,
) -> Result<Reply> {
    let req: SeqRequest = match decode(body) {
        Ok(req) => req,
        Err(msg) => return error_response(400, &msg, None),
    };
    match state.diagnostic.restart() {
        Ok(prompt) => json_response(req.seq, StepView::from(prompt)),
        Err(e) => flow_error(&e, req.seq),
    }
}

// ---------------------------------------------------------------------------
// API Handlers: market
// ---------------------------------------------------------------------------

/// `POST /api/market/historical`: `{ "commodity": "...", "range": 30 }`.
pub fn post_market_historical<B: MarketBackend>(
    state: &mut DashboardState<B>,
    body: Option<&str>,
) -> Result<Reply> {
    let req: HistoricalRequest = match decode(body) {
        Ok(req) => req,
        Err(msg) => return error_response(400, &msg, None),
    };
    // `seq` is echoed, never compared: each page orders its own replies.
    let ticket = state.trend.begin();
    let result = state
        .trend
        .fetch_historical(&state.backend, ticket, &req.commodity, req.range);
    match result {
        Ok(applied) => chart_reply(state, applied, req.seq),
        Err(e) => flow_error(&e, req.seq),
    }
}

/// `POST /api/market/predict`: `{ "commodity": "...", "date": "YYYY-MM-DD" }`.
pub fn post_market_predict<B: MarketBackend>(
    state: &mut DashboardState<B>,
    body: Option<&str>,
) -> Result<Reply> {
    let req: PredictRequest = match decode(body) {
        Ok(req) => req,
        Err(msg) => return error_response(400, &msg, None),
    };
    // `seq` is echoed, never compared: each page orders its own replies.
    let ticket = state.trend.begin();
    let result = state
        .trend
        .fetch_prediction(&state.backend, ticket, &req.commodity, &req.date);
    match result {
        Ok(applied) => chart_reply(state, applied, req.seq),
        Err(e) => flow_error(&e, req.seq),
    }
}

// ---------------------------------------------------------------------------
// API Handlers: misc
// ---------------------------------------------------------------------------

/// `GET /api/format?amount=N`: format an amount as Rupiah.
pub fn get_format<B: MarketBackend>(state: &DashboardState<B>, url: &str) -> Result<Reply> {
    let Some(amount) = parse_amount(url) else {
        return error_response(400, "query parameter 'amount' must be a number", None);
    };
    json_response(
        None,
        FormatResponse {
            amount,
            text: state.trend.currency().format(amount),
        },
    )
}

/// `GET /api/health`: backend reachability and the defaults the page
/// starts from.
pub fn get_health<B: MarketBackend>(state: &DashboardState<B>) -> Result<Reply> {
    let config_exists = crate::config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);

    json_response(
        None,
        HealthResponse {
            backend_url: state.backend.base_url(),
            backend_reachable: state.backend.is_reachable(),
            default_commodity: &state.market.default_commodity,
            default_range: state.market.default_range,
            ranges: &state.market.ranges,
            config_exists,
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticError;
    use crate::trend::TrendError;

    #[test]
    fn query_param_extracts_value() {
        assert_eq!(query_param("/api/format?amount=1500", "amount"), Some("1500"));
        assert_eq!(query_param("/api/format?x=1&amount=7", "amount"), Some("7"));
        assert_eq!(query_param("/api/format", "amount"), None);
        assert_eq!(query_param("/api/format?x=1", "amount"), None);
    }

    #[test]
    fn parse_amount_requires_a_number() {
        assert_eq!(parse_amount("/api/format?amount=1234567"), Some(1_234_567.0));
        assert_eq!(parse_amount("/api/format?amount=-5.5"), Some(-5.5));
        assert_eq!(parse_amount("/api/format?amount=abc"), None);
        assert_eq!(parse_amount("/api/format?amount="), None);
    }

    #[test]
    fn error_status_mapping() {
        let backend = FlowError::Backend(BackendError::Backend {
            status: Some(500),
            message: "boom".to_string(),
        });
        let connection = FlowError::Backend(BackendError::Connection("refused".to_string()));
        assert_eq!(error_status(&backend), 502);
        assert_eq!(error_status(&connection), 504);
        assert_eq!(error_status(&FlowError::InvalidRange(14)), 400);
        assert_eq!(error_status(&FlowError::MissingCommodity), 400);
        assert_eq!(error_status(&DiagnosticError::NotStarted.into()), 400);
        assert_eq!(error_status(&TrendError::EmptyHistory.into()), 400);
    }

    #[test]
    fn decode_treats_blank_body_as_empty_object() {
        let req: SeqRequest = decode(None).unwrap();
        assert_eq!(req.seq, None);
        let req: SeqRequest = decode(Some("  ")).unwrap();
        assert_eq!(req.seq, None);
        let req: SeqRequest = decode(Some(r#"{"seq": 4}"#)).unwrap();
        assert_eq!(req.seq, Some(4));
    }

    #[test]
    fn choose_request_path_is_optional() {
        let req: ChooseRequest = decode(Some(r#"{"key":"ya"}"#)).unwrap();
        assert_eq!(req.path, None);
        let req: ChooseRequest = decode(Some(r#"{"key":"ya","path":["tidak"]}"#)).unwrap();
        assert_eq!(req.path, Some(vec!["tidak".to_string()]));
    }

    #[test]
    fn decode_reports_missing_fields() {
        let err = decode::<ChooseRequest>(Some("{}")).unwrap_err();
        assert!(err.starts_with("invalid request body"));
    }

    #[test]
    fn error_response_shape() {
        let reply = error_response(504, "connection error: refused", Some(3)).unwrap();
        assert_eq!(reply.status, 504);
        let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "connection error: refused");
        assert_eq!(json["seq"], 3);
    }

    #[test]
    fn step_view_humanizes_option_labels() {
        let step = Step::Continue(Prompt {
            question: "Warna bercak?".to_string(),
            options: vec!["bercak_coklat".to_string()],
        });
        let json = serde_json::to_value(StepView::from(step)).unwrap();
        assert_eq!(json["kind"], "question");
        assert_eq!(json["options"][0]["key"], "bercak_coklat");
        assert_eq!(json["options"][0]["label"], "Bercak Coklat");

        let leaf = Step::Terminal {
            diagnosis: "Antraknosa".to_string(),
        };
        let json = serde_json::to_value(StepView::from(leaf)).unwrap();
        assert_eq!(json["kind"], "diagnosis");
        assert_eq!(json["diagnosis"], "Antraknosa");
    }

    #[test]
    fn envelope_flattens_payload() {
        let reply = json_response(
            Some(9),
            FormatResponse {
                amount: 1500.0,
                text: "Rp 1.500".to_string(),
            },
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["seq"], 9);
        assert_eq!(json["text"], "Rp 1.500");
    }
}
