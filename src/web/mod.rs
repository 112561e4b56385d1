//! Embedded web dashboard for agrisensa.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard with the diagnosis wizard and the price chart
//! - JSON API endpoints that drive the two flows and proxy the backend
//!
//! Launched via `agrisensa web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{error, info};

use crate::adapter::{DiagnosticFlow, TrendFlow};
use crate::backend::{BackendClient, MarketBackend};
use crate::config::AgrisensaConfig;
use crate::config::schema::MarketConfig;
use crate::utils::currency::CurrencyFormat;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything the dashboard remembers between requests.
///
/// Owned by the serve loop and lent to one handler at a time.
pub struct DashboardState<B = BackendClient> {
    backend: B,
    market: MarketConfig,
    diagnostic: DiagnosticFlow,
    trend: TrendFlow,
}

impl<B: MarketBackend> DashboardState<B> {
    pub fn new(backend: B, config: &AgrisensaConfig) -> Self {
        Self {
            backend,
            market: config.market.clone(),
            diagnostic: DiagnosticFlow::new(),
            trend: TrendFlow::new(&config.market, CurrencyFormat::from_config(&config.display)),
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on `config.web.addr`.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). Gracefully handles errors per-request
/// without crashing the server.
pub fn serve(config: &AgrisensaConfig) -> Result<()> {
    let addr = config.web.addr.as_str();
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let backend = BackendClient::from_config(&config.backend);
    info!(backend = backend.base_url(), "dashboard backend");
    let mut state = DashboardState::new(backend, config);

    println!("agrisensa dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if config.web.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    for mut request in server.incoming_requests() {
        let started = Instant::now();
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = match dispatch(&mut state, &method, &url, body.as_deref()) {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, %url, "handler failed");
                Reply::json(500, serde_json::json!({ "success": false, "error": e.to_string() }).to_string())
            }
        };
        let status = reply.status;
        let _ = request.respond(reply.into_response());

        info!(
            %method,
            %url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch<B: MarketBackend>(
    state: &mut DashboardState<B>,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Reply> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(Reply::html(frontend::INDEX_HTML)),

        // API: Diagnosis
        (&Method::Post, "/api/diagnostic/start") => api::post_diagnostic_start(state, body),
        (&Method::Post, "/api/diagnostic/choose") => api::post_diagnostic_choose(state, body),
        (&Method::Post, "/api/diagnostic/restart") => api::post_diagnostic_restart(state, body),

        // API: Market
        (&Method::Post, "/api/market/historical") => api::post_market_historical(state, body),
        (&Method::Post, "/api/market/predict") => api::post_market_predict(state, body),

        // API: Misc
        (&Method::Get, "/api/format") => api::get_format(state, url),
        (&Method::Get, "/api/health") => api::get_health(state),

        // 404
        _ => api::error_response(404, "not found", None),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// A handler's answer before it is turned into a `tiny_http` response.
#[derive(Debug)]
pub(crate) struct Reply {
    status: u16,
    body: String,
    html: bool,
}

impl Reply {
    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            body,
            html: false,
        }
    }

    fn html(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            html: true,
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let header = if self.html {
            content_type_html()
        } else {
            content_type_json()
        };
        Response::from_data(self.body.into_bytes())
            .with_header(header)
            .with_status_code(StatusCode(self.status))
    }
}

/// JSON content type header.
fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::{Days, Local};
    use serde_json::Value;

    use super::*;
    use crate::backend::{BackendError, HistoricalPrices, Prediction};
    use crate::diagnostic::DiagnosticTree;

    /// Canned backend; `offline` makes every call a connection error.
    struct FakeBackend {
        offline: bool,
        tree_fetches: Cell<usize>,
    }

    impl FakeBackend {
        fn online() -> Self {
            Self {
                offline: false,
                tree_fetches: Cell::new(0),
            }
        }

        fn check(&self) -> Result<(), BackendError> {
            if self.offline {
                return Err(BackendError::Connection("connection refused".to_string()));
            }
            Ok(())
        }
    }

    impl MarketBackend for FakeBackend {
        fn base_url(&self) -> &str {
            "http://backend.test"
        }

        fn is_reachable(&self) -> bool {
            !self.offline
        }

        fn diagnostic_tree(&self) -> Result<DiagnosticTree, BackendError> {
            self.check()?;
            self.tree_fetches.set(self.tree_fetches.get() + 1);
            let json = r#"{"start": {"question": "Gejala utama?", "options": {
                "daun_layu": "Layu Fusarium",
                "bercak": {"question": "Warna?", "options": {"coklat": "Antraknosa"}}
            }}}"#;
            Ok(serde_json::from_str(json).unwrap())
        }

        fn historical(&self, commodity: &str, range: u32) -> Result<HistoricalPrices, BackendError> {
            self.check()?;
            if commodity == "emas" {
                return Err(BackendError::Backend {
                    status: Some(404),
                    message: "Komoditas tidak ditemukan".to_string(),
                });
            }
            let n = range.min(3) as usize;
            Ok(HistoricalPrices {
                labels: (1..=n).map(|i| format!("2025-01-0{i}")).collect(),
                prices: (1..=n).map(|i| 40_000.0 + 1000.0 * i as f64).collect(),
            })
        }

        fn predict(&self, _: &str, date: &str) -> Result<Prediction, BackendError> {
            self.check()?;
            Ok(Prediction {
                prediction_date: date.to_string(),
                predicted_price: 45_000.0,
                current_price: 43_000.0,
                trend: "Naik".to_string(),
                insight: "Permintaan meningkat.".to_string(),
                historical_data: self.historical("cabai", 7)?,
            })
        }
    }

    fn state(backend: FakeBackend) -> DashboardState<FakeBackend> {
        DashboardState::new(backend, &AgrisensaConfig::default())
    }

    fn call(state: &mut DashboardState<FakeBackend>, method: Method, url: &str, body: &str) -> (u16, Value) {
        let reply = dispatch(state, &method, url, Some(body)).unwrap();
        let json = serde_json::from_str(&reply.body).unwrap();
        (reply.status, json)
    }

    fn tomorrow() -> String {
        (Local::now().date_naive() + Days::new(1))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[test]
    fn index_serves_html() {
        let mut state = state(FakeBackend::online());
        let reply = dispatch(&mut state, &Method::Get, "/", None).unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.html);
        assert!(reply.body.contains("<!DOCTYPE html>"));
    }

    #[test]
    fn unknown_route_is_404() {
        let mut state = state(FakeBackend::online());
        let (status, json) = call(&mut state, Method::Get, "/api/nope", "");
        assert_eq!(status, 404);
        assert_eq!(json["success"], false);
    }

    #[test]
    fn diagnosis_walk_over_http() {
        let mut state = state(FakeBackend::online());

        let (status, json) = call(&mut state, Method::Post, "/api/diagnostic/start", "");
        assert_eq!(status, 200);
        assert_eq!(json["kind"], "question");
        assert_eq!(json["options"][0]["label"], "Daun Layu");

        let (_, json) = call(&mut state, Method::Post, "/api/diagnostic/choose", r#"{"key":"bercak","seq":2}"#);
        assert_eq!(json["question"], "Warna?");
        assert_eq!(json["seq"], 2);

        let (_, json) = call(&mut state, Method::Post, "/api/diagnostic/choose", r#"{"key":"coklat"}"#);
        assert_eq!(json["kind"], "diagnosis");
        assert_eq!(json["diagnosis"], "Antraknosa");

        let (status, json) = call(&mut state, Method::Post, "/api/diagnostic/choose", r#"{"key":"coklat"}"#);
        assert_eq!(status, 400);
        assert_eq!(json["success"], false);

        let (status, json) = call(&mut state, Method::Post, "/api/diagnostic/restart", "{}");
        assert_eq!(status, 200);
        assert_eq!(json["question"], "Gejala utama?");
        assert_eq!(state.backend.tree_fetches.get(), 1);
    }

    #[test]
    fn invalid_option_is_400() {
        let mut state = state(FakeBackend::online());
        call(&mut state, Method::Post, "/api/diagnostic/start", "");
        let (status, json) = call(&mut state, Method::Post, "/api/diagnostic/choose", r#"{"key":"akar"}"#);
        assert_eq!(status, 400);
        assert!(json["error"].as_str().unwrap().contains("akar"));
    }

    #[test]
    fn offline_backend_is_504() {
        let mut state = state(FakeBackend {
            offline: true,
            tree_fetches: Cell::new(0),
        });
        let (status, _) = call(&mut state, Method::Post, "/api/diagnostic/start", "");
        assert_eq!(status, 504);
        let body = r#"{"commodity":"cabai","range":30}"#;
        let (status, json) = call(&mut state, Method::Post, "/api/market/historical", body);
        assert_eq!(status, 504);
        assert_eq!(json["success"], false);
    }

    #[test]
    fn backend_rejection_is_502() {
        let mut state = state(FakeBackend::online());
        let body = r#"{"commodity":"emas","range":30}"#;
        let (status, json) = call(&mut state, Method::Post, "/api/market/historical", body);
        assert_eq!(status, 502);
        assert_eq!(json["error"], "Komoditas tidak ditemukan");
    }

    #[test]
    fn historical_returns_chart() {
        let mut state = state(FakeBackend::online());
        let body = r#"{"commodity":"cabai","range":7,"seq":1}"#;
        let (status, json) = call(&mut state, Method::Post, "/api/market/historical", body);
        assert_eq!(status, 200);
        assert_eq!(json["applied"], "rendered");
        assert_eq!(json["chart"]["labels"].as_array().unwrap().len(), 3);
        assert_eq!(json["chart"]["datasets"][0]["label"], "Harga Historis");
    }

    #[test]
    fn invalid_range_is_400() {
        let mut state = state(FakeBackend::online());
        let body = r#"{"commodity":"cabai","range":14}"#;
        let (status, json) = call(&mut state, Method::Post, "/api/market/historical", body);
        assert_eq!(status, 400);
        assert!(json["error"].as_str().unwrap().contains("14"));
    }

    #[test]
    fn trend_requests_from_two_pages_interleave() {
        let mut state = state(FakeBackend::online());
        // Another page is further along in its own numbering.
        let later = r#"{"commodity":"cabai","range":30,"seq":1700000005001}"#;
        let (_, json) = call(&mut state, Method::Post, "/api/market/historical", later);
        assert_eq!(json["applied"], "rendered");

        for seq in [1700000000001_u64, 1700000000002] {
            let body = format!(r#"{{"commodity":"cabai","range":7,"seq":{seq}}}"#);
            let (status, json) = call(&mut state, Method::Post, "/api/market/historical", &body);
            assert_eq!(status, 200);
            assert_eq!(json["seq"], seq);
            assert_eq!(json["applied"], "rendered");
            assert!(json["chart"]["labels"].is_array());
        }
    }

    #[test]
    fn diagnosis_walks_from_two_pages_interleave() {
        let mut state = state(FakeBackend::online());

        // Page A starts and picks "bercak".
        call(&mut state, Method::Post, "/api/diagnostic/start", "");
        let (_, json) = call(
            &mut state,
            Method::Post,
            "/api/diagnostic/choose",
            r#"{"key":"bercak","path":[]}"#,
        );
        assert_eq!(json["question"], "Warna?");

        // Page B starts over on the shared server.
        let (_, json) = call(&mut state, Method::Post, "/api/diagnostic/start", "");
        assert_eq!(json["question"], "Gejala utama?");

        // Page A carries on from its own path.
        let (status, json) = call(
            &mut state,
            Method::Post,
            "/api/diagnostic/choose",
            r#"{"key":"coklat","path":["bercak"]}"#,
        );
        assert_eq!(status, 200);
        assert_eq!(json["diagnosis"], "Antraknosa");

        // Page B is still at the root.
        let (status, json) = call(
            &mut state,
            Method::Post,
            "/api/diagnostic/choose",
            r#"{"key":"daun_layu","path":[]}"#,
        );
        assert_eq!(status, 200);
        assert_eq!(json["diagnosis"], "Layu Fusarium");
        assert_eq!(state.backend.tree_fetches.get(), 1);
    }

    #[test]
    fn choose_with_unknown_path_is_400() {
        let mut state = state(FakeBackend::online());
        let (status, json) = call(
            &mut state,
            Method::Post,
            "/api/diagnostic/choose",
            r#"{"key":"coklat","path":["akar"]}"#,
        );
        assert_eq!(status, 400);
        assert!(json["error"].as_str().unwrap().contains("akar"));
    }

    #[test]
    fn prediction_returns_chart_and_summary() {
        let mut state = state(FakeBackend::online());
        let body = format!(r#"{{"commodity":"cabai","date":"{}"}}"#, tomorrow());
        let (status, json) = call(&mut state, Method::Post, "/api/market/predict", &body);
        assert_eq!(status, 200);
        assert_eq!(json["chart"]["labels"].as_array().unwrap().len(), 4);
        assert_eq!(json["prediction"]["predicted_price_text"], "Rp 45.000");
        assert_eq!(json["prediction"]["badge"], "↗ Naik");
    }

    #[test]
    fn past_prediction_date_is_400() {
        let mut state = state(FakeBackend::online());
        let body = r#"{"commodity":"cabai","date":"2000-01-01"}"#;
        let (status, _) = call(&mut state, Method::Post, "/api/market/predict", body);
        assert_eq!(status, 400);
    }

    #[test]
    fn malformed_body_is_400() {
        let mut state = state(FakeBackend::online());
        let (status, json) = call(&mut state, Method::Post, "/api/market/predict", "{not json");
        assert_eq!(status, 400);
        assert!(json["error"].as_str().unwrap().starts_with("invalid request body"));
    }

    #[test]
    fn format_endpoint() {
        let mut state = state(FakeBackend::online());
        let (status, json) = call(&mut state, Method::Get, "/api/format?amount=1234567", "");
        assert_eq!(status, 200);
        assert_eq!(json["text"], "Rp 1.234.567");

        let (status, _) = call(&mut state, Method::Get, "/api/format?amount=x", "");
        assert_eq!(status, 400);
    }

    #[test]
    fn health_endpoint() {
        let mut state = state(FakeBackend::online());
        let (status, json) = call(&mut state, Method::Get, "/api/health", "");
        assert_eq!(status, 200);
        assert_eq!(json["backend_url"], "http://backend.test");
        assert_eq!(json["backend_reachable"], true);
        assert_eq!(json["default_range"], 30);
        assert_eq!(json["default_commodity"], "cabai_merah_keriting");
    }
}
