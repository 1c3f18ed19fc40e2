//! Transport-free request handlers.
//!
//! Handlers take an [`HttpRequest`] and return an [`HttpResponse`]; nothing
//! here touches a socket.

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::microserver::{HttpRequest, HttpResponse};
use super::AppState;
use crate::assistant::{normalize_question, EMPTY_QUESTION};

/// Page served at `/` when the base directory has no template
const FALLBACK_INDEX: &str = include_str!("../../templates/index.html");

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
    version: &'a str,
    provider: &'a str,
}

/// Route a request to its handler
pub fn route_request(request: &HttpRequest, state: &AppState) -> HttpResponse {
    let response = match (request.method.as_str(), request.route()) {
        ("GET", "/") => handle_index(state),
        ("GET", "/health") => handle_health(state),
        ("POST", "/api/ask") => handle_ask(request, state),
        (_, "/") | (_, "/health") | (_, "/api/ask") => {
            HttpResponse::json_error(405, "Method not allowed")
        }
        _ => HttpResponse::json_error(404, "Not found"),
    };
    with_security_headers(response)
}

/// Headers added to every response
pub fn with_security_headers(response: HttpResponse) -> HttpResponse {
    response
        .with_header("X-Content-Type-Options", "nosniff")
        .with_header("X-Frame-Options", "DENY")
}

/// Handle GET /
fn handle_index(state: &AppState) -> HttpResponse {
    match std::fs::read(&state.index_page) {
        Ok(page) => HttpResponse::html(page),
        Err(_) => HttpResponse::html(FALLBACK_INDEX),
    }
}

/// Handle GET /health
fn handle_health(state: &AppState) -> HttpResponse {
    HttpResponse::json(
        200,
        &HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            provider: if state.live { "openai" } else { "mock" },
        },
    )
}

/// Handle POST /api/ask
fn handle_ask(request: &HttpRequest, state: &AppState) -> HttpResponse {
    let Some(question) = question_from_body(&request.body) else {
        return HttpResponse::json_error(400, EMPTY_QUESTION);
    };

    match state.assistant.ask(&question) {
        Ok(record) => HttpResponse::json(200, &record),
        Err(err) => {
            error!("failed to answer question: {:#}", err);
            HttpResponse::json_error(500, "Internal server error")
        }
    }
}

/// The non-blank `question` string of a JSON body, if any.
fn question_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let question = value.get("question")?.as_str()?;
    normalize_question(question).map(str::to_owned)
}
