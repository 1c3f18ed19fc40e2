//! HTTP server for the study assistant
//!
//! Routes:
//! - `GET /`          front page
//! - `POST /api/ask`  answer a question and log the exchange
//! - `GET /health`    liveness probe
//!
//! Design: blocking HTTP microserver, one thread per connection, one request
//! per connection. No async runtime.

mod handlers;
pub mod microserver;

use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::assistant::Assistant;
use crate::config::Config;
use crate::paths;

pub use handlers::route_request;

/// Immutable state shared by every connection
pub struct AppState {
    pub assistant: Assistant,
    pub index_page: PathBuf,
    pub live: bool,
    /// Silent clients are dropped after this long
    pub read_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let assistant = Assistant::from_config(config);
        Self {
            live: assistant.is_live(),
            index_page: paths::index_page(&config.base_dir),
            read_timeout: config.read_timeout,
            assistant,
        }
    }
}

/// Read one request, answer it, close.
pub fn handle_connection(stream: &mut (impl Read + Write), state: &AppState) {
    let response = match microserver::read_request(stream) {
        Some(Ok(request)) => {
            let response = route_request(&request, state);
            info!(
                method = %request.method,
                path = %request.route(),
                status = response.status,
                "request"
            );
            response
        }
        Some(Err(err)) => {
            debug!(%err, "rejected malformed request");
            handlers::with_security_headers(microserver::HttpResponse::json_error(
                err.status(),
                &err.to_string(),
            ))
        }
        None => return,
    };

    microserver::write_response(stream, &response);
}

/// Accept connections until the listener fails.
pub fn serve(listener: TcpListener, state: Arc<AppState>) {
    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    if let Err(err) = stream.set_read_timeout(Some(state.read_timeout)) {
                        warn!(%err, "failed to set read timeout");
                        return;
                    }
                    handle_connection(&mut stream, &state);
                    let _ = stream.shutdown(Shutdown::Write);
                });
            }
            Err(err) => warn!(%err, "accept error"),
        }
    }
}

/// Bind the configured address and serve forever
pub fn run(config: &Config) -> Result<()> {
    let addr = config.bind_addr();
    let listener =
        TcpListener::bind(&addr).with_context(|| format!("Failed to bind {}", addr))?;

    let state = Arc::new(AppState::new(config));
    info!(
        %addr,
        base_dir = %config.base_dir.display(),
        log = %config.log_path.display(),
        live = state.live,
        "study assistant listening"
    );

    serve(listener, state);
    Ok(())
}
