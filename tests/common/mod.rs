//! Shared helpers for integration tests

#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use study_assistant::server::{self, AppState};
use study_assistant::Config;

/// Start the server on an ephemeral port; the thread lives until the test process exits.
pub fn spawn_server(config: &Config) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(config));
    std::thread::spawn(move || server::serve(listener, state));
    addr
}

pub fn http() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .no_proxy()
        .build()
        .unwrap()
}
