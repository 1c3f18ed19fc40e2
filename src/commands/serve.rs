//! Serve command - run the HTTP server

use anyhow::Result;

use study_assistant::{server, Config};

pub fn execute(config: &Config) -> Result<()> {
    server::run(config)
}
