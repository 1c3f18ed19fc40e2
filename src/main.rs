use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use study_assistant::Config;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Study assistant backend: versioned prompts, one LLM call, logged answers", long_about = None)]
struct Cli {
    /// Directory holding prompt_v*.txt, templates/ and logs/ (default: $STUDY_ASSISTANT_HOME or cwd)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve(ServeArgs),

    /// Ask one question from the terminal and print the logged record
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Show which prompt is active
    Prompt,

    /// Show recent interactions
    History {
        /// Number of interactions to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Host to bind to (default: $HOST or 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (default: $PORT or 5000)
    #[arg(short, long)]
    port: Option<u16>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(base_dir) = cli.base_dir.as_deref() {
        config.set_base_dir(base_dir);
    }

    init_tracing();

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            if let Some(host) = args.host {
                config.host = host;
            }
            if let Some(port) = args.port {
                config.port = port;
            }
            commands::serve::execute(&config)?;
        }
        Commands::Ask { question } => {
            commands::ask::execute(&config, &question.join(" "))?;
        }
        Commands::Prompt => {
            commands::prompt::execute(&config)?;
        }
        Commands::History { limit, json } => {
            commands::history::execute(&config, limit, json)?;
        }
    }

    Ok(())
}
