//! SkyLens CLI - run the tracking pipeline from a terminal.
//!
//! This binary stands in for a rendering front end: it loads a
//! configuration, starts the background workers, and ticks the event
//! dispatcher in the foreground, printing tracking status as it
//! changes.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skylens", version, about = "Live aircraft tracking over tiled web maps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pipeline with a configuration document.
    Start {
        /// Path or URL of the configuration JSON.
        config: String,

        /// Seconds between foreground ticks.
        #[arg(long, default_value_t = 1)]
        interval: u64,

        /// Run the alignment solver once after this many ticks and
        /// report the solution (diagnostic).
        #[arg(long)]
        solve_after: Option<u64>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start {
            config,
            interval,
            solve_after,
        } => commands::start::run(commands::start::StartArgs {
            config,
            interval,
            solve_after,
        }),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
