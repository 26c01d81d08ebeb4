//! # moodmap: News Mood Map
//!
//! The thin entry point for the `moodmap` command-line interface. All logic
//! lives in the `moodmap_cli` library crate.

use anyhow::Result;
use clap::Parser;
use moodmap_cli::{run, Cli};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, then set up logging
    dotenvy::dotenv().ok();
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("moodmap=info".parse()?)
                .add_directive("moodmap_cli=info".parse()?),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Run and report the final result
    if let Err(e) = run(cli).await {
        eprintln!("[moodmap error] {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
