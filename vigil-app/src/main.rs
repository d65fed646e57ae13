//! Smoke-check binary: provision a session per config, open one page,
//! report what came back.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use vigil_common::observability::{init_logging, LogConfig};
use vigil_config::{SessionConfig, SessionConfigLoader};
use vigil_drivers::session::factory;

#[derive(Parser, Debug)]
#[command(name = "vigil", about = "Provision a guarded browser session and smoke-check one page")]
struct Args {
    /// Session configuration file; missing file falls back to defaults + env.
    #[arg(long, default_value = "vigil.yaml")]
    config: PathBuf,

    /// URL to open once the session is up.
    #[arg(long, default_value = "https://example.com")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first (env wins), logging second.
    let cfg: SessionConfig = SessionConfigLoader::new()
        .with_optional_file(&args.config)
        .load()?;

    init_logging(LogConfig {
        emit_stderr: true,
        ..LogConfig::default()
    })?;

    tracing::info!(
        mode = %cfg.execution_mode,
        browser = %cfg.browser,
        guarded = cfg.enable_loading_guard,
        "acquiring browser session"
    );

    let driver = factory::acquire(&cfg).await?;
    let page = driver.goto(&args.url).await?;

    let title = page.title().await?;
    let url = page.current_url().await?;
    println!("{url} — {title}");

    driver.close().await
}
