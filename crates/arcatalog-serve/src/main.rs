//! arcatalog - static asset and catalog server
//!
//! Serves the WASM viewer, model and image assets, and the catalog document.

mod config;
mod server;

use anyhow::Result;
use arcatalog_core::{category_labels, Catalog};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "arcatalog")]
#[command(about = "Serve an AR catalog viewer and its assets")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "arcatalog.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Validate the catalog and exit
    #[arg(long)]
    check: bool,

    /// Write a default configuration file to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("arcatalog v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    match Catalog::from_path(&config.catalog.path) {
        Ok(catalog) => {
            let entries: Vec<_> = catalog.iter().cloned().collect();
            let missing_models = entries.iter().filter(|e| e.validate_for_ar().is_err()).count();
            info!(
                entries = entries.len(),
                categories = ?category_labels(&entries),
                "Catalog loaded"
            );
            if missing_models > 0 {
                warn!(count = missing_models, "Entries without a model cannot be opened in AR");
            }
        }
        Err(e) if args.check => return Err(e.into()),
        Err(e) => warn!(error = %e, "Catalog not loadable yet, viewer will report it unavailable"),
    }

    if args.check {
        println!("Catalog OK: {}", config.catalog.path.display());
        return Ok(());
    }

    let state = Arc::new(server::AppState { config });
    server::run(state).await
}
