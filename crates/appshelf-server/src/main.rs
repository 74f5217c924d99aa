//! AppShelf — single-binary local shell for the personal tools.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use appshelf_server::{build_router, validate, AppState};

fn resolve_data_dir() -> PathBuf {
    std::env::var("APPSHELF_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--validate" | "validate" => {
                let data_dir = if args.len() > 2 {
                    PathBuf::from(&args[2])
                } else {
                    resolve_data_dir()
                };
                let report = validate::validate(&data_dir);
                validate::print_report(&report);
                std::process::exit(if report.is_ok() { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("AppShelf — local timers, notes, PDF library, research and charts");
                println!();
                println!("Usage: appshelf [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  validate [data-dir]      Check the database and report inconsistencies");
                println!("  help                     Show this help message");
                println!();
                println!("Environment:");
                println!("  APPSHELF_DATA_DIR        Data directory (default: data)");
                println!("  APPSHELF_HOST            Bind address (default: 127.0.0.1)");
                println!("  APPSHELF_PORT            Port (default: 3040)");
                println!("  APPSHELF_QUOTA_MB        Document storage quota (default: 512)");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'appshelf help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = appshelf_core::AppShelfConfig::from_env(&data_dir)?;

    let store = appshelf_store::SqliteStore::open(&config.data_paths.db, config.quota_bytes)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    let purged = store
        .purge_search_cache(config.search_cache_ttl, appshelf_core::now_millis())
        .unwrap_or(0);
    if purged > 0 {
        info!("Purged {} stale cached searches", purged);
    }

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, Arc::new(store))?);
    let shutdown = state.shutdown.clone();

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("AppShelf listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
