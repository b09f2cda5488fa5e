// oc-bridge Linux host: runs the OCF client stack and keeps a catalog of discovered resources.

mod config;
mod runner;
mod stack;

use std::str::FromStr;
use std::sync::Arc;

use oc_bridge_core::ResourceCatalog;
use tokio::sync::Notify;
use tracing::{info, Level};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("oc-bridge-linux {}", VERSION);
            return Ok(());
        }
    }

    let cfg = config::load()?;
    let level = Level::from_str(&cfg.log_level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
    info!(version = VERSION, interval = ?cfg.discovery_interval(), resource_type = ?cfg.resource_type, "starting");

    let catalog = Arc::new(ResourceCatalog::new());
    let wake = Arc::new(Notify::new());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut stack = stack::start(&cfg, catalog.clone(), wake.clone())?;
        runner::run(&mut *stack, wake, cfg.discovery_interval(), shutdown_signal()).await;
        anyhow::Ok(())
    })?;

    for r in catalog.snapshot() {
        info!(anchor = %r.anchor, uri = %r.uri, types = ?r.types, secure = r.is_secure(), "known resource");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown requested");
}
