// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mallard — host shell for an embedded scripting runtime.
//
// Entry point. Initialises logging, resolves host config, then runs the
// startup sequence (native loader, module registry, engine) and waits for the
// engine to finish its entry script.

mod engine;
mod host;
mod services;

use mallard_bridge::platform_loader;
use mallard_core::{HostConfig, MallardError};
use mallard_core::error::Result;
use tracing::{error, info};

use engine::ReplayEngine;
use host::HostApplication;
use services::{config, data_dir};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Mallard starting");

    if let Err(e) = run() {
        error!(error = %e, "host terminated");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let dir = data_dir::data_dir();
    let dev_env = std::env::var(config::DEV_ENV).ok();
    let config = config::resolve_config(&dir, dev_env.as_deref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))
}

async fn serve(config: HostConfig) -> Result<()> {
    let Some(script_dir) = config.script_dir.clone() else {
        return Err(MallardError::Engine("no script directory configured".into()));
    };
    let loader = platform_loader(config.native_libraries.clone());
    let app = HostApplication::new(config, loader, tokio::runtime::Handle::current());

    let mut engine = ReplayEngine::new(script_dir);
    let running = app.start(&mut engine)?;
    let summary = engine.join().await?;

    info!(
        entry = %running.entry_module,
        modules = running.bridge.registry().len(),
        resolved = summary.resolved(),
        rejected = summary.rejected(),
        "entry script finished"
    );
    Ok(())
}
