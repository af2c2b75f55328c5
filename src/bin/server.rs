// src/bin/server.rs

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use DocDispatch::config::args::ServerArgs;
use DocDispatch::config::load_app_config;
use DocDispatch::error::Result;
use DocDispatch::executor::PipelineExecutor;
use DocDispatch::server::run_server;
use DocDispatch::service_logic::{build_pipeline, Services};
use DocDispatch::utils::common::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();

    // Keep the guard alive for the whole process so file logs get flushed.
    let _log_guard = init_tracing(args.log_json, args.log_dir.as_deref());

    info!("Loading configuration from: {}", args.config.display());
    let mut config = match load_app_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration rejected");
            return Err(e);
        }
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
        config.server.validate()?;
    }

    let services = Services::from_config(&config)?;
    info!(
        customers = services.registry.len(),
        actions = services.catalog.len(),
        target_language = services.normalizer.target_language(),
        "Reference tables loaded"
    );

    if args.validate_config {
        info!("Configuration is valid.");
        return Ok(());
    }

    let executor = Arc::new(PipelineExecutor::new(build_pipeline(&services)));
    info!(steps = ?executor.step_names(), "Pipeline ready");

    run_server(executor, &config.server).await
}
