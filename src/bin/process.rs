// src/bin/process.rs

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use DocDispatch::config::args::ProcessArgs;
use DocDispatch::config::load_app_config;
use DocDispatch::data_model::RawDocument;
use DocDispatch::executor::PipelineExecutor;
use DocDispatch::service_logic::{build_pipeline, execute_processing_pipeline, Services};
use DocDispatch::utils::common::init_cli_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ProcessArgs::parse();
    init_cli_tracing();

    let config = load_app_config(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    let services = Services::from_config(&config).context("loading reference tables")?;
    let executor = Arc::new(PipelineExecutor::new(build_pipeline(&services)));

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let file_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let outcome = execute_processing_pipeline(RawDocument::new(file_name, bytes), executor).await;
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };
    println!("{}", rendered);

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
