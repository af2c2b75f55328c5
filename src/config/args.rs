use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the HTTP server binary.
#[derive(Parser, Debug)]
#[command(author, version, about = "Serve the document-to-action pipeline over HTTP", long_about = None)]
pub struct ServerArgs {
    /// Path to the application configuration YAML file.
    #[arg(short = 'c', long, default_value = "config/app_config.yaml")]
    pub config: PathBuf,

    /// Overrides `server.bind_address` from the configuration file.
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Validate the configuration and reference tables, then exit
    #[arg(long)]
    pub validate_config: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Write logs to a daily rolling file in this directory instead of stdout
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// Command-line arguments for the one-shot `process` binary.
#[derive(Parser, Debug)]
#[command(author, version, about = "Run a single document through the pipeline and print the outcome as JSON", long_about = None)]
pub struct ProcessArgs {
    /// Document to process (.pdf, .docx, .txt, .png, .jpg, .jpeg)
    pub file: PathBuf,

    /// Path to the application configuration YAML file.
    #[arg(short = 'c', long, default_value = "config/app_config.yaml")]
    pub config: PathBuf,

    /// Pretty-print the JSON outcome
    #[arg(long)]
    pub pretty: bool,
}
