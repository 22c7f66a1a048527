#![cfg(not(tarpaulin_include))]

use boxplot_web::app;
use boxplot_web::config::Config;
use clap::Parser;

/// Main entry point for the box-plot web service
///
/// Reads the configuration from the command line and environment, sets up
/// logging (`RUST_LOG`, default `info`) and runs the server until it stops.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!(
        "uploads in {}, outputs in {}",
        config.upload_dir.display(),
        config.output_dir.display()
    );

    app::run(config).await
}
