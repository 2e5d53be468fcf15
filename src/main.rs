use clap::Parser;
use receipt_processor::{
    CliArgs, LoggingConfig, ServerConfig, init_logging, run_server, shutdown_telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_logging(LoggingConfig::from_env())?;

    let cli = CliArgs::parse();
    let config = ServerConfig::from_args(cli)?;
    config.validate()?;

    let result = run_server(config).await;
    if let Err(error) = &result {
        tracing::error!(error = %format!("{error:#}"), "server exited with error");
    }

    // Exporter batches are lost unless flushed here
    shutdown_telemetry();

    result
}
