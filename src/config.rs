use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub shutdown_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            bind: cli_bind,
            shutdown_timeout_secs: cli_shutdown_timeout_secs,
            max_body_bytes: cli_max_body_bytes,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            bind: file_bind,
            shutdown_timeout_secs: file_shutdown_timeout_secs,
            max_body_bytes: file_max_body_bytes,
        } = file_config;

        let defaults = Self::default();

        Ok(Self {
            bind_address: cli_bind.or(file_bind).unwrap_or(defaults.bind_address),
            shutdown_timeout_secs: cli_shutdown_timeout_secs
                .or(file_shutdown_timeout_secs)
                .unwrap_or(defaults.shutdown_timeout_secs),
            max_body_bytes: cli_max_body_bytes
                .or(file_max_body_bytes)
                .unwrap_or(defaults.max_body_bytes),
        })
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.shutdown_timeout_secs > 0,
            "shutdown timeout must be at least one second"
        );
        anyhow::ensure!(
            self.max_body_bytes > 0,
            "maximum request body size must be greater than zero"
        );
        Ok(())
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "receipt-processor",
    about = "Scores retail receipts and serves the points by identifier",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "RECEIPT_PROCESSOR_BIND",
        value_name = "ADDR",
        help = "Address to listen on [default: 0.0.0.0:8080]"
    )]
    pub bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "RECEIPT_PROCESSOR_SHUTDOWN_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Seconds to wait for in-flight requests on shutdown",
        value_parser = clap::value_parser!(u64)
    )]
    pub shutdown_timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "RECEIPT_PROCESSOR_MAX_BODY_BYTES",
        value_name = "BYTES",
        help = "Largest accepted request body",
        value_parser = clap::value_parser!(usize)
    )]
    pub max_body_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    bind: Option<SocketAddr>,
    shutdown_timeout_secs: Option<u64>,
    max_body_bytes: Option<usize>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
