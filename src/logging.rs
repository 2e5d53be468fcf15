//! Logging setup.
//!
//! Events go through a `tracing-subscriber` fmt layer (JSON in production,
//! pretty text elsewhere) behind a non-blocking `tracing-appender` writer.
//! When `OTEL_EXPORTER_OTLP_ENDPOINT` is set, spans are also exported over
//! OTLP.

use anyhow::{Context, Result};
use opentelemetry::{KeyValue, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    trace::{self as sdktrace, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource as semconv;
use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt,
};

const SERVICE_NAME: &str = "receipt-processor";
const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// Daily-rolling file under [`LoggingConfig::log_dir`]
    File,
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            "file" => Ok(Self::File),
            other => Err(format!("unknown log output {other:?}")),
        }
    }
}

/// Where spans are shipped when trace export is on.
#[derive(Debug, Clone, PartialEq)]
pub struct OtlpExport {
    pub endpoint: String,
    /// Fraction of root spans kept, clamped to `0.0..=1.0`
    pub sampling_ratio: f64,
    pub timeout: Duration,
}

impl OtlpExport {
    fn sampler(&self) -> Sampler {
        match self.sampling_ratio {
            r if r >= 1.0 => Sampler::AlwaysOn,
            r if r <= 0.0 => Sampler::AlwaysOff,
            r => Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(r))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    pub log_dir: PathBuf,
    pub environment: String,
    pub otlp: Option<OtlpExport>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());
        Self::for_environment(environment)
    }
}

impl LoggingConfig {
    fn for_environment(environment: String) -> Self {
        let format = if is_production(&environment) {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };
        Self {
            format,
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            environment,
            otlp: None,
        }
    }

    /// Reads `LOG_FORMAT`, `LOG_OUTPUT`, `LOG_DIR`,
    /// `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_SAMPLING_RATE` and
    /// `OTEL_EXPORTER_OTLP_TIMEOUT` over the environment defaults.
    /// Unparseable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(format) = env_parse::<LogFormat>("LOG_FORMAT") {
            config.format = format;
        }
        if let Some(output) = env_parse::<LogOutput>("LOG_OUTPUT") {
            config.output = output;
        }
        if let Ok(dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        let default_ratio = if config.is_production() { 0.1 } else { 1.0 };
        config.otlp = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .map(|endpoint| OtlpExport {
                endpoint,
                sampling_ratio: env_parse::<f64>("OTEL_SAMPLING_RATE")
                    .unwrap_or(default_ratio)
                    .clamp(0.0, 1.0),
                timeout: env_parse::<u64>("OTEL_EXPORTER_OTLP_TIMEOUT")
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_EXPORT_TIMEOUT),
            });

        config
    }

    pub fn is_production(&self) -> bool {
        is_production(&self.environment)
    }

    fn default_filter(&self) -> EnvFilter {
        let level = if self.is_production() { "info" } else { "debug" };
        EnvFilter::new(format!("{level},hyper=info,tower=info"))
    }

    fn writer(&self) -> Result<(NonBlocking, WorkerGuard)> {
        Ok(match self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File => {
                std::fs::create_dir_all(&self.log_dir).with_context(|| {
                    format!("failed to create log directory {}", self.log_dir.display())
                })?;
                tracing_appender::non_blocking(tracing_appender::rolling::daily(
                    &self.log_dir,
                    SERVICE_NAME,
                ))
            }
        })
    }

    fn fmt_layer(&self, writer: NonBlocking) -> BoxedLayer {
        let base = fmt::layer()
            .with_writer(writer)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE);

        match self.format {
            LogFormat::Json => base
                .json()
                .with_current_span(true)
                .with_thread_ids(true)
                .boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
        }
    }
}

fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}

/// Installs the global subscriber.
///
/// The returned guard flushes buffered lines on drop; hold it until exit.
pub fn init_logging(config: LoggingConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config.default_filter());
    let (writer, guard) = config.writer()?;

    let mut layers = vec![config.fmt_layer(writer)];
    if let Some(export) = &config.otlp {
        match otlp_tracer(export, &config.environment) {
            Ok(tracer) => layers.push(tracing_opentelemetry::layer().with_tracer(tracer).boxed()),
            Err(error) => {
                eprintln!("warning: OTLP trace export disabled: {error}");
            }
        }
    }

    tracing_subscriber::registry()
        .with(layers.with_filter(filter))
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::info!(
        service = SERVICE_NAME,
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        format = ?config.format,
        output = ?config.output,
        otlp_endpoint = config.otlp.as_ref().map(|export| export.endpoint.as_str()),
        "logging initialized"
    );

    Ok(guard)
}

fn otlp_tracer(export: &OtlpExport, environment: &str) -> Result<Tracer, TraceError> {
    let resource = Resource::new([
        KeyValue::new(semconv::SERVICE_NAME, SERVICE_NAME),
        KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new("environment", environment.to_string()),
    ]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(export.endpoint.clone())
                .with_timeout(export.timeout),
        )
        .with_trace_config(
            sdktrace::config()
                .with_sampler(export.sampler())
                .with_resource(resource),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}

/// Flushes pending spans and shuts the exporter down. A no-op without OTLP.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
