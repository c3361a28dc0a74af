//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::NonZeroUsize,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "localizer";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_CACHE_CAPACITY: u64 = 50;
const DEFAULT_CACHE_TTL_SECS: u64 = 10 * 60;
const DEFAULT_SECONDARY_TTL_SECS: u64 = 30 * 60;
const DEFAULT_COMPUTE_CONCURRENCY: u64 = 2;
const DEFAULT_SECONDARY_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_SECONDARY_NAMESPACE: &str = "component:";
const DEFAULT_SECONDARY_CONNECT_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_SECONDARY_RESPONSE_TIMEOUT_MS: u64 = 500;

/// Command-line arguments for the Localizer binary.
#[derive(Debug, Parser)]
#[command(name = "localizer", version, about = "Localized component server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "LOCALIZER_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the Localizer HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the primary cache capacity.
    #[arg(long = "cache-capacity", value_name = "COUNT")]
    pub cache_capacity: Option<u64>,

    /// Override the primary cache TTL.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the TTL attached to secondary writes.
    #[arg(long = "cache-secondary-ttl-seconds", value_name = "SECONDS")]
    pub cache_secondary_ttl_seconds: Option<u64>,

    /// Refresh the secondary TTL whenever a secondary hit is served.
    #[arg(
        long = "cache-refresh-secondary-on-hit",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_refresh_secondary_on_hit: Option<bool>,

    /// Override the number of concurrent component computations.
    #[arg(long = "compute-concurrency", value_name = "COUNT")]
    pub compute_concurrency: Option<u64>,

    /// Enable or disable the Redis secondary tier.
    #[arg(
        long = "secondary-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub secondary_enabled: Option<bool>,

    /// Override the Redis connection URL.
    #[arg(long = "secondary-url", value_name = "URL")]
    pub secondary_url: Option<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub secondary: SecondarySettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub capacity: NonZeroUsize,
    pub ttl: Duration,
    pub secondary_ttl: Duration,
    pub refresh_secondary_on_hit: bool,
    pub write_secondary_on_compute: bool,
    pub compute_concurrency: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct SecondarySettings {
    pub enabled: bool,
    pub url: String,
    pub namespace: String,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("LOCALIZER").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    secondary: RawSecondarySettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(capacity) = overrides.cache_capacity {
            self.cache.capacity = Some(capacity);
        }
        if let Some(seconds) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.cache_secondary_ttl_seconds {
            self.cache.secondary_ttl_seconds = Some(seconds);
        }
        if let Some(refresh) = overrides.cache_refresh_secondary_on_hit {
            self.cache.refresh_secondary_on_hit = Some(refresh);
        }
        if let Some(value) = overrides.compute_concurrency {
            self.cache.compute_concurrency = Some(value);
        }
        if let Some(enabled) = overrides.secondary_enabled {
            self.secondary.enabled = Some(enabled);
        }
        if let Some(url) = overrides.secondary_url.as_ref() {
            self.secondary.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cache,
            secondary,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;
        let secondary = build_secondary_settings(secondary)?;

        Ok(Self {
            server,
            logging,
            cache,
            secondary,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = non_zero_usize(
        cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
        "cache.capacity",
    )?;
    let ttl = non_zero_secs(
        cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
        "cache.ttl_seconds",
    )?;
    let secondary_ttl = non_zero_secs(
        cache
            .secondary_ttl_seconds
            .unwrap_or(DEFAULT_SECONDARY_TTL_SECS),
        "cache.secondary_ttl_seconds",
    )?;
    let compute_concurrency = non_zero_usize(
        cache
            .compute_concurrency
            .unwrap_or(DEFAULT_COMPUTE_CONCURRENCY),
        "cache.compute_concurrency",
    )?;

    Ok(CacheSettings {
        capacity,
        ttl,
        secondary_ttl,
        refresh_secondary_on_hit: cache.refresh_secondary_on_hit.unwrap_or(false),
        write_secondary_on_compute: cache.write_secondary_on_compute.unwrap_or(true),
        compute_concurrency,
    })
}

fn build_secondary_settings(
    secondary: RawSecondarySettings,
) -> Result<SecondarySettings, LoadError> {
    let url = secondary
        .url
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_SECONDARY_URL.to_string());
    if url.is_empty() {
        return Err(LoadError::invalid("secondary.url", "url must not be empty"));
    }

    let connect_timeout_ms = secondary
        .connect_timeout_ms
        .unwrap_or(DEFAULT_SECONDARY_CONNECT_TIMEOUT_MS);
    if connect_timeout_ms == 0 {
        return Err(LoadError::invalid(
            "secondary.connect_timeout_ms",
            "must be greater than zero",
        ));
    }

    let response_timeout_ms = secondary
        .response_timeout_ms
        .unwrap_or(DEFAULT_SECONDARY_RESPONSE_TIMEOUT_MS);
    if response_timeout_ms == 0 {
        return Err(LoadError::invalid(
            "secondary.response_timeout_ms",
            "must be greater than zero",
        ));
    }

    Ok(SecondarySettings {
        enabled: secondary.enabled.unwrap_or(true),
        url,
        namespace: secondary
            .namespace
            .unwrap_or_else(|| DEFAULT_SECONDARY_NAMESPACE.to_string()),
        connect_timeout: Duration::from_millis(connect_timeout_ms),
        response_timeout: Duration::from_millis(response_timeout_ms),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    capacity: Option<u64>,
    ttl_seconds: Option<u64>,
    secondary_ttl_seconds: Option<u64>,
    refresh_secondary_on_hit: Option<bool>,
    write_secondary_on_compute: Option<bool>,
    compute_concurrency: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSecondarySettings {
    enabled: Option<bool>,
    url: Option<String>,
    namespace: Option<String>,
    connect_timeout_ms: Option<u64>,
    response_timeout_ms: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_secs(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
