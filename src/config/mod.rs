//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{CliArgs, Command, QueryArgs, ServeArgs, ServeOverrides, UpstreamOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tagfeed";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_UPSTREAM_ENDPOINT: &str = "https://example.com/blog/posts";
const DEFAULT_UPSTREAM_TAG_PARAM: &str = "tag";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_UPSTREAM_MAX_RETRIES: u32 = 0;
const DEFAULT_UPSTREAM_RETRY_BACKOFF_MS: u64 = 200;
const MAX_UPSTREAM_RETRIES: u32 = 10;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
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
pub struct UpstreamSettings {
    pub endpoint: Url,
    pub tag_param: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub single_flight: bool,
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

    builder = builder.add_source(Environment::with_prefix("TAGFEED").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Query(args)) => raw.apply_upstream_overrides(&args.upstream),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    upstream: RawUpstreamSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(single_flight) = overrides.cache_single_flight {
            self.cache.single_flight = Some(single_flight);
        }
        self.apply_upstream_overrides(&overrides.upstream);
    }

    fn apply_upstream_overrides(&mut self, overrides: &UpstreamOverrides) {
        if let Some(endpoint) = overrides.endpoint.as_ref() {
            self.upstream.endpoint = Some(endpoint.clone());
        }
        if let Some(param) = overrides.tag_param.as_ref() {
            self.upstream.tag_param = Some(param.clone());
        }
        if let Some(seconds) = overrides.request_timeout_seconds {
            self.upstream.request_timeout_seconds = Some(seconds);
        }
        if let Some(retries) = overrides.max_retries {
            self.upstream.max_retries = Some(retries);
        }
        if let Some(backoff) = overrides.retry_backoff_ms {
            self.upstream.retry_backoff_ms = Some(backoff);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            upstream,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            upstream: build_upstream_settings(upstream)?,
            cache: CacheSettings {
                single_flight: cache.single_flight.unwrap_or(true),
            },
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
    Ok(ServerSettings { addr })
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

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let endpoint_value = upstream
        .endpoint
        .unwrap_or_else(|| DEFAULT_UPSTREAM_ENDPOINT.to_string());
    let endpoint = Url::parse(endpoint_value.trim()).map_err(|err| {
        LoadError::invalid(
            "upstream.endpoint",
            format!("invalid url `{endpoint_value}`: {err}"),
        )
    })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "upstream.endpoint",
            "scheme must be http or https",
        ));
    }

    let tag_param = upstream
        .tag_param
        .unwrap_or_else(|| DEFAULT_UPSTREAM_TAG_PARAM.to_string());
    if tag_param.trim().is_empty() {
        return Err(LoadError::invalid(
            "upstream.tag_param",
            "must not be empty",
        ));
    }

    let timeout_secs = upstream
        .request_timeout_seconds
        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "upstream.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let max_retries = upstream
        .max_retries
        .unwrap_or(DEFAULT_UPSTREAM_MAX_RETRIES);
    if max_retries > MAX_UPSTREAM_RETRIES {
        return Err(LoadError::invalid(
            "upstream.max_retries",
            format!("must be at most {MAX_UPSTREAM_RETRIES}"),
        ));
    }

    let backoff_ms = upstream
        .retry_backoff_ms
        .unwrap_or(DEFAULT_UPSTREAM_RETRY_BACKOFF_MS);
    if backoff_ms == 0 {
        return Err(LoadError::invalid(
            "upstream.retry_backoff_ms",
            "must be greater than zero",
        ));
    }

    Ok(UpstreamSettings {
        endpoint,
        tag_param,
        request_timeout: Duration::from_secs(timeout_secs),
        max_retries,
        retry_backoff: Duration::from_millis(backoff_ms),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    endpoint: Option<String>,
    tag_param: Option<String>,
    request_timeout_seconds: Option<u64>,
    max_retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    single_flight: Option<bool>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}
