use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the tagfeed binary.
#[derive(Debug, Parser)]
#[command(
    name = "tagfeed",
    version,
    about = "Aggregating cache for a tag-indexed blog posts API"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TAGFEED_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Run a single posts query and print the JSON result.
    Query(QueryArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct UpstreamOverrides {
    /// Override the upstream posts endpoint URL.
    #[arg(long = "upstream-endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Override the query parameter that carries the tag.
    #[arg(long = "upstream-tag-param", value_name = "NAME")]
    pub tag_param: Option<String>,

    /// Override the per-request upstream timeout.
    #[arg(long = "upstream-request-timeout-seconds", value_name = "SECONDS")]
    pub request_timeout_seconds: Option<u64>,

    /// Override how many times a failed upstream request is retried.
    #[arg(long = "upstream-max-retries", value_name = "COUNT")]
    pub max_retries: Option<u32>,

    /// Override the delay before the first upstream retry.
    #[arg(long = "upstream-retry-backoff-ms", value_name = "MILLIS")]
    pub retry_backoff_ms: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub upstream: UpstreamOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

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

    /// Toggle per-tag single-flight cache population.
    #[arg(
        long = "cache-single-flight",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_single_flight: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub upstream: UpstreamOverrides,

    /// Comma-separated tags to query.
    #[arg(long, value_name = "TAGS")]
    pub tags: String,

    /// Sort key (id|reads|likes|popularity); empty means id.
    #[arg(long = "sort-by", value_name = "KEY", default_value = "")]
    pub sort_by: String,

    /// Sort direction (asc|desc); empty means asc.
    #[arg(long, value_name = "DIRECTION", default_value = "")]
    pub direction: String,

    /// Pretty-print the JSON output.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub pretty: bool,
}
