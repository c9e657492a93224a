use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    /// One JSON object per event; CloudWatch indexes the fields.
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` or `LOG_FORMAT=compact` overrides `default`.
    pub fn from_env_or(default: LogFormat) -> Self {
        match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") => LogFormat::Json,
            Some("compact") => LogFormat::Compact,
            _ => default,
        }
    }
}

fn default_filter(verbose: bool) -> EnvFilter {
    let directive = if verbose {
        "listing_etl=debug,info"
    } else {
        "listing_etl=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

pub fn init_logger(verbose: bool, format: LogFormat) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(default_filter(verbose));
    match format {
        LogFormat::Compact => registry.with(fmt_layer.compact()).init(),
        // Lambda stamps every line itself
        LogFormat::Json => registry.with(fmt_layer.without_time().json()).init(),
    }
}

pub fn init_cli_logger(verbose: bool) {
    init_logger(verbose, LogFormat::from_env_or(LogFormat::Compact));
}

pub fn init_lambda_logger() {
    init_logger(false, LogFormat::from_env_or(LogFormat::Json));
}
