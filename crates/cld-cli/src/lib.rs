use cld_api_client::Payload;

/// Parse a `key=value` argument.
pub fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", arg)),
    }
}

/// Remote sources are fetched by the service; anything else is a local path.
pub fn payload_for(source: &str) -> Payload {
    const REMOTE: [&str; 5] = ["http://", "https://", "ftp://", "s3://", "data:"];
    if REMOTE.iter().any(|prefix| source.starts_with(prefix)) {
        Payload::url(source)
    } else {
        Payload::file(source)
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
