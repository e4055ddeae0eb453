use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use req_json::{JsonRequest, RequestConfig, DEFAULT_METHOD};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Fire one JSON request and print the outcome as JSON.
#[derive(Parser, Debug)]
#[command(name = "req-json", version)]
struct Cli {
    /// Absolute http(s) URL
    url: String,

    #[arg(short = 'X', long, default_value = DEFAULT_METHOD)]
    method: String,

    /// Extra header as "Name: value"; repeatable
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// JSON request body
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Milliseconds before the request is abandoned; 0 disables the timer
    #[arg(long, env = "REQ_JSON_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("expected \"Name: value\", got {raw:?}");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header name is empty in {raw:?}");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

impl Cli {
    fn into_config(self) -> Result<RequestConfig> {
        let mut config = RequestConfig::new(self.url)
            .method(self.method)
            .timeout_ms(self.timeout_ms);
        for (name, value) in self.headers {
            config = config.header(name, value);
        }
        if let Some(data) = self.data {
            let body = serde_json::from_str(&data).context("--data is not valid JSON")?;
            config = config.body(body);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let request = JsonRequest::new(cli.into_config()?).context("invalid request")?;
    match request.send().await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            tracing::debug!(error = ?failure, "request failed");
            eprintln!("{}", serde_json::to_string_pretty(&failure.report())?);
            Ok(ExitCode::FAILURE)
        }
    }
}
