mod auth;
mod config;
mod converters;
mod cors;
mod error;
mod llm_client;
mod logging;
mod models;
mod request_id;
mod router;

use anyhow::Context;
use clap::Parser;
use config::Config;
use cors::CorsPolicy;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, info, warn};

#[derive(Parser, Debug)]
#[command(name = "promptbox-gateway")]
#[command(about = "Authenticated proxy in front of the Gemini API")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    ip: String,

    #[arg(short, long, default_value = "8787")]
    port: u16,

    /// Path to a YAML config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Also write logs to this file (size-capped)
    #[arg(long)]
    log_file: Option<String>,

    /// socks and http proxy for upstream calls, example: socks5://192.168.0.2:10080
    #[arg(long)]
    proxy: Option<String>,
}

fn build_http_client(proxy: Option<&str>) -> anyhow::Result<reqwest::Client> {
    let client_builder = reqwest::Client::builder();
    let client_builder = match proxy {
        Some(proxy) => {
            let proxy = reqwest::Proxy::all(proxy).with_context(|| format!("invalid proxy URL {}", proxy))?;
            client_builder.proxy(proxy)
        }
        None => client_builder,
    };
    client_builder.build().context("failed to build HTTP client")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = Level::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using INFO level.", args.log_level);
        Level::INFO
    });
    logging::init_logging(log_level, args.log_file.as_deref());

    let config = Config::load(args.config.as_deref())?;
    match &args.config {
        Some(path) => info!("Configuration loaded from: {}", path),
        None => info!("No config file given, using defaults"),
    }
    info!("Allowed origins: {:?}", config.allowed_origins);

    let http_client = Arc::new(build_http_client(args.proxy.as_deref())?);

    let app_state = auth::AppState {
        identity: Arc::new(auth::IdentityClient::new(http_client.clone(), &config.identity)),
        llm_client: Arc::new(llm_client::LlmClient::new(http_client, &config.gemini)),
        cors: Arc::new(CorsPolicy::new(config.allowed_origins.clone())),
        default_model: config.gemini.default_model.clone(),
    };

    let app = router::build_router(app_state);

    let bind_address = format!("{}:{}", args.ip, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    info!("Server started on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
