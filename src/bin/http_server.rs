//! HTTP Server Binary for the Garbanzo API
//!
//! Starts the read-only REST API over the live Wikidata services.
//!
//! Usage:
//!   cargo run --bin http_server -- --host 0.0.0.0 --port 8080 --log-level debug

use clap::Parser;
use garbanzo::{
    config::{CacheConfig, GarbanzoConfig, DEFAULT_API_ENDPOINT, DEFAULT_SPARQL_ENDPOINT},
    http::start_server,
    logging, Garbanzo,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "Garbanzo HTTP Server")]
#[command(about = "Knowledge beacon over Wikidata: CURIE translation, exact matches and statements", long_about = None)]
struct Args {
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value = "8080")]
    port: u16,

    #[arg(long, default_value = DEFAULT_SPARQL_ENDPOINT)]
    sparql_endpoint: String,

    #[arg(long, default_value = DEFAULT_API_ENDPOINT)]
    api_endpoint: String,

    /// Outbound request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout_secs: u64,

    /// Ids per entity request (at most 50)
    #[arg(long, default_value = "50")]
    batch_size: usize,

    #[arg(long, default_value = "10000")]
    cache_size: usize,

    #[arg(long, default_value = "100")]
    statement_cache_size: usize,

    #[arg(long, default_value = "300")]
    cache_ttl_secs: u64,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config(&self) -> GarbanzoConfig {
        GarbanzoConfig {
            sparql_endpoint: self.sparql_endpoint.clone(),
            api_endpoint: self.api_endpoint.clone(),
            request_timeout_secs: self.timeout_secs,
            max_entities_per_request: self.batch_size,
            lookup_cache: CacheConfig::new(self.cache_size, self.cache_ttl_secs),
            statement_cache: CacheConfig::new(self.statement_cache_size, self.cache_ttl_secs),
            ..GarbanzoConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level)?;

    let config = args.config();
    info!(sparql = %config.sparql_endpoint, api = %config.api_endpoint, "initializing Garbanzo");
    info!(
        lookup_cache = config.lookup_cache.capacity,
        statement_cache = config.statement_cache.capacity,
        ttl_secs = config.lookup_cache.ttl_secs,
        "cache configuration"
    );
    let garbanzo = Arc::new(Garbanzo::from_config(&config)?);

    let addr = format!("{}:{}", args.host, args.port);

    // Set up graceful shutdown
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    // Run server with graceful shutdown
    tokio::select! {
        result = start_server(&addr, garbanzo) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal => {
            info!("Server shut down gracefully");
        }
    }

    Ok(())
}
