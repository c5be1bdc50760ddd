//! Consignment Server Binary
//!
//! Main entry point for the consignment TCP server

use clap::Parser;
use consignment_service::{
    ConsignmentServer, ConsignmentService, MemoryRepository, Repository, Result, ServerConfig,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Consignment service server
#[derive(Parser, Debug)]
#[command(name = "consignment-server")]
#[command(about = "Accepts consignments over TCP and stores them in memory")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    listen: String,

    /// Maximum concurrent client connections
    #[arg(short, long, default_value = "1000")]
    max_connections: usize,

    /// Longest accepted request line in bytes
    #[arg(long, default_value = "1048576")]
    max_frame_len: usize,

    /// Reject consignments once this many are stored
    #[arg(short, long)]
    capacity: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: args.listen,
        max_connections: args.max_connections,
        max_frame_len: args.max_frame_len,
    };

    let repo = match args.capacity {
        Some(limit) => MemoryRepository::with_capacity_limit(limit),
        None => MemoryRepository::new(),
    };
    if let Some(limit) = repo.capacity_limit() {
        info!(limit, "repository capacity limited");
    }

    let server = Arc::new(ConsignmentServer::bind(config, ConsignmentService::new(repo)).await?);

    // Graceful shutdown on SIGINT (Ctrl+C)
    let server_clone = Arc::clone(&server);
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }

        info!("received ctrl-c, initiating graceful shutdown");
        if let Err(e) = server_clone.shutdown() {
            error!(error = %e, "failed to initiate shutdown");
        }
    });

    server.run().await?;

    let stored = server.service().repository().len().await?;
    info!(stored, "consignments held at shutdown");

    Ok(())
}
