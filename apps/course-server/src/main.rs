//! Course service REST API server.
//!
//! Integrates the core store, runtime loop, and REST API
//! with configuration parsing and graceful shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use course_db_api::{router::Router, server::Server};
use course_db_core::config::DbConfig;
use course_db_core::database::Database;
use course_db_core::error::DbError;
use course_db_core::persistence::PersistenceManager;
use course_db_runtime::{FlushCommand, Runtime};
use tokio::signal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// How long shutdown waits for the runtime to drain before flushing directly.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Command-line arguments for the course server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Tick rate for runtime loop (Hz)
    #[arg(long, default_value_t = 60)]
    tickrate: u32,

    /// Data directory for snapshots
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Keep all data in memory and never write snapshots
    #[arg(long)]
    in_memory: bool,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = 10000)]
    response_timeout_ms: u64,
}

impl Args {
    fn db_config(&self) -> DbConfig {
        DbConfig {
            tickrate: self.tickrate,
            data_dir: self.data_dir.clone(),
            persistence_enabled: !self.in_memory,
            request_timeout_ms: self.request_timeout_ms,
            response_timeout_ms: self.response_timeout_ms,
            ..Default::default()
        }
    }

    fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

/// Runs flush commands until the runtime drops its sender.
fn run_persistence(
    persistence: PersistenceManager,
    db: Arc<Database>,
    mut persistence_rx: mpsc::Receiver<FlushCommand>,
) {
    let mut successful_flushes = 0u64;
    let mut failed_flushes = 0u64;

    while let Some(cmd) = persistence_rx.blocking_recv() {
        match cmd {
            FlushCommand::FlushAll => {
                tracing::debug!("Received FlushAll command");
                match persistence.flush_all_tables(&db) {
                    Ok(()) => successful_flushes += 1,
                    Err(e) => {
                        tracing::error!("Failed to flush tables: {}", e);
                        failed_flushes += 1;
                    }
                }
            }
        }
    }

    tracing::info!(
        "Persistence stopped: successful_flushes={}, failed_flushes={}",
        successful_flushes,
        failed_flushes
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(args.db_config());
    let addr = args.addr()?;
    let persistence = PersistenceManager::new(&config);

    let db = match persistence.load_database() {
        Ok(db) => Arc::new(db),
        Err(DbError::DataCorruption(msg)) => {
            tracing::error!("Snapshot corruption detected: {}", msg);
            tracing::error!("Server cannot start. Restore the data directory from backup.");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load database"),
    };

    // Create channels for runtime communication
    let (api_tx, api_rx) = mpsc::channel(1000);
    let (persistence_tx, persistence_rx) = mpsc::channel(16);

    let persistence_thread = {
        let persistence = persistence.clone();
        let db = db.clone();
        thread::Builder::new()
            .name("persistence".to_string())
            .spawn(move || run_persistence(persistence, db, persistence_rx))
            .context("Failed to spawn persistence thread")?
    };

    let mut runtime = Runtime::new(db.clone(), (*config).clone(), api_rx, persistence_tx);
    let runtime_thread = thread::Builder::new()
        .name("runtime".to_string())
        .spawn(move || runtime.run())
        .context("Failed to spawn runtime thread")?;

    let server = Server::new(addr, Router::new(config.clone(), api_tx));

    tracing::info!(
        host = %args.host,
        port = args.port,
        tickrate = config.tickrate,
        data_dir = %config.data_dir.display(),
        persistence = config.persistence_enabled,
        "Starting course server"
    );

    let mut server_handle = tokio::spawn(server.serve());

    let server_finished = tokio::select! {
        result = signal::ctrl_c() => {
            result.context("Failed to listen for ctrl_c")?;
            tracing::info!("Shutting down server...");
            false
        }
        result = &mut server_handle => {
            match result {
                Ok(Ok(())) => tracing::info!("Server exited"),
                Ok(Err(e)) => tracing::error!("Server error: {}", e),
                Err(e) => tracing::error!("Server task failed: {}", e),
            }
            true
        }
    };
    if !server_finished {
        server_handle.abort();
        let _ = server_handle.await;
    }

    // Open keep-alive connections can hold request senders past the grace period.
    let drained = tokio::time::timeout(
        SHUTDOWN_GRACE,
        tokio::task::spawn_blocking(move || {
            let _ = runtime_thread.join();
            let _ = persistence_thread.join();
        }),
    )
    .await
    .is_ok();

    if !drained {
        tracing::warn!("Runtime still busy after {:?}, flushing directly", SHUTDOWN_GRACE);
    } else if db.is_dirty() {
        tracing::warn!("Last flush did not complete, flushing directly");
    }
    if !drained || db.take_dirty() {
        persistence
            .flush_all_tables(&db)
            .context("Final flush failed")?;
    }

    Ok(())
}
