use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use moviegateway::broadcast::Broadcaster;
use moviegateway::config::Config;
use moviegateway::service::info::InfoState;
use moviegateway::service::movies::MoviesState;
use moviegateway::service::review::ReviewState;
use moviegateway::service::{self, Service};
use moviegateway::store::MemoryRepository;
use moviegateway::telemetry;
use tokio::net::TcpListener;
use tracing::info;

/// Movie aggregation gateway and its record services
#[derive(Parser)]
#[command(name = "moviegateway", version, long_about = None)]
struct Cli {
	/// YAML configuration file. Defaults apply when omitted.
	#[arg(short, long)]
	file: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Serve movie metadata records and their event stream
	Info,
	/// Serve reviews and their event stream
	Reviews,
	/// Serve composite movies aggregated from the two record services
	Movies,
}

impl Commands {
	fn service(&self) -> Service {
		match self {
			Commands::Info => Service::Info,
			Commands::Reviews => Service::Reviews,
			Commands::Movies => Service::Movies,
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let config = match &cli.file {
		Some(path) => Config::from_file(path)
			.await
			.with_context(|| format!("loading {}", path.display()))?,
		None => Config::default(),
	};
	telemetry::init(&config.logging);

	let kind = cli.command.service();
	let app = build_router(kind, &config)?;
	let bind = config.bind.unwrap_or_else(|| kind.default_bind());
	let listener = TcpListener::bind(bind)
		.await
		.with_context(|| format!("binding {bind}"))?;
	info!(service = ?kind, address = %listener.local_addr()?, "listening");

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;
	info!("shut down");
	Ok(())
}

fn build_router(kind: Service, config: &Config) -> Result<Router> {
	Ok(match kind {
		Service::Info => service::info::router(InfoState {
			repository: Arc::new(MemoryRepository::new()),
			broadcaster: Broadcaster::new(config.stream_buffer),
		}),
		Service::Reviews => service::review::router(ReviewState {
			repository: Arc::new(MemoryRepository::new()),
			broadcaster: Broadcaster::new(config.stream_buffer),
		}),
		Service::Movies => {
			let clients = config.clients()?;
			service::movies::router(MoviesState {
				aggregator: clients.aggregator(),
				movie_info: clients.movie_info,
			})
		},
	})
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}
	info!("shutdown signal received");
}
