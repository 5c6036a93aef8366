use anyhow::Context;
use axum::Router;
use clap::Parser;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod schema;
mod server;
mod web;

use crate::config::{Config, WebConfig};

/// Shared application state — cheap to clone (the pool is reference counted).
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

#[derive(Debug, Parser)]
#[command(version, about = "Product inventory HTTP service")]
struct Cli {
    /// `migrate` or `seed` runs that command and exits; anything else starts the server.
    command: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Migrate,
    Seed,
    Serve,
}

impl Command {
    fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("migrate") => Self::Migrate,
            Some("seed") => Self::Seed,
            _ => Self::Serve,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,product_service=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    info!("Started");
    let outcome = run(Command::from_arg(cli.command.as_deref()), &config).await;
    match &outcome {
        Ok(()) => info!("Completed"),
        Err(err) => error!(error = %format!("{err:#}"), "Stopped with error"),
    }
    outcome
}

async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    info!(host = %config.db.host, database = %config.db.name, "Connecting to PostgreSQL...");
    let pool = db::open(&config.db)
        .await
        .context("connecting to database")?;
    info!("Database connection pool established.");

    let result = match command {
        Command::Migrate => schema::migrate(&pool)
            .await
            .map(|()| info!("Migrations complete"))
            .context("applying migrations"),
        Command::Seed => schema::seed(&pool)
            .await
            .map(|products| info!(count = products.len(), "Seed data complete"))
            .context("seeding database"),
        Command::Serve => serve(pool.clone(), &config.web).await,
    };

    pool.close().await;
    result
}

async fn serve(db: PgPool, web: &WebConfig) -> anyhow::Result<()> {
    let app = build_router(AppState { db }, web);

    let listener = TcpListener::bind(&web.address)
        .await
        .with_context(|| format!("binding {}", web.address))?;
    info!("API listening on http://{}", web.address);

    server::run(listener, app, web.shutdown_timeout, server::shutdown_signal())
        .await
        .context("serving")
}

/// Every request, whatever its method or path, lists products.
fn build_router(state: AppState, web: &WebConfig) -> Router {
    Router::new()
        .fallback(handlers::products::list_products)
        .layer(TimeoutLayer::new(web.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
