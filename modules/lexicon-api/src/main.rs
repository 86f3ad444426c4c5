use std::sync::Arc;

use anyhow::{Context, Result};
use lexicon_charts::{CasePopulation, ChartAggregator, PgPopulation};
use lexicon_common::Config;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod db;
mod rest;

use db::{CaseLookup, PgCaseLookup};

pub struct AppState {
    pub charts: ChartAggregator<Arc<dyn CasePopulation>>,
    pub cases: Arc<dyn CaseLookup>,
    pub base_url: String,
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    let population: Arc<dyn CasePopulation> = Arc::new(PgPopulation::new(pool.clone()));
    let state = Arc::new(AppState {
        charts: ChartAggregator::new(population),
        cases: Arc::new(PgCaseLookup::new(pool)),
        base_url: config.base_url.clone(),
    });

    let app = rest::build_router(state, &config.allowed_origins);

    let addr = config.bind_addr();
    info!("Lexicon API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
