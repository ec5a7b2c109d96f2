use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use course_nav::{
    api::app, config::Config, course::catalog::Catalog, database, utils::init_log,
};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about = "Course navigation HTTP server", long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "course_nav.toml")]
    config: PathBuf,
    /// Overrides the configured database url
    #[arg(short, long)]
    database: Option<String>,
    #[arg(short = 'H', long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::load(&args.config)?;
    if let Some(database) = args.database {
        config.database = database;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    let _guard = init_log(config.log_dir.clone())?;

    let database = database::connect(&config.database).await?;
    let store = SqliteStore::new(database.clone());
    store.migrate().await?;
    let catalog = Arc::new(Catalog::new(database, config.outline_cache_capacity));
    let app = app(catalog, store, config.session_days);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("listening on http://{}", listener.local_addr()?);
    info!(
        "Swagger UI available at http://{}/swagger-ui/",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
