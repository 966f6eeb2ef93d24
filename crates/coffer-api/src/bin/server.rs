//! coffer server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `COFFER_*` environment variables, opens the SQLite database and serves the
//! `notes` collection over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use coffer_api::{AppState, admin_router, collection_router, config::ServerConfig, note::Note};
use coffer_core::engine::Engine;
use coffer_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const NOTES: &str = "notes";

#[derive(Parser)]
#[command(author, version, about = "Coffer document server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("COFFER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open SQLite store.
  let db_path = server_cfg.database_path();
  if let Some(dir) = db_path.parent() {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create data directory {dir:?}"))?;
  }
  let store = Arc::new(
    SqliteStore::open(&db_path)
      .await
      .with_context(|| format!("failed to open store at {db_path:?}"))?,
  );

  let state = AppState::new(store.clone(), server_cfg.engine_config())
    .allow_unscoped(server_cfg.allow_unscoped);

  Engine::<_, Note>::new(store, state.config.clone(), NOTES, Default::default())
    .ensure_index()
    .await
    .with_context(|| format!("failed to index collection {NOTES}"))?;

  if server_cfg.debug {
    tracing::warn!("debug mode: /admin/database is enabled");
  }
  if server_cfg.allow_unscoped {
    tracing::warn!("requests without x-user-login run unscoped");
  }

  let app = Router::new()
    .merge(collection_router::<_, Note>(state.clone(), NOTES))
    .merge(admin_router(state, vec![NOTES.to_owned()]))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
