//! tether server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite user store, and serves the reconciliation API over HTTP.
//!
//! ```toml
//! host       = "127.0.0.1"
//! port       = 3000
//! store_path = "~/.local/share/tether/users.db"
//!
//! [identity]
//! user_endpoint = "https://idp.example.com/v1/me"
//! api_key       = "sk_live_..."
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tether_core::Reconciler;
use tether_idp::HttpIdentityProvider;
use tether_store_sqlite::SqliteUserStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Tether user reconciliation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteUserStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let provider = HttpIdentityProvider::new(server_cfg.identity.clone())
    .context("failed to build identity provider client")?;
  tracing::info!(
    endpoint = %server_cfg.identity.user_endpoint,
    "using identity provider"
  );

  let reconciler = Reconciler::new(Arc::new(provider), Arc::new(store));
  let app = tether_api::api_router(reconciler);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
