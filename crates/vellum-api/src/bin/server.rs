//! Vellum API server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP.
//!
//! # Session token minting
//!
//! Tokens are normally issued by the identity provider fronting this
//! service; for local work a token can be minted directly:
//!
//! ```
//! cargo run -p vellum-api --bin server -- \
//!   --mint-token --user u-alice --role admin \
//!   --tenant-id 6e2d... --tenant-slug acme
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vellum_api::{
  AppState, LocalBlobStore, ServerConfig, SessionClaims, SessionKey,
};
use vellum_core::{
  actor::{Actor, Role},
  rate_limit::RateLimiter,
};
use vellum_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vellum governance API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a signed session token and exit.
  #[arg(long)]
  mint_token: bool,

  /// User id for `--mint-token`.
  #[arg(long, default_value = "local-admin")]
  user: String,

  /// Role for `--mint-token`: admin, approver, editor, or viewer.
  #[arg(long, default_value = "admin")]
  role: String,

  /// Tenant id for `--mint-token`.
  #[arg(long)]
  tenant_id: Option<Uuid>,

  /// Tenant slug for `--mint-token`.
  #[arg(long)]
  tenant_slug: Option<String>,
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
    .add_source(config::Environment::with_prefix("VELLUM"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.session_secret.trim().is_empty() {
    anyhow::bail!("session_secret must be set and non-empty");
  }

  let sessions = SessionKey::new(&server_cfg.session_secret);

  // Helper mode: mint a token and exit.
  if cli.mint_token {
    let actor = Actor {
      user_id:     cli.user,
      role:        parse_role(&cli.role)?,
      tenant_id:   cli.tenant_id,
      tenant_slug: cli.tenant_slug,
      tenant_tier: None,
      email:       None,
    };
    let ttl = chrono::Duration::minutes(server_cfg.session_ttl_minutes);
    println!("{}", sessions.mint(&SessionClaims::for_actor(&actor, ttl)));
    return Ok(());
  }

  // Open the SQLite store and make sure the content directory exists.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let content_dir = expand_tilde(&server_cfg.content_dir);
  tokio::fs::create_dir_all(&content_dir)
    .await
    .with_context(|| format!("failed to create {content_dir:?}"))?;

  // Build application state.
  let state = AppState {
    store:    Arc::new(store),
    blob:     Arc::new(LocalBlobStore::new(content_dir)),
    sessions: Arc::new(sessions),
    limiter:  Arc::new(RateLimiter::new()),
    config:   Arc::new(server_cfg.clone()),
  };

  let app = vellum_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn parse_role(s: &str) -> anyhow::Result<Role> {
  match s {
    "admin" => Ok(Role::Admin),
    "approver" => Ok(Role::Approver),
    "editor" => Ok(Role::Editor),
    "viewer" => Ok(Role::Viewer),
    other => anyhow::bail!("unknown role {other:?}"),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
