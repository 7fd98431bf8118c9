//! DocArc license activation and validation service.
//!
//! Gates access to the archive application: derives the host device code,
//! validates licenses against the record store and lets an administrator
//! issue, renew and revoke device-bound licenses.
//!
//! Usage:
//!   docarc-server --port 8090 --db docarc-licenses.db
//!
//! The activation secret is read from `--secret-file` or the
//! `DOCARC_LICENSE_SECRET` environment variable; the admin token from
//! `--admin-token` or `DOCARC_ADMIN_TOKEN`.

use std::{env, fs, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use docarc_license::ActivationSecret;
use docarc_server::{build_router, AppState};
use docarc_store::{LicenseService, LicenseStore};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "docarc-server")]
#[command(about = "DocArc device-bound license service")]
struct Args {
    /// Port for the HTTP API
    #[arg(short, long, default_value = "8090")]
    port: u16,

    /// Path to the license database
    #[arg(short, long, default_value = "docarc-licenses.db")]
    db: PathBuf,

    /// File holding the activation secret
    #[arg(long)]
    secret_file: Option<PathBuf>,

    /// Admin token for the license-management endpoints
    #[arg(long)]
    admin_token: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("DocArc license service starting...");

    let secret = load_secret(&args)?;
    let admin_token = args
        .admin_token
        .clone()
        .or_else(|| env::var("DOCARC_ADMIN_TOKEN").ok())
        .context("admin token missing: pass --admin-token or set DOCARC_ADMIN_TOKEN")?;

    let store = LicenseStore::open(&args.db)
        .with_context(|| format!("failed to open license database at {}", args.db.display()))?;
    let secret = ActivationSecret::new(secret)?;
    let service = Arc::new(LicenseService::new(store, secret));
    let app = build_router(AppState::new(service, admin_token));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    info!("HTTP API listening on port {}", args.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

fn load_secret(args: &Args) -> Result<Vec<u8>> {
    if let Some(path) = &args.secret_file {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read secret file {}", path.display()))?;
        return Ok(bytes);
    }
    if let Ok(value) = env::var("DOCARC_LICENSE_SECRET") {
        return Ok(value.into_bytes());
    }
    bail!("activation secret missing: pass --secret-file or set DOCARC_LICENSE_SECRET");
}
