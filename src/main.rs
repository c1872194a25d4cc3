// Copyright PingCAP Inc. 2025.
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; version 2 of the License.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use clap::Parser;
use gatehouse::auth::{PasswordHasher, SessionCookie};
use gatehouse::config::Config;
use gatehouse::handler::BaseHandler;
use gatehouse::lifecycle::Stores;
use gatehouse::observability::tracing_setup;
use gatehouse::server::{ConnectionManager, HttpConnectionManager};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(name = "gatehouse")]
#[command(about = "Login-gated HTTP pages backed by in-memory session and user stores", long_about = None)]
struct Args {
    /// Address to listen on (e.g., 0.0.0.0:3000, 127.0.0.1:3000)
    #[arg(short, long)]
    listen: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Path to the users JSON file
    #[arg(short, long)]
    users_file: Option<PathBuf>,

    /// Print the digest of a password for the users file and exit
    #[arg(long, value_name = "PLAINTEXT")]
    hash_password: Option<String>,
}

/// Load the config file. Only the default path may be absent.
fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
        tracing::warn!("{} not found, using default configuration", DEFAULT_CONFIG_PATH);
        return Ok(Config::default());
    }
    Ok(Config::from_path(path)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Keep stdout clean when only printing a digest
    if args.hash_password.is_none() {
        tracing_setup::init_tracing_from_env().map_err(|e| e as Box<dyn std::error::Error>)?;
    }

    // Load config from file
    let mut cfg = load_config(&args.config)?;

    if let Some(plaintext) = args.hash_password.as_deref() {
        let hasher = PasswordHasher::new(cfg.auth.password_key.as_bytes())?;
        println!("{}", hasher.digest(plaintext));
        return Ok(());
    }

    // Command line args override config file
    if let Some(listen) = args.listen {
        cfg.listen_addr = listen;
    }
    if let Some(users_file) = args.users_file {
        cfg.records.path = users_file;
    }
    let addr: SocketAddr = cfg.listen_addr.parse()?;

    let stores = Stores::start(&cfg).await?;
    tracing::info!(
        lifetime_secs = cfg.session.lifetime_secs,
        sweep_interval_secs = cfg.session.sweep_interval_secs,
        "session store started"
    );

    let handler = BaseHandler::new(
        stores.sessions.store(),
        stores.records.store(),
        PasswordHasher::new(cfg.auth.password_key.as_bytes())?,
        SessionCookie::from_config(&cfg.session),
    );

    let server = HttpConnectionManager::new(handler);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tracing::info!("gatehouse HTTP server listening on {}", addr);

    let serve = server.serve(addr, shutdown_rx);
    tokio::pin!(serve);

    tokio::select! {
        r = &mut serve => {
            if let Err(e) = r {
                tracing::error!("server exited with error: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("ctrl-c received, shutting down");
            let _ = shutdown_tx.send(());
            if let Err(e) = serve.await {
                tracing::error!("server exited with error: {e}");
            }
        }
    }

    stores.stop().await;
    Ok(())
}
