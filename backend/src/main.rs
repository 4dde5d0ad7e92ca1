//! Backend entry-point: loads settings, prepares the database, and serves
//! the REST API.

mod server;

use std::io;
use std::path::Path;

use actix_web::cookie::Key;
use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use placelists::inbound::http::health::HealthState;
use placelists::outbound::persistence::{DbPool, run_pending_migrations};
use placelists::settings::AppSettings;
use server::{ServerConfig, create_server};

/// Shortest key material accepted for cookie signing and encryption.
const SESSION_KEY_MIN_LEN: usize = 32;

/// Read the session key, falling back to a generated one when permitted.
///
/// Debug builds always permit the fallback.
fn load_session_key(path: &Path, allow_ephemeral: bool) -> io::Result<Key> {
    let failure = match std::fs::read(path) {
        Ok(bytes) if bytes.len() >= SESSION_KEY_MIN_LEN => return Ok(Key::derive_from(&bytes)),
        Ok(bytes) => format!(
            "session key at {} is {} bytes; need at least {SESSION_KEY_MIN_LEN}",
            path.display(),
            bytes.len()
        ),
        Err(e) => format!("failed to read session key at {}: {e}", path.display()),
    };

    if cfg!(debug_assertions) || allow_ephemeral {
        warn!(path = %path.display(), reason = %failure, "using temporary session key (dev only)");
        Ok(Key::generate())
    } else {
        Err(io::Error::other(failure))
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|e| io::Error::other(e.to_string()))?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let pool_config = settings.pool_config().map_err(io::Error::other)?;

    if settings.run_migrations {
        run_pending_migrations(pool_config.database_url())
            .await
            .map_err(io::Error::other)?;
    }

    let pool = DbPool::new(pool_config)
        .await
        .map_err(|e| io::Error::other(format!("database pool: {e}")))?;
    let key = load_session_key(&settings.session_key_file(), settings.session_allow_ephemeral)?;

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(key, settings.cookie_secure, bind_addr, pool)
        .with_rate_limits(settings.rate_limits);
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "placelists listening");
    server.await
}
