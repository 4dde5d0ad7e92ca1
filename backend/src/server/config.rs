//! HTTP server configuration object and helpers.

use actix_web::cookie::{Key, SameSite};
use placelists::outbound::persistence::DbPool;
use std::net::SocketAddr;

/// Everything the server needs beyond its route table.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) rate_limits: bool,
    pub(crate) db_pool: DbPool,
}

impl ServerConfig {
    /// Construct a server configuration around a ready pool.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, bind_addr: SocketAddr, db_pool: DbPool) -> Self {
        Self {
            key,
            cookie_secure,
            same_site: SameSite::Lax,
            bind_addr,
            rate_limits: true,
            db_pool,
        }
    }

    /// Enable or disable per-route request budgets.
    #[must_use]
    pub fn with_rate_limits(mut self, enabled: bool) -> Self {
        self.rate_limits = enabled;
        self
    }

    /// Override the `SameSite` policy for session cookies.
    #[cfg_attr(
        not(test),
        expect(dead_code, reason = "Lax is the only production policy today")
    )]
    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }
}
