//! Application settings loaded via OrthoConfig.
//!
//! Values come from `RECICLAI_*` environment variables, an optional
//! configuration file and command-line flags, in increasing precedence.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use reciclai::inbound::http::session_config::SessionToggles;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_AWARD_POINTS: u64 = 10;
const DEFAULT_DB_POOL_SIZE: u32 = 10;

/// Startup configuration for the backend process.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RECICLAI")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Points credited to the citizen when a collection is processed.
    pub award_points: Option<u64>,
    /// Maximum number of pooled database connections.
    pub db_pool_size: Option<u32>,
    pub session_key_file: Option<PathBuf>,
    /// Whether session cookies carry `Secure`; unset means secure.
    ///
    /// Kept off the command line so an absent flag does not shadow the
    /// environment.
    #[ortho_config(skip_cli)]
    pub session_cookie_secure: Option<bool>,
    pub session_same_site: Option<String>,
    /// Permit a generated session key when the key file is unreadable.
    #[ortho_config(skip_cli, default = false)]
    pub allow_ephemeral_session: bool,
}

impl AppSettings {
    /// Return the listen address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] when the configured address does not
    /// parse.
    pub fn bind_addr(&self) -> std::io::Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address '{raw}': {err}"),
            )
        })
    }

    #[must_use]
    pub fn award_points(&self) -> u64 {
        self.award_points.unwrap_or(DEFAULT_AWARD_POINTS)
    }

    #[must_use]
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_DB_POOL_SIZE)
    }

    /// Raw session toggles for validation against the build mode.
    #[must_use]
    pub fn session_toggles(&self) -> SessionToggles {
        SessionToggles {
            key_file: self.session_key_file.clone(),
            cookie_secure: self.session_cookie_secure,
            same_site: self.session_same_site.clone(),
            allow_ephemeral: self.allow_ephemeral_session,
        }
    }
}
