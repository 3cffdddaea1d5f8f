//! HTTP server configuration object.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use nutrisnap::inbound::http::session_config::SessionSettings;
use nutrisnap::outbound::gemini::GeminiSettings;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) gemini: Option<GeminiSettings>,
}

impl ServerConfig {
    /// Construct a server configuration from validated session settings.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            key: session.key,
            cookie_secure: session.cookie_secure,
            same_site: session.same_site,
            bind_addr,
            gemini: None,
        }
    }

    /// Analyse photos and summarise intake through Gemini.
    ///
    /// Without this the server answers with fixture data.
    #[must_use]
    pub fn with_gemini(mut self, settings: Option<GeminiSettings>) -> Self {
        self.gemini = settings;
        self
    }
}
