//! Server settings loaded via OrthoConfig.
//!
//! Every value can come from the command line, a config file or a
//! `NUTRISNAP_*` environment variable. Session cookie settings are read
//! separately by [`crate::inbound::http::session_config`].

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;

use crate::outbound::gemini::GeminiSettings;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NUTRITION_LANGUAGE: &str = "Bangla";

/// Errors raised when settings values cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid Gemini endpoint '{value}': {source}")]
    GeminiEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Gemini timeout must be at least one second")]
    GeminiTimeout,
}

/// Process-wide settings for the HTTP server and the Gemini adapter.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "NUTRISNAP")]
pub struct ServerSettings {
    /// Socket address to listen on.
    #[ortho_config(default = DEFAULT_BIND_ADDR.to_owned())]
    pub bind_addr: String,
    /// Base URL of the Gemini API.
    #[ortho_config(default = DEFAULT_GEMINI_ENDPOINT.to_owned())]
    pub gemini_endpoint: String,
    /// Gemini model used for analysis and summaries.
    #[ortho_config(default = DEFAULT_GEMINI_MODEL.to_owned())]
    pub gemini_model: String,
    /// Gemini API key. Without one the server answers with fixture data.
    pub gemini_api_key: Option<String>,
    /// Whole-request timeout for Gemini calls, in seconds.
    #[ortho_config(default = DEFAULT_GEMINI_TIMEOUT_SECS)]
    pub gemini_timeout_secs: u64,
    /// Language for nutrition descriptions.
    #[ortho_config(default = DEFAULT_NUTRITION_LANGUAGE.to_owned())]
    pub nutrition_language: String,
}

impl ServerSettings {
    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .parse()
            .map_err(|source| SettingsError::BindAddr {
                value: self.bind_addr.clone(),
                source,
            })
    }

    /// Language requested for nutrition descriptions.
    pub fn nutrition_language(&self) -> &str {
        match self.nutrition_language.trim() {
            "" => DEFAULT_NUTRITION_LANGUAGE,
            language => language,
        }
    }

    /// Build Gemini connection settings, or `None` when no API key is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint is not a URL or the timeout is zero.
    pub fn gemini_settings(&self) -> Result<Option<GeminiSettings>, SettingsError> {
        let Some(api_key) = self
            .gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        else {
            return Ok(None);
        };

        let endpoint = Url::parse(&self.gemini_endpoint).map_err(|source| {
            SettingsError::GeminiEndpoint {
                value: self.gemini_endpoint.clone(),
                source,
            }
        })?;

        if self.gemini_timeout_secs == 0 {
            return Err(SettingsError::GeminiTimeout);
        }

        Ok(Some(GeminiSettings {
            endpoint,
            model: self.gemini_model.clone(),
            api_key: api_key.to_owned(),
            timeout: Duration::from_secs(self.gemini_timeout_secs),
            nutrition_language: self.nutrition_language().to_owned(),
        }))
    }
}
