//! Driven port for the authentication provider that issues anonymous
//! identities and publishes identity changes.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::Identity;

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// The provider could not be reached.
        Unavailable { message: String } =>
            "identity provider unavailable: {message}",
        /// The provider refused to issue an identity.
        Rejected { message: String } =>
            "identity provider rejected sign-in: {message}",
    }
}

/// Port for reading and changing the current identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Identity currently signed in, if any.
    fn current(&self) -> Option<Identity>;

    /// Receiver that observes every identity change, starting with the
    /// current value.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    /// Make an anonymous identity current. Returns the active identity
    /// unchanged when one exists.
    async fn sign_in_anonymous(&self) -> Result<Identity, IdentityProviderError>;

    /// Drop the current identity.
    async fn sign_out(&self) -> Result<(), IdentityProviderError>;
}
