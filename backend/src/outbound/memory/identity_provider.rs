//! In-process anonymous identity provider backed by a watch channel.

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::domain::Identity;
use crate::domain::ports::{IdentityProvider, IdentityProviderError};

/// Issues UUID-backed anonymous identities and publishes every change.
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    current: watch::Sender<Option<Identity>>,
    auto_reissue: bool,
}

impl InMemoryIdentityProvider {
    /// Start signed out. With `auto_reissue`, signing out immediately issues
    /// a fresh anonymous identity.
    pub fn new(auto_reissue: bool) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current,
            auto_reissue,
        }
    }

    /// Start with `identity` already signed in.
    pub fn with_identity(identity: Identity, auto_reissue: bool) -> Self {
        let provider = Self::new(auto_reissue);
        provider.current.send_replace(Some(identity));
        provider
    }

    /// Sign in anonymously unless an identity is already active.
    pub async fn ensure_signed_in(&self) -> Result<Identity, IdentityProviderError> {
        match self.current() {
            Some(identity) => Ok(identity),
            None => self.sign_in_anonymous().await,
        }
    }

    /// Publish a fresh identity when none is active and return the active one.
    fn issue_if_absent(&self) -> Identity {
        let mut active = Identity::issue_anonymous();
        let issued = self.current.send_if_modified(|current| match current {
            Some(existing) => {
                active = existing.clone();
                false
            }
            None => {
                *current = Some(active.clone());
                true
            }
        });
        if issued {
            info!(user_id = %active.id(), "issued anonymous identity");
        }
        active
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    async fn sign_in_anonymous(&self) -> Result<Identity, IdentityProviderError> {
        Ok(self.issue_if_absent())
    }

    async fn sign_out(&self) -> Result<(), IdentityProviderError> {
        if let Some(previous) = self.current.send_replace(None) {
            info!(user_id = %previous.id(), "signed out");
        }
        if self.auto_reissue {
            self.issue_if_absent();
        }
        Ok(())
    }
}
