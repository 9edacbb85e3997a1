//! In-memory identity provider.
//!
//! The sync and OAuth components only need a user id; session management
//! lives outside this workspace. This provider holds the signed-in user for
//! the lifetime of the process and is also what the integration tests use.

use std::sync::RwLock;

use async_trait::async_trait;
use mktsync_core::IdentityProvider;
use mktsync_domain::{MarketplaceError, Result, User};

/// Process-local implementation of `IdentityProvider`
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    current: RwLock<Option<User>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self { current: RwLock::new(Some(user)) }
    }

    /// Replace the current session.
    pub fn sign_in(&self, user: User) -> Result<()> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| MarketplaceError::Internal("identity lock poisoned".into()))?;
        *guard = Some(user);
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn current_user(&self) -> Result<Option<User>> {
        let guard = self
            .current
            .read()
            .map_err(|_| MarketplaceError::Internal("identity lock poisoned".into()))?;
        Ok(guard.clone())
    }

    async fn sign_out(&self) -> Result<()> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| MarketplaceError::Internal("identity lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}
