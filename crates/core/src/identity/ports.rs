//! Port interface for the authenticated user

use async_trait::async_trait;
use mktsync_domain::{Result, User};

/// Trait for resolving the current authenticated user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when the session has ended
    async fn current_user(&self) -> Result<Option<User>>;

    /// End the current session
    async fn sign_out(&self) -> Result<()>;
}
