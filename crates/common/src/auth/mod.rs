//! OAuth 2.0 types shared by the flow controller and token refresh manager.

mod types;

pub use types::{Credentials, OAuthErrorBody, TokenResponse};
