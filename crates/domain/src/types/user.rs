//! User identity.

use serde::{Deserialize, Serialize};

/// Authenticated user on whose behalf connections and syncs run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), email: None }
    }
}
