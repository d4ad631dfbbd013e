//! User identity

use crate::error::MemoirResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal user id, the partition key of every per-user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A user known to the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable internal id
    pub id: UserId,

    /// Platform id (unique)
    pub external_id: i64,

    /// Display name reported by the platform
    pub display_name: Option<String>,

    /// When the user was first seen
    pub created_at: DateTime<Utc>,
}

/// Resolves platform identities to users, creating them on first contact
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Return the user with `external_id`, creating it if missing
    async fn get_or_create_user(
        &self,
        external_id: i64,
        display_name: Option<&str>,
    ) -> MemoirResult<User>;
}
