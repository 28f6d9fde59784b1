//! Bookkeeping record of synchronized entity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entity type whose lifecycle notifications are being listened to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenedType {
    /// Entity type uid.
    pub uid: String,
    /// When the subscription was registered.
    pub listened_at: DateTime<Utc>,
}

impl ListenedType {
    /// Record a type as listened now.
    pub fn now(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            listened_at: Utc::now(),
        }
    }
}
