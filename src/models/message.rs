use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    // Older logs tag replies as "ai".
    #[serde(alias = "ai")]
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn id_suffix(&self) -> &'static str {
        match self {
            Role::User => "u",
            Role::Assistant => "a",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    #[serde(rename = "sender")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// Loaded ids beyond this are ignored so the counter can never overflow.
const MAX_OBSERVED_SEQUENCE: i64 = i64::MAX / 2;

/// Issues message ids that sort in creation order for the lifetime of a session.
///
/// An id is `<millis>-u` or `<millis>-a`. When the clock has not advanced
/// (or went backwards) the counter is bumped past the last issued value, so
/// no two ids collide even within the same millisecond.
#[derive(Debug, Default)]
pub struct MessageIds {
    last: AtomicI64,
}

impl MessageIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids sort after an id that already exists in the log.
    pub fn observe(&self, id: &str) {
        match Self::sequence_of(id) {
            Some(n) if n <= MAX_OBSERVED_SEQUENCE => {
                self.last.fetch_max(n, Ordering::SeqCst);
            }
            Some(_) => tracing::warn!("Ignoring out-of-range message id {}", id),
            None => {}
        }
    }

    pub fn next(&self, role: Role, now: DateTime<Utc>) -> String {
        let candidate = now.timestamp_millis();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let n = candidate.max(prev.saturating_add(1));
            match self
                .last
                .compare_exchange(prev, n, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return format!("{}-{}", n, role.id_suffix()),
                Err(actual) => prev = actual,
            }
        }
    }

    fn sequence_of(id: &str) -> Option<i64> {
        id.split('-').next()?.parse().ok()
    }
}

impl Message {
    pub fn new(ids: &MessageIds, role: Role, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ids.next(role, now),
            text: text.into(),
            role,
            created_at: now,
        }
    }
}
