//! Auth-state notification envelope

use chrono::{DateTime, Utc};

use crate::domain::AuthEvent;

/// Auth event stamped with an id and publish time.
#[derive(Debug, Clone)]
pub struct AuthEventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub event: AuthEvent,
}

impl AuthEventMessage {
    pub fn new(event: AuthEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
