use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::SubscriberEmail;

/// A subscription waiting for its confirmation link to be visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub email: SubscriberEmail,
    pub expires_at: DateTime<Utc>,
}

impl PendingConfirmation {
    pub fn new(
        email: SubscriberEmail,
        ttl: Duration,
    ) -> Self {
        Self {
            email,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired_at(
        &self,
        now: DateTime<Utc>,
    ) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool { self.is_expired_at(Utc::now()) }
}
