//! Authenticated session passed explicitly to the batch driver.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime of a freshly issued session.
pub const DEFAULT_SESSION_DAYS: i64 = 7;

/// Who is converting, and until when they may.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            expires_at,
        }
    }

    /// A session valid for `DEFAULT_SESSION_DAYS` from now.
    pub fn issue(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Utc::now() + Duration::days(DEFAULT_SESSION_DAYS))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_session_is_active() {
        let session = SessionContext::issue("u1");
        assert!(!session.is_expired());
        assert!(session.is_expired_at(session.expires_at));
        assert!(session.is_expired_at(Utc::now() + Duration::days(DEFAULT_SESSION_DAYS + 1)));
    }

    #[test]
    fn test_past_expiry() {
        let session = SessionContext::new("u1", Utc::now() - Duration::seconds(1));
        assert!(session.is_expired());
    }

    #[test]
    fn test_serde_camel_case() {
        let session = SessionContext::issue("u1");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["userId"], "u1");
        assert!(json.get("expiresAt").is_some());
    }
}
