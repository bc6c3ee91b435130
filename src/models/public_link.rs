//! Public estimate link model
//!
//! A public link grants anonymous access to one estimate. Only the SHA-256
//! digest of the token is stored; the raw token is handed out once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EstimateId, PublicLinkId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatePublicLink {
    pub id: PublicLinkId,
    pub estimate_id: EstimateId,
    /// Hex-encoded SHA-256 of the raw token
    pub token_hash: String,
    /// Short code for SMS/printed links
    pub short_code: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub access_count: u32,
    pub created_at: DateTime<Utc>,
}

impl EstimatePublicLink {
    pub fn new(
        estimate_id: EstimateId,
        token_hash: String,
        short_code: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PublicLinkId::new(),
            estimate_id,
            token_hash,
            short_code,
            expires_at,
            revoked_at: None,
            last_accessed_at: None,
            access_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Usable right now: neither revoked nor expired
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }

    pub fn revoke(&mut self) {
        if self.revoked_at.is_none() {
            self.revoked_at = Some(Utc::now());
        }
    }

    pub fn record_access(&mut self, at: DateTime<Utc>) {
        self.last_accessed_at = Some(at);
        self.access_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_active_window() {
        let now = Utc::now();
        let mut link = EstimatePublicLink::new(
            EstimateId::new(),
            "abc".into(),
            "SHORT123".into(),
            now + Duration::hours(1),
        );
        assert!(link.is_active_at(now));
        assert!(!link.is_active_at(now + Duration::hours(2)));

        link.revoke();
        assert!(link.is_revoked());
        assert!(!link.is_active_at(now));
    }

    #[test]
    fn test_record_access() {
        let mut link = EstimatePublicLink::new(
            EstimateId::new(),
            "abc".into(),
            "SHORT123".into(),
            Utc::now(),
        );
        link.record_access(Utc::now());
        link.record_access(Utc::now());
        assert_eq!(link.access_count, 2);
        assert!(link.last_accessed_at.is_some());
    }
}
