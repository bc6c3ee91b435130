//! Public link repository
//!
//! Links are looked up by the SHA-256 digest of the raw token or by short
//! code. The raw token itself is never stored.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::ShopResult;
use crate::models::{EstimateId, EstimatePublicLink, PublicLinkId};

use super::collection::{Collection, Record};

impl Record for EstimatePublicLink {
    type Id = PublicLinkId;

    fn record_id(&self) -> PublicLinkId {
        self.id
    }
}

pub struct PublicLinkRepository {
    records: Collection<EstimatePublicLink>,
}

impl PublicLinkRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            records: Collection::new(path),
        }
    }

    pub fn load(&self) -> ShopResult<()> {
        self.records.load()
    }

    pub fn save(&self) -> ShopResult<()> {
        self.records.save()
    }

    pub fn get(&self, id: PublicLinkId) -> ShopResult<Option<EstimatePublicLink>> {
        self.records.get(id)
    }

    pub fn get_by_token_hash(&self, token_hash: &str) -> ShopResult<Option<EstimatePublicLink>> {
        self.records.find_by(|l| l.token_hash == token_hash)
    }

    pub fn get_by_short_code(&self, code: &str) -> ShopResult<Option<EstimatePublicLink>> {
        self.records.find_by(|l| l.short_code == code)
    }

    /// Resolve a full UUID, a short code or a displayed link id (`lnk-…`)
    pub fn find(&self, identifier: &str) -> ShopResult<Option<EstimatePublicLink>> {
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<PublicLinkId>() {
            return self.get(id);
        }
        if let Some(link) = self.get_by_short_code(identifier)? {
            return Ok(Some(link));
        }
        let matches = self.records.filter(|l| l.id.matches_short(identifier))?;
        Ok(match matches.len() {
            1 => matches.into_iter().next(),
            _ => None,
        })
    }

    /// All links for an estimate, newest first
    pub fn for_estimate(&self, estimate_id: EstimateId) -> ShopResult<Vec<EstimatePublicLink>> {
        let mut links = self.records.filter(|l| l.estimate_id == estimate_id)?;
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links)
    }

    pub fn active_for_estimate(
        &self,
        estimate_id: EstimateId,
        now: DateTime<Utc>,
    ) -> ShopResult<Vec<EstimatePublicLink>> {
        self.records
            .filter(|l| l.estimate_id == estimate_id && l.is_active_at(now))
    }

    pub fn get_all(&self) -> ShopResult<Vec<EstimatePublicLink>> {
        self.records.all()
    }

    pub fn short_code_exists(&self, code: &str) -> ShopResult<bool> {
        Ok(self.get_by_short_code(code)?.is_some())
    }

    pub fn upsert(&self, link: EstimatePublicLink) -> ShopResult<()> {
        self.records.upsert(link).map(|_| ())
    }

    pub fn commit(&self, link: EstimatePublicLink) -> ShopResult<Option<EstimatePublicLink>> {
        self.records.commit(link)
    }

    pub fn restore(
        &self,
        id: PublicLinkId,
        previous: Option<EstimatePublicLink>,
    ) -> ShopResult<()> {
        self.records.restore(id, previous)
    }

    pub fn count(&self) -> ShopResult<usize> {
        self.records.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_and_active_links() {
        let temp_dir = TempDir::new().unwrap();
        let repo = PublicLinkRepository::new(temp_dir.path().join("public_links.json"));
        let estimate_id = EstimateId::new();
        let now = Utc::now();

        let live = EstimatePublicLink::new(
            estimate_id,
            "aa".repeat(32),
            "AbCd1234".into(),
            now + Duration::hours(1),
        );
        let mut revoked = EstimatePublicLink::new(
            estimate_id,
            "bb".repeat(32),
            "Zz990000".into(),
            now + Duration::hours(1),
        );
        revoked.revoke();
        repo.commit(live.clone()).unwrap();
        repo.commit(revoked).unwrap();

        assert_eq!(
            repo.get_by_token_hash(&"aa".repeat(32)).unwrap().unwrap().id,
            live.id
        );
        assert!(repo.short_code_exists("Zz990000").unwrap());
        assert_eq!(repo.for_estimate(estimate_id).unwrap().len(), 2);

        let active = repo.active_for_estimate(estimate_id, now).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, live.id);

        assert_eq!(repo.find("AbCd1234").unwrap().unwrap().id, live.id);
        assert_eq!(repo.find(&live.id.to_string()).unwrap().unwrap().id, live.id);
        assert!(repo.find("nothing").unwrap().is_none());
    }
}
