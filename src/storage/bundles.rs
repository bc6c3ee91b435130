//! Bundle repository

use std::path::PathBuf;

use crate::error::ShopResult;
use crate::models::{Bundle, BundleId};

use super::collection::{Collection, Record};

impl Record for Bundle {
    type Id = BundleId;

    fn record_id(&self) -> BundleId {
        self.id
    }
}

pub struct BundleRepository {
    records: Collection<Bundle>,
}

impl BundleRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            records: Collection::new(path),
        }
    }

    pub fn load(&self) -> ShopResult<()> {
        self.records.load()
    }

    pub fn get(&self, id: BundleId) -> ShopResult<Option<Bundle>> {
        self.records.get(id)
    }

    /// Look up by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> ShopResult<Option<Bundle>> {
        let name = name.trim().to_lowercase();
        self.records.find_by(|b| b.name.to_lowercase() == name)
    }

    /// Resolve a name, full UUID or displayed short id
    pub fn find(&self, identifier: &str) -> ShopResult<Option<Bundle>> {
        if let Some(bundle) = self.get_by_name(identifier)? {
            return Ok(Some(bundle));
        }
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<BundleId>() {
            return self.get(id);
        }
        let matches = self.records.filter(|b| b.id.matches_short(identifier))?;
        Ok(match matches.len() {
            1 => matches.into_iter().next(),
            _ => None,
        })
    }

    /// Bundles sorted by name
    pub fn list(&self, include_inactive: bool) -> ShopResult<Vec<Bundle>> {
        let mut bundles = self.records.filter(|b| include_inactive || b.active)?;
        bundles.sort_by_key(|b| b.name.to_lowercase());
        Ok(bundles)
    }

    pub fn name_exists(&self, name: &str, exclude_id: Option<BundleId>) -> ShopResult<bool> {
        let name = name.trim().to_lowercase();
        Ok(self
            .records
            .find_by(|b| b.name.to_lowercase() == name && Some(b.id) != exclude_id)?
            .is_some())
    }

    pub fn commit(&self, bundle: Bundle) -> ShopResult<Option<Bundle>> {
        self.records.commit(bundle)
    }

    pub fn commit_removal(&self, id: BundleId) -> ShopResult<Option<Bundle>> {
        self.records.commit_removal(id)
    }

    pub fn count(&self) -> ShopResult<usize> {
        self.records.count()
    }
}
