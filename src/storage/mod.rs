//! Storage layer for shopfloor
//!
//! JSON file storage with atomic writes. Each aggregate type lives in its
//! own file under the data directory, and every change is mirrored into the
//! audit log.

pub mod bundles;
pub mod collection;
pub mod estimates;
pub mod file_io;
pub mod init;
pub mod invoices;
pub mod public_links;
pub mod workorders;

pub use bundles::BundleRepository;
pub use estimates::{EstimateFilter, EstimateRepository};
pub use file_io::{read_json, read_json_value, write_json_atomic};
pub use init::initialize_storage;
pub use invoices::{InvoiceFilter, InvoiceRepository};
pub use public_links::PublicLinkRepository;
pub use workorders::{WorkorderFilter, WorkorderRepository};

use serde::Serialize;

use crate::audit::{diff_of, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::ShopPaths;
use crate::error::ShopResult;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: ShopPaths,
    pub estimates: EstimateRepository,
    pub workorders: WorkorderRepository,
    pub invoices: InvoiceRepository,
    pub bundles: BundleRepository,
    pub public_links: PublicLinkRepository,
    audit: AuditLogger,
}

impl Storage {
    pub fn new(paths: ShopPaths) -> ShopResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            estimates: EstimateRepository::new(paths.estimates_file()),
            workorders: WorkorderRepository::new(paths.workorders_file()),
            invoices: InvoiceRepository::new(paths.invoices_file()),
            bundles: BundleRepository::new(paths.bundles_file()),
            public_links: PublicLinkRepository::new(paths.public_links_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &ShopPaths {
        &self.paths
    }

    pub fn load_all(&mut self) -> ShopResult<()> {
        self.estimates.load()?;
        self.workorders.load()?;
        self.invoices.load()?;
        self.bundles.load()?;
        self.public_links.load()?;
        Ok(())
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> ShopResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Record an update; the change summary is derived when not given
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> ShopResult<()> {
        self.log_update_by(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff_summary,
            None,
        )
    }

    /// Record an update made by a named actor
    #[allow(clippy::too_many_arguments)]
    pub fn log_update_by<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
        actor: Option<&str>,
    ) -> ShopResult<()> {
        let diff_summary = diff_summary.or_else(|| diff_of(before, after));
        let entry = AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff_summary,
        )
        .by(actor);
        self.audit.log(&entry)
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> ShopResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}
