//! Workorder service
//!
//! Opens workorders from approved estimates, drives their status machine,
//! edits their items while the work is carried out, folds in sub-estimates
//! for discovered work and finally invoices them.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{ShopError, ShopResult};
use crate::models::{
    Estimate, EstimateId, EstimateStatus, Invoice, InvoiceLine, InvoiceSection, InvoiceSource,
    ItemId, JobId, Workorder, WorkorderId, WorkorderItem, WorkorderJob, WorkorderStatus,
    WorkorderStatusHistory,
};
use crate::storage::{Storage, WorkorderFilter};

use super::estimate_editor::{EstimateEditorService, EstimateInput, JobInput};
use super::invoice::InvoiceService;
use super::LineInput;

pub struct WorkorderService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> WorkorderService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    /// Open a workorder for the approved work on an estimate
    ///
    /// Only approved jobs, and within them only approved items, are copied.
    pub fn create_from_estimate(
        &self,
        estimate_id: EstimateId,
        technician_id: Option<u64>,
    ) -> ShopResult<Workorder> {
        let mut estimate = self.load_estimate(estimate_id)?;

        if !matches!(
            estimate.status,
            EstimateStatus::Approved | EstimateStatus::Sent
        ) {
            return Err(ShopError::Validation(format!(
                "Estimate {} is {}; only approved or sent estimates can become workorders",
                estimate.number, estimate.status
            )));
        }
        if estimate.parent_workorder_id.is_some() {
            return Err(ShopError::Validation(format!(
                "Estimate {} belongs to a workorder; merge it instead",
                estimate.number
            )));
        }
        let existing = match estimate.workorder_id {
            Some(id) => self.storage.workorders.get(id)?,
            None => self.storage.workorders.get_by_estimate(estimate.id)?,
        };
        if estimate.workorder_id.is_some() || existing.is_some() {
            return Err(ShopError::Duplicate {
                entity_type: "Workorder",
                identifier: existing.map_or_else(|| estimate.number.clone(), |w| w.number),
            });
        }
        if estimate.invoice_id.is_some() {
            return Err(ShopError::Locked(format!(
                "Estimate {} has already been invoiced",
                estimate.number
            )));
        }

        let approved = estimate.approved_work();
        if approved.is_empty() {
            return Err(ShopError::Validation(format!(
                "Estimate {} has no approved jobs",
                estimate.number
            )));
        }

        let number = self
            .storage
            .workorders
            .next_number(&self.settings.prefixes.workorder)?;
        let mut workorder = Workorder::new(
            number,
            estimate.id,
            estimate.customer_id,
            estimate.vehicle_id,
        );
        workorder.technician_id = technician_id.or(estimate.technician_id);
        workorder.tax_rate_bps = estimate.tax_rate_bps;
        workorder.notes = estimate.notes.clone();
        workorder.jobs = approved
            .iter()
            .map(|job| WorkorderJob::from_estimate_job(estimate.id, job))
            .collect();
        workorder.recompute_totals();

        self.storage.workorders.commit(workorder.clone())?;

        let before = estimate.clone();
        estimate.workorder_id = Some(workorder.id);
        estimate.updated_at = Utc::now();
        if let Err(e) = self.storage.estimates.commit(estimate.clone()) {
            self.storage.workorders.commit_removal(workorder.id)?;
            return Err(e);
        }

        self.storage.log_create(
            EntityType::Workorder,
            workorder.id.to_string(),
            Some(workorder.number.clone()),
            &workorder,
        )?;
        self.storage.log_update(
            EntityType::Estimate,
            estimate.id.to_string(),
            Some(estimate.number.clone()),
            &before,
            &estimate,
            Some(format!("workorder: {}", workorder.number)),
        )?;

        info!(
            workorder = %workorder.number,
            estimate = %estimate.number,
            jobs = workorder.jobs.len(),
            total = %workorder.grand_total,
            "workorder created"
        );
        Ok(workorder)
    }

    pub fn get(&self, id: WorkorderId) -> ShopResult<Option<Workorder>> {
        self.storage.workorders.get(id)
    }

    /// Find by number, UUID or short id
    pub fn find(&self, identifier: &str) -> ShopResult<Option<Workorder>> {
        self.storage.workorders.find(identifier)
    }

    pub fn require(&self, identifier: &str) -> ShopResult<Workorder> {
        self.find(identifier)?
            .ok_or_else(|| ShopError::workorder_not_found(identifier))
    }

    pub fn list(&self, filter: &WorkorderFilter) -> ShopResult<Vec<Workorder>> {
        self.storage.workorders.list(filter)
    }

    pub fn history(&self, id: WorkorderId) -> ShopResult<Vec<WorkorderStatusHistory>> {
        Ok(self.load(id)?.history)
    }

    pub fn change_status(
        &self,
        id: WorkorderId,
        to: WorkorderStatus,
        note: Option<String>,
        actor: Option<String>,
    ) -> ShopResult<Workorder> {
        let mut workorder = self.load(id)?;
        let before = workorder.clone();

        let note = note.filter(|n| !n.trim().is_empty());
        let actor = actor.filter(|a| !a.trim().is_empty());
        let from = workorder
            .change_status(to, note, actor.clone())
            .map_err(|(from, to)| {
                warn!(workorder = %before.number, %from, %to, "refused workorder transition");
                ShopError::transition("Workorder", from, to)
            })?;

        self.storage.workorders.commit(workorder.clone())?;
        self.storage.log_update_by(
            EntityType::Workorder,
            workorder.id.to_string(),
            Some(workorder.number.clone()),
            &before,
            &workorder,
            Some(format!("status: {} -> {}", from, to)),
            actor.as_deref(),
        )?;

        info!(workorder = %workorder.number, %from, %to, "workorder status changed");
        Ok(workorder)
    }

    /// Add a line to one of the workorder's jobs
    pub fn add_item(
        &self,
        id: WorkorderId,
        job_id: JobId,
        line: LineInput,
    ) -> ShopResult<(Workorder, ItemId)> {
        line.validate()?;
        let item = WorkorderItem::new(
            line.item_type,
            line.description.trim(),
            line.quantity,
            line.unit_price,
            line.taxable,
        );
        let item_id = item.id;
        let workorder = self.edit(id, |workorder| {
            let job = workorder
                .job_mut(job_id)
                .ok_or_else(|| ShopError::job_not_found(job_id.to_string()))?;
            job.items.push(item);
            Ok(())
        })?;
        Ok((workorder, item_id))
    }

    /// Replace the priced content of a line, keeping its completion flag
    pub fn update_item(
        &self,
        id: WorkorderId,
        item_id: ItemId,
        line: LineInput,
    ) -> ShopResult<Workorder> {
        line.validate()?;
        self.edit(id, |workorder| {
            let item = workorder
                .item_mut(item_id)
                .ok_or_else(|| ShopError::item_not_found(item_id.to_string()))?;
            item.item_type = line.item_type;
            item.description = line.description.trim().to_string();
            item.quantity = line.quantity;
            item.unit_price = line.unit_price;
            item.taxable = line.taxable;
            Ok(())
        })
    }

    pub fn remove_item(&self, id: WorkorderId, item_id: ItemId) -> ShopResult<Workorder> {
        self.edit(id, |workorder| {
            workorder
                .remove_item(item_id)
                .map(|_| ())
                .ok_or_else(|| ShopError::item_not_found(item_id.to_string()))
        })
    }

    pub fn set_item_completed(
        &self,
        id: WorkorderId,
        item_id: ItemId,
        completed: bool,
    ) -> ShopResult<Workorder> {
        self.edit(id, |workorder| {
            let item = workorder
                .item_mut(item_id)
                .ok_or_else(|| ShopError::item_not_found(item_id.to_string()))?;
            item.completed = completed;
            Ok(())
        })
    }

    /// Quote work discovered on the floor as a new estimate for the same vehicle
    pub fn create_sub_estimate(
        &self,
        id: WorkorderId,
        jobs: Vec<JobInput>,
    ) -> ShopResult<Estimate> {
        let mut workorder = self.load(id)?;
        self.ensure_editable(&workorder)?;
        if jobs.is_empty() {
            return Err(ShopError::Validation(
                "A sub-estimate needs at least one job".into(),
            ));
        }

        let editor = EstimateEditorService::new(self.storage, self.settings);
        let estimate = editor.create_for_workorder(
            workorder.id,
            EstimateInput {
                customer_id: workorder.customer_id,
                vehicle_id: workorder.vehicle_id,
                technician_id: workorder.technician_id,
                notes: format!("Additional work found on {}", workorder.number),
                jobs,
                ..Default::default()
            },
        )?;

        let before = workorder.clone();
        workorder.sub_estimate_ids.push(estimate.id);
        workorder.updated_at = Utc::now();
        if let Err(e) = self.storage.workorders.commit(workorder.clone()) {
            self.storage.estimates.commit_removal(estimate.id)?;
            return Err(e);
        }
        self.storage.log_update(
            EntityType::Workorder,
            workorder.id.to_string(),
            Some(workorder.number.clone()),
            &before,
            &workorder,
            Some(format!("sub_estimate: {}", estimate.number)),
        )?;

        info!(
            workorder = %workorder.number,
            estimate = %estimate.number,
            "sub-estimate created"
        );
        Ok(estimate)
    }

    /// Fold the approved work of a sub-estimate into the workorder
    pub fn merge_sub_estimate(
        &self,
        id: WorkorderId,
        estimate_id: EstimateId,
    ) -> ShopResult<(Workorder, Estimate)> {
        let mut workorder = self.load(id)?;
        self.ensure_editable(&workorder)?;
        let mut estimate = self.load_estimate(estimate_id)?;

        if estimate.parent_workorder_id != Some(workorder.id) {
            return Err(ShopError::Validation(format!(
                "Estimate {} is not a sub-estimate of {}",
                estimate.number, workorder.number
            )));
        }
        if estimate.status != EstimateStatus::Approved {
            return Err(ShopError::transition(
                "Estimate",
                estimate.status,
                EstimateStatus::Converted,
            ));
        }

        let wo_before = workorder.clone();
        workorder.jobs.extend(
            estimate
                .approved_work()
                .iter()
                .map(|job| WorkorderJob::from_estimate_job(estimate.id, job)),
        );
        workorder.recompute_totals();

        let est_before = estimate.clone();
        estimate
            .transition(EstimateStatus::Converted)
            .map_err(|(from, to)| ShopError::transition("Estimate", from, to))?;
        estimate.workorder_id = Some(workorder.id);

        self.storage.workorders.commit(workorder.clone())?;
        if let Err(e) = self.storage.estimates.commit(estimate.clone()) {
            self.storage
                .workorders
                .revert(workorder.id, Some(wo_before))?;
            return Err(e);
        }

        self.storage.log_update(
            EntityType::Workorder,
            workorder.id.to_string(),
            Some(workorder.number.clone()),
            &wo_before,
            &workorder,
            Some(format!("merged {}", estimate.number)),
        )?;
        self.storage.log_update(
            EntityType::Estimate,
            estimate.id.to_string(),
            Some(estimate.number.clone()),
            &est_before,
            &estimate,
            None,
        )?;

        info!(
            workorder = %workorder.number,
            estimate = %estimate.number,
            total = %workorder.grand_total,
            "sub-estimate merged"
        );
        Ok((workorder, estimate))
    }

    /// Invoice every line on a completed workorder
    pub fn convert_to_invoice(&self, id: WorkorderId) -> ShopResult<(Workorder, Invoice)> {
        let mut workorder = self.load(id)?;

        if workorder.status != WorkorderStatus::Completed {
            return Err(ShopError::Validation(format!(
                "Workorder {} is {}; only completed workorders can be invoiced",
                workorder.number, workorder.status
            )));
        }
        if workorder.invoice_id.is_some() {
            return Err(ShopError::Duplicate {
                entity_type: "Invoice",
                identifier: workorder.number.clone(),
            });
        }

        let sections = workorder
            .jobs
            .iter()
            .map(|job| InvoiceSection {
                title: job.title.clone(),
                lines: job.items.iter().map(InvoiceLine::from).collect(),
            })
            .collect();

        let invoices = InvoiceService::new(self.storage, self.settings);
        let invoice = invoices.issue(
            InvoiceSource::Workorder(workorder.id),
            workorder.customer_id,
            workorder.vehicle_id,
            workorder.tax_rate_bps,
            sections,
        )?;

        let before = workorder.clone();
        workorder.invoice_id = Some(invoice.id);
        workorder.updated_at = Utc::now();
        if let Err(e) = self.storage.workorders.commit(workorder.clone()) {
            invoices.withdraw(invoice.id)?;
            return Err(e);
        }
        self.storage.log_update(
            EntityType::Workorder,
            workorder.id.to_string(),
            Some(workorder.number.clone()),
            &before,
            &workorder,
            Some(format!("invoice: {}", invoice.number)),
        )?;

        info!(
            workorder = %workorder.number,
            invoice = %invoice.number,
            "workorder invoiced"
        );
        Ok((workorder, invoice))
    }

    fn edit<F>(&self, id: WorkorderId, change: F) -> ShopResult<Workorder>
    where
        F: FnOnce(&mut Workorder) -> ShopResult<()>,
    {
        let mut workorder = self.load(id)?;
        self.ensure_editable(&workorder)?;

        let before = workorder.clone();
        change(&mut workorder)?;
        workorder.recompute_totals();
        debug!(
            workorder = %workorder.number,
            total = %workorder.grand_total,
            "workorder totals recomputed"
        );

        self.storage.workorders.commit(workorder.clone())?;
        self.storage.log_update(
            EntityType::Workorder,
            workorder.id.to_string(),
            Some(workorder.number.clone()),
            &before,
            &workorder,
            None,
        )?;
        Ok(workorder)
    }

    fn ensure_editable(&self, workorder: &Workorder) -> ShopResult<()> {
        if workorder.is_locked() {
            return Err(ShopError::Locked(format!(
                "Workorder {} is {} and can no longer be edited",
                workorder.number, workorder.status
            )));
        }
        Ok(())
    }

    fn load(&self, id: WorkorderId) -> ShopResult<Workorder> {
        self.storage
            .workorders
            .get(id)?
            .ok_or_else(|| ShopError::workorder_not_found(id.to_string()))
    }

    fn load_estimate(&self, id: EstimateId) -> ShopResult<Estimate> {
        self.storage
            .estimates
            .get(id)?
            .ok_or_else(|| ShopError::estimate_not_found(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ShopPaths;
    use crate::models::{ApprovalStatus, InvoiceStatus, ItemType, Money, Quantity};
    use crate::services::EstimateService;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShopPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn line(desc: &str, cents: i64) -> LineInput {
        LineInput::new(ItemType::Part, desc, Quantity::units(1), Money::from_cents(cents), false)
    }

    /// Brakes (pads approved, rotors rejected) and a rejected flush
    fn decided_estimate(storage: &Storage, settings: &Settings) -> Estimate {
        let editor = EstimateEditorService::new(storage, settings);
        let estimate = editor
            .create(EstimateInput {
                customer_id: 7,
                vehicle_id: 9,
                technician_id: Some(3),
                jobs: vec![
                    JobInput::new("Brakes")
                        .with_item(line("Pads", 6_000))
                        .with_item(line("Rotors", 12_000)),
                    JobInput::new("Coolant flush").with_item(line("Coolant", 2_500)),
                ],
                ..Default::default()
            })
            .unwrap();

        let brakes = &estimate.jobs[0];
        let (pads, rotors) = (brakes.items[0].id, brakes.items[1].id);
        editor
            .set_item_status(estimate.id, brakes.id, pads, ApprovalStatus::Approved)
            .unwrap();
        editor
            .set_item_status(estimate.id, brakes.id, rotors, ApprovalStatus::Rejected)
            .unwrap();
        editor
            .set_job_status(estimate.id, estimate.jobs[1].id, ApprovalStatus::Rejected, None)
            .unwrap()
    }

    #[test]
    fn test_create_copies_only_approved_work() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let estimate = decided_estimate(&storage, &settings);
        assert_eq!(estimate.status, EstimateStatus::Approved);

        let service = WorkorderService::new(&storage, &settings);
        let workorder = service.create_from_estimate(estimate.id, None).unwrap();

        assert_eq!(workorder.number, "WO-000001");
        assert_eq!(workorder.technician_id, Some(3));
        assert_eq!(workorder.jobs.len(), 1);
        assert_eq!(workorder.jobs[0].items.len(), 1);
        assert_eq!(workorder.grand_total, Money::from_cents(6_000));
        assert_eq!(workorder.status, WorkorderStatus::Pending);
        assert_eq!(workorder.history.len(), 1);

        let estimate = storage.estimates.get(estimate.id).unwrap().unwrap();
        assert_eq!(estimate.workorder_id, Some(workorder.id));
        assert!(estimate.is_locked());
    }

    #[test]
    fn test_create_from_sent_estimate_takes_approved_jobs_only() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let editor = EstimateEditorService::new(&storage, &settings);
        let estimate = editor
            .create(EstimateInput {
                customer_id: 4,
                vehicle_id: 5,
                jobs: vec![
                    JobInput::new("Oil change").with_item(line("Filter", 1_500)),
                    JobInput::new("Wipers").with_item(line("Blades", 3_000)),
                ],
                ..Default::default()
            })
            .unwrap();
        EstimateService::new(&storage, &settings).send(estimate.id).unwrap();
        let estimate = editor
            .set_job_status(estimate.id, estimate.jobs[0].id, ApprovalStatus::Approved, None)
            .unwrap();
        assert_eq!(estimate.status, EstimateStatus::Sent);
        assert_eq!(estimate.jobs[1].customer_status, ApprovalStatus::Pending);

        let workorder = WorkorderService::new(&storage, &settings)
            .create_from_estimate(estimate.id, None)
            .unwrap();

        assert_eq!(workorder.jobs.len(), 1);
        assert_eq!(workorder.jobs[0].title, "Oil change");
        assert_eq!(workorder.jobs[0].source_job_id, Some(estimate.jobs[0].id));
        assert_eq!(workorder.grand_total, Money::from_cents(1_500));
    }

    #[test]
    fn test_create_refuses_duplicates_and_undecided() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let service = WorkorderService::new(&storage, &settings);

        let estimate = decided_estimate(&storage, &settings);
        service.create_from_estimate(estimate.id, None).unwrap();
        assert!(matches!(
            service.create_from_estimate(estimate.id, None).unwrap_err(),
            ShopError::Duplicate { .. }
        ));

        let pending = EstimateEditorService::new(&storage, &settings)
            .create(EstimateInput {
                customer_id: 1,
                vehicle_id: 1,
                jobs: vec![JobInput::new("Inspect").with_item(line("Scan", 100))],
                ..Default::default()
            })
            .unwrap();
        assert!(service
            .create_from_estimate(pending.id, None)
            .unwrap_err()
            .is_validation());

        // Sent but nothing approved yet
        EstimateService::new(&storage, &settings).send(pending.id).unwrap();
        assert!(service
            .create_from_estimate(pending.id, None)
            .unwrap_err()
            .is_validation());
        assert_eq!(storage.workorders.count().unwrap(), 1);
    }

    #[test]
    fn test_status_changes_keep_history() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let service = WorkorderService::new(&storage, &settings);
        let estimate = decided_estimate(&storage, &settings);
        let wo = service.create_from_estimate(estimate.id, None).unwrap();

        let err = service
            .change_status(wo.id, WorkorderStatus::Completed, None, None)
            .unwrap_err();
        assert!(err.is_invalid_transition());

        service
            .change_status(wo.id, WorkorderStatus::InProgress, None, Some("sam".into()))
            .unwrap();
        service
            .change_status(
                wo.id,
                WorkorderStatus::OnHold,
                Some("waiting on rotors".into()),
                None,
            )
            .unwrap();

        let history = service.history(wo.id).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].actor.as_deref(), Some("sam"));
        assert_eq!(history[2].from, Some(WorkorderStatus::InProgress));
        assert_eq!(history[2].note.as_deref(), Some("waiting on rotors"));

        let entries = storage.audit().read_all().unwrap();
        assert!(entries.iter().any(|e| e.actor.as_deref() == Some("sam")));
    }

    #[test]
    fn test_item_editing_and_lock() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let service = WorkorderService::new(&storage, &settings);
        let estimate = decided_estimate(&storage, &settings);
        let wo = service.create_from_estimate(estimate.id, None).unwrap();
        let job_id = wo.jobs[0].id;

        let (wo, shop_fee) = service
            .add_item(
                wo.id,
                job_id,
                LineInput::new(
                    ItemType::Fee,
                    "Shop supplies",
                    Quantity::units(1),
                    Money::from_cents(500),
                    false,
                ),
            )
            .unwrap();
        assert_eq!(wo.grand_total, Money::from_cents(6_500));

        let doubled = LineInput::new(
            ItemType::Fee,
            "Shop supplies",
            Quantity::units(2),
            Money::from_cents(500),
            false,
        );
        let wo = service.update_item(wo.id, shop_fee, doubled).unwrap();
        assert_eq!(wo.fees, Money::from_cents(1_000));

        let pads = wo.jobs[0].items[0].id;
        let wo = service.set_item_completed(wo.id, pads, true).unwrap();
        assert_eq!(wo.completed_item_count(), 1);

        let wo = service.remove_item(wo.id, shop_fee).unwrap();
        assert_eq!(wo.grand_total, Money::from_cents(6_000));
        assert!(service.remove_item(wo.id, shop_fee).unwrap_err().is_not_found());

        service
            .change_status(wo.id, WorkorderStatus::Cancelled, None, None)
            .unwrap();
        assert!(matches!(
            service.set_item_completed(wo.id, pads, false).unwrap_err(),
            ShopError::Locked(_)
        ));
    }

    #[test]
    fn test_sub_estimate_merge() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let service = WorkorderService::new(&storage, &settings);
        let estimate = decided_estimate(&storage, &settings);
        let wo = service.create_from_estimate(estimate.id, None).unwrap();

        let sub = service
            .create_sub_estimate(
                wo.id,
                vec![JobInput::new("Leaking hose").with_item(line("Radiator hose", 4_000))],
            )
            .unwrap();
        assert_eq!(sub.parent_workorder_id, Some(wo.id));
        assert_eq!(sub.customer_id, 7);
        assert_eq!(service.get(wo.id).unwrap().unwrap().sub_estimate_ids, vec![sub.id]);

        // Must be approved before merging
        assert!(service
            .merge_sub_estimate(wo.id, sub.id)
            .unwrap_err()
            .is_invalid_transition());

        let estimates = EstimateService::new(&storage, &settings);
        estimates.approve(sub.id).unwrap();
        assert!(estimates.convert_to_invoice(sub.id).unwrap_err().is_validation());

        let (merged, sub) = service.merge_sub_estimate(wo.id, sub.id).unwrap();
        assert_eq!(merged.jobs.len(), 2);
        assert_eq!(merged.jobs[1].source_estimate_id, sub.id);
        assert_eq!(merged.grand_total, Money::from_cents(10_000));
        assert_eq!(sub.status, EstimateStatus::Converted);
        assert!(service.merge_sub_estimate(wo.id, sub.id).is_err());

        // A sub-estimate of another workorder is refused
        let other = decided_estimate(&storage, &settings);
        assert!(service
            .merge_sub_estimate(wo.id, other.id)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_convert_to_invoice() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let service = WorkorderService::new(&storage, &settings);
        let estimate = decided_estimate(&storage, &settings);
        let wo = service.create_from_estimate(estimate.id, None).unwrap();

        assert!(service.convert_to_invoice(wo.id).unwrap_err().is_validation());

        service
            .change_status(wo.id, WorkorderStatus::InProgress, None, None)
            .unwrap();
        service
            .change_status(wo.id, WorkorderStatus::Completed, None, None)
            .unwrap();

        let (wo, invoice) = service.convert_to_invoice(wo.id).unwrap();
        assert_eq!(wo.invoice_id, Some(invoice.id));
        assert_eq!(invoice.source, InvoiceSource::Workorder(wo.id));
        assert_eq!(invoice.grand_total, wo.grand_total);
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert!(matches!(
            service.convert_to_invoice(wo.id).unwrap_err(),
            ShopError::Duplicate { .. }
        ));
    }
}
