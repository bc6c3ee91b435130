//! Job and line item CLI commands
//!
//! Jobs and items are addressed by the short ids shown in
//! `estimate show` (`job-1a2b3c4d`, `itm-5e6f7a8b`).

use clap::Subcommand;

use super::{parse_line_spec, LineArgs};
use crate::config::settings::Settings;
use crate::error::{ShopError, ShopResult};
use crate::models::{ApprovalStatus, Estimate, ItemId, JobId};
use crate::services::{EstimateEditorService, EstimateService, JobInput};
use crate::storage::Storage;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Add a job to an estimate
    Add {
        /// Estimate number or ID
        estimate: String,
        /// Job title
        title: String,
        /// Service type (e.g. "brakes")
        #[arg(short, long)]
        service_type: Option<String>,
        /// Item (type:description:quantity:price[:taxable]); repeatable
        #[arg(short, long = "item")]
        items: Vec<String>,
    },
    /// Remove a job from an estimate
    Remove { estimate: String, job: String },
    /// Record the customer's approval of a job
    Approve { estimate: String, job: String },
    /// Record the customer's rejection of a job
    Reject {
        estimate: String,
        job: String,
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Add an item to a job
    AddItem {
        estimate: String,
        job: String,
        #[command(flatten)]
        line: LineArgs,
    },
    /// Remove an item
    RemoveItem { estimate: String, item: String },
    /// Set a single item's decision (pending, approved, rejected)
    SetItem {
        estimate: String,
        item: String,
        status: String,
    },
}

/// Handle a job command
pub fn handle_job_command(
    storage: &Storage,
    settings: &Settings,
    cmd: JobCommands,
) -> ShopResult<()> {
    let estimates = EstimateService::new(storage, settings);
    let editor = EstimateEditorService::new(storage, settings);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        JobCommands::Add {
            estimate,
            title,
            service_type,
            items,
        } => {
            let estimate = estimates.require(&estimate)?;
            let mut input = JobInput::new(title);
            input.service_type = service_type;
            for spec in &items {
                input = input.with_item(parse_line_spec(spec)?);
            }
            let (estimate, job_id) = editor.add_job(estimate.id, input)?;
            println!(
                "Added job {} to {} (total now {})",
                job_id,
                estimate.number,
                estimate.grand_total.format_with_symbol(currency)
            );
        }

        JobCommands::Remove { estimate, job } => {
            let estimate = estimates.require(&estimate)?;
            let job_id = resolve_job(&estimate, &job)?;
            let estimate = editor.remove_job(estimate.id, job_id)?;
            println!("Removed job {} from {}", job_id, estimate.number);
        }

        JobCommands::Approve { estimate, job } => {
            let estimate = estimates.require(&estimate)?;
            let job_id = resolve_job(&estimate, &job)?;
            let estimate =
                editor.set_job_status(estimate.id, job_id, ApprovalStatus::Approved, None)?;
            println!(
                "Job {} approved; estimate {} is {}",
                job_id, estimate.number, estimate.status
            );
        }

        JobCommands::Reject {
            estimate,
            job,
            reason,
        } => {
            let estimate = estimates.require(&estimate)?;
            let job_id = resolve_job(&estimate, &job)?;
            let estimate =
                editor.set_job_status(estimate.id, job_id, ApprovalStatus::Rejected, reason)?;
            println!(
                "Job {} rejected; estimate {} is {}",
                job_id, estimate.number, estimate.status
            );
        }

        JobCommands::AddItem {
            estimate,
            job,
            line,
        } => {
            let estimate = estimates.require(&estimate)?;
            let job_id = resolve_job(&estimate, &job)?;
            let (estimate, item_id) = editor.add_item(estimate.id, job_id, line.into_line()?)?;
            println!(
                "Added item {} (total now {})",
                item_id,
                estimate.grand_total.format_with_symbol(currency)
            );
        }

        JobCommands::RemoveItem { estimate, item } => {
            let estimate = estimates.require(&estimate)?;
            let (job_id, item_id) = resolve_item(&estimate, &item)?;
            let estimate = editor.remove_item(estimate.id, job_id, item_id)?;
            println!(
                "Removed item {} (total now {})",
                item_id,
                estimate.grand_total.format_with_symbol(currency)
            );
        }

        JobCommands::SetItem {
            estimate,
            item,
            status,
        } => {
            let status = ApprovalStatus::parse(&status).ok_or_else(|| {
                ShopError::Validation(format!(
                    "Invalid decision: '{}'. Valid: pending, approved, rejected",
                    status
                ))
            })?;
            let estimate = estimates.require(&estimate)?;
            let (job_id, item_id) = resolve_item(&estimate, &item)?;
            let estimate = editor.set_item_status(estimate.id, job_id, item_id, status)?;
            println!(
                "Item {} is {}; estimate {} is {}",
                item_id, status, estimate.number, estimate.status
            );
        }
    }

    Ok(())
}

pub(crate) fn resolve_job(estimate: &Estimate, reference: &str) -> ShopResult<JobId> {
    estimate
        .find_job_id(reference)
        .ok_or_else(|| ShopError::job_not_found(reference))
}

fn resolve_item(estimate: &Estimate, reference: &str) -> ShopResult<(JobId, ItemId)> {
    estimate
        .find_item_id(reference)
        .ok_or_else(|| ShopError::item_not_found(reference))
}
