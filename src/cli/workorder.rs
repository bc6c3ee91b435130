//! Workorder CLI commands

use std::path::PathBuf;

use clap::Subcommand;

use super::{parse_item_type, parse_line_spec, parse_money, parse_quantity, read_input, LineArgs};
use crate::config::settings::Settings;
use crate::display::{format_history, format_workorder_details, format_workorder_list};
use crate::error::{ShopError, ShopResult};
use crate::models::{ItemId, JobId, Workorder, WorkorderStatus};
use crate::services::{EstimateService, JobInput, LineInput, WorkorderService};
use crate::storage::{Storage, WorkorderFilter};

/// Workorder subcommands
#[derive(Subcommand)]
pub enum WorkorderCommands {
    /// Open a workorder for the approved work on an estimate
    Create {
        /// Estimate number or ID
        estimate: String,
        /// Assigned technician ID
        #[arg(short, long)]
        technician: Option<u64>,
    },
    /// List workorders, newest first
    List {
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        customer: Option<u64>,
        #[arg(short, long)]
        technician: Option<u64>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show workorder details
    Show {
        /// Workorder number or ID
        workorder: String,
    },
    /// Move a workorder to a new status
    Status {
        workorder: String,
        /// in_progress, on_hold, completed or cancelled
        status: String,
        #[arg(short, long)]
        note: Option<String>,
        /// Who made the change
        #[arg(short, long)]
        actor: Option<String>,
    },
    /// Show the status history
    History { workorder: String },
    /// Add an item to a job on the workorder
    AddItem {
        workorder: String,
        job: String,
        #[command(flatten)]
        line: LineArgs,
    },
    /// Change an item; omitted fields keep their value
    EditItem {
        workorder: String,
        item: String,
        #[arg(short = 't', long = "type")]
        item_type: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        quantity: Option<String>,
        #[arg(short, long)]
        price: Option<String>,
        #[arg(long)]
        taxable: Option<bool>,
    },
    /// Remove an item
    RemoveItem { workorder: String, item: String },
    /// Mark an item done
    Done {
        workorder: String,
        item: String,
        /// Mark it not done instead
        #[arg(long)]
        undo: bool,
    },
    /// Write up additional work found during the job as a new estimate
    SubEstimate {
        workorder: String,
        /// Title of a single job
        #[arg(short, long, required_unless_present = "from")]
        job: Option<String>,
        #[arg(short, long)]
        service_type: Option<String>,
        /// Item for the job (type:description:quantity:price[:taxable])
        #[arg(short, long = "item", requires = "job")]
        items: Vec<String>,
        /// Read a list of jobs from a YAML or JSON file
        #[arg(short, long, conflicts_with = "job")]
        from: Option<PathBuf>,
    },
    /// Fold an approved sub-estimate into the workorder
    Merge {
        workorder: String,
        /// Sub-estimate number or ID
        estimate: String,
    },
    /// Invoice a completed workorder
    Invoice { workorder: String },
}

/// Handle a workorder command
pub fn handle_workorder_command(
    storage: &Storage,
    settings: &Settings,
    cmd: WorkorderCommands,
) -> ShopResult<()> {
    let service = WorkorderService::new(storage, settings);
    let estimates = EstimateService::new(storage, settings);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        WorkorderCommands::Create {
            estimate,
            technician,
        } => {
            let estimate = estimates.require(&estimate)?;
            let workorder = service.create_from_estimate(estimate.id, technician)?;
            println!(
                "Created workorder {} from {} ({} item(s), {})",
                workorder.number,
                estimate.number,
                workorder.item_count(),
                workorder.grand_total.format_with_symbol(currency)
            );
        }

        WorkorderCommands::List {
            status,
            customer,
            technician,
            limit,
        } => {
            let filter = WorkorderFilter {
                status: status.as_deref().map(parse_status).transpose()?,
                customer_id: customer,
                technician_id: technician,
                limit,
            };
            let workorders = service.list(&filter)?;
            print!("{}", format_workorder_list(&workorders, currency));
        }

        WorkorderCommands::Show { workorder } => {
            let workorder = service.require(&workorder)?;
            print!("{}", format_workorder_details(&workorder, currency));
        }

        WorkorderCommands::Status {
            workorder,
            status,
            note,
            actor,
        } => {
            let to = parse_status(&status)?;
            let id = service.require(&workorder)?.id;
            let workorder = service.change_status(id, to, note, actor)?;
            println!("Workorder {} is now {}", workorder.number, workorder.status);
        }

        WorkorderCommands::History { workorder } => {
            let workorder = service.require(&workorder)?;
            println!("History of {}", workorder.number);
            print!("{}", format_history(&service.history(workorder.id)?));
        }

        WorkorderCommands::AddItem {
            workorder,
            job,
            line,
        } => {
            let workorder = service.require(&workorder)?;
            let job_id = resolve_job(&workorder, &job)?;
            let line = line.into_line()?;
            let (workorder, item_id) = service.add_item(workorder.id, job_id, line)?;
            println!(
                "Added item {} to {} (total now {})",
                item_id,
                workorder.number,
                workorder.grand_total.format_with_symbol(currency)
            );
        }

        WorkorderCommands::EditItem {
            workorder,
            item,
            item_type,
            description,
            quantity,
            price,
            taxable,
        } => {
            let workorder = service.require(&workorder)?;
            let item_id = resolve_item(&workorder, &item)?;
            let current = workorder
                .jobs
                .iter()
                .flat_map(|j| j.items.iter())
                .find(|i| i.id == item_id)
                .ok_or_else(|| ShopError::item_not_found(item.as_str()))?;

            let line = LineInput::new(
                match item_type {
                    Some(t) => parse_item_type(&t)?,
                    None => current.item_type,
                },
                description.unwrap_or_else(|| current.description.clone()),
                match quantity {
                    Some(q) => parse_quantity(&q)?,
                    None => current.quantity,
                },
                match price {
                    Some(p) => parse_money(&p)?,
                    None => current.unit_price,
                },
                taxable.unwrap_or(current.taxable),
            );
            let workorder = service.update_item(workorder.id, item_id, line)?;
            println!(
                "Updated item {} (total now {})",
                item_id,
                workorder.grand_total.format_with_symbol(currency)
            );
        }

        WorkorderCommands::RemoveItem { workorder, item } => {
            let workorder = service.require(&workorder)?;
            let item_id = resolve_item(&workorder, &item)?;
            let workorder = service.remove_item(workorder.id, item_id)?;
            println!(
                "Removed item {} (total now {})",
                item_id,
                workorder.grand_total.format_with_symbol(currency)
            );
        }

        WorkorderCommands::Done {
            workorder,
            item,
            undo,
        } => {
            let workorder = service.require(&workorder)?;
            let item_id = resolve_item(&workorder, &item)?;
            let workorder = service.set_item_completed(workorder.id, item_id, !undo)?;
            println!(
                "{}: {}/{} items done",
                workorder.number,
                workorder.completed_item_count(),
                workorder.item_count()
            );
        }

        WorkorderCommands::SubEstimate {
            workorder,
            job,
            service_type,
            items,
            from,
        } => {
            let workorder = service.require(&workorder)?;
            let jobs = match (from, job) {
                (Some(path), _) => read_input::<Vec<JobInput>>(&path)?,
                (None, Some(title)) => {
                    let mut job = JobInput::new(title);
                    job.service_type = service_type;
                    for spec in &items {
                        job = job.with_item(parse_line_spec(spec)?);
                    }
                    vec![job]
                }
                (None, None) => Vec::new(),
            };
            let estimate = service.create_sub_estimate(workorder.id, jobs)?;
            println!(
                "Created estimate {} for additional work on {}",
                estimate.number, workorder.number
            );
        }

        WorkorderCommands::Merge {
            workorder,
            estimate,
        } => {
            let workorder = service.require(&workorder)?;
            let estimate = estimates.require(&estimate)?;
            let (workorder, estimate) = service.merge_sub_estimate(workorder.id, estimate.id)?;
            println!(
                "Merged {} into {} (total now {})",
                estimate.number,
                workorder.number,
                workorder.grand_total.format_with_symbol(currency)
            );
        }

        WorkorderCommands::Invoice { workorder } => {
            let workorder = service.require(&workorder)?;
            let (workorder, invoice) = service.convert_to_invoice(workorder.id)?;
            println!(
                "Invoiced {} as {}: {} due {}",
                workorder.number,
                invoice.number,
                invoice.grand_total.format_with_symbol(currency),
                invoice.due_date
            );
        }
    }

    Ok(())
}

fn parse_status(s: &str) -> ShopResult<WorkorderStatus> {
    WorkorderStatus::parse(s).ok_or_else(|| {
        ShopError::Validation(format!(
            "Invalid status: '{}'. Valid: pending, in_progress, on_hold, completed, cancelled",
            s
        ))
    })
}

fn resolve_job(workorder: &Workorder, reference: &str) -> ShopResult<JobId> {
    workorder
        .find_job_id(reference)
        .ok_or_else(|| ShopError::job_not_found(reference))
}

fn resolve_item(workorder: &Workorder, reference: &str) -> ShopResult<ItemId> {
    workorder
        .find_item_id(reference)
        .ok_or_else(|| ShopError::item_not_found(reference))
}
