//! Estimate CLI commands

use std::path::PathBuf;

use clap::Subcommand;

use super::{parse_date, parse_line_spec, read_input};
use crate::config::settings::Settings;
use crate::display::{format_estimate_details, format_estimate_list};
use crate::error::{ShopError, ShopResult};
use crate::models::{Estimate, EstimateStatus};
use crate::services::{
    today, EstimateEditorService, EstimateInput, EstimatePublicLinkService, EstimateService,
    ItemInput, JobInput, LineInput,
};
use crate::storage::{EstimateFilter, Storage};

/// Estimate subcommands
#[derive(Subcommand)]
pub enum EstimateCommands {
    /// Create a new estimate
    Create {
        /// Customer ID
        #[arg(short, long)]
        customer: Option<u64>,
        /// Vehicle ID
        #[arg(short, long)]
        vehicle: Option<u64>,
        /// Assigned technician ID
        #[arg(long)]
        technician: Option<u64>,
        /// Expiration date (YYYY-MM-DD); defaults to the shop's validity period
        #[arg(short, long)]
        expires: Option<String>,
        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Single-job shortcut: title of the first job
        #[arg(short, long)]
        job: Option<String>,
        /// Item for the shortcut job (type:description:quantity:price[:taxable])
        #[arg(short, long = "item", requires = "job")]
        items: Vec<String>,
        /// Read the whole estimate from a YAML or JSON file
        #[arg(short, long, conflicts_with_all = ["job", "items"])]
        from: Option<PathBuf>,
    },
    /// List estimates, newest first
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
        /// Filter by customer ID
        #[arg(short, long)]
        customer: Option<u64>,
        /// Filter by vehicle ID
        #[arg(short, long)]
        vehicle: Option<u64>,
        /// Filter by technician ID
        #[arg(long)]
        technician: Option<u64>,
        /// Created on or after (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// Created on or before (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// Search number, notes and job titles
        #[arg(short = 'q', long)]
        search: Option<String>,
        /// Maximum number to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show estimate details
    Show {
        /// Estimate number or ID
        estimate: String,
    },
    /// Edit header fields, or replace everything from a file
    Edit {
        /// Estimate number or ID
        estimate: String,
        #[arg(short, long)]
        customer: Option<u64>,
        #[arg(short, long)]
        vehicle: Option<u64>,
        #[arg(long)]
        technician: Option<u64>,
        /// Expiration date (YYYY-MM-DD)
        #[arg(short, long)]
        expires: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Read the whole estimate from a YAML or JSON file
        #[arg(short, long)]
        from: Option<PathBuf>,
    },
    /// Mark an estimate as sent to the customer
    Send { estimate: String },
    /// Approve every pending job on behalf of the customer
    Approve { estimate: String },
    /// Reject every pending job on behalf of the customer
    Reject {
        estimate: String,
        /// Reason given by the customer
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Mark an estimate as expired
    Expire { estimate: String },
    /// Expire every undecided estimate past its expiration date
    ExpireOverdue,
    /// Add a shop comment
    Comment {
        estimate: String,
        /// Comment text
        body: String,
        /// Author name
        #[arg(short, long, default_value = "shop")]
        author: String,
    },
    /// Invoice the approved work directly
    Invoice { estimate: String },
    /// Delete a pending estimate
    Delete {
        estimate: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle an estimate command
pub fn handle_estimate_command(
    storage: &Storage,
    settings: &Settings,
    cmd: EstimateCommands,
) -> ShopResult<()> {
    let service = EstimateService::new(storage, settings);
    let editor = EstimateEditorService::new(storage, settings);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        EstimateCommands::Create {
            customer,
            vehicle,
            technician,
            expires,
            notes,
            job,
            items,
            from,
        } => {
            let mut input = match from {
                Some(path) => read_input::<EstimateInput>(&path)?,
                None => EstimateInput::default(),
            };
            if let Some(customer) = customer {
                input.customer_id = customer;
            }
            if let Some(vehicle) = vehicle {
                input.vehicle_id = vehicle;
            }
            if technician.is_some() {
                input.technician_id = technician;
            }
            if let Some(expires) = expires {
                input.expiration_date = Some(parse_date(&expires)?);
            }
            if let Some(notes) = notes {
                input.notes = notes;
            }
            if let Some(title) = job {
                let mut job = JobInput::new(title);
                for spec in &items {
                    job = job.with_item(parse_line_spec(spec)?);
                }
                input.jobs.push(job);
            }

            let estimate = editor.create(input)?;
            println!(
                "Created estimate {} ({}) for {}",
                estimate.number,
                estimate.id,
                estimate.grand_total.format_with_symbol(currency)
            );
        }

        EstimateCommands::List {
            status,
            customer,
            vehicle,
            technician,
            since,
            until,
            search,
            limit,
        } => {
            let status = status
                .map(|s| {
                    EstimateStatus::parse(&s).ok_or_else(|| {
                        ShopError::Validation(format!(
                            "Invalid status: '{}'. Valid: pending, sent, approved, rejected, expired, converted",
                            s
                        ))
                    })
                })
                .transpose()?;
            let filter = EstimateFilter {
                status,
                customer_id: customer,
                vehicle_id: vehicle,
                technician_id: technician,
                created_from: since.as_deref().map(parse_date).transpose()?,
                created_to: until.as_deref().map(parse_date).transpose()?,
                text: search,
                limit,
                ..Default::default()
            };
            let estimates = service.list(&filter)?;
            print!("{}", format_estimate_list(&estimates, currency));
        }

        EstimateCommands::Show { estimate } => {
            let estimate = service.require(&estimate)?;
            let links = EstimatePublicLinkService::new(storage, settings)
                .list_for_estimate(estimate.id)?;
            print!("{}", format_estimate_details(&estimate, &links, currency));
        }

        EstimateCommands::Edit {
            estimate,
            customer,
            vehicle,
            technician,
            expires,
            notes,
            from,
        } => {
            let current = service.require(&estimate)?;
            let mut input = match from {
                Some(path) => read_input::<EstimateInput>(&path)?,
                None => input_from(&current),
            };
            if let Some(customer) = customer {
                input.customer_id = customer;
            }
            if let Some(vehicle) = vehicle {
                input.vehicle_id = vehicle;
            }
            if technician.is_some() {
                input.technician_id = technician;
            }
            if let Some(expires) = expires {
                input.expiration_date = Some(parse_date(&expires)?);
            }
            if let Some(notes) = notes {
                input.notes = notes;
            }

            let updated = editor.update(current.id, input)?;
            println!("Updated estimate {} ({})", updated.number, updated.status);
        }

        EstimateCommands::Send { estimate } => {
            let estimate = service.send(service.require(&estimate)?.id)?;
            println!("Estimate {} is now {}", estimate.number, estimate.status);
        }

        EstimateCommands::Approve { estimate } => {
            let estimate = service.approve(service.require(&estimate)?.id)?;
            println!("Estimate {} is now {}", estimate.number, estimate.status);
        }

        EstimateCommands::Reject { estimate, reason } => {
            let estimate = service.reject(service.require(&estimate)?.id, reason)?;
            println!("Estimate {} is now {}", estimate.number, estimate.status);
        }

        EstimateCommands::Expire { estimate } => {
            let estimate = service.expire(service.require(&estimate)?.id)?;
            println!("Estimate {} is now {}", estimate.number, estimate.status);
        }

        EstimateCommands::ExpireOverdue => {
            let expired = service.expire_overdue(today())?;
            if expired.is_empty() {
                println!("No estimates past their expiration date.");
            } else {
                for estimate in &expired {
                    println!("Expired {}", estimate.number);
                }
                println!("{} estimate(s) expired.", expired.len());
            }
        }

        EstimateCommands::Comment {
            estimate,
            body,
            author,
        } => {
            let estimate = service.add_comment(service.require(&estimate)?.id, &author, &body)?;
            println!(
                "Comment added to {} ({} total)",
                estimate.number,
                estimate.comments.len()
            );
        }

        EstimateCommands::Invoice { estimate } => {
            let (estimate, invoice) = service.convert_to_invoice(service.require(&estimate)?.id)?;
            println!(
                "Invoiced {} as {}: {} due {}",
                estimate.number,
                invoice.number,
                invoice.grand_total.format_with_symbol(currency),
                invoice.due_date
            );
        }

        EstimateCommands::Delete { estimate, force } => {
            let current = service.require(&estimate)?;
            if !force {
                println!(
                    "This will delete estimate {} and revoke its links.",
                    current.number
                );
                println!("To proceed, run again with --force flag:");
                println!("  shopfloor estimate delete {} --force", estimate);
                return Ok(());
            }
            let deleted = service.delete(current.id)?;
            println!("Deleted estimate {}", deleted.number);
        }
    }

    Ok(())
}

/// The editable content of an estimate, keeping job and item ids and
/// decisions
fn input_from(estimate: &Estimate) -> EstimateInput {
    EstimateInput {
        customer_id: estimate.customer_id,
        vehicle_id: estimate.vehicle_id,
        technician_id: estimate.technician_id,
        expiration_date: estimate.expiration_date,
        notes: estimate.notes.clone(),
        jobs: estimate
            .jobs
            .iter()
            .map(|job| JobInput {
                id: Some(job.id),
                title: job.title.clone(),
                service_type: job.service_type.clone(),
                items: job
                    .items
                    .iter()
                    .map(|item| ItemInput {
                        id: Some(item.id),
                        line: LineInput::new(
                            item.item_type,
                            item.description.clone(),
                            item.quantity,
                            item.unit_price,
                            item.taxable,
                        ),
                        status: Some(item.status),
                    })
                    .collect(),
            })
            .collect(),
    }
}
