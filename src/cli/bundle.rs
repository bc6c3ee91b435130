//! Bundle CLI commands

use std::path::PathBuf;

use clap::Subcommand;

use super::{parse_line_spec, read_input};
use crate::config::settings::Settings;
use crate::display::{format_bundle_details, format_bundle_list};
use crate::error::ShopResult;
use crate::models::Bundle;
use crate::services::{BundleInput, BundleService, EstimateService, LineInput};
use crate::storage::Storage;

/// Bundle subcommands
#[derive(Subcommand)]
pub enum BundleCommands {
    /// Create a bundle
    Create {
        /// Bundle name
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        service_type: Option<String>,
        /// Item (type:description:quantity:price[:taxable]); repeatable
        #[arg(short, long = "item")]
        items: Vec<String>,
        /// Read the bundle from a YAML or JSON file
        #[arg(short, long)]
        from: Option<PathBuf>,
    },
    /// List bundles
    List {
        /// Include inactive bundles
        #[arg(short, long)]
        all: bool,
    },
    /// Show bundle details
    Show {
        /// Bundle name or ID
        bundle: String,
    },
    /// Edit a bundle; items given here replace the existing ones
    Edit {
        bundle: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        service_type: Option<String>,
        #[arg(short, long = "item")]
        items: Vec<String>,
    },
    /// Hide a bundle from use
    Deactivate { bundle: String },
    /// Make a bundle usable again
    Activate { bundle: String },
    /// Delete a bundle
    Delete { bundle: String },
    /// Add a bundle to an estimate as a new job
    Apply {
        /// Bundle name or ID
        bundle: String,
        /// Estimate number or ID
        estimate: String,
    },
}

/// Handle a bundle command
pub fn handle_bundle_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BundleCommands,
) -> ShopResult<()> {
    let service = BundleService::new(storage, settings);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        BundleCommands::Create {
            name,
            description,
            service_type,
            items,
            from,
        } => {
            let mut input = match from {
                Some(path) => read_input::<BundleInput>(&path)?,
                None => BundleInput::default(),
            };
            if let Some(name) = name {
                input.name = name;
            }
            if let Some(description) = description {
                input.description = description;
            }
            if service_type.is_some() {
                input.service_type = service_type;
            }
            for spec in &items {
                input.items.push(parse_line_spec(spec)?);
            }

            let bundle = service.create(input)?;
            println!(
                "Created bundle '{}' ({}) with {} item(s)",
                bundle.name,
                bundle.id,
                bundle.items.len()
            );
        }

        BundleCommands::List { all } => {
            let bundles = service.list(all)?;
            print!("{}", format_bundle_list(&bundles, currency));
        }

        BundleCommands::Show { bundle } => {
            let bundle = service.require(&bundle)?;
            print!("{}", format_bundle_details(&bundle, currency));
        }

        BundleCommands::Edit {
            bundle,
            name,
            description,
            service_type,
            items,
        } => {
            let current = service.require(&bundle)?;
            let mut input = input_from(&current);
            if let Some(name) = name {
                input.name = name;
            }
            if let Some(description) = description {
                input.description = description;
            }
            if service_type.is_some() {
                input.service_type = service_type;
            }
            if !items.is_empty() {
                input.items = items
                    .iter()
                    .map(|spec| parse_line_spec(spec))
                    .collect::<ShopResult<_>>()?;
            }

            let bundle = service.update(current.id, input)?;
            println!("Updated bundle '{}'", bundle.name);
        }

        BundleCommands::Deactivate { bundle } => {
            let bundle = service.deactivate(service.require(&bundle)?.id)?;
            println!("Bundle '{}' deactivated", bundle.name);
        }

        BundleCommands::Activate { bundle } => {
            let bundle = service.activate(service.require(&bundle)?.id)?;
            println!("Bundle '{}' activated", bundle.name);
        }

        BundleCommands::Delete { bundle } => {
            let bundle = service.delete(service.require(&bundle)?.id)?;
            println!("Deleted bundle '{}'", bundle.name);
        }

        BundleCommands::Apply { bundle, estimate } => {
            let bundle = service.require(&bundle)?;
            let estimate = EstimateService::new(storage, settings).require(&estimate)?;
            let (estimate, job_id) = service.apply_to_estimate(estimate.id, bundle.id)?;
            println!(
                "Added '{}' to {} as job {} (total now {})",
                bundle.name,
                estimate.number,
                job_id,
                estimate.grand_total.format_with_symbol(currency)
            );
        }
    }

    Ok(())
}

fn input_from(bundle: &Bundle) -> BundleInput {
    BundleInput {
        name: bundle.name.clone(),
        description: bundle.description.clone(),
        service_type: bundle.service_type.clone(),
        items: bundle
            .items
            .iter()
            .map(|i| {
                LineInput::new(
                    i.item_type,
                    i.description.clone(),
                    i.quantity,
                    i.unit_price,
                    i.taxable,
                )
            })
            .collect(),
    }
}
