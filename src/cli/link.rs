//! Public link CLI commands (shop side)

use chrono::Utc;
use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_issued_link, format_link_list};
use crate::error::{ShopError, ShopResult};
use crate::services::{EstimatePublicLinkService, EstimateService};
use crate::storage::Storage;

/// Link subcommands
#[derive(Subcommand)]
pub enum LinkCommands {
    /// Issue a customer link for an estimate, replacing any active one
    Issue {
        /// Estimate number or ID
        estimate: String,
    },
    /// List the links issued for an estimate
    List { estimate: String },
    /// Revoke a link
    Revoke {
        /// Link ID or short code
        link: String,
    },
}

/// Handle a link command
pub fn handle_link_command(
    storage: &Storage,
    settings: &Settings,
    cmd: LinkCommands,
) -> ShopResult<()> {
    let service = EstimatePublicLinkService::new(storage, settings);
    let estimates = EstimateService::new(storage, settings);

    match cmd {
        LinkCommands::Issue { estimate } => {
            let estimate = estimates.require(&estimate)?;
            let issued = service.issue(estimate.id)?;
            print!("{}", format_issued_link(&issued));
        }

        LinkCommands::List { estimate } => {
            let estimate = estimates.require(&estimate)?;
            let links = service.list_for_estimate(estimate.id)?;
            print!("{}", format_link_list(&links, Utc::now()));
        }

        LinkCommands::Revoke { link } => {
            let found = service
                .find(&link)?
                .ok_or_else(|| ShopError::link_not_found(link.as_str()))?;
            let link = service.revoke(found.id)?;
            println!("Revoked link {} ({})", link.id, link.short_code);
        }
    }

    Ok(())
}
