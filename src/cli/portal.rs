//! Customer portal CLI commands
//!
//! Everything here acts through a public link token (or its short code),
//! exactly as a customer would.

use clap::Subcommand;

use super::job::resolve_job;
use crate::config::settings::Settings;
use crate::display::format_estimate_details;
use crate::error::ShopResult;
use crate::services::EstimatePublicLinkService;
use crate::storage::Storage;

/// Portal subcommands
#[derive(Subcommand)]
pub enum PortalCommands {
    /// View the estimate behind a link
    View {
        /// Link token or short code
        token: String,
    },
    /// Approve a job
    Approve { token: String, job: String },
    /// Decline a job
    Reject {
        token: String,
        job: String,
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Sign the estimate once every job is decided
    Sign {
        token: String,
        /// Signer's full name
        #[arg(short, long)]
        name: String,
        /// Base64 signature image, optionally as a data: URL
        #[arg(short, long)]
        signature: String,
    },
    /// Leave a comment for the shop
    Comment {
        token: String,
        body: String,
        #[arg(short, long, default_value = "")]
        author: String,
    },
}

/// Handle a portal command
pub fn handle_portal_command(
    storage: &Storage,
    settings: &Settings,
    cmd: PortalCommands,
) -> ShopResult<()> {
    let service = EstimatePublicLinkService::new(storage, settings);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        PortalCommands::View { token } => {
            let (_, estimate) = service.resolve(&token)?;
            println!("{}", settings.shop_name);
            println!();
            print!("{}", format_estimate_details(&estimate, &[], currency));
        }

        PortalCommands::Approve { token, job } => {
            let job_id = resolve_job(&service.peek_estimate(&token)?, &job)?;
            let estimate = service.approve_job(&token, job_id)?;
            println!("Approved. Estimate {} is {}", estimate.number, estimate.status);
        }

        PortalCommands::Reject { token, job, reason } => {
            let job_id = resolve_job(&service.peek_estimate(&token)?, &job)?;
            let estimate = service.reject_job(&token, job_id, reason)?;
            println!("Declined. Estimate {} is {}", estimate.number, estimate.status);
        }

        PortalCommands::Sign {
            token,
            name,
            signature,
        } => {
            let estimate = service.sign(&token, &name, &signature)?;
            println!("Estimate {} signed by {}", estimate.number, name.trim());
        }

        PortalCommands::Comment {
            token,
            body,
            author,
        } => {
            let estimate = service.comment(&token, &author, &body)?;
            println!("Comment sent for estimate {}", estimate.number);
        }
    }

    Ok(())
}
