//! Audit log CLI commands

use clap::Subcommand;

use crate::error::ShopResult;
use crate::storage::Storage;

/// Audit subcommands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// Show the most recent entries
    List {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show every entry for one record
    Show {
        /// Estimate, workorder or invoice number, or any record ID
        record: String,
    },
}

/// Handle an audit command
pub fn handle_audit_command(storage: &Storage, cmd: AuditCommands) -> ShopResult<()> {
    let entries = match cmd {
        AuditCommands::List { limit } => storage.audit().read_recent(limit)?,
        AuditCommands::Show { record } => {
            let entity_id = resolve_entity_id(storage, &record)?;
            storage.audit().read_for_entity(&entity_id)?
        }
    };

    if entries.is_empty() {
        println!("No audit entries found.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}

/// Map a document number to the id its audit entries are keyed by
fn resolve_entity_id(storage: &Storage, record: &str) -> ShopResult<String> {
    if let Some(estimate) = storage.estimates.get_by_number(record)? {
        return Ok(estimate.id.to_string());
    }
    if let Some(workorder) = storage.workorders.get_by_number(record)? {
        return Ok(workorder.id.to_string());
    }
    if let Some(invoice) = storage.invoices.get_by_number(record)? {
        return Ok(invoice.id.to_string());
    }
    Ok(record.trim().to_string())
}
