//! Invoice CLI commands

use clap::Subcommand;

use super::parse_money;
use crate::config::settings::Settings;
use crate::display::{format_invoice_details, format_invoice_list};
use crate::error::{ShopError, ShopResult};
use crate::models::InvoiceStatus;
use crate::services::{today, InvoiceService};
use crate::storage::{InvoiceFilter, Storage};

/// Invoice subcommands
#[derive(Subcommand)]
pub enum InvoiceCommands {
    /// List invoices, newest first
    List {
        /// unpaid, partial, paid or void
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        customer: Option<u64>,
        /// Only invoices past their due date
        #[arg(short, long)]
        overdue: bool,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show invoice details
    Show {
        /// Invoice number or ID
        invoice: String,
    },
    /// Record a payment
    Pay {
        invoice: String,
        /// Amount received (e.g. "150.00")
        amount: String,
        /// Payment method (cash, card, check, ...)
        #[arg(short, long, default_value = "cash")]
        method: String,
        /// Check number, card authorization, etc.
        #[arg(short, long)]
        reference: Option<String>,
    },
    /// Void an invoice that has no payments
    Void {
        invoice: String,
        #[arg(short, long)]
        reason: String,
    },
}

/// Handle an invoice command
pub fn handle_invoice_command(
    storage: &Storage,
    settings: &Settings,
    cmd: InvoiceCommands,
) -> ShopResult<()> {
    let service = InvoiceService::new(storage, settings);
    let currency = settings.currency_symbol.as_str();
    let today = today();

    match cmd {
        InvoiceCommands::List {
            status,
            customer,
            overdue,
            limit,
        } => {
            let status = status
                .map(|s| {
                    InvoiceStatus::parse(&s).ok_or_else(|| {
                        ShopError::Validation(format!(
                            "Invalid status: '{}'. Valid: unpaid, partial, paid, void",
                            s
                        ))
                    })
                })
                .transpose()?;
            let filter = InvoiceFilter {
                status,
                customer_id: customer,
                overdue_on: overdue.then_some(today),
                limit,
            };
            let invoices = service.list(&filter)?;
            print!("{}", format_invoice_list(&invoices, today, currency));
        }

        InvoiceCommands::Show { invoice } => {
            let invoice = service.require(&invoice)?;
            print!("{}", format_invoice_details(&invoice, today, currency));
        }

        InvoiceCommands::Pay {
            invoice,
            amount,
            method,
            reference,
        } => {
            let amount = parse_money(&amount)?;
            let invoice = service.require(&invoice)?;
            let invoice = service.record_payment(invoice.id, amount, &method, reference)?;
            println!(
                "Recorded {} on {}; balance due {} ({})",
                amount.format_with_symbol(currency),
                invoice.number,
                invoice.balance_due.format_with_symbol(currency),
                invoice.status
            );
        }

        InvoiceCommands::Void { invoice, reason } => {
            let invoice = service.void(service.require(&invoice)?.id, &reason)?;
            println!("Invoice {} voided", invoice.number);
        }
    }

    Ok(())
}
