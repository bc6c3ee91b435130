//! Invoice display formatting

use chrono::NaiveDate;
use tabled::Tabled;

use super::{push_amount, table, truncate};
use crate::models::Invoice;

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Customer")]
    customer: u64,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Balance")]
    balance: String,
}

/// Overdue invoices get a `!` after their due date
pub fn format_invoice_list(invoices: &[Invoice], today: NaiveDate, currency: &str) -> String {
    let rows = invoices
        .iter()
        .map(|i| InvoiceRow {
            number: i.number.clone(),
            status: i.status.to_string(),
            customer: i.customer_id,
            due: if i.is_overdue(today) {
                format!("{} !", i.due_date)
            } else {
                i.due_date.to_string()
            },
            total: i.grand_total.format_with_symbol(currency),
            balance: i.balance_due.format_with_symbol(currency),
        })
        .collect();
    table(rows, "No invoices found.")
}

pub fn format_invoice_details(invoice: &Invoice, today: NaiveDate, currency: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice {}  ({})\n", invoice.number, invoice.id));
    output.push_str(&format!("  Status:      {}\n", invoice.status));
    output.push_str(&format!("  Source:      {}\n", invoice.source));
    output.push_str(&format!("  Customer:    {}\n", invoice.customer_id));
    output.push_str(&format!("  Vehicle:     {}\n", invoice.vehicle_id));
    output.push_str(&format!("  Issued:      {}\n", invoice.issue_date));
    output.push_str(&format!(
        "  Due:         {}{}\n",
        invoice.due_date,
        if invoice.is_overdue(today) { "  (overdue)" } else { "" }
    ));
    if let Some(reason) = &invoice.void_reason {
        output.push_str(&format!("  Voided:      {}\n", reason));
    }

    for section in &invoice.sections {
        output.push_str(&format!("\n  {}\n", section.title));
        for line in &section.lines {
            output.push_str(&format!(
                "    {:<9} {:<30} {:>6} x {:>10} = {:>10}{}\n",
                line.item_type.to_string(),
                truncate(&line.description, 30),
                line.quantity.to_string(),
                line.unit_price.format_with_symbol(currency),
                line.line_total.format_with_symbol(currency),
                if line.taxable { "  T" } else { "" }
            ));
        }
    }

    output.push('\n');
    push_amount(&mut output, "Subtotal:", invoice.subtotal, currency);
    push_amount(&mut output, "Fees:", invoice.fees, currency);
    push_amount(&mut output, "Discounts:", invoice.discounts, currency);
    push_amount(&mut output, "Tax:", invoice.tax, currency);
    push_amount(&mut output, "Total:", invoice.grand_total, currency);
    push_amount(&mut output, "Paid:", invoice.amount_paid, currency);
    push_amount(&mut output, "Balance:", invoice.balance_due, currency);

    if !invoice.payments.is_empty() {
        output.push_str("\n  Payments:\n");
        for payment in &invoice.payments {
            output.push_str(&format!(
                "    {}  {:>10}  {}{}\n",
                payment.received_at.format("%Y-%m-%d"),
                payment.amount.format_with_symbol(currency),
                payment.method,
                payment
                    .reference
                    .as_ref()
                    .map(|r| format!(" ({})", r))
                    .unwrap_or_default()
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EstimateId, InvoiceLine, InvoiceSection, InvoiceSource, ItemType, Money, Payment, Quantity,
    };
    use chrono::Utc;

    fn sample_invoice() -> Invoice {
        let line = InvoiceLine {
            item_type: ItemType::Part,
            description: "Wiper blades".into(),
            quantity: Quantity::units(2),
            unit_price: Money::from_cents(1_500),
            taxable: false,
            line_total: Money::from_cents(3_000),
        };
        Invoice::new(
            "INV-000001",
            InvoiceSource::Estimate(EstimateId::new()),
            1,
            2,
            0,
            vec![InvoiceSection {
                title: "Wipers".into(),
                lines: vec![line],
            }],
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        )
    }

    #[test]
    fn test_overdue_marker() {
        let invoice = sample_invoice();
        let before = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let after = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();

        let invoices = std::slice::from_ref(&invoice);
        assert!(!format_invoice_list(invoices, before, "$").contains(" !"));
        assert!(format_invoice_list(invoices, after, "$").contains("2026-03-31 !"));
        assert!(format_invoice_details(&invoice, after, "$").contains("(overdue)"));
    }

    #[test]
    fn test_details_show_payments() {
        let mut invoice = sample_invoice();
        invoice.apply_payment(Payment {
            amount: Money::from_cents(1_000),
            method: "card".into(),
            reference: Some("auth 7731".into()),
            received_at: Utc::now(),
        });
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let text = format_invoice_details(&invoice, today, "$");

        assert!(text.contains("Wiper blades"));
        assert!(text.contains("card (auth 7731)"));
        assert!(text.contains("$20.00"));
    }
}
