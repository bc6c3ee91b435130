//! Estimate display formatting

use tabled::Tabled;

use super::{or_dash, push_amount, table, truncate};
use crate::models::{Estimate, EstimatePublicLink};

#[derive(Tabled)]
struct EstimateRow {
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Customer")]
    customer: u64,
    #[tabled(rename = "Vehicle")]
    vehicle: u64,
    #[tabled(rename = "Jobs")]
    jobs: usize,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Expires")]
    expires: String,
}

pub fn format_estimate_list(estimates: &[Estimate], currency: &str) -> String {
    let rows = estimates
        .iter()
        .map(|e| EstimateRow {
            number: e.number.clone(),
            status: e.status.to_string(),
            customer: e.customer_id,
            vehicle: e.vehicle_id,
            jobs: e.jobs.len(),
            total: e.grand_total.format_with_symbol(currency),
            expires: or_dash(e.expiration_date),
        })
        .collect();
    table(rows, "No estimates found.")
}

/// Header, jobs with their items, totals and the customer thread
pub fn format_estimate_details(
    estimate: &Estimate,
    links: &[EstimatePublicLink],
    currency: &str,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Estimate {}  ({})\n", estimate.number, estimate.id));
    output.push_str(&format!("  Status:      {}\n", estimate.status));
    output.push_str(&format!("  Customer:    {}\n", estimate.customer_id));
    output.push_str(&format!("  Vehicle:     {}\n", estimate.vehicle_id));
    output.push_str(&format!("  Technician:  {}\n", or_dash(estimate.technician_id)));
    output.push_str(&format!("  Expires:     {}\n", or_dash(estimate.expiration_date)));
    if let Some(reason) = &estimate.rejection_reason {
        output.push_str(&format!("  Rejected:    {}\n", reason));
    }
    if !estimate.notes.is_empty() {
        output.push_str(&format!("  Notes:       {}\n", estimate.notes));
    }

    for job in &estimate.jobs {
        output.push_str(&format!(
            "\n  [{}] {}  {}  {}\n",
            job.customer_status,
            job.title,
            job.id,
            job.total.format_with_symbol(currency)
        ));
        for item in &job.items {
            output.push_str(&format!(
                "      {:<9} {:<30} {:>6} x {:>10} = {:>10}  {}{}\n",
                item.item_type.to_string(),
                truncate(&item.description, 30),
                item.quantity.to_string(),
                item.unit_price.format_with_symbol(currency),
                item.line_total.format_with_symbol(currency),
                item.status,
                if item.taxable { "  T" } else { "" }
            ));
        }
    }

    output.push('\n');
    push_amount(&mut output, "Subtotal:", estimate.subtotal, currency);
    push_amount(&mut output, "Fees:", estimate.fees, currency);
    push_amount(&mut output, "Discounts:", estimate.discounts, currency);
    push_amount(&mut output, "Tax:", estimate.tax, currency);
    push_amount(&mut output, "Total:", estimate.grand_total, currency);

    if let Some(sig) = &estimate.signature {
        output.push_str(&format!(
            "\n  Signed by {} on {}\n",
            sig.signer_name,
            sig.signed_at.format("%Y-%m-%d %H:%M")
        ));
    }
    if !estimate.comments.is_empty() {
        output.push_str("\n  Comments:\n");
        for c in &estimate.comments {
            output.push_str(&format!(
                "    {} {}{}: {}\n",
                c.created_at.format("%Y-%m-%d"),
                c.author,
                if c.from_customer { " (customer)" } else { "" },
                c.body
            ));
        }
    }
    if !links.is_empty() {
        let now = chrono::Utc::now();
        let active = links.iter().filter(|l| l.is_active_at(now)).count();
        output.push_str(&format!(
            "\n  Public links: {} ({} active)\n",
            links.len(),
            active
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstimateItem, EstimateJob, ItemType, Money, Quantity};

    #[test]
    fn test_list_and_details() {
        let mut estimate = Estimate::new("EST-000003", 5, 6);
        let mut job = EstimateJob::new("Diagnostics");
        job.items.push(EstimateItem::new(
            ItemType::Labor,
            "Check engine light",
            Quantity::units(1),
            Money::from_cents(12_500),
            false,
        ));
        estimate.jobs.push(job);
        estimate.recompute_totals();

        let list = format_estimate_list(std::slice::from_ref(&estimate), "$");
        assert!(list.contains("EST-000003"));
        assert!(list.contains("$125.00"));

        let details = format_estimate_details(&estimate, &[], "$");
        assert!(details.contains("Diagnostics"));
        assert!(details.contains("Check engine light"));
        assert!(details.contains("LABOR"));

        assert_eq!(format_estimate_list(&[], "$"), "No estimates found.\n");
    }
}
