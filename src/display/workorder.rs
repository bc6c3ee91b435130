//! Workorder display formatting

use tabled::Tabled;

use super::{or_dash, push_amount, table, truncate};
use crate::models::{Workorder, WorkorderStatusHistory};

#[derive(Tabled)]
struct WorkorderRow {
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Customer")]
    customer: u64,
    #[tabled(rename = "Tech")]
    technician: String,
    #[tabled(rename = "Done")]
    progress: String,
    #[tabled(rename = "Total")]
    total: String,
}

pub fn format_workorder_list(workorders: &[Workorder], currency: &str) -> String {
    let rows = workorders
        .iter()
        .map(|w| WorkorderRow {
            number: w.number.clone(),
            status: w.status.to_string(),
            customer: w.customer_id,
            technician: or_dash(w.technician_id),
            progress: format!("{}/{}", w.completed_item_count(), w.item_count()),
            total: w.grand_total.format_with_symbol(currency),
        })
        .collect();
    table(rows, "No workorders found.")
}

pub fn format_workorder_details(workorder: &Workorder, currency: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Workorder {}  ({})\n", workorder.number, workorder.id));
    output.push_str(&format!("  Status:      {}\n", workorder.status));
    output.push_str(&format!("  Estimate:    {}\n", workorder.estimate_id));
    output.push_str(&format!("  Customer:    {}\n", workorder.customer_id));
    output.push_str(&format!("  Vehicle:     {}\n", workorder.vehicle_id));
    output.push_str(&format!("  Technician:  {}\n", or_dash(workorder.technician_id)));
    output.push_str(&format!(
        "  Progress:    {}/{} items done\n",
        workorder.completed_item_count(),
        workorder.item_count()
    ));
    if let Some(invoice_id) = workorder.invoice_id {
        output.push_str(&format!("  Invoice:     {}\n", invoice_id));
    }
    if !workorder.sub_estimate_ids.is_empty() {
        let ids: Vec<String> = workorder.sub_estimate_ids.iter().map(|id| id.to_string()).collect();
        output.push_str(&format!("  Additional:  {}\n", ids.join(", ")));
    }

    for job in &workorder.jobs {
        output.push_str(&format!(
            "\n  {}  {}  {}\n",
            job.title,
            job.id,
            job.total.format_with_symbol(currency)
        ));
        for item in &job.items {
            output.push_str(&format!(
                "    [{}] {}  {:<9} {:<30} {:>6} x {:>10} = {:>10}\n",
                if item.completed { "x" } else { " " },
                item.id,
                item.item_type.to_string(),
                truncate(&item.description, 30),
                item.quantity.to_string(),
                item.unit_price.format_with_symbol(currency),
                item.line_total.format_with_symbol(currency),
            ));
        }
    }

    output.push('\n');
    push_amount(&mut output, "Subtotal:", workorder.subtotal, currency);
    push_amount(&mut output, "Fees:", workorder.fees, currency);
    push_amount(&mut output, "Discounts:", workorder.discounts, currency);
    push_amount(&mut output, "Tax:", workorder.tax, currency);
    push_amount(&mut output, "Total:", workorder.grand_total, currency);

    output
}

/// One line per status change, oldest first
pub fn format_history(history: &[WorkorderStatusHistory]) -> String {
    let mut output = String::new();
    for entry in history {
        let from = entry.from.map_or_else(|| "-".to_string(), |s| s.to_string());
        output.push_str(&format!(
            "{}  {:>11} -> {:<11}",
            entry.changed_at.format("%Y-%m-%d %H:%M"),
            from,
            entry.to.to_string()
        ));
        if let Some(actor) = &entry.actor {
            output.push_str(&format!(" by {}", actor));
        }
        if let Some(note) = &entry.note {
            output.push_str(&format!("  ({})", note));
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstimateId, WorkorderStatus};
    use chrono::Utc;

    #[test]
    fn test_history_lines() {
        let history = vec![
            WorkorderStatusHistory {
                from: None,
                to: WorkorderStatus::Pending,
                note: None,
                actor: None,
                changed_at: Utc::now(),
            },
            WorkorderStatusHistory {
                from: Some(WorkorderStatus::Pending),
                to: WorkorderStatus::InProgress,
                note: Some("bay 2".into()),
                actor: Some("sam".into()),
                changed_at: Utc::now(),
            },
        ];
        let text = format_history(&history);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("by sam"));
        assert!(text.contains("(bay 2)"));
    }

    #[test]
    fn test_list_and_details() {
        let workorder = Workorder::new("WO-000001", EstimateId::new(), 3, 9);
        let list = format_workorder_list(std::slice::from_ref(&workorder), "$");
        assert!(list.contains("WO-000001"));
        assert!(list.contains("0/0"));

        let details = format_workorder_details(&workorder, "€");
        assert!(details.contains("pending"));
        assert!(details.contains("€0.00"));

        assert_eq!(format_workorder_list(&[], "$"), "No workorders found.\n");
    }
}
