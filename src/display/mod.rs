//! Display formatting for terminal output
//!
//! List views are rendered as tables with `tabled`; detail views are plain
//! aligned text.

pub mod bundle;
pub mod estimate;
pub mod invoice;
pub mod link;
pub mod workorder;

pub use bundle::{format_bundle_details, format_bundle_list};
pub use estimate::{format_estimate_details, format_estimate_list};
pub use invoice::{format_invoice_details, format_invoice_list};
pub use link::{format_issued_link, format_link_list};
pub use workorder::{format_history, format_workorder_details, format_workorder_list};

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::Money;

/// Render rows as a table, or `empty` when there are none
pub(crate) fn table<T: Tabled>(rows: Vec<T>, empty: &str) -> String {
    if rows.is_empty() {
        return format!("{}\n", empty);
    }
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    format!("{}\n", table)
}

/// Truncate to `max` characters with an ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Append a right-aligned `label  amount` line
pub(crate) fn push_amount(output: &mut String, label: &str, amount: Money, currency: &str) {
    output.push_str(&format!(
        "  {:<12} {:>12}\n",
        label,
        amount.format_with_symbol(currency)
    ));
}

pub(crate) fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Brakes", 10), "Brakes");
        assert_eq!(truncate("Front brake service", 8), "Front b…");
        assert_eq!(truncate("Überholung", 4), "Übe…");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some(3)), "3");
        assert_eq!(or_dash(None::<u64>), "-");
    }
}
