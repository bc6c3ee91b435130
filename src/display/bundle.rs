//! Bundle display formatting

use tabled::Tabled;

use super::{table, truncate};
use crate::models::{Bundle, PricedLine};

#[derive(Tabled)]
struct BundleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Service")]
    service_type: String,
    #[tabled(rename = "Items")]
    items: usize,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Active")]
    active: String,
}

pub fn format_bundle_list(bundles: &[Bundle], currency: &str) -> String {
    let rows = bundles
        .iter()
        .map(|b| BundleRow {
            id: b.id.to_string(),
            name: truncate(&b.name, 32),
            service_type: b.service_type.clone().unwrap_or_else(|| "-".into()),
            items: b.items.len(),
            price: b.list_price().format_with_symbol(currency),
            active: if b.active { "yes" } else { "no" }.to_string(),
        })
        .collect();
    table(rows, "No bundles found.")
}

pub fn format_bundle_details(bundle: &Bundle, currency: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("Bundle: {}  ({})\n", bundle.name, bundle.id));
    if !bundle.description.is_empty() {
        output.push_str(&format!("  {}\n", bundle.description));
    }
    if let Some(service_type) = &bundle.service_type {
        output.push_str(&format!("  Service type: {}\n", service_type));
    }
    if !bundle.active {
        output.push_str("  (inactive)\n");
    }
    output.push('\n');
    for item in &bundle.items {
        output.push_str(&format!(
            "  {:<9} {:<30} {:>6} x {:>10} = {:>10}\n",
            item.item_type.to_string(),
            truncate(&item.description, 30),
            item.quantity.to_string(),
            item.unit_price.format_with_symbol(currency),
            item.signed_total().format_with_symbol(currency),
        ));
    }
    output.push_str(&format!(
        "\n  List price: {}\n",
        bundle.list_price().format_with_symbol(currency)
    ));
    output
}
