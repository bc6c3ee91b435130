//! Line-item kinds, approval status and totals computation
//!
//! Estimates, workorders, bundles and invoices all carry priced lines. The
//! `PricedLine` trait lets a single `Totals` computation serve all of them,
//! so totals are never taken from anywhere but the lines themselves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

use super::money::{Money, Quantity};

/// Kind of line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    Labor,
    Part,
    Fee,
    /// Entered with a positive price, contributes negatively
    Discount,
}

impl ItemType {
    /// Parse an item type from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "labor" | "labour" => Some(Self::Labor),
            "part" | "parts" => Some(Self::Part),
            "fee" => Some(Self::Fee),
            "discount" => Some(Self::Discount),
            _ => None,
        }
    }

    /// Sign applied to the line total
    pub fn sign(&self) -> i64 {
        match self {
            Self::Discount => -1,
            _ => 1,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Labor => write!(f, "LABOR"),
            Self::Part => write!(f, "PART"),
            Self::Fee => write!(f, "FEE"),
            Self::Discount => write!(f, "DISCOUNT"),
        }
    }
}

/// Customer decision on a job or line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" | "approve" => Some(Self::Approved),
            "rejected" | "reject" | "declined" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Aggregate child decisions into a parent decision
    ///
    /// Returns `None` while any child is still pending (or there are no
    /// children). Once all children have converged the parent is approved if
    /// anything was approved, otherwise rejected.
    pub fn converge<I>(statuses: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut any = false;
        let mut any_approved = false;
        for status in statuses {
            any = true;
            match status {
                Self::Pending => return None,
                Self::Approved => any_approved = true,
                Self::Rejected => {}
            }
        }

        if !any {
            None
        } else if any_approved {
            Some(Self::Approved)
        } else {
            Some(Self::Rejected)
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Anything that can be priced as a line
pub trait PricedLine {
    fn item_type(&self) -> ItemType;
    fn quantity(&self) -> Quantity;
    fn unit_price(&self) -> Money;
    fn taxable(&self) -> bool;

    /// Whether the line contributes to totals (rejected lines do not)
    fn counts(&self) -> bool {
        true
    }

    /// Unsigned quantity x unit price
    fn line_total(&self) -> Money {
        self.unit_price().times(self.quantity())
    }

    /// Line total with the discount sign applied
    fn signed_total(&self) -> Money {
        Money::from_cents(self.line_total().cents() * self.item_type().sign())
    }
}

/// Validate the user-controlled fields shared by every priced line
pub fn validate_line(
    description: &str,
    quantity: Quantity,
    unit_price: Money,
) -> Result<(), String> {
    if description.trim().is_empty() {
        return Err("Item description cannot be empty".into());
    }
    if !quantity.is_positive() {
        return Err(format!(
            "Item '{}' must have a quantity greater than zero",
            description.trim()
        ));
    }
    if unit_price.is_negative() {
        return Err(format!(
            "Item '{}' cannot have a negative unit price",
            description.trim()
        ));
    }
    Ok(())
}

/// Totals computed from a set of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Labor + parts
    pub subtotal: Money,
    pub fees: Money,
    /// Discount magnitude (positive)
    pub discounts: Money,
    pub tax: Money,
    pub grand_total: Money,
}

impl Totals {
    /// Compute totals for one group of lines (a job) at a tax rate
    pub fn from_lines<'a, L, I>(lines: I, tax_rate_bps: u32) -> Self
    where
        L: PricedLine + 'a,
        I: IntoIterator<Item = &'a L>,
    {
        let mut totals = Totals::default();
        let mut taxable_base = Money::zero();

        for line in lines.into_iter().filter(|l| l.counts()) {
            let amount = line.line_total();
            match line.item_type() {
                ItemType::Labor | ItemType::Part => totals.subtotal += amount,
                ItemType::Fee => totals.fees += amount,
                ItemType::Discount => totals.discounts += amount,
            }
            if line.taxable() {
                taxable_base += line.signed_total();
            }
        }

        if taxable_base.is_positive() {
            totals.tax = taxable_base.apply_rate_bps(tax_rate_bps);
        }
        totals.grand_total = totals.net() + totals.tax;
        totals
    }

    /// Subtotal + fees - discounts, before tax
    pub fn net(&self) -> Money {
        self.subtotal + self.fees - self.discounts
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, other: Self) {
        self.subtotal += other.subtotal;
        self.fees += other.fees;
        self.discounts += other.discounts;
        self.tax += other.tax;
        self.grand_total += other.grand_total;
    }
}

impl std::iter::Sum for Totals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Totals::default(), |mut acc, t| {
            acc += t;
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line(ItemType, i64, i64, bool, bool);

    impl PricedLine for Line {
        fn item_type(&self) -> ItemType {
            self.0
        }
        fn quantity(&self) -> Quantity {
            Quantity::from_hundredths(self.1)
        }
        fn unit_price(&self) -> Money {
            Money::from_cents(self.2)
        }
        fn taxable(&self) -> bool {
            self.3
        }
        fn counts(&self) -> bool {
            self.4
        }
    }

    #[test]
    fn test_converge() {
        use ApprovalStatus::*;
        assert_eq!(ApprovalStatus::converge(std::iter::empty()), None);
        assert_eq!(ApprovalStatus::converge([Approved, Pending]), None);
        assert_eq!(ApprovalStatus::converge([Approved, Approved]), Some(Approved));
        assert_eq!(ApprovalStatus::converge([Rejected, Rejected]), Some(Rejected));
        assert_eq!(ApprovalStatus::converge([Rejected, Approved]), Some(Approved));
    }

    #[test]
    fn test_totals_breakdown() {
        let lines = vec![
            // 1.5h labor at $120, not taxable
            Line(ItemType::Labor, 150, 12000, false, true),
            // 2 pads at $45.50, taxable
            Line(ItemType::Part, 200, 4550, true, true),
            Line(ItemType::Fee, 100, 500, true, true),
            Line(ItemType::Discount, 100, 1000, true, true),
        ];

        let totals = Totals::from_lines(&lines, 1000);
        assert_eq!(totals.subtotal.cents(), 18000 + 9100);
        assert_eq!(totals.fees.cents(), 500);
        assert_eq!(totals.discounts.cents(), 1000);
        // taxable base 9100 + 500 - 1000 = 8600 at 10%
        assert_eq!(totals.tax.cents(), 860);
        assert_eq!(totals.grand_total.cents(), 27100 + 500 - 1000 + 860);
    }

    #[test]
    fn test_rejected_lines_ignored() {
        let lines = vec![
            Line(ItemType::Part, 100, 5000, true, true),
            Line(ItemType::Part, 100, 9999, true, false),
        ];
        let totals = Totals::from_lines(&lines, 0);
        assert_eq!(totals.grand_total.cents(), 5000);
    }

    #[test]
    fn test_tax_never_negative() {
        let lines = vec![
            Line(ItemType::Part, 100, 1000, true, true),
            Line(ItemType::Discount, 100, 5000, true, true),
        ];
        let totals = Totals::from_lines(&lines, 800);
        assert!(totals.tax.is_zero());
        assert_eq!(totals.grand_total.cents(), -4000);
    }

    #[test]
    fn test_validate_line() {
        assert!(validate_line("Oil filter", Quantity::units(1), Money::from_cents(899)).is_ok());
        assert!(validate_line("  ", Quantity::units(1), Money::zero()).is_err());
        assert!(validate_line("Filter", Quantity::from_hundredths(0), Money::zero()).is_err());
        assert!(validate_line("Filter", Quantity::units(1), Money::from_cents(-1)).is_err());
    }
}
