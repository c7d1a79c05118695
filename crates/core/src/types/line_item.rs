//! Checkout line items.

use serde::{Deserialize, Serialize};

use super::id::{LineItemId, VariantId};

/// One product variant in a checkout, as last confirmed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Remote line item ID (empty if not yet confirmed).
    pub id: LineItemId,
    /// Product variant ID.
    pub variant_id: VariantId,
    /// Quantity (positive in a consistent checkout).
    pub quantity: i64,
}

impl LineItem {
    /// Create a new line item.
    #[must_use]
    pub fn new(id: impl Into<LineItemId>, variant_id: impl Into<VariantId>, quantity: i64) -> Self {
        Self {
            id: id.into(),
            variant_id: variant_id.into(),
            quantity,
        }
    }
}

/// Input for setting the absolute quantity of an existing line item.
///
/// The remote service only accepts absolute quantities, never deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemUpdate {
    /// Line item to update.
    pub id: LineItemId,
    /// Variant the line item refers to.
    pub variant_id: VariantId,
    /// New absolute quantity. Zero or negative is passed through unchanged.
    pub quantity: i64,
}

/// Sum of quantities across a set of line items, saturating at the `i64`
/// bounds.
#[must_use]
pub fn total_quantity(items: &[LineItem]) -> i64 {
    items
        .iter()
        .map(|item| item.quantity)
        .fold(0, i64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_quantity_empty() {
        assert_eq!(total_quantity(&[]), 0);
    }

    #[test]
    fn test_total_quantity_sums_all_lines() {
        let items = vec![LineItem::new("li1", "v1", 2), LineItem::new("li2", "v2", 3)];
        assert_eq!(total_quantity(&items), 5);
    }

    #[test]
    fn test_total_quantity_saturates() {
        let items = vec![
            LineItem::new("li1", "v1", i64::MAX),
            LineItem::new("li2", "v2", 1),
        ];
        assert_eq!(total_quantity(&items), i64::MAX);
    }
}
