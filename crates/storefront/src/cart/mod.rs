//! Local cart state mirroring a remote checkout.
//!
//! [`CartState`] is a plain snapshot. Its fields are private to this crate so
//! the only writer is [`CartSync`], which owns the state and publishes every
//! change through a `tokio::sync::watch` channel. Everything else reads
//! snapshots (the projection methods below) or subscribes.

mod apply;
mod sync;

pub use apply::{CheckoutIdentity, CheckoutPatch};
pub use sync::{CartSync, InitStatus, SyncError, SyncOutcome};

use checkout_sync_core::{CheckoutId, LineItem, LineItemId, Money, PriceTriple};
use serde::Serialize;

/// Snapshot of the cart as last confirmed by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartState {
    pub(crate) visible: bool,
    pub(crate) id: Option<CheckoutId>,
    pub(crate) web_url: String,
    pub(crate) prices: PriceTriple,
    pub(crate) items: Vec<LineItem>,
}

impl CartState {
    /// Whether the cart UI is open.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// The remote checkout ID, if one has been resolved.
    #[must_use]
    pub const fn checkout_id(&self) -> Option<&CheckoutId> {
        self.id.as_ref()
    }

    /// Hosted checkout page URL (empty until a checkout is resolved).
    #[must_use]
    pub fn web_url(&self) -> &str {
        &self.web_url
    }

    /// Line items in service order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        checkout_sync_core::total_quantity(&self.items)
    }

    #[must_use]
    pub const fn subtotal_price(&self) -> &Money {
        &self.prices.subtotal_price
    }

    #[must_use]
    pub const fn total_tax(&self) -> &Money {
        &self.prices.total_tax
    }

    #[must_use]
    pub const fn total_price(&self) -> &Money {
        &self.prices.total_price
    }

    /// The current quantity of a line item, if it is known locally.
    #[must_use]
    pub fn quantity_of(&self, line_item_id: &LineItemId) -> Option<i64> {
        self.items
            .iter()
            .find(|item| &item.id == line_item_id)
            .map(|item| item.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_items() -> CartState {
        CartState {
            items: vec![LineItem::new("li1", "v1", 2), LineItem::new("li2", "v2", 3)],
            ..CartState::default()
        }
    }

    #[test]
    fn test_default_state_is_empty() {
        let state = CartState::default();
        assert!(!state.is_visible());
        assert!(state.checkout_id().is_none());
        assert_eq!(state.web_url(), "");
        assert_eq!(state.item_count(), 0);
        assert!(state.total_price().is_empty());
    }

    #[test]
    fn test_item_count_sums_quantities() {
        assert_eq!(state_with_items().item_count(), 5);
    }

    #[test]
    fn test_quantity_of() {
        let state = state_with_items();
        assert_eq!(state.quantity_of(&LineItemId::new("li2")), Some(3));
        assert_eq!(state.quantity_of(&LineItemId::new("missing")), None);
    }
}
