//! Normalized checkout payloads.
//!
//! These types sit between the raw GraphQL response shapes and the sync
//! core. Every field is optional: what the service left out stays `None`,
//! and deciding what is safe to apply is the sync core's job.

use checkout_sync_core::{CheckoutId, LineItem, Money};

/// A checkout as returned by one remote operation.
///
/// `id` and `web_url` are only meaningful on create and fetch responses.
/// Mutation responses carry prices and line items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCheckout {
    /// Checkout ID.
    pub id: Option<CheckoutId>,
    /// Hosted checkout page URL.
    pub web_url: Option<String>,
    /// Subtotal before tax.
    pub subtotal_price: Option<Money>,
    /// Total tax.
    pub total_tax: Option<Money>,
    /// Grand total.
    pub total_price: Option<Money>,
    /// Full line item set, in service order.
    pub line_items: Option<Vec<LineItem>>,
}

impl RemoteCheckout {
    /// Sum of quantities over the returned line items.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.line_items
            .as_deref()
            .map_or(0, checkout_sync_core::total_quantity)
    }
}
