//! The apply step: the single path by which remote data enters [`CartState`].
//!
//! A remote response is first normalized into a [`CheckoutPatch`], then the
//! patch is applied in one go. The remote response is always the new ground
//! truth; local state is never merged with it field by field.

use checkout_sync_core::{CheckoutId, LineItem, PriceTriple};
use tracing::warn;

use super::CartState;
use crate::shopify::RemoteCheckout;

/// Identity of a remote checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutIdentity {
    pub id: CheckoutId,
    pub web_url: String,
}

/// Changes derived from one remote response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutPatch {
    /// Only set from create and fetch responses.
    pub identity: Option<CheckoutIdentity>,
    /// Only set when all three amounts were present.
    pub prices: Option<PriceTriple>,
    /// Replacement line item set.
    pub items: Option<Vec<LineItem>>,
}

impl CheckoutPatch {
    /// Normalize a create response. A fresh checkout has no line items, so
    /// the item set is replaced with whatever came back (normally nothing).
    #[must_use]
    pub fn from_create(remote: RemoteCheckout) -> Self {
        let identity = identity_of(&remote);
        let prices = prices_of(&remote);
        Self {
            identity,
            prices,
            items: Some(remote.line_items.unwrap_or_default()),
        }
    }

    /// Normalize a fetch response: identity, prices and the full item set.
    #[must_use]
    pub fn from_fetch(remote: RemoteCheckout) -> Self {
        let identity = identity_of(&remote);
        let prices = prices_of(&remote);
        Self {
            identity,
            prices,
            items: items_of(remote),
        }
    }

    /// Normalize a line item mutation response. Identity is ignored even if
    /// present.
    #[must_use]
    pub fn from_mutation(remote: RemoteCheckout) -> Self {
        let prices = prices_of(&remote);
        Self {
            identity: None,
            prices,
            items: items_of(remote),
        }
    }

    /// Apply the patch. Returns whether anything changed.
    pub fn apply_to(self, state: &mut CartState) -> bool {
        let mut changed = false;

        if let Some(identity) = self.identity {
            changed |= state.id.as_ref() != Some(&identity.id) || state.web_url != identity.web_url;
            state.id = Some(identity.id);
            state.web_url = identity.web_url;
        }

        if let Some(prices) = self.prices {
            changed |= state.prices != prices;
            state.prices = prices;
        }

        if let Some(items) = self.items {
            changed |= state.items != items;
            state.items = items;
        }

        changed
    }
}

fn identity_of(remote: &RemoteCheckout) -> Option<CheckoutIdentity> {
    match &remote.id {
        Some(id) if !id.is_empty() => Some(CheckoutIdentity {
            id: id.clone(),
            web_url: remote.web_url.clone().unwrap_or_default(),
        }),
        _ => {
            warn!("Checkout response carried no ID; identity not applied");
            None
        }
    }
}

fn prices_of(remote: &RemoteCheckout) -> Option<PriceTriple> {
    let prices = PriceTriple::from_parts(
        remote.subtotal_price.clone(),
        remote.total_tax.clone(),
        remote.total_price.clone(),
    );
    if prices.is_none() {
        warn!(
            subtotal = ?remote.subtotal_price,
            tax = ?remote.total_tax,
            total = ?remote.total_price,
            "Incomplete price triple in checkout response; keeping previous prices"
        );
    }
    prices
}

fn items_of(remote: RemoteCheckout) -> Option<Vec<LineItem>> {
    if remote.line_items.is_none() {
        warn!("Checkout response carried no line items; keeping previous items");
    }
    remote.line_items
}

#[cfg(test)]
mod tests {
    use checkout_sync_core::Money;

    use super::*;

    fn full_response() -> RemoteCheckout {
        RemoteCheckout {
            id: Some(CheckoutId::new("c1")),
            web_url: Some("https://x/c1".to_string()),
            subtotal_price: Some(Money::new("10.00")),
            total_tax: Some(Money::new("1.00")),
            total_price: Some(Money::new("11.00")),
            line_items: Some(vec![LineItem::new("li1", "v1", 2)]),
        }
    }

    fn populated_state() -> CartState {
        CartState {
            visible: true,
            id: Some(CheckoutId::new("c1")),
            web_url: "https://x/c1".to_string(),
            prices: PriceTriple {
                subtotal_price: Money::new("5.00"),
                total_tax: Money::new("0.50"),
                total_price: Money::new("5.50"),
            },
            items: vec![LineItem::new("li0", "v0", 1)],
        }
    }

    #[test]
    fn test_missing_any_price_keeps_all_three() {
        let strip: [fn(&mut RemoteCheckout); 3] = [
            |r| r.subtotal_price = None,
            |r| r.total_tax = None,
            |r| r.total_price = Some(Money::default()),
        ];

        for strip_one in strip {
            let mut response = full_response();
            strip_one(&mut response);

            let mut state = populated_state();
            let before = state.prices.clone();
            CheckoutPatch::from_mutation(response).apply_to(&mut state);

            assert_eq!(state.prices, before);
            // Items still come through
            assert_eq!(state.items, vec![LineItem::new("li1", "v1", 2)]);
        }
    }

    #[test]
    fn test_items_replaced_wholesale_in_response_order() {
        let mut response = full_response();
        let returned = vec![LineItem::new("li9", "v9", 4), LineItem::new("li0", "v0", 1)];
        response.line_items = Some(returned.clone());

        let mut state = populated_state();
        CheckoutPatch::from_mutation(response).apply_to(&mut state);

        assert_eq!(state.items, returned);
    }

    #[test]
    fn test_empty_item_list_clears_items() {
        let mut response = full_response();
        response.line_items = Some(vec![]);

        let mut state = populated_state();
        CheckoutPatch::from_mutation(response).apply_to(&mut state);

        assert!(state.items.is_empty());
    }

    #[test]
    fn test_mutation_never_touches_identity() {
        let mut response = full_response();
        response.id = Some(CheckoutId::new("other"));
        response.web_url = Some("https://x/other".to_string());

        let mut state = populated_state();
        CheckoutPatch::from_mutation(response).apply_to(&mut state);

        assert_eq!(state.id, Some(CheckoutId::new("c1")));
        assert_eq!(state.web_url, "https://x/c1");
    }

    #[test]
    fn test_create_without_line_items_clears_items() {
        let mut response = full_response();
        response.line_items = None;

        let mut state = populated_state();
        CheckoutPatch::from_create(response).apply_to(&mut state);

        assert!(state.items.is_empty());
    }

    #[test]
    fn test_fetch_without_line_items_keeps_items() {
        let mut response = full_response();
        response.line_items = None;

        let mut state = populated_state();
        CheckoutPatch::from_fetch(response).apply_to(&mut state);

        assert_eq!(state.items, vec![LineItem::new("li0", "v0", 1)]);
    }

    #[test]
    fn test_fetch_without_id_has_no_identity() {
        let mut response = full_response();
        response.id = Some(CheckoutId::default());

        assert!(CheckoutPatch::from_fetch(response).identity.is_none());
    }

    #[test]
    fn test_apply_reports_no_change() {
        let mut state = CartState::default();
        assert!(CheckoutPatch::from_fetch(full_response()).apply_to(&mut state));
        assert!(!CheckoutPatch::from_fetch(full_response()).apply_to(&mut state));
    }

    #[test]
    fn test_visibility_untouched_by_apply() {
        let mut state = populated_state();
        CheckoutPatch::from_fetch(full_response()).apply_to(&mut state);
        assert!(state.visible);
    }
}
