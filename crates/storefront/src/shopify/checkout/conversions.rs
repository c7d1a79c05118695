//! Conversions from raw checkout response shapes to [`RemoteCheckout`].

use checkout_sync_core::{CheckoutId, LineItem, LineItemId, Money, VariantId};
use tracing::warn;

use crate::shopify::{CheckoutError, RemoteCheckout};

use super::queries::{CheckoutFields, CheckoutMutationPayload, CheckoutUserError, LineItemNode, MoneyV2};

pub fn convert_checkout(fields: CheckoutFields) -> RemoteCheckout {
    RemoteCheckout {
        id: fields.id.map(CheckoutId::from),
        web_url: fields.web_url,
        subtotal_price: fields.subtotal_price.and_then(convert_money),
        total_tax: fields.total_tax.and_then(convert_money),
        total_price: fields.total_price.and_then(convert_money),
        line_items: fields.line_items.map(|connection| {
            connection
                .edges
                .into_iter()
                .filter_map(|edge| convert_line_item(edge.node))
                .collect()
        }),
    }
}

fn convert_money(money: MoneyV2) -> Option<Money> {
    money.amount.map(Money::from)
}

fn convert_line_item(node: LineItemNode) -> Option<LineItem> {
    // A deleted variant comes back as null; there is nothing to key the line on
    let Some(variant) = node.variant else {
        warn!(line_item_id = ?node.id, "Dropping checkout line without a variant");
        return None;
    };
    let Some(quantity) = node.quantity else {
        warn!(line_item_id = ?node.id, "Dropping checkout line without a quantity");
        return None;
    };

    Some(LineItem {
        id: node.id.map(LineItemId::from).unwrap_or_default(),
        variant_id: VariantId::from(variant.id),
        quantity,
    })
}

/// Collapse `checkoutUserErrors` into a single message.
pub fn convert_user_errors(errors: Vec<CheckoutUserError>) -> String {
    errors
        .into_iter()
        .map(|e| {
            let field = e.field.map(|f| f.join(".")).filter(|f| !f.is_empty());
            match (e.code, field) {
                (Some(code), Some(field)) => format!("{} ({code} at {field})", e.message),
                (Some(code), None) => format!("{} ({code})", e.message),
                (None, Some(field)) => format!("{} (at {field})", e.message),
                (None, None) => e.message,
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unwrap a mutation payload into a checkout, surfacing user errors.
///
/// # Errors
///
/// Returns `UserError` when the mutation reported user errors, and
/// `Unexpected` when neither a checkout nor errors came back.
pub fn convert_mutation_payload(
    payload: Option<CheckoutMutationPayload>,
    operation: &str,
) -> Result<RemoteCheckout, CheckoutError> {
    let Some(payload) = payload else {
        return Err(CheckoutError::Unexpected(format!(
            "{operation} returned no payload"
        )));
    };

    if !payload.checkout_user_errors.is_empty() {
        return Err(CheckoutError::UserError(convert_user_errors(
            payload.checkout_user_errors,
        )));
    }

    payload.checkout.map(convert_checkout).ok_or_else(|| {
        CheckoutError::Unexpected(format!("{operation} returned no checkout"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn checkout_json() -> serde_json::Value {
        json!({
            "id": "gid://shopify/Checkout/c1",
            "webUrl": "https://x/c1",
            "subtotalPrice": { "amount": "10.0" },
            "totalTax": { "amount": "1.0" },
            "totalPrice": { "amount": "11.0" },
            "lineItems": {
                "edges": [
                    { "node": { "id": "li1", "quantity": 2, "variant": { "id": "v1" } } },
                    { "node": { "id": "li2", "quantity": 1, "variant": null } }
                ]
            }
        })
    }

    #[test]
    fn test_convert_checkout() {
        let fields: CheckoutFields = serde_json::from_value(checkout_json()).unwrap();
        let checkout = convert_checkout(fields);

        assert_eq!(checkout.id, Some(CheckoutId::new("gid://shopify/Checkout/c1")));
        assert_eq!(checkout.web_url.as_deref(), Some("https://x/c1"));
        assert_eq!(checkout.total_price, Some(Money::new("11.0")));
        // Line without a variant is dropped
        assert_eq!(checkout.line_items, Some(vec![LineItem::new("li1", "v1", 2)]));
    }

    #[test]
    fn test_convert_checkout_missing_fields_stay_none() {
        let fields: CheckoutFields =
            serde_json::from_value(json!({ "totalPrice": { "amount": "1.00" } })).unwrap();
        let checkout = convert_checkout(fields);

        assert!(checkout.id.is_none());
        assert!(checkout.subtotal_price.is_none());
        assert!(checkout.line_items.is_none());
        assert_eq!(checkout.total_price, Some(Money::new("1.00")));
    }

    #[test]
    fn test_mutation_payload_user_errors() {
        let payload: CheckoutMutationPayload = serde_json::from_value(json!({
            "checkout": null,
            "checkoutUserErrors": [
                { "code": "INVALID", "field": ["lineItems", "0", "variantId"], "message": "Variant is invalid" }
            ]
        }))
        .unwrap();

        let err = convert_mutation_payload(Some(payload), "checkoutLineItemsAdd").unwrap_err();
        assert_eq!(
            err.to_string(),
            "User error: Variant is invalid (INVALID at lineItems.0.variantId)"
        );
    }

    #[test]
    fn test_mutation_payload_missing() {
        let err = convert_mutation_payload(None, "checkoutCreate").unwrap_err();
        assert!(matches!(err, CheckoutError::Unexpected(_)));
    }

    #[test]
    fn test_mutation_payload_checkout() {
        let payload: CheckoutMutationPayload =
            serde_json::from_value(json!({ "checkout": checkout_json(), "checkoutUserErrors": [] }))
                .unwrap();
        let checkout = convert_mutation_payload(Some(payload), "checkoutCreate").unwrap();
        assert_eq!(checkout.total_quantity(), 2);
    }
}
