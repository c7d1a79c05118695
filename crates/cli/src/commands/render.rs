//! Terminal output for cart snapshots.

#![allow(clippy::print_stdout)]

use std::fmt::Write as _;

use checkout_sync_storefront::CartState;

use super::CommandError;

/// Print the cart as a table, or as JSON.
pub fn cart(state: &CartState, json: bool) -> Result<(), CommandError> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        print!("{}", format_cart(state));
    }
    Ok(())
}

/// Print the hosted checkout URL.
pub fn web_url(state: &CartState) -> Result<(), CommandError> {
    println!("{}", state.web_url());
    Ok(())
}

fn format_cart(state: &CartState) -> String {
    let mut out = String::new();
    let checkout = state
        .checkout_id()
        .map_or_else(|| "(none)".to_string(), ToString::to_string);

    let _ = writeln!(out, "Checkout: {checkout}");
    if state.items().is_empty() {
        let _ = writeln!(out, "  (empty)");
    }
    for item in state.items() {
        let _ = writeln!(out, "  {:>3} x {}  [{}]", item.quantity, item.variant_id, item.id);
    }
    let _ = writeln!(out, "Items:    {}", state.item_count());
    let _ = writeln!(out, "Subtotal: {}", state.subtotal_price().display());
    let _ = writeln!(out, "Tax:      {}", state.total_tax().display());
    let _ = writeln!(out, "Total:    {}", state.total_price().display());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_empty_cart() {
        let out = format_cart(&CartState::default());
        assert!(out.contains("Checkout: (none)"));
        assert!(out.contains("(empty)"));
        assert!(out.contains("Items:    0"));
    }
}
