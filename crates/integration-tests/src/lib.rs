//! Integration test support for checkout-sync.
//!
//! [`ScriptedService`] stands in for the remote checkout service: responses
//! are queued up front, handed out in call order, and every call is recorded
//! with its arguments so tests can assert on what was sent.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p checkout-sync-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use checkout_sync_core::{CheckoutId, LineItem, LineItemId, LineItemUpdate, Money, VariantId};
use checkout_sync_storefront::shopify::{CheckoutError, CheckoutService, RemoteCheckout};
use tokio::sync::Notify;

/// One recorded call to the checkout service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create,
    Fetch(CheckoutId),
    Add {
        checkout_id: CheckoutId,
        variant_id: VariantId,
        quantity: i64,
    },
    Remove {
        checkout_id: CheckoutId,
        line_item_id: LineItemId,
    },
    Update {
        checkout_id: CheckoutId,
        update: LineItemUpdate,
    },
}

enum Step {
    Respond(RemoteCheckout),
    Fail(CheckoutError),
    /// Hold the response until the gate is released.
    Gated(Arc<Notify>, RemoteCheckout),
}

/// Checkout service that replays queued responses.
///
/// An exhausted script answers with [`CheckoutError::Unexpected`].
#[derive(Default)]
pub struct ScriptedService {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    #[must_use]
    pub fn respond(self, checkout: RemoteCheckout) -> Self {
        self.push(Step::Respond(checkout));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn fail(self, error: CheckoutError) -> Self {
        self.push(Step::Fail(error));
        self
    }

    /// Queue a response that is only returned once `gate` is notified.
    #[must_use]
    pub fn respond_after(self, gate: Arc<Notify>, checkout: RemoteCheckout) -> Self {
        self.push(Step::Gated(gate, checkout));
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until at least `n` calls have been made.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls.lock().unwrap().len() < n {
            tokio::task::yield_now().await;
        }
    }

    fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    async fn answer(&self, call: Call) -> Result<RemoteCheckout, CheckoutError> {
        // Take the step before recording so a gated call owns its slot
        let step = self.steps.lock().unwrap().pop_front();
        self.calls.lock().unwrap().push(call);

        match step {
            Some(Step::Respond(checkout)) => Ok(checkout),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Gated(gate, checkout)) => {
                gate.notified().await;
                Ok(checkout)
            }
            None => Err(CheckoutError::Unexpected("script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl CheckoutService for ScriptedService {
    async fn create_checkout(&self) -> Result<RemoteCheckout, CheckoutError> {
        self.answer(Call::Create).await
    }

    async fn fetch_checkout(&self, checkout_id: &CheckoutId) -> Result<RemoteCheckout, CheckoutError> {
        self.answer(Call::Fetch(checkout_id.clone())).await
    }

    async fn add_variant(
        &self,
        checkout_id: &CheckoutId,
        variant_id: &VariantId,
        quantity: i64,
    ) -> Result<RemoteCheckout, CheckoutError> {
        self.answer(Call::Add {
            checkout_id: checkout_id.clone(),
            variant_id: variant_id.clone(),
            quantity,
        })
        .await
    }

    async fn remove_line_item(
        &self,
        checkout_id: &CheckoutId,
        line_item_id: &LineItemId,
    ) -> Result<RemoteCheckout, CheckoutError> {
        self.answer(Call::Remove {
            checkout_id: checkout_id.clone(),
            line_item_id: line_item_id.clone(),
        })
        .await
    }

    async fn update_line_item(
        &self,
        checkout_id: &CheckoutId,
        update: &LineItemUpdate,
    ) -> Result<RemoteCheckout, CheckoutError> {
        self.answer(Call::Update {
            checkout_id: checkout_id.clone(),
            update: update.clone(),
        })
        .await
    }
}

// =============================================================================
// Response builders
// =============================================================================

/// A checkout as returned by create: identity, zero totals, no line items.
#[must_use]
pub fn new_checkout(id: &str) -> RemoteCheckout {
    RemoteCheckout {
        id: Some(CheckoutId::new(id)),
        web_url: Some(format!("https://x/{id}")),
        ..priced("0.00", "0.00", "0.00", Vec::new())
    }
}

/// A checkout with identity, totals and line items.
#[must_use]
pub fn full_checkout(
    id: &str,
    (subtotal, tax, total): (&str, &str, &str),
    items: Vec<LineItem>,
) -> RemoteCheckout {
    RemoteCheckout {
        id: Some(CheckoutId::new(id)),
        web_url: Some(format!("https://x/{id}")),
        ..priced(subtotal, tax, total, items)
    }
}

/// A mutation payload: totals and line items, no identity.
#[must_use]
pub fn priced(subtotal: &str, tax: &str, total: &str, items: Vec<LineItem>) -> RemoteCheckout {
    RemoteCheckout {
        id: None,
        web_url: None,
        subtotal_price: Some(Money::new(subtotal)),
        total_tax: Some(Money::new(tax)),
        total_price: Some(Money::new(total)),
        line_items: Some(items),
    }
}
