//! Cart synchronization core.
//!
//! [`CartSync`] turns cart intents into remote checkout calls and applies the
//! confirmed results to the cart it owns. There is no optimistic state: every
//! mutation is one request followed by one apply of the service's answer.
//!
//! # Ordering
//!
//! Each remote request takes a sequence number when it is issued. Applies
//! happen inside the watch channel's write lock, and a response older than
//! the last applied one is dropped instead of overwriting newer state.
//!
//! # Example
//!
//! ```rust,ignore
//! let sync = CartSync::new(client, Arc::new(FileStore::new(state_dir)));
//! sync.initialize().await?;
//! sync.add_line_item(&VariantId::new("gid://shopify/ProductVariant/1"), 2).await?;
//! println!("{} items", sync.snapshot().item_count());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use checkout_sync_core::{CheckoutId, LineItemId, LineItemUpdate, VariantId};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use super::{CartState, CheckoutPatch};
use crate::shopify::{CheckoutError, CheckoutService, RemoteCheckout};
use crate::storage::{CheckoutIdStore, storage_keys};

/// Errors returned by cart intents.
///
/// Whenever an intent fails, the cart is left exactly as it was.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The checkout service reported a failure.
    #[error("checkout service call failed: {0}")]
    Remote(#[from] CheckoutError),

    /// A line item intent was issued before a checkout was resolved.
    #[error("no checkout has been resolved yet")]
    NoCheckout,

    /// A create or fetch response carried no checkout ID.
    #[error("checkout response carried no checkout ID")]
    MissingCheckoutId,
}

/// What happened to an intent that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote response was applied.
    Applied,
    /// The response arrived after a newer one had been applied and was dropped.
    Superseded,
    /// The intent referenced nothing known locally; no remote call was made.
    Skipped,
}

/// Checkout identity resolution progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InitStatus {
    #[default]
    Uninitialized,
    Resolving,
    /// Resumed a remembered checkout.
    Fetched,
    /// Provisioned a new checkout.
    Created,
    /// The last resolution attempt failed; the cart is unchanged.
    Failed,
}

/// Owner of the cart state and the only component that writes to it.
pub struct CartSync<S> {
    service: S,
    store: Arc<dyn CheckoutIdStore>,
    state: watch::Sender<CartState>,
    status: watch::Sender<InitStatus>,
    issued: AtomicU64,
    applied: AtomicU64,
}

impl<S: CheckoutService> CartSync<S> {
    /// Create a sync core with an empty cart.
    pub fn new(service: S, store: Arc<dyn CheckoutIdStore>) -> Self {
        Self {
            service,
            store,
            state: watch::Sender::new(CartState::default()),
            status: watch::Sender::new(InitStatus::default()),
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Read surface
    // =========================================================================

    /// A copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Subscribe to cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Current identity resolution status.
    #[must_use]
    pub fn status(&self) -> InitStatus {
        *self.status.borrow()
    }

    /// The checkout service this core talks to.
    pub const fn service(&self) -> &S {
        &self.service
    }

    // =========================================================================
    // Local intents
    // =========================================================================

    /// Flip cart visibility. Returns the new value.
    #[instrument(skip(self))]
    pub fn toggle_visibility(&self) -> bool {
        let mut visible = false;
        self.state.send_modify(|state| {
            state.visible = !state.visible;
            visible = state.visible;
        });
        visible
    }

    // =========================================================================
    // Identity resolution
    // =========================================================================

    /// Resume the remembered checkout, or create a new one if none is
    /// remembered.
    ///
    /// A failed fetch does not fall back to creating a checkout: the
    /// remembered one may still be valid, and abandoning it would lose the
    /// customer's cart. Call `initialize` again to retry.
    ///
    /// A superseded response still completes resolution: a newer confirmed
    /// response already holds the cart.
    ///
    /// # Errors
    ///
    /// Returns the failure of whichever remote call was made.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<SyncOutcome, SyncError> {
        self.status.send_replace(InitStatus::Resolving);

        let (result, resolved) = match self.remembered_checkout_id() {
            Some(checkout_id) => {
                info!(checkout_id = %checkout_id, "Resuming remembered checkout");
                (self.fetch_checkout(&checkout_id).await, InitStatus::Fetched)
            }
            None => {
                info!("No remembered checkout; creating one");
                (self.create_new_checkout().await, InitStatus::Created)
            }
        };

        match &result {
            Ok(SyncOutcome::Superseded) => {
                debug!(status = ?resolved, "Resolution response superseded by a newer one");
                self.status.send_replace(resolved);
            }
            Ok(_) => {}
            Err(_) => {
                self.status.send_replace(InitStatus::Failed);
            }
        }
        result
    }

    /// Provision a new remote checkout and remember its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the service call fails or the response has no ID.
    #[instrument(skip(self))]
    pub async fn create_new_checkout(&self) -> Result<SyncOutcome, SyncError> {
        let seq = self.next_sequence();
        let remote = self
            .service
            .create_checkout()
            .await
            .map_err(|e| report_failure("create_checkout", e))?;

        let patch = CheckoutPatch::from_create(remote);
        let Some(identity) = patch.identity.clone() else {
            return Err(SyncError::MissingCheckoutId);
        };

        let outcome = self.apply(seq, patch);
        if outcome == SyncOutcome::Applied {
            info!(checkout_id = %identity.id, "Created checkout");
            self.remember_checkout_id(&identity.id);
            self.status.send_replace(InitStatus::Created);
        }
        Ok(outcome)
    }

    /// Load an existing remote checkout.
    ///
    /// Identity always follows the latest successful fetch, even if a
    /// different checkout was resolved before.
    ///
    /// # Errors
    ///
    /// Returns an error if the service call fails or the response has no ID.
    #[instrument(skip(self), fields(checkout_id = %checkout_id))]
    pub async fn fetch_checkout(&self, checkout_id: &CheckoutId) -> Result<SyncOutcome, SyncError> {
        let seq = self.next_sequence();
        let remote = self
            .service
            .fetch_checkout(checkout_id)
            .await
            .map_err(|e| report_failure("fetch_checkout", e))?;

        let patch = CheckoutPatch::from_fetch(remote);
        if patch.identity.is_none() {
            return Err(SyncError::MissingCheckoutId);
        }

        let outcome = self.apply(seq, patch);
        if outcome == SyncOutcome::Applied {
            self.status.send_replace(InitStatus::Fetched);
        }
        Ok(outcome)
    }

    // =========================================================================
    // Line item intents
    // =========================================================================

    /// Add `quantity` units of a variant.
    ///
    /// A non-positive quantity is skipped without a remote call.
    ///
    /// # Errors
    ///
    /// Returns `NoCheckout` before a checkout is resolved, or the remote failure.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn add_line_item(
        &self,
        variant_id: &VariantId,
        quantity: i64,
    ) -> Result<SyncOutcome, SyncError> {
        if quantity <= 0 {
            warn!(quantity, "Ignoring add with non-positive quantity");
            return Ok(SyncOutcome::Skipped);
        }
        let checkout_id = self.current_checkout_id()?;

        let seq = self.next_sequence();
        let remote = self
            .service
            .add_variant(&checkout_id, variant_id, quantity)
            .await
            .map_err(|e| report_failure("add_variant", e))?;

        Ok(self.apply_mutation(seq, remote))
    }

    /// Remove a line item.
    ///
    /// An ID not present in the cart is skipped without a remote call.
    ///
    /// # Errors
    ///
    /// Returns `NoCheckout` before a checkout is resolved, or the remote failure.
    #[instrument(skip(self), fields(line_item_id = %line_item_id))]
    pub async fn remove_line_item(&self, line_item_id: &LineItemId) -> Result<SyncOutcome, SyncError> {
        if self.state.borrow().quantity_of(line_item_id).is_none() {
            warn!("Ignoring removal of unknown line item");
            return Ok(SyncOutcome::Skipped);
        }
        let checkout_id = self.current_checkout_id()?;

        let seq = self.next_sequence();
        let remote = self
            .service
            .remove_line_item(&checkout_id, line_item_id)
            .await
            .map_err(|e| report_failure("remove_line_item", e))?;

        Ok(self.apply_mutation(seq, remote))
    }

    /// Change a line item's quantity by `quantity_delta`.
    ///
    /// The remote service takes absolute quantities, so the delta is added to
    /// the last confirmed quantity and the result is sent as is, including
    /// zero or negative values. An unknown line item is skipped without a
    /// remote call.
    ///
    /// # Errors
    ///
    /// Returns `NoCheckout` before a checkout is resolved, or the remote failure.
    #[instrument(skip(self), fields(line_item_id = %line_item_id, variant_id = %variant_id))]
    pub async fn update_line_item_quantity(
        &self,
        line_item_id: &LineItemId,
        variant_id: &VariantId,
        quantity_delta: i64,
    ) -> Result<SyncOutcome, SyncError> {
        let current = self.state.borrow().quantity_of(line_item_id);
        let Some(current) = current else {
            warn!("Ignoring quantity change for unknown line item");
            return Ok(SyncOutcome::Skipped);
        };
        let checkout_id = self.current_checkout_id()?;

        let update = LineItemUpdate {
            id: line_item_id.clone(),
            variant_id: variant_id.clone(),
            quantity: current.saturating_add(quantity_delta),
        };
        debug!(current, new_quantity = update.quantity, "Updating line item quantity");

        let seq = self.next_sequence();
        let remote = self
            .service
            .update_line_item(&checkout_id, &update)
            .await
            .map_err(|e| report_failure("update_line_item", e))?;

        Ok(self.apply_mutation(seq, remote))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn next_sequence(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply_mutation(&self, seq: u64, remote: RemoteCheckout) -> SyncOutcome {
        self.apply(seq, CheckoutPatch::from_mutation(remote))
    }

    /// Apply a patch unless a newer response has already been applied.
    fn apply(&self, seq: u64, patch: CheckoutPatch) -> SyncOutcome {
        let mut outcome = SyncOutcome::Superseded;

        // The closure runs under the channel's write lock, so the sequence
        // check and the state write are one critical section.
        self.state.send_if_modified(|state| {
            let last = self.applied.load(Ordering::SeqCst);
            if seq < last {
                debug!(seq, last, "Dropping superseded checkout response");
                return false;
            }
            self.applied.store(seq, Ordering::SeqCst);
            outcome = SyncOutcome::Applied;
            patch.apply_to(state)
        });

        outcome
    }

    fn current_checkout_id(&self) -> Result<CheckoutId, SyncError> {
        self.state.borrow().id.clone().ok_or_else(|| {
            warn!("Line item intent issued before a checkout was resolved");
            SyncError::NoCheckout
        })
    }

    fn remembered_checkout_id(&self) -> Option<CheckoutId> {
        if !self.store.is_available() {
            debug!("Checkout storage unavailable; treating remembered checkout as absent");
            return None;
        }
        self.store
            .get(storage_keys::CHECKOUT_ID)
            .filter(|id| !id.is_empty())
            .map(CheckoutId::from)
    }

    fn remember_checkout_id(&self, checkout_id: &CheckoutId) {
        if !self.store.is_available() {
            debug!("Checkout storage unavailable; checkout will not be remembered");
            return;
        }
        if let Err(e) = self.store.set(storage_keys::CHECKOUT_ID, checkout_id.as_str()) {
            warn!(error = %e, "Failed to remember checkout ID");
        }
    }
}

fn report_failure(operation: &'static str, err: CheckoutError) -> SyncError {
    error!(operation, error = %err, "Checkout service call failed; cart unchanged");
    SyncError::Remote(err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use checkout_sync_core::{LineItem, Money};

    use super::*;
    use crate::storage::{DisabledStore, MemoryStore};

    /// Answers every call with the same checkout and counts calls.
    struct FixedService {
        response: RemoteCheckout,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FixedService {
        fn new(response: RemoteCheckout) -> Self {
            Self {
                response,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: &'static str) -> Result<RemoteCheckout, CheckoutError> {
            self.calls.lock().unwrap().push(call);
            Ok(self.response.clone())
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CheckoutService for FixedService {
        async fn create_checkout(&self) -> Result<RemoteCheckout, CheckoutError> {
            self.record("create")
        }

        async fn fetch_checkout(&self, _: &CheckoutId) -> Result<RemoteCheckout, CheckoutError> {
            self.record("fetch")
        }

        async fn add_variant(
            &self,
            _: &CheckoutId,
            _: &VariantId,
            _: i64,
        ) -> Result<RemoteCheckout, CheckoutError> {
            self.record("add")
        }

        async fn remove_line_item(
            &self,
            _: &CheckoutId,
            _: &LineItemId,
        ) -> Result<RemoteCheckout, CheckoutError> {
            self.record("remove")
        }

        async fn update_line_item(
            &self,
            _: &CheckoutId,
            _: &LineItemUpdate,
        ) -> Result<RemoteCheckout, CheckoutError> {
            self.record("update")
        }
    }

    fn checkout(id: &str) -> RemoteCheckout {
        RemoteCheckout {
            id: Some(CheckoutId::new(id)),
            web_url: Some(format!("https://x/{id}")),
            subtotal_price: Some(Money::new("0.00")),
            total_tax: Some(Money::new("0.00")),
            total_price: Some(Money::new("0.00")),
            line_items: None,
        }
    }

    #[test]
    fn test_toggle_pairs_restore_visibility() {
        let sync = CartSync::new(FixedService::new(checkout("c1")), Arc::new(MemoryStore::new()));
        assert!(sync.toggle_visibility());
        assert!(!sync.toggle_visibility());
        assert!(!sync.snapshot().is_visible());
    }

    #[tokio::test]
    async fn test_add_before_checkout_is_an_error() {
        let sync = CartSync::new(FixedService::new(checkout("c1")), Arc::new(MemoryStore::new()));
        let result = sync.add_line_item(&VariantId::new("v1"), 1).await;
        assert!(matches!(result, Err(SyncError::NoCheckout)));
        assert!(sync.service().calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_add_is_skipped() {
        let sync = CartSync::new(FixedService::new(checkout("c1")), Arc::new(MemoryStore::new()));
        sync.initialize().await.unwrap();

        let outcome = sync.add_line_item(&VariantId::new("v1"), 0).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped);
        assert_eq!(sync.service().calls(), vec!["create"]);
    }

    #[tokio::test]
    async fn test_remove_unknown_line_item_is_skipped() {
        let sync = CartSync::new(FixedService::new(checkout("c1")), Arc::new(MemoryStore::new()));
        sync.initialize().await.unwrap();

        let outcome = sync.remove_line_item(&LineItemId::new("nope")).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped);
        assert_eq!(sync.service().calls(), vec!["create"]);
    }

    #[tokio::test]
    async fn test_initialize_without_storage_creates() {
        let sync = CartSync::new(FixedService::new(checkout("c1")), Arc::new(DisabledStore));
        let outcome = sync.initialize().await.unwrap();

        assert_eq!(outcome, SyncOutcome::Applied);
        assert_eq!(sync.status(), InitStatus::Created);
        assert_eq!(sync.snapshot().checkout_id(), Some(&CheckoutId::new("c1")));
    }

    #[tokio::test]
    async fn test_create_without_id_changes_nothing() {
        let mut response = checkout("c1");
        response.id = None;
        let store = Arc::new(MemoryStore::new());
        let sync = CartSync::new(FixedService::new(response), store.clone());

        let result = sync.initialize().await;

        assert!(matches!(result, Err(SyncError::MissingCheckoutId)));
        assert_eq!(sync.status(), InitStatus::Failed);
        assert_eq!(sync.snapshot(), CartState::default());
        assert_eq!(store.get(storage_keys::CHECKOUT_ID), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_applied_changes() {
        let sync = CartSync::new(FixedService::new(checkout("c1")), Arc::new(MemoryStore::new()));
        let mut rx = sync.subscribe();

        sync.initialize().await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().web_url(), "https://x/c1");
    }

    #[tokio::test]
    async fn test_update_sends_absolute_quantity() {
        let mut response = checkout("c1");
        response.line_items = Some(vec![LineItem::new("li1", "v1", 2)]);
        let sync = CartSync::new(
            FixedService::new(response),
            Arc::new(MemoryStore::with_entry(storage_keys::CHECKOUT_ID, "c1")),
        );
        sync.initialize().await.unwrap();

        let outcome = sync
            .update_line_item_quantity(&LineItemId::new("li1"), &VariantId::new("v1"), -5)
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Applied);
        assert_eq!(sync.service().calls(), vec!["fetch", "update"]);
    }
}
