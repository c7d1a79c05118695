//! Cart commands.
//!
//! Every command resolves the checkout first (resume the remembered one, or
//! create one), then runs its intent and prints the resulting cart.
//!
//! # Environment Variables
//!
//! - `CHECKOUT_STATE_DIR` - Where the checkout ID is remembered. Without it
//!   every run starts a new checkout.

mod render;

use std::sync::Arc;

use checkout_sync_core::{LineItemId, VariantId};
use checkout_sync_storefront::config::{CheckoutSyncConfig, ConfigError};
use checkout_sync_storefront::shopify::{CheckoutError, StorefrontClient};
use checkout_sync_storefront::{
    CartSync, CheckoutIdStore, DisabledStore, FileStore, SyncError, SyncOutcome,
};
use thiserror::Error;

use crate::Commands;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The checkout client could not be built.
    #[error("Client error: {0}")]
    Client(#[from] CheckoutError),

    /// A cart intent failed.
    #[error("Cart error: {0}")]
    Sync(#[from] SyncError),

    /// JSON output failed.
    #[error("Output error: {0}")]
    Render(#[from] serde_json::Error),

    /// The state directory could not be created.
    #[error("State directory error: {0}")]
    StateDir(#[from] std::io::Error),
}

/// Run one command against the configured checkout.
///
/// # Errors
///
/// Returns an error if the client cannot be built or an intent fails.
pub async fn run(command: Commands, config: &CheckoutSyncConfig, json: bool) -> Result<(), CommandError> {
    let client = StorefrontClient::new(&config.shopify, config.request_timeout)?;
    let sync = CartSync::new(client, open_store(config)?);

    if matches!(command, Commands::New) {
        sync.create_new_checkout().await?;
        return render::cart(&sync.snapshot(), json);
    }

    sync.initialize().await?;

    let outcome = match command {
        Commands::Show | Commands::New => SyncOutcome::Applied,
        Commands::Open => return render::web_url(&sync.snapshot()),
        Commands::Add {
            variant_id,
            quantity,
        } => {
            sync.add_line_item(&VariantId::new(variant_id), quantity)
                .await?
        }
        Commands::Remove { line_item_id } => {
            sync.remove_line_item(&LineItemId::new(line_item_id)).await?
        }
        Commands::Update {
            line_item_id,
            delta,
        } => {
            let line_item_id = LineItemId::new(line_item_id);
            // The variant is whatever the line currently holds
            let variant_id = sync
                .snapshot()
                .items()
                .iter()
                .find(|item| item.id == line_item_id)
                .map(|item| item.variant_id.clone())
                .unwrap_or_default();
            sync.update_line_item_quantity(&line_item_id, &variant_id, delta)
                .await?
        }
    };

    if outcome == SyncOutcome::Skipped {
        tracing::warn!("Nothing to do: the line item is not in this cart");
    }

    render::cart(&sync.snapshot(), json)
}

fn open_store(config: &CheckoutSyncConfig) -> Result<Arc<dyn CheckoutIdStore>, CommandError> {
    match &config.state_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(Arc::new(FileStore::new(dir)))
        }
        None => {
            tracing::info!("CHECKOUT_STATE_DIR not set; the checkout will not be remembered");
            Ok(Arc::new(DisabledStore))
        }
    }
}
