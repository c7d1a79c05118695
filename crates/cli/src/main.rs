//! checkout-cli - Drive a remembered Shopify checkout from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Resume (or create) the checkout and print it
//! checkout-cli show
//!
//! # Add two units of a variant
//! checkout-cli add gid://shopify/ProductVariant/123 -q 2
//!
//! # Change a line item's quantity by a delta
//! checkout-cli update gid://shopify/CheckoutLineItem/456 -1
//!
//! # Start over with a fresh checkout
//! checkout-cli new
//! ```
//!
//! The checkout ID is remembered in `CHECKOUT_STATE_DIR` between runs. See
//! `checkout_sync_storefront::config` for every environment variable.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_sync_storefront::config::CheckoutSyncConfig;

mod commands;

#[derive(Parser)]
#[command(name = "checkout-cli")]
#[command(author, version, about = "Command-line cart for a Shopify checkout")]
struct Cli {
    /// Print the cart as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current cart
    Show,
    /// Add a product variant
    Add {
        /// Product variant ID
        variant_id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Remove a line item
    Remove {
        /// Line item ID
        line_item_id: String,
    },
    /// Change a line item's quantity by a (possibly negative) delta
    Update {
        /// Line item ID
        line_item_id: String,

        /// Quantity change
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Create a fresh checkout and remember it
    New,
    /// Print the hosted checkout URL
    Open,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(dsn: Option<&str>) -> Option<sentry::ClientInitGuard> {
    let dsn = dsn?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration is needed before tracing so Sentry can hook in first
    let config = CheckoutSyncConfig::from_env();
    let sentry_guard = init_sentry(
        config
            .as_ref()
            .ok()
            .and_then(|c| c.sentry_dsn.as_deref()),
    );

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "checkout_sync_storefront=info,checkout_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => commands::run(cli.command, &config, cli.json).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        // Flush Sentry before exiting; process::exit skips destructors
        drop(sentry_guard);
        std::process::exit(1);
    }
}
