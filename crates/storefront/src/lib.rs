//! checkout-sync storefront library.
//!
//! Keeps a local cart consistent with a remote Shopify checkout:
//!
//! - [`shopify`] - The remote checkout service seam and its Storefront API client
//! - [`storage`] - Durable storage for the remembered checkout ID
//! - [`cart`] - Cart state, projections, and the synchronization core
//! - [`config`] - Environment-based configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod shopify;
pub mod storage;

pub use cart::{CartState, CartSync, InitStatus, SyncError, SyncOutcome};
pub use storage::{CheckoutIdStore, DisabledStore, FileStore, MemoryStore};
