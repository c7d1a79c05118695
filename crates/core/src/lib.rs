//! checkout-sync core - Shared checkout types.
//!
//! This crate provides the types shared by every checkout-sync component:
//! - `storefront` - Remote checkout client and the cart synchronization core
//! - `cli` - Command-line front end driving a persisted checkout
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no state.
//! Identifiers are opaque Shopify global IDs and money is kept as the decimal
//! strings the remote service returns, so nothing here can synthesize a price.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for checkout IDs, line items, and money

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
