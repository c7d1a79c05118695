//! Core types for checkout-sync.
//!
//! This module provides type-safe wrappers for checkout domain concepts.

pub mod id;
pub mod line_item;
pub mod money;

pub use id::*;
pub use line_item::{LineItem, LineItemUpdate, total_quantity};
pub use money::{Money, PriceTriple};
