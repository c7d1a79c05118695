//! Remote checkout service: the [`CheckoutService`] seam and its Shopify
//! Storefront API implementation.
//!
//! # Architecture
//!
//! - [`CheckoutService`] is the only way the sync core talks to the remote
//!   service. Each operation resolves exactly once, with either a
//!   [`RemoteCheckout`] or a [`CheckoutError`].
//! - [`StorefrontClient`] implements it with `graphql_client` request/response
//!   envelopes over `reqwest`.
//! - The remote service is the source of truth. Nothing here caches checkout
//!   state; every call goes to the API.
//!
//! # Example
//!
//! ```rust,ignore
//! use checkout_sync_storefront::shopify::{CheckoutService, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.shopify, config.request_timeout)?;
//!
//! let checkout = client.create_checkout().await?;
//! let checkout = client
//!     .add_variant(checkout.id.as_ref().unwrap(), &variant_id, 1)
//!     .await?;
//! ```

mod checkout;
pub mod types;

pub use checkout::StorefrontClient;
pub use types::RemoteCheckout;

use async_trait::async_trait;
use checkout_sync_core::{CheckoutId, LineItemId, LineItemUpdate, VariantId};
use thiserror::Error;

/// Errors that can occur when talking to the remote checkout service.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Checkout not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid variant).
    #[error("User error: {0}")]
    UserError(String),

    /// Any other failure reported by a service implementation.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// An error carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Remote checkout operations consumed by the sync core.
///
/// Every method resolves exactly once. Implementations must not retry on
/// their own; retry is the caller's decision.
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Provision a new, empty checkout.
    async fn create_checkout(&self) -> Result<RemoteCheckout, CheckoutError>;

    /// Fetch an existing checkout by ID.
    async fn fetch_checkout(&self, checkout_id: &CheckoutId)
    -> Result<RemoteCheckout, CheckoutError>;

    /// Add `quantity` of a variant to the checkout.
    async fn add_variant(
        &self,
        checkout_id: &CheckoutId,
        variant_id: &VariantId,
        quantity: i64,
    ) -> Result<RemoteCheckout, CheckoutError>;

    /// Remove a line item from the checkout.
    async fn remove_line_item(
        &self,
        checkout_id: &CheckoutId,
        line_item_id: &LineItemId,
    ) -> Result<RemoteCheckout, CheckoutError>;

    /// Set the absolute quantity of a line item.
    async fn update_line_item(
        &self,
        checkout_id: &CheckoutId,
        line_item: &LineItemUpdate,
    ) -> Result<RemoteCheckout, CheckoutError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_error_display() {
        let err = CheckoutError::NotFound("gid://shopify/Checkout/c1".to_string());
        assert_eq!(err.to_string(), "Not found: gid://shopify/Checkout/c1");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let err = CheckoutError::GraphQL(vec![
            GraphQLError::message("Field not found"),
            GraphQLError::message("Invalid ID"),
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_path_and_location() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 5, column: 10 }],
            path: vec![
                serde_json::Value::String("checkoutLineItemsAdd".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = CheckoutError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: checkoutLineItemsAdd.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_empty_vec() {
        let err = CheckoutError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = CheckoutError::RateLimited(2);
        assert_eq!(err.to_string(), "Rate limited, retry after 2 seconds");
    }
}
