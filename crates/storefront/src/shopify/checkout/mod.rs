//! Shopify Storefront checkout client implementation.
//!
//! Uses `graphql_client` request/response envelopes with `reqwest` for HTTP.
//! Nothing is cached: checkout state is mutable and owned by Shopify.

mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use checkout_sync_core::{CheckoutId, LineItemId, LineItemUpdate, VariantId};
use graphql_client::{GraphQLQuery, Response};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::{
    CheckoutError, CheckoutService, GraphQLError, GraphQLErrorLocation, RemoteCheckout,
};

use conversions::{convert_checkout, convert_mutation_payload};
use queries::{
    AddLineItems, CheckoutCreateInput, CheckoutLineItemInput, CheckoutLineItemUpdateInput,
    CreateCheckout, FetchCheckout, RemoveLineItems, UpdateLineItems,
};

/// Longest response body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront checkout API.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the store domain is not a valid URL or the HTTP
    /// client cannot be built.
    pub fn new(
        config: &ShopifyStorefrontConfig,
        request_timeout: Duration,
    ) -> Result<Self, CheckoutError> {
        let endpoint = config.endpoint().map_err(|e| {
            CheckoutError::Unexpected(format!("invalid store domain {}: {e}", config.store))
        })?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: endpoint.into(),
                access_token: config.storefront_token.expose_secret().to_string(),
            }),
        })
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, CheckoutError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(
                "X-Shopify-Storefront-Access-Token",
                &self.inner.access_token,
            )
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CheckoutError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %excerpt(&response_text, LOG_BODY_LIMIT),
                "Shopify API returned non-success status"
            );
            return Err(CheckoutError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                excerpt(&response_text, 200)
            ))]));
        }

        let response: Response<Q::ResponseData> = serde_json::from_str(&response_text)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %excerpt(&response_text, LOG_BODY_LIMIT),
                    "Failed to parse Shopify GraphQL response"
                );
                CheckoutError::Parse(e)
            })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");
            return Err(CheckoutError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %excerpt(&response_text, LOG_BODY_LIMIT),
                "Shopify GraphQL response has no data and no errors"
            );
            CheckoutError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

fn excerpt(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

// =============================================================================
// Checkout Methods (never cached - mutable state)
// =============================================================================

#[async_trait]
impl CheckoutService for StorefrontClient {
    #[instrument(skip(self))]
    async fn create_checkout(&self) -> Result<RemoteCheckout, CheckoutError> {
        let variables = queries::CreateCheckoutVariables {
            input: CheckoutCreateInput::default(),
        };

        let data = self.execute::<CreateCheckout>(variables).await?;
        convert_mutation_payload(data.checkout_create, "checkoutCreate")
    }

    #[instrument(skip(self), fields(checkout_id = %checkout_id))]
    async fn fetch_checkout(
        &self,
        checkout_id: &CheckoutId,
    ) -> Result<RemoteCheckout, CheckoutError> {
        let variables = queries::FetchCheckoutVariables {
            checkout_id: checkout_id.to_string(),
        };

        let data = self.execute::<FetchCheckout>(variables).await?;

        data.node
            .map(convert_checkout)
            .ok_or_else(|| CheckoutError::NotFound(format!("Checkout not found: {checkout_id}")))
    }

    #[instrument(skip(self), fields(checkout_id = %checkout_id, variant_id = %variant_id))]
    async fn add_variant(
        &self,
        checkout_id: &CheckoutId,
        variant_id: &VariantId,
        quantity: i64,
    ) -> Result<RemoteCheckout, CheckoutError> {
        let variables = queries::AddLineItemsVariables {
            checkout_id: checkout_id.to_string(),
            line_items: vec![CheckoutLineItemInput {
                variant_id: variant_id.to_string(),
                quantity,
            }],
        };

        let data = self.execute::<AddLineItems>(variables).await?;
        convert_mutation_payload(data.checkout_line_items_add, "checkoutLineItemsAdd")
    }

    #[instrument(skip(self), fields(checkout_id = %checkout_id, line_item_id = %line_item_id))]
    async fn remove_line_item(
        &self,
        checkout_id: &CheckoutId,
        line_item_id: &LineItemId,
    ) -> Result<RemoteCheckout, CheckoutError> {
        let variables = queries::RemoveLineItemsVariables {
            checkout_id: checkout_id.to_string(),
            line_item_ids: vec![line_item_id.to_string()],
        };

        let data = self.execute::<RemoveLineItems>(variables).await?;
        convert_mutation_payload(data.checkout_line_items_remove, "checkoutLineItemsRemove")
    }

    #[instrument(skip(self, line_item), fields(checkout_id = %checkout_id, line_item_id = %line_item.id))]
    async fn update_line_item(
        &self,
        checkout_id: &CheckoutId,
        line_item: &LineItemUpdate,
    ) -> Result<RemoteCheckout, CheckoutError> {
        let variables = queries::UpdateLineItemsVariables {
            checkout_id: checkout_id.to_string(),
            line_items: vec![CheckoutLineItemUpdateInput {
                id: line_item.id.to_string(),
                variant_id: line_item.variant_id.to_string(),
                quantity: line_item.quantity,
            }],
        };

        let data = self.execute::<UpdateLineItems>(variables).await?;
        convert_mutation_payload(data.checkout_line_items_update, "checkoutLineItemsUpdate")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(store: &str) -> ShopifyStorefrontConfig {
        ShopifyStorefrontConfig {
            store: store.to_string(),
            api_version: "2024-01".to_string(),
            storefront_token: SecretString::from("9f86d081884c7d659a2feaa0c55ad015"),
        }
    }

    #[test]
    fn test_new_builds_endpoint() {
        let client = StorefrontClient::new(&config("test.myshopify.com"), Duration::from_secs(5))
            .unwrap();
        assert_eq!(
            client.inner.endpoint,
            "https://test.myshopify.com/api/2024-01/graphql.json"
        );
    }

    #[test]
    fn test_new_rejects_invalid_store() {
        let result = StorefrontClient::new(&config("bad store"), Duration::from_secs(5));
        assert!(matches!(result, Err(CheckoutError::Unexpected(_))));
    }

    #[test]
    fn test_convert_graphql_error() {
        let raw: graphql_client::Error = serde_json::from_str(
            r#"{"message":"Invalid id","locations":[{"line":2,"column":3}],"path":["node",0]}"#,
        )
        .unwrap();
        let err = convert_graphql_error(raw);
        assert_eq!(err.message, "Invalid id");
        assert_eq!(err.locations[0].line, 2);
        assert_eq!(err.path.len(), 2);
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        assert_eq!(excerpt("äöü", 2), "äö");
    }
}
