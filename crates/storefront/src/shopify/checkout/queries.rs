//! GraphQL operations for the Storefront checkout API.
//!
//! The checkout schema is small and stable, so the operations implement
//! `GraphQLQuery` by hand instead of deriving it from a schema dump. Response
//! shapes deserialize every field as optional; a missing field is not a parse
//! error here.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

const CHECKOUT_FIELDS: &str = r"
fragment CheckoutFields on Checkout {
  id
  webUrl
  subtotalPrice { amount }
  totalTax { amount }
  totalPrice { amount }
  lineItems(first: 250) {
    edges {
      node {
        id
        quantity
        variant { id }
      }
    }
  }
}
";

const USER_ERROR_FIELDS: &str = r"
fragment UserErrorFields on CheckoutUserError {
  code
  field
  message
}
";

macro_rules! checkout_query {
    ($name:ident, $op:literal, $vars:ty, $data:ty, $body:literal, [$($fragment:expr),+]) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $vars;
            type ResponseData = $data;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                static QUERY: ::std::sync::LazyLock<String> = ::std::sync::LazyLock::new(|| {
                    [$body, $($fragment),+].concat()
                });
                QueryBody {
                    variables,
                    query: QUERY.as_str(),
                    operation_name: $op,
                }
            }
        }
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// `MoneyV2` as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct MoneyV2 {
    pub amount: Option<String>,
}

/// Fields selected by the `CheckoutFields` fragment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutFields {
    pub id: Option<String>,
    pub web_url: Option<String>,
    pub subtotal_price: Option<MoneyV2>,
    pub total_tax: Option<MoneyV2>,
    pub total_price: Option<MoneyV2>,
    pub line_items: Option<LineItemConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItemConnection {
    #[serde(default)]
    pub edges: Vec<LineItemEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItemEdge {
    pub node: LineItemNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItemNode {
    pub id: Option<String>,
    pub quantity: Option<i64>,
    pub variant: Option<VariantRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantRef {
    pub id: String,
}

/// `checkoutUserErrors` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutUserError {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every checkout mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMutationPayload {
    pub checkout: Option<CheckoutFields>,
    #[serde(default)]
    pub checkout_user_errors: Vec<CheckoutUserError>,
}

// =============================================================================
// Create
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CreateCheckoutVariables {
    pub input: CheckoutCreateInput,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCreateInput {
    pub line_items: Vec<CheckoutLineItemInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutData {
    pub checkout_create: Option<CheckoutMutationPayload>,
}

checkout_query!(
    CreateCheckout,
    "CreateCheckout",
    CreateCheckoutVariables,
    CreateCheckoutData,
    r"
mutation CreateCheckout($input: CheckoutCreateInput!) {
  checkoutCreate(input: $input) {
    checkout { ...CheckoutFields }
    checkoutUserErrors { ...UserErrorFields }
  }
}
",
    [CHECKOUT_FIELDS, USER_ERROR_FIELDS]
);

// =============================================================================
// Fetch
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchCheckoutVariables {
    pub checkout_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchCheckoutData {
    pub node: Option<CheckoutFields>,
}

checkout_query!(
    FetchCheckout,
    "FetchCheckout",
    FetchCheckoutVariables,
    FetchCheckoutData,
    r"
query FetchCheckout($checkoutId: ID!) {
  node(id: $checkoutId) {
    ... on Checkout { ...CheckoutFields }
  }
}
",
    [CHECKOUT_FIELDS]
);

// =============================================================================
// Add
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineItemInput {
    pub variant_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineItemsVariables {
    pub checkout_id: String,
    pub line_items: Vec<CheckoutLineItemInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineItemsData {
    pub checkout_line_items_add: Option<CheckoutMutationPayload>,
}

checkout_query!(
    AddLineItems,
    "AddLineItems",
    AddLineItemsVariables,
    AddLineItemsData,
    r"
mutation AddLineItems($checkoutId: ID!, $lineItems: [CheckoutLineItemInput!]!) {
  checkoutLineItemsAdd(checkoutId: $checkoutId, lineItems: $lineItems) {
    checkout { ...CheckoutFields }
    checkoutUserErrors { ...UserErrorFields }
  }
}
",
    [CHECKOUT_FIELDS, USER_ERROR_FIELDS]
);

// =============================================================================
// Remove
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLineItemsVariables {
    pub checkout_id: String,
    pub line_item_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLineItemsData {
    pub checkout_line_items_remove: Option<CheckoutMutationPayload>,
}

checkout_query!(
    RemoveLineItems,
    "RemoveLineItems",
    RemoveLineItemsVariables,
    RemoveLineItemsData,
    r"
mutation RemoveLineItems($checkoutId: ID!, $lineItemIds: [ID!]!) {
  checkoutLineItemsRemove(checkoutId: $checkoutId, lineItemIds: $lineItemIds) {
    checkout { ...CheckoutFields }
    checkoutUserErrors { ...UserErrorFields }
  }
}
",
    [CHECKOUT_FIELDS, USER_ERROR_FIELDS]
);

// =============================================================================
// Update
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineItemUpdateInput {
    pub id: String,
    pub variant_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLineItemsVariables {
    pub checkout_id: String,
    pub line_items: Vec<CheckoutLineItemUpdateInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLineItemsData {
    pub checkout_line_items_update: Option<CheckoutMutationPayload>,
}

checkout_query!(
    UpdateLineItems,
    "UpdateLineItems",
    UpdateLineItemsVariables,
    UpdateLineItemsData,
    r"
mutation UpdateLineItems($checkoutId: ID!, $lineItems: [CheckoutLineItemUpdateInput!]!) {
  checkoutLineItemsUpdate(checkoutId: $checkoutId, lineItems: $lineItems) {
    checkout { ...CheckoutFields }
    checkoutUserErrors { ...UserErrorFields }
  }
}
",
    [CHECKOUT_FIELDS, USER_ERROR_FIELDS]
);
