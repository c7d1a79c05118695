//! Newtype IDs for type-safe remote entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally passing a line item ID where a variant ID is expected.
//!
//! All IDs wrap the opaque global ID string handed out by the remote service
//! (e.g. `gid://shopify/Checkout/abc123`). They are never parsed or generated
//! locally.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Default`
/// - Conversion methods: `new()`, `as_str()`, `is_empty()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use checkout_sync_core::define_id;
/// define_id!(CheckoutId);
/// define_id!(VariantId);
///
/// let checkout = CheckoutId::new("gid://shopify/Checkout/1");
/// let variant = VariantId::new("gid://shopify/ProductVariant/1");
///
/// // These are different types, so this won't compile:
/// // let _: CheckoutId = variant;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a remote identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is empty (not yet confirmed remotely).
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Consume the ID, returning the underlying identifier.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(CheckoutId);
define_id!(LineItemId);
define_id!(VariantId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_is_raw_gid() {
        let id = CheckoutId::new("gid://shopify/Checkout/c1");
        assert_eq!(id.to_string(), "gid://shopify/Checkout/c1");
    }

    #[test]
    fn test_default_id_is_empty() {
        assert!(LineItemId::default().is_empty());
        assert!(!LineItemId::from("li1").is_empty());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = VariantId::new("v1");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"v1\""));
    }
}
