//! GraphQL operations for the Shopify Storefront API.
//!
//! Each operation mirrors what `#[derive(GraphQLQuery)]` would generate: a
//! marker type implementing [`GraphQLQuery`] plus a snake-case module holding
//! the query text, `Variables` and `ResponseData`. The response types only
//! cover the fields selected in `graphql/storefront/*.graphql`.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::Deserialize;

/// Relay-style connection, reduced to its nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Connection<T> {
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    /// Decimal scalar, kept as a string to preserve precision
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionNode {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub title: String,
    pub price: MoneyV2,
    pub compare_at_price: Option<MoneyV2>,
    pub available_for_sale: bool,
    /// Null unless the token has the inventory read scope
    pub quantity_available: Option<i64>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOptionNode>,
}

// =============================================================================
// GetProducts
// =============================================================================

pub struct GetProducts;

pub mod get_products {
    use serde::{Deserialize, Serialize};

    use super::{Connection, ImageNode, MoneyV2, VariantNode};

    pub const OPERATION_NAME: &str = "GetProducts";
    pub const QUERY: &str = include_str!("../../../graphql/storefront/products.graphql");

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNode {
        pub id: String,
        pub title: String,
        pub description: String,
        pub handle: String,
        pub vendor: String,
        pub product_type: String,
        pub tags: Vec<String>,
        pub featured_image: Option<ImageNode>,
        pub variants: Connection<VariantNode>,
        pub price_range: PriceRange,
        pub available_for_sale: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRange {
        pub min_variant_price: MoneyV2,
    }
}

impl GraphQLQuery for GetProducts {
    type Variables = get_products::Variables;
    type ResponseData = get_products::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_products::QUERY,
            operation_name: get_products::OPERATION_NAME,
        }
    }
}

// =============================================================================
// GetProduct
// =============================================================================

pub struct GetProduct;

pub mod get_product {
    use serde::{Deserialize, Serialize};

    use super::{Connection, ImageNode, MoneyV2, VariantNode};

    pub const OPERATION_NAME: &str = "GetProduct";
    pub const QUERY: &str = include_str!("../../../graphql/storefront/product.graphql");

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNode {
        pub id: String,
        pub title: String,
        pub description: String,
        pub description_html: String,
        pub handle: String,
        pub vendor: String,
        pub product_type: String,
        pub tags: Vec<String>,
        pub featured_image: Option<ImageNode>,
        pub variants: Connection<VariantNode>,
        pub price_range: PriceRange,
        pub available_for_sale: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRange {
        pub min_variant_price: MoneyV2,
        pub max_variant_price: MoneyV2,
    }
}

impl GraphQLQuery for GetProduct {
    type Variables = get_product::Variables;
    type ResponseData = get_product::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_product::QUERY,
            operation_name: get_product::OPERATION_NAME,
        }
    }
}

// =============================================================================
// CreateCart
// =============================================================================

pub struct CreateCart;

pub mod create_cart {
    use serde::{Deserialize, Serialize};

    use super::{Connection, MoneyV2};

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = include_str!("../../../graphql/storefront/cart.graphql");

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineInput {
        pub merchandise_id: String,
        pub quantity: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartCreatePayload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCreatePayload {
        pub cart: Option<CartNode>,
        pub user_errors: Vec<CartUserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CartUserError {
        pub message: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartNode {
        pub id: String,
        pub checkout_url: String,
        pub cost: CartCost,
        pub lines: Connection<CartLineNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCost {
        pub total_amount: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CartLineNode {
        pub id: String,
        pub quantity: i64,
        pub cost: CartCost,
        pub merchandise: Merchandise,
    }

    /// `Merchandise` union; only `ProductVariant` is selected, other members
    /// arrive as an empty object.
    #[derive(Debug, Clone, Deserialize)]
    pub struct Merchandise {
        pub id: Option<String>,
        pub title: Option<String>,
        pub product: Option<MerchandiseProduct>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MerchandiseProduct {
        pub id: String,
        pub title: String,
        pub handle: String,
    }
}

impl GraphQLQuery for CreateCart {
    type Variables = create_cart::Variables;
    type ResponseData = create_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: create_cart::QUERY,
            operation_name: create_cart::OPERATION_NAME,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_bodies_name_their_operation() {
        let body = GetProducts::build_query(get_products::Variables { first: 12 });
        assert!(body.query.contains("query GetProducts"));
        assert_eq!(body.operation_name, "GetProducts");

        let body = GetProduct::build_query(get_product::Variables {
            id: "gid://shopify/Product/1".to_string(),
        });
        assert!(body.query.contains("query GetProduct("));

        let body = CreateCart::build_query(create_cart::Variables {
            input: create_cart::CartInput { lines: vec![] },
        });
        assert!(body.query.contains("mutation CreateCart"));
    }

    #[test]
    fn test_cart_variables_serialize_camel_case() {
        let variables = create_cart::Variables {
            input: create_cart::CartInput {
                lines: vec![create_cart::CartLineInput {
                    merchandise_id: "gid://shopify/ProductVariant/9".to_string(),
                    quantity: 2,
                }],
            },
        };
        let json = serde_json::to_value(&variables).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "input": {
                    "lines": [{
                        "merchandiseId": "gid://shopify/ProductVariant/9",
                        "quantity": 2
                    }]
                }
            })
        );
    }
}
