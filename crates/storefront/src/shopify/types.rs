//! Domain types returned by the catalog and checkout proxies.
//!
//! These are the normalized shapes sent to browsers, separate from the raw
//! GraphQL response types in `storefront::queries`. Field names serialize in
//! camelCase to match the Storefront API conventions clients already expect.

use serde::Serialize;

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
}

/// A variant option such as `Platform: PC`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// A purchasable variant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub title: String,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    pub available_for_sale: bool,
    pub quantity_available: Option<i64>,
    /// Only populated in detail mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selected_options: Vec<SelectedOption>,
}

/// List-mode product: one representative variant and the minimum price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub handle: String,
    pub vendor: String,
    pub product_type: String,
    pub tags: Vec<String>,
    pub featured_image: Option<Image>,
    pub min_price: Money,
    pub available_for_sale: bool,
    pub variant: Option<ProductVariant>,
}

/// Price range across a product's variants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min_variant_price: Money,
    pub max_variant_price: Money,
}

/// Detail-mode product with up to ten variants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub description_html: String,
    pub handle: String,
    pub vendor: String,
    pub product_type: String,
    pub tags: Vec<String>,
    pub featured_image: Option<Image>,
    pub price_range: PriceRange,
    pub available_for_sale: bool,
    pub variants: Vec<ProductVariant>,
}

/// A freshly created cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    /// Hosted checkout page the browser is sent to.
    pub checkout_url: String,
    pub total_amount: Money,
    pub lines: Vec<CartLine>,
}

/// A cart line with its variant and product references.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub quantity: i64,
    pub total_amount: Money,
    pub variant_id: Option<String>,
    pub variant_title: Option<String>,
    pub product_id: Option<String>,
    pub product_title: Option<String>,
    pub product_handle: Option<String>,
}
