//! Conversions from raw GraphQL responses to proxy domain types.

use crate::shopify::types::{
    Cart, CartLine, Image, Money, PriceRange, ProductDetail, ProductSummary, ProductVariant,
    SelectedOption,
};

use super::queries::{ImageNode, MoneyV2, VariantNode, create_cart, get_product, get_products};

fn convert_money(money: MoneyV2) -> Money {
    Money {
        amount: money.amount,
        currency_code: money.currency_code,
    }
}

fn convert_image(image: ImageNode) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
    }
}

fn convert_variant(variant: VariantNode) -> ProductVariant {
    ProductVariant {
        id: variant.id,
        title: variant.title,
        price: convert_money(variant.price),
        compare_at_price: variant.compare_at_price.map(convert_money),
        available_for_sale: variant.available_for_sale,
        quantity_available: variant.quantity_available,
        selected_options: variant
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
    }
}

pub fn convert_product_summary(product: get_products::ProductNode) -> ProductSummary {
    ProductSummary {
        id: product.id,
        title: product.title,
        description: product.description,
        handle: product.handle,
        vendor: product.vendor,
        product_type: product.product_type,
        tags: product.tags,
        featured_image: product.featured_image.map(convert_image),
        min_price: convert_money(product.price_range.min_variant_price),
        available_for_sale: product.available_for_sale,
        variant: product.variants.into_nodes().next().map(convert_variant),
    }
}

pub fn convert_product_detail(product: get_product::ProductNode) -> ProductDetail {
    ProductDetail {
        id: product.id,
        title: product.title,
        description: product.description,
        description_html: product.description_html,
        handle: product.handle,
        vendor: product.vendor,
        product_type: product.product_type,
        tags: product.tags,
        featured_image: product.featured_image.map(convert_image),
        price_range: PriceRange {
            min_variant_price: convert_money(product.price_range.min_variant_price),
            max_variant_price: convert_money(product.price_range.max_variant_price),
        },
        available_for_sale: product.available_for_sale,
        variants: product.variants.into_nodes().map(convert_variant).collect(),
    }
}

pub fn convert_cart(cart: create_cart::CartNode) -> Cart {
    Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        total_amount: convert_money(cart.cost.total_amount),
        lines: cart
            .lines
            .into_nodes()
            .map(|line| {
                let product = line.merchandise.product;
                CartLine {
                    id: line.id,
                    quantity: line.quantity,
                    total_amount: convert_money(line.cost.total_amount),
                    variant_id: line.merchandise.id,
                    variant_title: line.merchandise.title,
                    product_id: product.as_ref().map(|p| p.id.clone()),
                    product_title: product.as_ref().map(|p| p.title.clone()),
                    product_handle: product.map(|p| p.handle),
                }
            })
            .collect(),
    }
}

/// Join mutation user errors into one user-facing message.
pub fn join_user_errors(errors: &[create_cart::CartUserError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn money(amount: &str) -> serde_json::Value {
        json!({ "amount": amount, "currencyCode": "USD" })
    }

    #[test]
    fn test_summary_takes_first_variant_and_min_price() {
        let data: get_products::ResponseData = serde_json::from_value(json!({
            "products": { "edges": [{ "node": {
                "id": "gid://shopify/Product/1",
                "title": "OG Account",
                "description": "Rare skins",
                "handle": "og-account",
                "vendor": "Konvy",
                "productType": "Account",
                "tags": ["og", "rare"],
                "featuredImage": { "url": "https://cdn/x.png", "altText": null },
                "variants": { "edges": [{ "node": {
                    "id": "gid://shopify/ProductVariant/11",
                    "title": "Default Title",
                    "price": money("49.99"),
                    "compareAtPrice": null,
                    "availableForSale": true,
                    "quantityAvailable": 3
                }}]},
                "priceRange": { "minVariantPrice": money("49.99") },
                "availableForSale": true
            }}]}
        }))
        .unwrap();

        let products: Vec<_> = data
            .products
            .into_nodes()
            .map(convert_product_summary)
            .collect();
        assert_eq!(products.len(), 1);

        let product = &products[0];
        assert_eq!(product.tags, vec!["og", "rare"]);
        assert_eq!(product.min_price.amount, "49.99");
        let variant = product.variant.as_ref().unwrap();
        assert_eq!(variant.quantity_available, Some(3));
        assert!(variant.selected_options.is_empty());

        let out = serde_json::to_value(product).unwrap();
        assert_eq!(out["featuredImage"]["url"], "https://cdn/x.png");
        assert_eq!(out["minPrice"]["currencyCode"], "USD");
        assert!(out["variant"].get("selectedOptions").is_none());
    }

    #[test]
    fn test_summary_without_variants() {
        let node: get_products::ProductNode = serde_json::from_value(json!({
            "id": "p", "title": "t", "description": "", "handle": "h",
            "vendor": "", "productType": "", "tags": [],
            "featuredImage": null,
            "variants": { "edges": [] },
            "priceRange": { "minVariantPrice": money("0.0") },
            "availableForSale": false
        }))
        .unwrap();

        let product = convert_product_summary(node);
        assert!(product.variant.is_none());
        assert!(product.featured_image.is_none());
    }

    #[test]
    fn test_detail_keeps_all_variants_and_options() {
        let node: get_product::ProductNode = serde_json::from_value(json!({
            "id": "p", "title": "Stacked", "description": "d",
            "descriptionHtml": "<p>d</p>", "handle": "stacked",
            "vendor": "Konvy", "productType": "Account", "tags": [],
            "featuredImage": null,
            "variants": { "edges": [
                { "node": {
                    "id": "v1", "title": "PC", "price": money("10.00"),
                    "compareAtPrice": money("15.00"), "availableForSale": true,
                    "quantityAvailable": null,
                    "selectedOptions": [{ "name": "Platform", "value": "PC" }]
                }},
                { "node": {
                    "id": "v2", "title": "Console", "price": money("12.00"),
                    "compareAtPrice": null, "availableForSale": false,
                    "quantityAvailable": 0,
                    "selectedOptions": [{ "name": "Platform", "value": "Console" }]
                }}
            ]},
            "priceRange": {
                "minVariantPrice": money("10.00"),
                "maxVariantPrice": money("12.00")
            },
            "availableForSale": true
        }))
        .unwrap();

        let product = convert_product_detail(node);
        assert_eq!(product.variants.len(), 2);
        assert_eq!(product.price_range.max_variant_price.amount, "12.00");
        assert_eq!(
            product.variants[0].compare_at_price.as_ref().unwrap().amount,
            "15.00"
        );
        assert_eq!(product.variants[1].selected_options[0].value, "Console");
    }

    #[test]
    fn test_cart_conversion() {
        let data: create_cart::ResponseData = serde_json::from_value(json!({
            "cartCreate": {
                "cart": {
                    "id": "gid://shopify/Cart/abc",
                    "checkoutUrl": "https://shop/checkouts/abc",
                    "cost": { "totalAmount": money("20.00") },
                    "lines": { "edges": [{ "node": {
                        "id": "line-1",
                        "quantity": 2,
                        "cost": { "totalAmount": money("20.00") },
                        "merchandise": {
                            "id": "v1",
                            "title": "PC",
                            "product": { "id": "p1", "title": "Stacked", "handle": "stacked" }
                        }
                    }}]}
                },
                "userErrors": []
            }
        }))
        .unwrap();

        let cart = convert_cart(data.cart_create.unwrap().cart.unwrap());
        assert_eq!(cart.checkout_url, "https://shop/checkouts/abc");
        assert_eq!(cart.lines[0].quantity, 2);
        assert_eq!(cart.lines[0].product_handle.as_deref(), Some("stacked"));
    }

    #[test]
    fn test_join_user_errors() {
        let errors: Vec<create_cart::CartUserError> = serde_json::from_value(json!([
            { "message": "Merchandise does not exist" },
            { "message": "Quantity is invalid" }
        ]))
        .unwrap();

        assert_eq!(
            join_user_errors(&errors),
            "Merchandise does not exist, Quantity is invalid"
        );
    }
}
