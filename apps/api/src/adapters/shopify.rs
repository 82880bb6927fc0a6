//! Adapter mapping Shopify-shaped product payloads into normalized records.
//!
//! - Strips HTML down to compact description text
//! - Takes the minimum parseable variant price
//! - Joins the values of the "Size" option
//! - Passes through vendor, product_type, tags
//! - Leaves material unset so the model infers it from the other fields
//!
//! Records without a usable id or title are dropped, not errored.

use std::collections::HashSet;
use std::sync::OnceLock;

use html_escape::decode_html_entities;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::models::product::Product;

const MAX_DESCRIPTION_CHARS: usize = 512;

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyProduct {
    /// Shopify ids arrive as numbers or strings depending on the export.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub tags: Option<Value>,
    #[serde(default)]
    pub variants: Vec<ShopifyVariant>,
    #[serde(default)]
    pub options: Vec<ShopifyOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyVariant {
    #[serde(default)]
    pub price: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyOption {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Maps a batch, dropping records that cannot be adapted.
pub fn map_products(products: Vec<ShopifyProduct>) -> Vec<Product> {
    products.iter().filter_map(map_product).collect()
}

pub fn map_product(raw: &ShopifyProduct) -> Option<Product> {
    let id = raw.id.as_ref().and_then(id_string)?;
    let title = raw
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();

    Some(Product {
        id,
        title,
        description: raw.body_html.as_deref().and_then(html_to_text),
        price: min_variant_price(&raw.variants),
        material: None, // let the model infer from description/tags/type
        size: extract_size(&raw.options),
        rating: None,
        product_type: nonempty(&raw.product_type),
        vendor: nonempty(&raw.vendor),
        tags: clean_tags(&raw.tags),
    })
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn nonempty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// HTML body → compact plain text: unescape entities, drop tags, collapse
/// whitespace, truncate at a word boundary.
fn html_to_text(html: &str) -> Option<String> {
    let decoded = decode_html_entities(html);
    let without_tags = tag_re().replace_all(&decoded, " ");
    let collapsed = ws_re().replace_all(without_tags.trim(), " ").into_owned();
    if collapsed.is_empty() {
        return None;
    }
    Some(truncate_at_word(&collapsed, MAX_DESCRIPTION_CHARS))
}

fn truncate_at_word(text: &str, max_chars: usize) -> String {
    let byte_limit = match text.char_indices().nth(max_chars) {
        Some((index, _)) => index,
        None => return text.to_string(),
    };
    let head = &text[..byte_limit];
    match head.rfind(' ') {
        Some(cut) if cut > 0 => head[..cut].trim_end().to_string(),
        _ => head.to_string(),
    }
}

/// Minimum price across variants; unparseable prices are skipped.
fn min_variant_price(variants: &[ShopifyVariant]) -> Option<f64> {
    variants
        .iter()
        .filter_map(|variant| variant.price.as_ref())
        .filter_map(price_value)
        .fold(None, |min, price| match min {
            Some(current) if current <= price => Some(current),
            _ => Some(price),
        })
}

fn price_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Comma-joined, deduplicated values of the option named "Size".
fn extract_size(options: &[ShopifyOption]) -> Option<String> {
    for option in options {
        let name = option.name.as_deref().unwrap_or("").trim();
        if !name.eq_ignore_ascii_case("size") {
            continue;
        }
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for value in &option.values {
            let Some(cleaned) = scalar_string(value) else {
                continue;
            };
            if seen.insert(cleaned.clone()) {
                ordered.push(cleaned);
            }
        }
        if !ordered.is_empty() {
            return Some(ordered.join(","));
        }
    }
    None
}

fn clean_tags(tags: &Option<Value>) -> Option<Vec<String>> {
    let list = tags.as_ref()?.as_array()?;
    let cleaned: Vec<String> = list.iter().filter_map(scalar_string).collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shopify(value: Value) -> ShopifyProduct {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_maps_full_product() {
        let raw = shopify(json!({
            "id": 1,
            "title": "Red Silk Midi Dress",
            "body_html": "<p>Elegant red midi dress made from 100% silk.</p>",
            "vendor": "AURORA",
            "product_type": "Clothing > Dresses",
            "tags": ["Silk", "Wedding", ""],
            "variants": [{"price": "129.00"}, {"price": "139.00"}],
            "options": [{"name": "Size", "values": ["XS", "S", "XS", "M"]}]
        }));
        let product = map_product(&raw).unwrap();
        assert_eq!(product.id, "1");
        assert_eq!(product.title, "Red Silk Midi Dress");
        assert_eq!(
            product.description.as_deref(),
            Some("Elegant red midi dress made from 100% silk.")
        );
        assert_eq!(product.price, Some(129.0));
        assert_eq!(product.size.as_deref(), Some("XS,S,M"));
        assert_eq!(product.vendor.as_deref(), Some("AURORA"));
        assert!(product.material.is_none());
        assert_eq!(product.tags, Some(vec!["Silk".to_string(), "Wedding".to_string()]));
    }

    #[test]
    fn test_drops_product_without_id_or_title() {
        assert!(map_product(&shopify(json!({"title": "No Id"}))).is_none());
        assert!(map_product(&shopify(json!({"id": 7}))).is_none());
        assert!(map_product(&shopify(json!({"id": 7, "title": "  "}))).is_none());
    }

    #[test]
    fn test_map_products_keeps_only_usable_records() {
        let batch = vec![
            shopify(json!({"id": 1, "title": "Keep"})),
            shopify(json!({"title": "Drop"})),
        ];
        let products = map_products(batch);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "Keep");
    }

    #[test]
    fn test_html_to_text_unescapes_and_collapses() {
        let text = html_to_text("<p>Soft &amp; warm</p>\n<ul><li>cashmere</li></ul>").unwrap();
        assert_eq!(text, "Soft & warm cashmere");
    }

    #[test]
    fn test_html_to_text_empty_body_is_none() {
        assert!(html_to_text("<p>   </p>").is_none());
    }

    #[test]
    fn test_description_truncated_at_word_boundary() {
        let long = format!("<p>{}</p>", "word ".repeat(200));
        let text = html_to_text(&long).unwrap();
        assert!(text.chars().count() <= MAX_DESCRIPTION_CHARS);
        assert!(!text.ends_with(' '));
        assert!(text.ends_with("word"));
    }

    #[test]
    fn test_min_price_skips_unparseable_variants() {
        let raw = shopify(json!({
            "id": 1,
            "title": "Jacket",
            "variants": [{"price": "n/a"}, {"price": "299.00"}, {"price": 250}]
        }));
        assert_eq!(map_product(&raw).unwrap().price, Some(250.0));
    }

    #[test]
    fn test_no_parseable_price_is_none() {
        let raw = shopify(json!({"id": 1, "title": "Jacket", "variants": [{"price": null}]}));
        assert!(map_product(&raw).unwrap().price.is_none());
    }

    #[test]
    fn test_size_option_matched_case_insensitively() {
        let raw = shopify(json!({
            "id": 1,
            "title": "Jacket",
            "options": [
                {"name": "Color", "values": ["Black"]},
                {"name": "SIZE", "values": ["S", "M"]}
            ]
        }));
        assert_eq!(map_product(&raw).unwrap().size.as_deref(), Some("S,M"));
    }

    #[test]
    fn test_non_list_tags_become_none() {
        let raw = shopify(json!({"id": 1, "title": "Jacket", "tags": "Leather, Biker"}));
        assert!(map_product(&raw).unwrap().tags.is_none());
    }
}
