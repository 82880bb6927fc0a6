//! Prompt builders for the query-generation pipeline.
//!
//! Pure functions of their inputs, no ambient configuration. All model
//! instructions used by the pipeline live in this file.

use crate::models::product::Product;

/// Bucket labels the model may use. Keep in sync with `QueryBucket`.
pub const BUCKETS: [&str; 6] = ["price", "occasion", "material", "fit", "brand", "rating"];

/// Queries accepted per bucket after the self-check pass; also advertised in
/// both prompts so the model aims for it up front.
pub const PER_BUCKET_LIMIT: usize = 2;

/// System prompt shared by the first pass and the self-check pass.
pub const QUERY_SYSTEM: &str =
    "You are a helpful assistant that generates human-like e-commerce search queries. \
    Produce a diverse mix of short keyword-style queries and natural language queries. \
    Queries must be relevant to the given product and reflect realistic user behavior.";

/// First-pass prompt template.
/// Replace: {product_block}, {buckets}, {per_bucket}
const USER_PROMPT_TEMPLATE: &str = r#"Given the product details below, generate realistic user search queries.
Product:
{product_block}

Buckets: {buckets}. For each bucket that applies, generate up to {per_bucket} queries,
balancing short keyword-style and natural-language styles.
Output strictly in minified JSON with this structure:
{"queries":[{"text":"string","style":"short"|"natural","bucket":"price|occasion|material|fit|brand|rating"}]}
Use only fields present in the product. No explanations or extra keys."#;

/// Self-check prompt template: the model audits its own first pass against
/// an explicit checklist.
/// Replace: {product_block}, {first_pass_json}, {per_bucket}
const REFINE_PROMPT_TEMPLATE: &str = r#"You previously generated candidate search queries for the product below.
Audit the candidates against the checklist and return the corrected set.

Product:
{product_block}

Candidate queries (JSON):
{first_pass_json}

Checklist:
1. Cover at least 3 different buckets when the product details allow it.
2. Every "natural" query must read as a full sentence or question of roughly 5 to 12 words.
3. Keep at most {per_bucket} queries per bucket, dropping the weakest extras.
4. Price queries may phrase the price as a budget (e.g. "under $150") but must stay consistent with the listed price.
5. Remove duplicates and queries that do not match the product.

Output strictly in minified JSON with the same structure:
{"queries":[{"text":"string","style":"short"|"natural","bucket":"price|occasion|material|fit|brand|rating"}]}
No explanations or extra keys."#;

/// Builds the first-pass user prompt for one product.
pub fn user_prompt(product: &Product, per_bucket: usize) -> String {
    USER_PROMPT_TEMPLATE
        .replace("{product_block}", &product_block(product))
        .replace("{buckets}", &BUCKETS.join(", "))
        .replace("{per_bucket}", &per_bucket.to_string())
}

/// Builds the self-check prompt from the product and the serialized
/// first-pass queries.
pub fn refine_prompt(product: &Product, first_pass_json: &str, per_bucket: usize) -> String {
    REFINE_PROMPT_TEMPLATE
        .replace("{product_block}", &product_block(product))
        .replace("{first_pass_json}", first_pass_json)
        .replace("{per_bucket}", &per_bucket.to_string())
}

/// Compact product description: only fields that are present, to keep the
/// prompt concise.
fn product_block(product: &Product) -> String {
    let mut parts = vec![
        format!("id: {}", product.id),
        format!("title: {}", product.title),
    ];
    if let Some(description) = &product.description {
        parts.push(format!("description: {description}"));
    }
    if let Some(price) = product.price {
        parts.push(format!("price: {price}"));
    }
    if let Some(material) = &product.material {
        parts.push(format!("material: {material}"));
    }
    if let Some(size) = &product.size {
        parts.push(format!("size: {size}"));
    }
    if let Some(rating) = product.rating {
        parts.push(format!("rating: {rating}"));
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: "p1".to_string(),
            title: "Red Silk Midi Dress".to_string(),
            description: None,
            price: Some(129.0),
            material: Some("silk".to_string()),
            size: None,
            rating: None,
            product_type: Some("Dresses".to_string()),
            vendor: Some("AURORA".to_string()),
            tags: None,
        }
    }

    #[test]
    fn test_user_prompt_includes_only_present_fields() {
        let prompt = user_prompt(&product(), PER_BUCKET_LIMIT);
        assert!(prompt.contains("id: p1"));
        assert!(prompt.contains("title: Red Silk Midi Dress"));
        assert!(prompt.contains("price: 129"));
        assert!(prompt.contains("material: silk"));
        assert!(!prompt.contains("description:"));
        assert!(!prompt.contains("size:"));
        assert!(!prompt.contains("rating:"));
    }

    #[test]
    fn test_user_prompt_advertises_buckets_and_limit() {
        let prompt = user_prompt(&product(), 2);
        assert!(prompt.contains("price, occasion, material, fit, brand, rating"));
        assert!(prompt.contains("up to 2 queries"));
        assert!(!prompt.contains("{per_bucket}"));
    }

    #[test]
    fn test_refine_prompt_embeds_first_pass_json() {
        let first_pass = r#"{"queries":[{"text":"red dress","style":"short","bucket":"misc"}]}"#;
        let prompt = refine_prompt(&product(), first_pass, PER_BUCKET_LIMIT);
        assert!(prompt.contains(first_pass));
        assert!(prompt.contains("Checklist:"));
        assert!(prompt.contains("at most 2 queries per bucket"));
        assert!(!prompt.contains("{first_pass_json}"));
    }
}
