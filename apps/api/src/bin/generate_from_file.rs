//! Offline batch tool: loads Shopify-shaped products from a JSON file, runs
//! the generation pipeline, exports the results as a JSON document, and
//! prints a concise preview.
//!
//! Requires OPENAI_API_KEY (and optionally the other OPENAI_* variables) in
//! the environment or a .env file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use querygen_api::adapters::shopify::{map_products, ShopifyProduct};
use querygen_api::config::Config;
use querygen_api::generation::generator::{generate_batch, GenerationOptions};
use querygen_api::model_client::OpenAiClient;
use querygen_api::models::product::Product;
use querygen_api::models::query::ProductQueries;

#[derive(Parser, Debug)]
#[command(
    name = "generate-from-file",
    about = "Generate search queries for products stored in a JSON file"
)]
struct Args {
    /// Input JSON file holding {"products": [...]} in Shopify shape
    #[arg(long, default_value = "data/merged_products_clean.json")]
    path: PathBuf,

    /// Number of products to process
    #[arg(long, default_value_t = 2)]
    limit: usize,

    /// Concurrency bound for generation
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Output JSON path for generated queries
    #[arg(long, default_value = "data/generated_queries.json")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let raw = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let document: Value =
        serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", args.path.display()))?;
    let shopify: Vec<ShopifyProduct> = serde_json::from_value(
        document
            .get("products")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())),
    )
    .context("'products' must be an array of product objects")?;

    let products = map_products(shopify.into_iter().take(args.limit).collect());
    if products.is_empty() {
        println!("No valid products found in input.");
        return Ok(());
    }

    let model = OpenAiClient::new(
        config.openai_api_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    );
    let mut options = GenerationOptions::from_config(&config);
    options.concurrency = args.concurrency.max(1);

    let results = generate_batch(&model, &products, &options).await;

    let records = build_export_records(&products, &results);
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(&args.out, serde_json::to_string_pretty(&records)?)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!("Saved {} records to {}", records.len(), args.out.display());

    print_preview(&products, &results);
    Ok(())
}

/// One-way export shape: identifying/descriptive product fields plus the
/// generated queries. Not a format the pipeline reads back.
fn build_export_records(products: &[Product], results: &[ProductQueries]) -> Vec<Value> {
    products
        .iter()
        .zip(results)
        .map(|(product, result)| {
            json!({
                "id": product.id,
                "title": product.title,
                "description": product.description,
                "price": product.price,
                "material": product.material,
                "size": product.size,
                "rating": product.rating,
                "product_type": product.product_type,
                "vendor": product.vendor,
                "tags": product.tags,
                "queries": result.queries,
            })
        })
        .collect()
}

fn print_preview(products: &[Product], results: &[ProductQueries]) {
    for (product, result) in products.iter().zip(results) {
        println!("\n=== Product ===");
        println!("id: {}", product.id);
        println!("title: {}", product.title);
        if let Some(price) = product.price {
            println!("price: {price}");
        }
        if let Some(size) = &product.size {
            println!("size: {size}");
        }
        if let Some(vendor) = &product.vendor {
            println!("vendor: {vendor}");
        }
        if let Some(product_type) = &product.product_type {
            println!("product_type: {product_type}");
        }
        if let Some(tags) = &product.tags {
            println!("tags: {}", tags.join(", "));
        }
        println!("queries: {}", result.queries.len());

        for query in result.queries.iter().take(10) {
            println!(
                "- {} -- {} -- {}",
                query.style.as_str(),
                query.bucket.as_str(),
                query.text
            );
        }
    }
}
