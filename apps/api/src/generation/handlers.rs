//! Axum route handlers for the query-generation API.
//!
//! Handlers are thin: validate the request shape, run the batch pipeline,
//! wrap the result. All failure isolation lives in the generator.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapters::shopify::{map_products, ShopifyProduct};
use crate::errors::AppError;
use crate::generation::generator::generate_batch;
use crate::models::product::Product;
use crate::models::query::ProductQueries;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductsRequest {
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct ShopifyProductsRequest {
    pub products: Vec<ShopifyProduct>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<ProductQueries>,
}

/// POST /api/v1/queries/generate
///
/// Accepts normalized product records and returns generated queries for
/// each, in input order. A product that yields no queries is a legitimate
/// outcome, not an error.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<ProductsRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    for (index, product) in request.products.iter().enumerate() {
        product
            .validate()
            .map_err(|reason| AppError::Validation(format!("products[{index}]: {reason}")))?;
    }

    let results = generate_batch(state.model.as_ref(), &request.products, &state.options).await;
    Ok(Json(BatchResponse { results }))
}

/// POST /api/v1/queries/generate/shopify
///
/// Accepts Shopify-shaped product objects, adapts them into normalized
/// records (silently dropping unusable ones), and returns generated queries.
pub async fn handle_generate_shopify(
    State(state): State<AppState>,
    Json(request): Json<ShopifyProductsRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    let received = request.products.len();
    let products = map_products(request.products);
    if products.len() < received {
        info!(
            received,
            mapped = products.len(),
            "Dropped unusable Shopify products during adaptation"
        );
    }

    let results = generate_batch(state.model.as_ref(), &products, &state.options).await;
    Ok(Json(BatchResponse { results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_request_deserializes() {
        let json = r#"{"products":[{"id":"p1","title":"Red Dress","price":129.0}]}"#;
        let request: ProductsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.products.len(), 1);
        assert_eq!(request.products[0].id, "p1");
    }

    #[test]
    fn test_batch_response_serializes_results_key() {
        let response = BatchResponse {
            results: vec![ProductQueries {
                product_id: "p1".to_string(),
                queries: vec![],
            }],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"results":[{"product_id":"p1","queries":[]}]}"#);
    }
}
