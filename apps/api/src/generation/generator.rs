//! Query generation: orchestrates the per-product prompt/response cycle
//! and the concurrency-bounded batch fan-out.
//!
//! Flow: build prompts → model call → interpret/repair → (optional)
//! self-check refinement → assemble per-product results in input order.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::generation::interpreter::{interpret, interpret_capped};
use crate::generation::prompts::{self, PER_BUCKET_LIMIT, QUERY_SYSTEM};
use crate::model_client::{ChatModel, ModelError, SamplingParams};
use crate::models::product::Product;
use crate::models::query::{GeneratedQuery, ProductQueries};

/// Knobs for one batch run. Passed explicitly at call time; there is no
/// global mutable state.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Max simultaneously in-flight per-product runs. 1 means sequential.
    pub concurrency: usize,
    /// Whether to run the best-effort self-check pass after the first pass.
    pub self_check: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency_limit.max(1),
            self_check: config.llm_self_check,
            temperature: config.openai_temperature,
            max_tokens: config.openai_max_tokens,
        }
    }
}

/// Generates queries for one product.
///
/// The mandatory first model call propagates its error; isolating it per
/// product is the batch layer's job. Everything after that call degrades to
/// an empty list or to the first-pass result instead of failing.
pub async fn generate_for_product(
    model: &dyn ChatModel,
    product: &Product,
    options: &GenerationOptions,
) -> Result<Vec<GeneratedQuery>, ModelError> {
    let user = prompts::user_prompt(product, PER_BUCKET_LIMIT);
    let params = SamplingParams::first_pass(options.temperature, options.max_tokens);

    let response = model.complete(QUERY_SYSTEM, &user, &params).await?;

    let content = match response.text() {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => {
            warn!(product_id = %product.id, "Empty model response (no choices or content)");
            return Ok(Vec::new());
        }
    };
    debug!(product_id = %product.id, raw = %content, "First-pass model output");

    let first_pass = interpret(&content);

    if !options.self_check {
        return Ok(first_pass);
    }

    let refined = attempt_refinement(model, product, &first_pass, options).await;
    Ok(apply_refinement(first_pass, refined))
}

/// Wire shape the self-check prompt embeds; matches the output contract the
/// model is asked to follow.
#[derive(Serialize)]
struct QueriesEnvelope<'a> {
    queries: &'a [GeneratedQuery],
}

/// Best-effort self-check pass. Returns `None` whenever anything goes wrong
/// in the stage (serialization, transport, unparsable output, empty refined
/// set) so the caller uniformly falls back to the first pass.
async fn attempt_refinement(
    model: &dyn ChatModel,
    product: &Product,
    first_pass: &[GeneratedQuery],
    options: &GenerationOptions,
) -> Option<Vec<GeneratedQuery>> {
    let first_pass_json = serde_json::to_string(&QueriesEnvelope {
        queries: first_pass,
    })
    .ok()?;
    let user = prompts::refine_prompt(product, &first_pass_json, PER_BUCKET_LIMIT);
    let params = SamplingParams::refinement(options.temperature, options.max_tokens);

    let response = match model.complete(QUERY_SYSTEM, &user, &params).await {
        Ok(response) => response,
        Err(e) => {
            warn!(product_id = %product.id, error = %e, "Self-check call failed; keeping first pass");
            return None;
        }
    };

    let content = match response.text() {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => {
            warn!(product_id = %product.id, "Empty self-check response; keeping first pass");
            return None;
        }
    };
    debug!(product_id = %product.id, raw = %content, "Self-check model output");

    let refined = interpret_capped(&content, PER_BUCKET_LIMIT);
    if refined.is_empty() {
        warn!(product_id = %product.id, "Self-check produced no usable queries; keeping first pass");
        None
    } else {
        Some(refined)
    }
}

/// Pure fallback decision: a non-empty refined set replaces the first pass;
/// anything else keeps it. Refinement never reduces availability below the
/// first pass.
pub fn apply_refinement(
    first_pass: Vec<GeneratedQuery>,
    refined: Option<Vec<GeneratedQuery>>,
) -> Vec<GeneratedQuery> {
    match refined {
        Some(refined) if !refined.is_empty() => refined,
        _ => first_pass,
    }
}

/// Generates queries for a batch of products with per-product error
/// isolation.
///
/// Always returns one entry per input product, in input order, regardless
/// of the concurrency bound or per-product failures. Order is established
/// by index-preserving assembly, not by completion order.
pub async fn generate_batch(
    model: &dyn ChatModel,
    products: &[Product],
    options: &GenerationOptions,
) -> Vec<ProductQueries> {
    if products.is_empty() {
        return Vec::new();
    }

    info!(
        products = products.len(),
        concurrency = options.concurrency,
        self_check = options.self_check,
        "Generating queries for batch"
    );

    if options.concurrency <= 1 {
        let mut results = Vec::with_capacity(products.len());
        for product in products {
            results.push(run_isolated(model, product, options).await);
        }
        return results;
    }

    // Admission gate: at most `concurrency` per-product runs hold a permit
    // at any instant. join_all keeps the output aligned with the input.
    let gate = Arc::new(Semaphore::new(options.concurrency));
    let runs = products.iter().map(|product| {
        let gate = Arc::clone(&gate);
        async move {
            // The gate is never closed, so acquire cannot fail.
            let _permit = gate.acquire().await.expect("admission gate closed");
            run_isolated(model, product, options).await
        }
    });
    join_all(runs).await
}

/// Runs one product through the pipeline, converting any escaped error into
/// an empty result so one bad product never aborts its siblings.
async fn run_isolated(
    model: &dyn ChatModel,
    product: &Product,
    options: &GenerationOptions,
) -> ProductQueries {
    let queries = match generate_for_product(model, product, options).await {
        Ok(queries) => queries,
        Err(e) => {
            warn!(product_id = %product.id, error = %e, "Query generation failed for product");
            Vec::new()
        }
    };
    ProductQueries {
        product_id: product.id.clone(),
        queries,
    }
}
