//! Product search-query generation service: prompts an LLM chat endpoint
//! per product, repairs and normalizes its output, and fans out across a
//! batch under a bounded concurrency gate.

pub mod adapters;
pub mod config;
pub mod errors;
pub mod generation;
pub mod model_client;
pub mod models;
pub mod routes;
pub mod state;
pub mod textclean;
