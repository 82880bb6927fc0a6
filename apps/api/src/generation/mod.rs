// Query generation pipeline: prompt building, response interpretation and
// repair, the optional self-check pass, and batch orchestration.
// All LLM calls go through model_client, never the endpoint directly.

pub mod generator;
pub mod handlers;
pub mod interpreter;
pub mod prompts;
