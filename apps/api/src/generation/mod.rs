// Outreach generation: the aggregation core, the content synthesizer seam and the HTTP handlers.
// All LLM calls go through llm_client.

pub mod aggregator;
pub mod handlers;
pub mod prompts;
pub mod synthesizer;
