// Acquisition workers: everything that pulls raw context from the outside world.
// Job pages (HTTP, then headless browser), recruiter profiles, resume PDFs, and the
// LLM-backed job description converter.

pub mod browser;
pub mod extractor;
pub mod jd_converter;
pub mod page_fetcher;
pub mod profile;
pub mod prompts;
pub mod resume_parser;
