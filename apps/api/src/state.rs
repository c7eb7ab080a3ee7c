use std::sync::Arc;

use crate::acquisition::jd_converter::JobStructurer;
use crate::acquisition::page_fetcher::JobPageFetcher;
use crate::acquisition::profile::ProfileLookup;
use crate::acquisition::resume_parser::DocumentParser;
use crate::config::DEFAULT_UPLOAD_LIMIT;
use crate::generation::aggregator::EmailGenerator;
use crate::generation::synthesizer::ContentSynthesizer;

/// Shared application state injected into all route handlers via Axum extractors.
/// The single-purpose routes (`/jd-from-url`, `/linkedin`, ...) use the same
/// components the generator fans out to.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<EmailGenerator>,
    pub fetcher: Arc<JobPageFetcher>,
    pub structurer: Arc<dyn JobStructurer>,
    pub profiles: Arc<ProfileLookup>,
    pub parser: Arc<dyn DocumentParser>,
    pub synthesizer: Arc<dyn ContentSynthesizer>,
    /// Body limit applied to the resume upload routes.
    pub upload_limit: usize,
}

impl AppState {
    /// Wires the generator from the individual components.
    pub fn new(
        fetcher: Arc<JobPageFetcher>,
        structurer: Arc<dyn JobStructurer>,
        profiles: Arc<ProfileLookup>,
        parser: Arc<dyn DocumentParser>,
        synthesizer: Arc<dyn ContentSynthesizer>,
        deadline: Option<std::time::Duration>,
    ) -> Self {
        let generator = EmailGenerator::new(
            fetcher.clone(),
            structurer.clone(),
            profiles.clone(),
            parser.clone(),
            synthesizer.clone(),
        )
        .with_deadline(deadline);

        Self {
            generator: Arc::new(generator),
            fetcher,
            structurer,
            profiles,
            parser,
            synthesizer,
            upload_limit: DEFAULT_UPLOAD_LIMIT,
        }
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit = bytes;
        self
    }
}
