//! Aggregation core: fans out the acquisition workers, absorbs their failures,
//! and hands a fully-populated `MergedContext` to the content synthesizer.
//!
//! Flow: validate request → spawn {job, resume, profile?} → join all →
//!       merge (failed/empty branches take their defaults) → synthesize.
//!
//! Every worker runs in its own tokio task and reports through its own
//! `JoinHandle`. Errors, panics and deadline overruns stop at the worker
//! boundary; only request validation and synthesis failures reach the caller.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::acquisition::jd_converter::{JobListing, JobStructurer};
use crate::acquisition::page_fetcher::JobPageFetcher;
use crate::acquisition::profile::{ProfileLookup, ProfileSummary};
use crate::acquisition::resume_parser::DocumentParser;
use crate::generation::synthesizer::{
    ContentSynthesizer, EmailAndReview, MessageType, ReferralAndReview, SynthesisError,
};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

// ────────────────────────────────────────────────────────────────────────────
// Request / result types
// ────────────────────────────────────────────────────────────────────────────

/// One generation's inputs. Blank strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub resume_path: PathBuf,
    pub job_url: Option<String>,
    pub job_text: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    Url(String),
    Text(String),
}

impl GenerationRequest {
    /// Resolves the job description source. A URL wins when both are given.
    pub fn job_source(&self) -> Result<JobSource, GenerationError> {
        match (non_blank(&self.job_url), non_blank(&self.job_text)) {
            (Some(url), _) => Ok(JobSource::Url(url.to_string())),
            (None, Some(text)) => Ok(JobSource::Text(text.to_string())),
            (None, None) => Err(GenerationError::InvalidRequest(
                "Either a job description URL or text must be provided".to_string(),
            )),
        }
    }

    pub fn profile_url(&self) -> Option<&str> {
        non_blank(&self.profile_url)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Outcome of one worker. Every dispatched worker yields exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerResult<T> {
    Success(T),
    Empty,
    Failure(String),
}

impl<T: Default> WorkerResult<T> {
    pub fn into_value_or_default(self) -> T {
        match self {
            WorkerResult::Success(value) => value,
            WorkerResult::Empty | WorkerResult::Failure(_) => T::default(),
        }
    }
}

/// Context handed to the synthesizer. Always structurally complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedContext {
    pub job_description: JobListing,
    pub profile_summary: ProfileSummary,
    pub resume_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Email,
    Referral { message_type: MessageType },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SynthesizedResult {
    Email(EmailAndReview),
    Referral(ReferralAndReview),
}

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

pub struct EmailGenerator {
    fetcher: Arc<JobPageFetcher>,
    structurer: Arc<dyn JobStructurer>,
    profiles: Arc<ProfileLookup>,
    parser: Arc<dyn DocumentParser>,
    synthesizer: Arc<dyn ContentSynthesizer>,
    /// Upper bound on each worker. `None` waits indefinitely.
    deadline: Option<Duration>,
}

impl EmailGenerator {
    pub fn new(
        fetcher: Arc<JobPageFetcher>,
        structurer: Arc<dyn JobStructurer>,
        profiles: Arc<ProfileLookup>,
        parser: Arc<dyn DocumentParser>,
        synthesizer: Arc<dyn ContentSynthesizer>,
    ) -> Self {
        Self {
            fetcher,
            structurer,
            profiles,
            parser,
            synthesizer,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Runs the acquisition workers and merges their results.
    /// Fails only when the request has no job description source.
    pub async fn gather(
        &self,
        request: &GenerationRequest,
    ) -> Result<MergedContext, GenerationError> {
        let source = request.job_source()?;
        let generation_id = Uuid::new_v4();
        let span = info_span!("generation", %generation_id);

        let context = async {
            info!(
                "Dispatching workers: job={}, profile={}",
                match &source {
                    JobSource::Url(_) => "url",
                    JobSource::Text(_) => "text",
                },
                request.profile_url().is_some()
            );

            let job = tokio::spawn(
                job_worker(self.fetcher.clone(), self.structurer.clone(), source)
                    .in_current_span(),
            );
            let resume = tokio::spawn(
                resume_worker(self.parser.clone(), request.resume_path.clone()).in_current_span(),
            );
            let profile = request.profile_url().map(|url| {
                tokio::spawn(
                    profile_worker(self.profiles.clone(), url.to_string()).in_current_span(),
                )
            });

            let (job, resume, profile) = tokio::join!(
                settle("job_description", job, self.deadline),
                settle("resume", resume, self.deadline),
                async {
                    match profile {
                        Some(handle) => settle("profile", handle, self.deadline).await,
                        None => WorkerResult::Empty,
                    }
                },
            );

            MergedContext {
                job_description: job.into_value_or_default(),
                profile_summary: profile.into_value_or_default(),
                resume_text: resume.into_value_or_default(),
            }
        }
        .instrument(span)
        .await;

        Ok(context)
    }

    /// Full pipeline: gather, then synthesize in the requested mode.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        mode: GenerationMode,
    ) -> Result<SynthesizedResult, GenerationError> {
        let context = self.gather(request).await?;

        let result = match mode {
            GenerationMode::Email => {
                SynthesizedResult::Email(self.synthesizer.email(&context).await?)
            }
            GenerationMode::Referral { message_type } => SynthesizedResult::Referral(
                self.synthesizer.referral(&context, message_type).await?,
            ),
        };
        Ok(result)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Workers
// ────────────────────────────────────────────────────────────────────────────

async fn job_worker(
    fetcher: Arc<JobPageFetcher>,
    structurer: Arc<dyn JobStructurer>,
    source: JobSource,
) -> WorkerResult<JobListing> {
    let text = match source {
        JobSource::Url(url) => match fetcher.fetch(&url).await {
            Some(text) => text,
            None => return WorkerResult::Empty,
        },
        JobSource::Text(text) => text,
    };

    match structurer.convert(&text).await {
        Ok(listing) if listing.is_empty() => WorkerResult::Empty,
        Ok(listing) => WorkerResult::Success(listing),
        Err(e) => WorkerResult::Failure(e.to_string()),
    }
}

async fn resume_worker(parser: Arc<dyn DocumentParser>, path: PathBuf) -> WorkerResult<String> {
    match parser.parse(&path).await {
        Ok(Some(text)) if !text.trim().is_empty() => WorkerResult::Success(text),
        Ok(_) => WorkerResult::Empty,
        Err(e) => WorkerResult::Failure(e.to_string()),
    }
}

/// `ProfileLookup` already absorbs provider errors; only panics and overruns fail here.
async fn profile_worker(profiles: Arc<ProfileLookup>, url: String) -> WorkerResult<ProfileSummary> {
    let summary = profiles.search(&url).await;
    if summary.is_empty() {
        WorkerResult::Empty
    } else {
        WorkerResult::Success(summary)
    }
}

/// Waits for one worker, bounded by `deadline`. Overrunning tasks are aborted.
async fn settle<T>(
    worker: &'static str,
    mut handle: JoinHandle<WorkerResult<T>>,
    deadline: Option<Duration>,
) -> WorkerResult<T> {
    let from_join = |joined: Result<WorkerResult<T>, JoinError>| {
        joined.unwrap_or_else(|e| WorkerResult::Failure(format!("worker task failed: {e}")))
    };

    let result = match deadline {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => from_join(joined),
            Err(_) => {
                handle.abort();
                WorkerResult::Failure(format!("exceeded deadline of {limit:?}"))
            }
        },
        None => from_join(handle.await),
    };

    match &result {
        WorkerResult::Success(_) => info!(worker, "Worker finished: success"),
        WorkerResult::Empty => info!(worker, "Worker finished: empty"),
        WorkerResult::Failure(cause) => warn!(worker, "Worker finished: failure: {cause}"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::jd_converter::tests::{innovatetech_listing, StubStructurer};
    use crate::acquisition::page_fetcher::tests::StubSource;
    use crate::acquisition::profile::tests::{recruiter_record, StubProvider};
    use crate::acquisition::resume_parser::tests::StubParser;
    use crate::acquisition::resume_parser::ParseError;
    use crate::generation::synthesizer::tests::StubSynthesizer;
    use async_trait::async_trait;
    use std::path::Path;

    const JOB_TEXT: &str = "Senior Python Developer at InnovateTech, Remote, 5+ years experience";
    const JOB_URL: &str = "https://jobs.example/postings/42";
    const PROFILE_URL: &str = "https://www.linkedin.com/in/priya-raman/";
    const RESUME: &str = "Sam Doe. Backend engineer. Python, Django, PostgreSQL.";
    const POSTING: &str = concat!(
        "<html><body><nav>Jobs</nav>",
        "<h1>Senior Python Developer</h1><p>InnovateTech</p></body></html>",
    );

    struct Fixture {
        fast: Arc<StubSource>,
        fallback: Arc<StubSource>,
        structurer: Arc<StubStructurer>,
        provider: Arc<StubProvider>,
        parser: Arc<StubParser>,
        synthesizer: Arc<StubSynthesizer>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                fast: StubSource::html(POSTING),
                fallback: StubSource::html(POSTING),
                structurer: StubStructurer::ok(),
                provider: StubProvider::returning(recruiter_record()),
                parser: StubParser::text(RESUME),
                synthesizer: StubSynthesizer::ok(),
            }
        }

        fn build(&self) -> EmailGenerator {
            self.build_with_parser(self.parser.clone())
        }

        fn build_with_parser(&self, parser: Arc<dyn DocumentParser>) -> EmailGenerator {
            EmailGenerator::new(
                Arc::new(JobPageFetcher::new(self.fast.clone(), self.fallback.clone())),
                self.structurer.clone(),
                Arc::new(ProfileLookup::new(self.provider.clone())),
                parser,
                self.synthesizer.clone(),
            )
        }
    }

    fn request(
        job_url: Option<&str>,
        job_text: Option<&str>,
        profile_url: Option<&str>,
    ) -> GenerationRequest {
        GenerationRequest {
            resume_path: PathBuf::from("/tmp/resume.pdf"),
            job_url: job_url.map(str::to_string),
            job_text: job_text.map(str::to_string),
            profile_url: profile_url.map(str::to_string),
        }
    }

    /// Parser that never completes.
    struct HangingParser;

    #[async_trait]
    impl DocumentParser for HangingParser {
        async fn parse(&self, _path: &Path) -> Result<Option<String>, ParseError> {
            std::future::pending().await
        }
    }

    struct PanickingParser;

    #[async_trait]
    impl DocumentParser for PanickingParser {
        async fn parse(&self, _path: &Path) -> Result<Option<String>, ParseError> {
            panic!("pdf loader blew up");
        }
    }

    #[test]
    fn test_job_source_resolution() {
        let both = request(Some(JOB_URL), Some(JOB_TEXT), None);
        assert_eq!(both.job_source().unwrap(), JobSource::Url(JOB_URL.to_string()));

        let blank_url = request(Some("   "), Some(JOB_TEXT), None);
        assert_eq!(
            blank_url.job_source().unwrap(),
            JobSource::Text(JOB_TEXT.to_string())
        );

        let neither = request(Some(""), Some(" \n"), None);
        assert!(matches!(
            neither.job_source(),
            Err(GenerationError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_worker_result_defaults() {
        assert_eq!(WorkerResult::Success(7).into_value_or_default(), 7);
        assert_eq!(WorkerResult::<u32>::Empty.into_value_or_default(), 0);
        assert_eq!(
            WorkerResult::<String>::Failure("boom".to_string()).into_value_or_default(),
            ""
        );
    }

    #[tokio::test]
    async fn test_missing_job_source_dispatches_no_workers() {
        let fx = Fixture::new();
        let err = fx
            .build()
            .generate(&request(None, None, Some(PROFILE_URL)), GenerationMode::Email)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::InvalidRequest(_)));
        assert_eq!(fx.fast.calls(), 0);
        assert_eq!(fx.structurer.calls(), 0);
        assert_eq!(fx.provider.calls(), 0);
        assert_eq!(fx.parser.calls(), 0);
        assert_eq!(fx.synthesizer.calls(), 0);
    }

    #[tokio::test]
    async fn test_text_source_without_profile() {
        let fx = Fixture::new();
        let result = fx
            .build()
            .generate(&request(None, Some(JOB_TEXT), None), GenerationMode::Email)
            .await
            .unwrap();

        assert!(matches!(result, SynthesizedResult::Email(_)));
        assert_eq!(fx.provider.calls(), 0);
        assert_eq!(fx.fast.calls(), 0);
        assert_eq!(fx.structurer.inputs.lock().unwrap().as_slice(), [JOB_TEXT]);

        let context = fx.synthesizer.last_context();
        assert_eq!(context.job_description, innovatetech_listing());
        assert_eq!(context.resume_text, RESUME);
        assert!(context.profile_summary.is_empty());
    }

    #[tokio::test]
    async fn test_url_source_feeds_extracted_text_to_converter() {
        let fx = Fixture::new();
        let context = fx
            .build()
            .gather(&request(Some(JOB_URL), None, Some(PROFILE_URL)))
            .await
            .unwrap();

        assert_eq!(fx.fallback.calls(), 0);
        assert_eq!(
            fx.structurer.inputs.lock().unwrap().as_slice(),
            ["Senior Python Developer InnovateTech"]
        );
        assert_eq!(context.profile_summary.name.as_deref(), Some("Priya Raman"));
        assert_eq!(context.resume_text, RESUME);
    }

    #[tokio::test]
    async fn test_empty_page_defaults_job_description() {
        let mut fx = Fixture::new();
        fx.fast = StubSource::html("<html><body></body></html>");
        fx.fallback = StubSource::html("<html><body>  </body></html>");

        let result = fx
            .build()
            .generate(&request(Some(JOB_URL), None, None), GenerationMode::Email)
            .await;

        assert!(result.is_ok());
        assert_eq!(fx.fast.calls(), 1);
        assert_eq!(fx.fallback.calls(), 1);
        assert_eq!(fx.structurer.calls(), 0);

        let context = fx.synthesizer.last_context();
        assert!(context.job_description.is_empty());
        assert_eq!(context.resume_text, RESUME);
    }

    #[tokio::test]
    async fn test_profile_provider_failure_is_isolated() {
        let mut fx = Fixture::new();
        fx.provider = StubProvider::failing();

        let result = fx
            .build()
            .generate(
                &request(Some(JOB_URL), None, Some(PROFILE_URL)),
                GenerationMode::Email,
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(fx.provider.calls(), 1);

        let context = fx.synthesizer.last_context();
        assert!(context.profile_summary.is_empty());
        assert_eq!(context.job_description, innovatetech_listing());
        assert_eq!(context.resume_text, RESUME);
    }

    #[tokio::test]
    async fn test_resume_failure_is_isolated() {
        let mut fx = Fixture::new();
        fx.parser = StubParser::failing();

        let context = fx
            .build()
            .gather(&request(None, Some(JOB_TEXT), Some(PROFILE_URL)))
            .await
            .unwrap();

        assert_eq!(fx.parser.calls(), 1);
        assert_eq!(context.resume_text, "");
        assert_eq!(context.job_description, innovatetech_listing());
        assert!(!context.profile_summary.is_empty());
    }

    #[tokio::test]
    async fn test_converter_failure_is_isolated() {
        let mut fx = Fixture::new();
        fx.structurer = StubStructurer::failing();

        let context = fx
            .build()
            .gather(&request(None, Some(JOB_TEXT), Some(PROFILE_URL)))
            .await
            .unwrap();

        assert!(context.job_description.is_empty());
        assert_eq!(context.resume_text, RESUME);
        assert!(!context.profile_summary.is_empty());
    }

    #[tokio::test]
    async fn test_worker_panic_is_absorbed() {
        let fx = Fixture::new();
        let context = fx
            .build_with_parser(Arc::new(PanickingParser))
            .gather(&request(None, Some(JOB_TEXT), None))
            .await
            .unwrap();

        assert_eq!(context.resume_text, "");
        assert_eq!(context.job_description, innovatetech_listing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_hung_worker() {
        let fx = Fixture::new();
        let generator = fx
            .build_with_parser(Arc::new(HangingParser))
            .with_deadline(Some(Duration::from_secs(5)));

        let started = tokio::time::Instant::now();
        let context = generator
            .gather(&request(None, Some(JOB_TEXT), Some(PROFILE_URL)))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(context.resume_text, "");
        assert_eq!(context.job_description, innovatetech_listing());
        assert!(!context.profile_summary.is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_failure_surfaces() {
        let mut fx = Fixture::new();
        fx.synthesizer = StubSynthesizer::failing();

        let err = fx
            .build()
            .generate(&request(None, Some(JOB_TEXT), None), GenerationMode::Email)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_referral_mode_uses_requested_shape() {
        let fx = Fixture::new();
        let result = fx
            .build()
            .generate(
                &request(None, Some(JOB_TEXT), None),
                GenerationMode::Referral {
                    message_type: MessageType::Email,
                },
            )
            .await
            .unwrap();

        match result {
            SynthesizedResult::Referral(referral) => assert!(matches!(
                referral.referral_message,
                crate::generation::synthesizer::ReferralMessage::Email(_)
            )),
            other => panic!("expected referral, got {other:?}"),
        }
    }
}
