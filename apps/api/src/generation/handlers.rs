//! Axum route handlers for the outreach API.
//!
//! v1 routes take raw inputs (resume upload, job URL or text, profile URL) and
//! run the acquisition workers. v2 routes take already-resolved context and
//! only synthesize.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::acquisition::jd_converter::JobListing;
use crate::acquisition::profile::ProfileSummary;
use crate::errors::AppError;
use crate::generation::aggregator::{
    GenerationMode, GenerationRequest, MergedContext, SynthesizedResult,
};
use crate::generation::synthesizer::{EmailAndReview, MessageType, ReferralAndReview};
use crate::state::AppState;

const PDF_CONTENT_TYPE: &str = "application/pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JdFromUrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct JdFromTextRequest {
    pub jd_text: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub recruiter_url: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeTextResponse {
    pub resume_text: String,
}

/// Body of the v2 routes: context the caller already resolved.
#[derive(Debug, Deserialize)]
pub struct ResolvedContextRequest {
    pub resume_text: String,
    #[serde(default)]
    pub job_description: JobListing,
    #[serde(default)]
    pub recruiter_info: Option<ProfileSummary>,
    #[serde(default)]
    pub message_type: Option<String>,
}

impl ResolvedContextRequest {
    fn into_context(self) -> Result<(MergedContext, Option<String>), AppError> {
        if self.resume_text.trim().is_empty() {
            return Err(AppError::Validation("resume_text cannot be empty".to_string()));
        }
        if self.job_description.is_empty() {
            return Err(AppError::Validation(
                "job_description cannot be empty".to_string(),
            ));
        }
        let context = MergedContext {
            job_description: self.job_description,
            profile_summary: self.recruiter_info.unwrap_or_default(),
            resume_text: self.resume_text,
        };
        Ok((context, self.message_type))
    }
}

/// Multipart form shared by the v1 upload routes.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Bytes>,
    content_type: Option<String>,
    jd_url: Option<String>,
    jd_text: Option<String>,
    recruiter_url: Option<String>,
    message_type: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_string);
            if name.as_deref() == Some("file") {
                form.content_type = field.content_type().map(str::to_string);
                form.file = Some(field.bytes().await.map_err(multipart_error)?);
                continue;
            }

            let slot = match name.as_deref() {
                Some("jd_url") => &mut form.jd_url,
                Some("jd_text") => &mut form.jd_text,
                Some("recruiter_url") => &mut form.recruiter_url,
                Some("message_type") => &mut form.message_type,
                _ => continue,
            };
            let value = field.text().await.map_err(multipart_error)?;
            *slot = Some(value);
        }

        Ok(form)
    }

    /// Validates the uploaded resume and writes it to a scratch file.
    /// The file is removed when the returned handle is dropped.
    async fn persist_resume(&mut self) -> Result<NamedTempFile, AppError> {
        let bytes = self
            .file
            .take()
            .ok_or_else(|| AppError::Validation("Missing file in multipart form".to_string()))?;

        if !self.content_type.as_deref().is_some_and(is_pdf) {
            return Err(AppError::Validation(
                "Invalid file type. Please upload a PDF.".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("Resume file is empty".to_string()));
        }

        let scratch = tempfile::Builder::new()
            .prefix("resume-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| AppError::Internal(e.into()))?;
        tokio::fs::write(scratch.path(), &bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(scratch)
    }

    fn message_type(&self) -> Result<MessageType, AppError> {
        parse_message_type(self.message_type.as_deref())
    }
}

/// Keeps the status multer assigned (413 for an exceeded body limit).
fn multipart_error(err: MultipartError) -> AppError {
    match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(err.body_text()),
        _ => AppError::Validation(format!("Multipart error: {}", err.body_text())),
    }
}

/// Compares the MIME essence only; parameters such as `; name=cv.pdf` are ignored.
fn is_pdf(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
}

fn parse_message_type(raw: Option<&str>) -> Result<MessageType, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse().map_err(AppError::Validation),
        None => Ok(MessageType::default()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// v1: full aggregation
// ────────────────────────────────────────────────────────────────────────────

async fn run_generation(
    state: &AppState,
    multipart: Multipart,
    referral: bool,
) -> Result<SynthesizedResult, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let mode = if referral {
        GenerationMode::Referral {
            message_type: form.message_type()?,
        }
    } else {
        GenerationMode::Email
    };
    let scratch = form.persist_resume().await?;

    let request = GenerationRequest {
        resume_path: scratch.path().to_path_buf(),
        job_url: form.jd_url,
        job_text: form.jd_text,
        profile_url: form.recruiter_url,
    };

    // `scratch` must outlive the parse; it is deleted when this function returns.
    Ok(state.generator.generate(&request, mode).await?)
}

/// POST /api/v1/generate-email
///
/// Multipart: `file` (PDF), `jd_url` or `jd_text`, optional `recruiter_url`.
/// Runs the acquisition workers concurrently, then writes the email and review.
pub async fn handle_generate_email(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SynthesizedResult>, AppError> {
    Ok(Json(run_generation(&state, multipart, false).await?))
}

/// POST /api/v1/generate-referral
///
/// Same form as generate-email plus `message_type` (`email` | `linkedin message`).
pub async fn handle_generate_referral(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SynthesizedResult>, AppError> {
    Ok(Json(run_generation(&state, multipart, true).await?))
}

/// POST /api/v1/jd-from-url
pub async fn handle_jd_from_url(
    State(state): State<AppState>,
    Json(request): Json<JdFromUrlRequest>,
) -> Result<Json<JobListing>, AppError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("url cannot be empty".to_string()));
    }

    let text = state.fetcher.fetch(url).await.ok_or_else(|| {
        AppError::UnprocessableEntity(format!("Could not extract a job description from {url}"))
    })?;

    let listing = state
        .structurer
        .convert(&text)
        .await
        .map_err(|e| AppError::Llm(format!("JD conversion failed: {e}")))?;

    Ok(Json(listing))
}

/// POST /api/v1/jd-from-text
pub async fn handle_jd_from_text(
    State(state): State<AppState>,
    Json(request): Json<JdFromTextRequest>,
) -> Result<Json<JobListing>, AppError> {
    if request.jd_text.trim().is_empty() {
        return Err(AppError::Validation("jd_text cannot be empty".to_string()));
    }

    let listing = state
        .structurer
        .convert(&request.jd_text)
        .await
        .map_err(|e| AppError::Llm(format!("JD conversion failed: {e}")))?;

    Ok(Json(listing))
}

/// POST /api/v1/linkedin
pub async fn handle_profile(
    State(state): State<AppState>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<ProfileSummary>, AppError> {
    let url = request.recruiter_url.trim();
    if url.is_empty() {
        return Err(AppError::Validation(
            "recruiter_url cannot be empty".to_string(),
        ));
    }

    if !state.profiles.is_enabled() {
        return Err(AppError::NotFound(
            "Profile lookup is not configured".to_string(),
        ));
    }

    let summary = state.profiles.search(url).await;
    if summary.is_empty() {
        return Err(AppError::NotFound(format!("No profile data found for {url}")));
    }
    Ok(Json(summary))
}

/// POST /api/v1/resume
///
/// Multipart `file` (PDF). Returns the extracted text.
pub async fn handle_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ResumeTextResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let scratch = form.persist_resume().await?;

    let parsed = state
        .parser
        .parse(scratch.path())
        .await
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    let resume_text = parsed
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::UnprocessableEntity("No text found in resume".to_string()))?;

    info!("Parsed resume upload: {} chars", resume_text.len());
    Ok(Json(ResumeTextResponse { resume_text }))
}

// ────────────────────────────────────────────────────────────────────────────
// v2: synthesis from resolved context
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v2/generate-email
pub async fn handle_generate_email_v2(
    State(state): State<AppState>,
    Json(request): Json<ResolvedContextRequest>,
) -> Result<Json<EmailAndReview>, AppError> {
    let (context, _) = request.into_context()?;
    let result = state
        .synthesizer
        .email(&context)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;
    Ok(Json(result))
}

/// POST /api/v2/generate-referral
pub async fn handle_generate_referral_v2(
    State(state): State<AppState>,
    Json(request): Json<ResolvedContextRequest>,
) -> Result<Json<ReferralAndReview>, AppError> {
    let (context, message_type) = request.into_context()?;
    let message_type = parse_message_type(message_type.as_deref())?;
    let result = state
        .synthesizer
        .referral(&context, message_type)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_compares_essence_only() {
        assert!(is_pdf("application/pdf"));
        assert!(is_pdf("APPLICATION/PDF"));
        assert!(is_pdf("application/pdf; name=resume.pdf"));
        assert!(is_pdf(" application/pdf ;charset=binary"));
        assert!(!is_pdf("text/plain"));
        assert!(!is_pdf("application/pdfx"));
        assert!(!is_pdf(""));
    }

    #[test]
    fn test_parse_message_type_defaults_when_blank() {
        assert_eq!(parse_message_type(None).unwrap(), MessageType::default());
        assert_eq!(parse_message_type(Some("  ")).unwrap(), MessageType::default());
        assert!(parse_message_type(Some("fax")).is_err());
    }
}
