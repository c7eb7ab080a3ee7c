//! Content synthesis: merged context → outreach message + resume review.
//!
//! `ContentSynthesizer` is the seam the aggregator hands its `MergedContext` to.
//! `LlmSynthesizer` is the production implementation; prompt text and JSON
//! parsing stay behind it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::generation::aggregator::MergedContext;
use crate::generation::prompts::{
    EMAIL_PROMPT_TEMPLATE, EMAIL_SYSTEM, REFERRAL_DM_SHAPE, REFERRAL_EMAIL_SHAPE,
    REFERRAL_PROMPT_TEMPLATE, REFERRAL_SYSTEM, REVIEW_SCHEMA,
};
use crate::llm_client::prompts::{json_system, GROUNDING_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};

const MAX_ATS_SCORE: u8 = 100;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed synthesis output: {0}")]
    Malformed(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Output models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredEmail {
    pub subject: String,
    pub greeting: String,
    pub body: String,
    pub closing: String,
    pub signature: String,
}

/// Direct-message variant: same as an email without a subject line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedInMessage {
    pub greeting: String,
    pub body: String,
    pub closing: String,
    #[serde(default)]
    pub signature: String,
}

impl From<StructuredEmail> for LinkedInMessage {
    fn from(email: StructuredEmail) -> Self {
        Self {
            greeting: email.greeting,
            body: email.body,
            closing: email.closing,
            signature: email.signature,
        }
    }
}

/// A referral request is either email-shaped or DM-shaped. Email is tried first,
/// so a payload with a `subject` always lands in `Email`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferralMessage {
    Email(StructuredEmail),
    LinkedIn(LinkedInMessage),
}

impl ReferralMessage {
    fn body(&self) -> &str {
        match self {
            ReferralMessage::Email(email) => &email.body,
            ReferralMessage::LinkedIn(message) => &message.body,
        }
    }

    /// Coerces the message into the requested shape. A DM can be made from an email
    /// by dropping the subject; the reverse cannot be done without inventing one.
    fn into_shape(self, message_type: MessageType) -> Result<Self, SynthesisError> {
        match (message_type, self) {
            (MessageType::Email, msg @ ReferralMessage::Email(_)) => Ok(msg),
            (MessageType::Email, ReferralMessage::LinkedIn(_)) => Err(SynthesisError::Malformed(
                "email referral is missing a subject".to_string(),
            )),
            (MessageType::LinkedInMessage, ReferralMessage::Email(email)) => {
                Ok(ReferralMessage::LinkedIn(email.into()))
            }
            (MessageType::LinkedInMessage, msg @ ReferralMessage::LinkedIn(_)) => Ok(msg),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordAnalysis {
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub keyword_suggestions: BTreeMap<String, String>,
    pub match_percentage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeReview {
    pub overall_summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub keyword_analysis: KeywordAnalysis,
    pub ats_score: u8,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl ResumeReview {
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.ats_score > MAX_ATS_SCORE {
            return Err(SynthesisError::Malformed(format!(
                "ats_score {} is outside 0-{MAX_ATS_SCORE}",
                self.ats_score
            )));
        }
        let pct = self.keyword_analysis.match_percentage;
        if !(0.0..=100.0).contains(&pct) {
            return Err(SynthesisError::Malformed(format!(
                "match_percentage {pct} is outside 0-100"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAndReview {
    pub email: StructuredEmail,
    pub review: ResumeReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralAndReview {
    pub referral_message: ReferralMessage,
    pub review: ResumeReview,
}

/// Shape of the referral message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageType {
    Email,
    #[default]
    LinkedInMessage,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Email => "email",
            MessageType::LinkedInMessage => "linkedin message",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(MessageType::Email),
            "linkedin message" | "linkedin" | "dm" => Ok(MessageType::LinkedInMessage),
            other => Err(format!(
                "Unknown message_type '{other}', expected 'email' or 'linkedin message'"
            )),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Synthesizer
// ────────────────────────────────────────────────────────────────────────────

/// Turns a merged context into final user-facing content. One operation per mode.
#[async_trait]
pub trait ContentSynthesizer: Send + Sync {
    async fn email(&self, context: &MergedContext) -> Result<EmailAndReview, SynthesisError>;

    async fn referral(
        &self,
        context: &MergedContext,
        message_type: MessageType,
    ) -> Result<ReferralAndReview, SynthesisError>;
}

pub struct LlmSynthesizer {
    llm: LlmClient,
}

impl LlmSynthesizer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ContentSynthesizer for LlmSynthesizer {
    async fn email(&self, context: &MergedContext) -> Result<EmailAndReview, SynthesisError> {
        let prompt = EMAIL_PROMPT_TEMPLATE
            .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
            .replace("{review_schema}", REVIEW_SCHEMA)
            .replace("{context}", &render_context(context));

        let result: EmailAndReview = self
            .llm
            .call_json(&prompt, &json_system(EMAIL_SYSTEM))
            .await?;

        require_body(&result.email.body)?;
        result.review.validate()?;
        info!("Email synthesized: ats_score={}", result.review.ats_score);
        Ok(result)
    }

    async fn referral(
        &self,
        context: &MergedContext,
        message_type: MessageType,
    ) -> Result<ReferralAndReview, SynthesisError> {
        let shape = match message_type {
            MessageType::Email => REFERRAL_EMAIL_SHAPE,
            MessageType::LinkedInMessage => REFERRAL_DM_SHAPE,
        };
        let prompt = REFERRAL_PROMPT_TEMPLATE
            .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
            .replace("{message_shape}", shape)
            .replace("{review_schema}", REVIEW_SCHEMA)
            .replace("{context}", &render_context(context));

        let raw: ReferralAndReview = self
            .llm
            .call_json(&prompt, &json_system(REFERRAL_SYSTEM))
            .await?;

        let referral_message = raw.referral_message.into_shape(message_type)?;
        require_body(referral_message.body())?;
        raw.review.validate()?;
        info!(
            "Referral synthesized as {message_type}: ats_score={}",
            raw.review.ats_score
        );
        Ok(ReferralAndReview {
            referral_message,
            review: raw.review,
        })
    }
}

fn require_body(body: &str) -> Result<(), SynthesisError> {
    if body.trim().is_empty() {
        warn!("Synthesizer returned a message with an empty body");
        return Err(SynthesisError::Malformed("message body is empty".to_string()));
    }
    Ok(())
}

/// Renders the context block of a prompt. The recruiter section only appears when
/// a profile was resolved; an empty job description renders as `{}`.
fn render_context(context: &MergedContext) -> String {
    let job = if context.job_description.is_empty() {
        "{}".to_string()
    } else {
        serde_json::to_string_pretty(&context.job_description).unwrap_or_default()
    };

    let mut sections = vec![format!("JOB DESCRIPTION (JSON):\n{job}")];
    if !context.profile_summary.is_empty() {
        let profile = serde_json::to_string_pretty(&context.profile_summary).unwrap_or_default();
        sections.push(format!("RECIPIENT PROFILE (JSON):\n{profile}"));
    }
    sections.push(format!("RESUME:\n{}", context.resume_text));
    sections.join("\n\n")
}
