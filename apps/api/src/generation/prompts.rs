// Prompt constants for outreach synthesis.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for the cold email + resume review call.
pub const EMAIL_SYSTEM: &str = "You are an expert career assistant. \
    Given a job description, a resume and optionally the recruiter's public profile, \
    write a professional, concise email to the recruiter that highlights the candidate's \
    relevant experience and expresses genuine interest in the role. \
    Then review the resume against the job description the way an ATS and a hiring manager would.";

/// System prompt for the referral request + resume review call.
pub const REFERRAL_SYSTEM: &str = "You are an expert career assistant. \
    Given a job description, a resume and optionally the profile of someone at the company, \
    write a short, warm referral request. Keep it specific to the role and never pushy. \
    Then review the resume against the job description the way an ATS and a hiring manager would.";

/// Resume review schema shared by both generation modes.
pub const REVIEW_SCHEMA: &str = r#"{
    "overall_summary": "string — two or three sentences on overall fit",
    "strengths": ["string"],
    "areas_for_improvement": ["string"],
    "keyword_analysis": {
      "matched_keywords": ["string — JD keywords present in the resume"],
      "missing_keywords": ["string — JD keywords absent from the resume"],
      "keyword_suggestions": {"<missing keyword>": "where and how to add it"},
      "match_percentage": 0.0
    },
    "ats_score": 0,
    "recommendations": ["string — concrete, actionable edits"]
  }"#;

/// Email generation prompt.
/// Replace: {grounding_instruction}, {context}, {review_schema}
pub const EMAIL_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

{context}

Return a JSON object with this EXACT schema:
{
  "email": {
    "subject": "string",
    "greeting": "string",
    "body": "string — 120 to 200 words",
    "closing": "string",
    "signature": "string — candidate name and contact line from the resume"
  },
  "review": {review_schema}
}

Rules:
- ats_score is an integer from 0 to 100.
- match_percentage is a number from 0 to 100.
- Address the recruiter by name only if the recruiter profile provides one."#;

/// Referral generation prompt.
/// Replace: {grounding_instruction}, {context}, {message_shape}, {review_schema}
pub const REFERRAL_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

{context}

Return a JSON object with this EXACT schema:
{
  "referral_message": {message_shape},
  "review": {review_schema}
}

Rules:
- ats_score is an integer from 0 to 100.
- match_percentage is a number from 0 to 100.
- Mention the specific role and company from the job description."#;

/// `referral_message` shape when an email is requested.
pub const REFERRAL_EMAIL_SHAPE: &str = r#"{
    "subject": "string",
    "greeting": "string",
    "body": "string — 100 to 180 words",
    "closing": "string",
    "signature": "string"
  }"#;

/// `referral_message` shape for a LinkedIn direct message. No subject line.
pub const REFERRAL_DM_SHAPE: &str = r#"{
    "greeting": "string",
    "body": "string — under 120 words, conversational",
    "closing": "string",
    "signature": "string — first name only"
  }"#;
