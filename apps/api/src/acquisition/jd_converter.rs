//! Job description converter: free text → structured `JobListing` via the LLM.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::acquisition::prompts::{JD_CONVERT_PROMPT_TEMPLATE, JD_CONVERT_SYSTEM};
use crate::llm_client::prompts::json_system;
use crate::llm_client::{LlmClient, LlmError};

/// Seniority of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobLevel {
    Entry,
    Mid,
    Senior,
}

/// Structured job description. `Default` is the empty record used when no
/// description could be acquired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobListing {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<JobLevel>,
    pub location: String,
    pub description: String,
    pub key_qualifications: String,
    pub preferred_qualifications: String,
    pub responsibilities: String,
    pub company: String,
}

impl JobListing {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Converts raw job description text into a `JobListing`.
#[async_trait]
pub trait JobStructurer: Send + Sync {
    async fn convert(&self, jd_text: &str) -> Result<JobListing, LlmError>;
}

pub struct LlmJobStructurer {
    llm: LlmClient,
    system: String,
}

impl LlmJobStructurer {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            system: json_system(JD_CONVERT_SYSTEM),
        }
    }
}

#[async_trait]
impl JobStructurer for LlmJobStructurer {
    async fn convert(&self, jd_text: &str) -> Result<JobListing, LlmError> {
        let prompt = JD_CONVERT_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
        self.llm.call_json::<JobListing>(&prompt, &self.system).await
    }
}
