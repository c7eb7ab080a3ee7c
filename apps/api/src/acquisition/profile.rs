//! Recruiter profile lookup.
//!
//! Resolves a LinkedIn profile URL through the Bright Data dataset API and normalizes
//! the raw record into a sparse `ProfileSummary`. Lookup never fails: an unconfigured
//! provider, a blank URL, or a provider error all yield an empty summary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

const BRIGHT_DATA_API_URL: &str = "https://api.brightdata.com";
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(60);
const RECENT_ACTIVITY_LIMIT: usize = 2;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed profile record: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Profile not ready yet (snapshot {0})")]
    Pending(String),
}

/// One entry of the provider's experience list. Bright Data has shipped both key styles.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawExperience {
    pub company_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub title: Option<String>,
}

impl RawExperience {
    fn company(&self) -> Option<String> {
        non_blank(self.company_name.clone()).or_else(|| non_blank(self.company.clone()))
    }

    fn role(&self) -> Option<String> {
        non_blank(self.position.clone()).or_else(|| non_blank(self.title.clone()))
    }
}

/// Profile record as returned by the provider. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProfile {
    pub name: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub about: Option<String>,
    pub experience: Option<Vec<RawExperience>>,
    pub education: Option<Vec<Value>>,
    pub posts: Option<Vec<Value>>,
}

/// Normalized recruiter summary handed to the synthesizer.
///
/// Sparse: empty strings and empty lists are never serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub education: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_activity: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub past_companies: Vec<String>,
}

impl ProfileSummary {
    /// Builds the summary: the first experience is current, the rest are past companies
    /// in provider order, and only the first two posts are kept.
    pub fn from_raw(raw: RawProfile) -> Self {
        let experiences = raw.experience.unwrap_or_default();
        let current = experiences.first();

        Self {
            name: non_blank(raw.name),
            profile_heading: non_blank(raw.position),
            location: non_blank(raw.location).or_else(|| non_blank(raw.city)),
            about: non_blank(raw.about),
            current_company: current.and_then(RawExperience::company),
            current_role: current.and_then(RawExperience::role),
            education: raw
                .education
                .unwrap_or_default()
                .into_iter()
                .filter(is_truthy)
                .collect(),
            recent_activity: raw
                .posts
                .unwrap_or_default()
                .into_iter()
                .take(RECENT_ACTIVITY_LIMIT)
                .filter(is_truthy)
                .collect(),
            past_companies: experiences
                .iter()
                .skip(1)
                .filter_map(RawExperience::company)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}

/// Third-party service that returns raw profile records.
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn fetch_profile(&self, profile_url: &str) -> Result<Option<RawProfile>, ProfileError>;
}

/// Bright Data synchronous dataset scrape.
pub struct BrightDataProvider {
    client: Client,
    api_key: String,
    dataset_id: String,
    base_url: String,
}

impl BrightDataProvider {
    pub fn new(api_key: String, dataset_id: String) -> Result<Self, ProfileError> {
        Self::with_base_url(api_key, dataset_id, BRIGHT_DATA_API_URL)
    }

    pub fn with_base_url(
        api_key: String,
        dataset_id: String,
        base_url: &str,
    ) -> Result<Self, ProfileError> {
        let client = Client::builder().timeout(PROVIDER_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            dataset_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProfileProvider for BrightDataProvider {
    async fn fetch_profile(&self, profile_url: &str) -> Result<Option<RawProfile>, ProfileError> {
        let response = self
            .client
            .post(format!("{}/datasets/v3/scrape", self.base_url))
            .query(&[
                ("dataset_id", self.dataset_id.as_str()),
                ("include_errors", "true"),
            ])
            .bearer_auth(&self.api_key)
            .json(&json!([{ "url": profile_url }]))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProfileError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        let record = match body {
            Value::Array(items) => items.into_iter().next(),
            Value::Object(_) => Some(body),
            _ => None,
        };

        let Some(record) = record else {
            return Ok(None);
        };

        if let Some(snapshot) = record.get("snapshot_id").and_then(Value::as_str) {
            if record.get("name").is_none() {
                return Err(ProfileError::Pending(snapshot.to_string()));
            }
        }

        Ok(Some(serde_json::from_value(record)?))
    }
}

/// Fail-soft profile lookup used by the aggregator and the `/linkedin` route.
pub struct ProfileLookup {
    provider: Option<Arc<dyn ProfileProvider>>,
}

impl ProfileLookup {
    pub fn new(provider: Arc<dyn ProfileProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Lookup with no backing provider; every search returns an empty summary.
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn search(&self, profile_url: &str) -> ProfileSummary {
        let profile_url = profile_url.trim();
        let Some(provider) = self.provider.as_ref() else {
            debug!("Profile lookup disabled, skipping {profile_url}");
            return ProfileSummary::default();
        };
        if profile_url.is_empty() {
            return ProfileSummary::default();
        }

        match provider.fetch_profile(profile_url).await {
            Ok(Some(raw)) => {
                let summary = ProfileSummary::from_raw(raw);
                info!(
                    "Resolved profile {profile_url}: name_present={}",
                    summary.name.is_some()
                );
                summary
            }
            Ok(None) => {
                info!("Provider returned no record for {profile_url}");
                ProfileSummary::default()
            }
            Err(e) => {
                warn!("Profile lookup failed for {profile_url}: {e}");
                ProfileSummary::default()
            }
        }
    }
}
