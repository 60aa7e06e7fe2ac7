//! Gemini client for wine suggestions.

use std::time::Duration;

use entities::WineCategory;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{SommelierError, SommelierResult};

/// Default Gemini API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for both suggestion paths.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// How long a single suggestion call may take before the client gives up.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the sommelier client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SommelierConfig {
    /// Gemini API key.
    pub api_key: String,

    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL. Overridable so tests can point at a stub.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl SommelierConfig {
    /// Creates a configuration with the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_model(),
            api_base_url: default_api_base_url(),
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Wine details extracted from a label photo.
///
/// Field names match the response schema sent with the request, so the
/// model's JSON deserializes directly. The schema requires name, producer
/// and category; everything else is best effort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelAnalysis {
    /// Wine name.
    #[serde(default)]
    pub name: Option<String>,
    /// Producer or winery.
    #[serde(default)]
    pub producer: Option<String>,
    /// Vintage year, or "NV".
    #[serde(default)]
    pub vintage: Option<String>,
    /// Category of the wine.
    #[serde(default)]
    pub category: Option<WineCategory>,
    /// Grape variety.
    #[serde(default)]
    pub grape: Option<String>,
    /// Region of origin.
    #[serde(default)]
    pub region: Option<String>,
    /// Alcohol content, e.g. "13.5% vol".
    #[serde(default)]
    pub alcohol_by_volume: Option<String>,
    /// Suggested food pairing.
    #[serde(default)]
    pub pairing_suggestion: Option<String>,
    /// Short estimated tasting description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Wine details suggested from a free-text query. Same shape as
/// [`LabelAnalysis`] minus the tasting description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WineSuggestion {
    /// Wine name.
    #[serde(default)]
    pub name: Option<String>,
    /// Producer or winery.
    #[serde(default)]
    pub producer: Option<String>,
    /// Vintage year, or "NV".
    #[serde(default)]
    pub vintage: Option<String>,
    /// Category of the wine.
    #[serde(default)]
    pub category: Option<WineCategory>,
    /// Grape variety.
    #[serde(default)]
    pub grape: Option<String>,
    /// Region of origin.
    #[serde(default)]
    pub region: Option<String>,
    /// Alcohol content.
    #[serde(default)]
    pub alcohol_by_volume: Option<String>,
    /// Suggested food pairing.
    #[serde(default)]
    pub pairing_suggestion: Option<String>,
}

/// Client for the Gemini wine-suggestion calls.
///
/// Both operations are single-shot: no retry, no queueing. A failure is
/// reported to the caller once and the draft being edited stays untouched.
#[derive(Debug, Clone)]
pub struct SommelierClient {
    config: SommelierConfig,
    http: reqwest::Client,
}

impl SommelierClient {
    /// Creates a client from the given configuration.
    pub fn new(config: SommelierConfig) -> SommelierResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { config, http })
    }

    /// Extracts wine details from a base64-encoded label photo.
    pub async fn analyze_label(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> SommelierResult<LabelAnalysis> {
        let body = json!({
            "contents": [{
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": mime_type,
                            "data": image_base64,
                        }
                    },
                    { "text": label_instruction() },
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": label_schema(),
            }
        });

        let text = self.generate(body).await?;
        debug!(bytes = text.len(), "Label analysis response received");
        Ok(serde_json::from_str(&text)?)
    }

    /// Suggests likely details for a wine named in a free-text query.
    pub async fn suggest_details(&self, query: &str) -> SommelierResult<WineSuggestion> {
        let body = json!({
            "contents": [{
                "parts": [{ "text": suggestion_instruction(query) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": suggestion_schema(),
            }
        });

        let text = self.generate(body).await?;
        debug!(bytes = text.len(), "Suggestion response received");
        Ok(serde_json::from_str(&text)?)
    }

    /// Sends one `generateContent` request and returns the candidate text.
    async fn generate(&self, body: Value) -> SommelierResult<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, "Gemini request failed");
            return Err(SommelierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateContentResponse = response.json().await?;
        reply
            .candidate_text()
            .ok_or(SommelierError::EmptyResponse)
    }
}

/// Wire shape of a `generateContent` response, reduced to what we read.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// First non-empty text part of the first candidate.
    fn candidate_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|part| part.text.filter(|t| !t.is_empty()))
    }
}

fn label_instruction() -> &'static str {
    "Analyze this wine label and extract its details as JSON. Identify: \
     name, producer, vintage, category, grape, region, alcohol content \
     (e.g. \"13.5% vol\") and suggest a food pairing. Add a short estimated \
     tasting description. If a detail is not visible, use an empty string \
     or estimate from context."
}

fn suggestion_instruction(query: &str) -> String {
    format!(
        "The user wants to record a wine called: \"{query}\". \
         Return a JSON object with the likely details for this wine. \
         Fields: name, producer, vintage (use \"NV\" when not applicable), \
         category, grape, region, alcohol_by_volume, pairing_suggestion."
    )
}

/// The categories the model is allowed to answer with. `Unknown` is not
/// offered; an off-enum reply still parses as `Unknown` instead of failing.
fn category_enum() -> Vec<&'static str> {
    WineCategory::KNOWN.iter().map(|c| c.as_str()).collect()
}

fn label_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "producer": { "type": "STRING" },
            "vintage": { "type": "STRING" },
            "category": { "type": "STRING", "enum": category_enum() },
            "grape": { "type": "STRING" },
            "region": { "type": "STRING" },
            "alcohol_by_volume": { "type": "STRING", "description": "E.g. 13.5% vol" },
            "pairing_suggestion": { "type": "STRING" },
            "description": { "type": "STRING", "description": "Short estimated tasting description" }
        },
        "required": ["name", "producer", "category"]
    })
}

fn suggestion_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "producer": { "type": "STRING" },
            "vintage": { "type": "STRING" },
            "category": { "type": "STRING", "enum": category_enum() },
            "grape": { "type": "STRING" },
            "region": { "type": "STRING" },
            "alcohol_by_volume": { "type": "STRING" },
            "pairing_suggestion": { "type": "STRING" }
        }
    })
}
