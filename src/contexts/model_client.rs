use crate::error::AgentError;
use crate::registries::ModelSettings;
use serde::{Deserialize, Serialize};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Something that turns a prompt into free-form model text.
#[allow(async_fn_in_trait)]
pub trait ModelClient {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`, if non-blank.
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.trim().is_empty())
    }
}

/// Gemini `generateContent` over HTTPS. One request per call, no timeout and
/// no retry.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    settings: ModelSettings,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, settings: ModelSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            settings,
        }
    }

    /// Reads the key from the environment; `.env` must already be loaded.
    pub fn from_env(settings: ModelSettings) -> Result<Self, AgentError> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim(), settings)),
            _ => Err(AgentError::MissingApiKey),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.name,
            self.api_key
        )
    }
}

impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::info!("Calling {} ({} prompt bytes)", self.settings.name, prompt.len());
        let response = self
            .http
            .post(self.url())
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Upstream(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Upstream(format!("{} {}", status, detail.trim())));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Upstream(format!("unreadable response: {}", e.without_url())))?;
        parsed.into_text().ok_or(AgentError::EmptyResponse)
    }
}
