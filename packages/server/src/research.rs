use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ResearchConfig;

const PROMPT_PREAMBLE: &str = "Instruction: You are a helpful Biology teacher assistant. \
    Provide accurate, educational answers suitable for students.\n\n";

#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("research API key is not configured")]
    NotConfigured,
    #[error("research request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("research API returned no text")]
    EmptyResponse,
}

/// Answers a free-text research question.
#[async_trait]
pub trait ResearchClient: Send + Sync {
    async fn ask(&self, query: &str) -> Result<String, ResearchError>;
}

/// Generative-text client speaking the `generateContent` JSON API.
pub struct HttpResearchClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpResearchClient {
    pub fn new(config: &ResearchConfig) -> Result<Self, ResearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn first_text(response: GenerateResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait]
impl ResearchClient for HttpResearchClient {
    async fn ask(&self, query: &str) -> Result<String, ResearchError> {
        let key = self.api_key.as_deref().ok_or(ResearchError::NotConfigured)?;
        let prompt = format!("{PROMPT_PREAMBLE}Student Question: {query}");
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);

        let response: GenerateResponse = self
            .client
            .post(url)
            .query(&[("key", key)])
            .json(&GenerateRequest {
                contents: [Content {
                    parts: [Part { text: &prompt }],
                }],
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        first_text(response).ok_or(ResearchError::EmptyResponse)
    }
}
