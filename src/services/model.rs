use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Output format requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Json,
    Text,
}

/// One generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub prompt: String,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_format: ResponseFormat,
}

/// Raw model text; may be empty, fenced, or truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
}

impl ModelResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A generative model that turns a prompt into text.
#[async_trait]
pub trait ItineraryModel: Send + Sync + std::fmt::Debug {
    /// Identifier stamped into `metadata.model_version`.
    fn model_version(&self) -> &str;

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse>;
}
