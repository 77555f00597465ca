use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    error::{ItineraryError, Result},
    services::model::{ItineraryModel, ModelRequest, ModelResponse, ResponseFormat},
};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-pro-1.5";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI-compatible chat-completions client.
///
/// Makes exactly one HTTP request per call; retry policy belongs to the caller.
#[derive(Clone, Debug)]
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    request_timeout: Duration,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat_completion(&self, body: &Value) -> Result<Value> {
        let request_url = build_chat_url(&self.base_url);

        let response = self
            .http
            .post(&request_url)
            .timeout(self.request_timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "itinerary-gen-rs")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ItineraryError::Timeout(format!("HTTP request timed out: {err}"))
                } else {
                    ItineraryError::Transport(format!("HTTP request failed: {err}"))
                }
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        let response_text = response
            .text()
            .await
            .map_err(|err| ItineraryError::Transport(format!("Failed to read response: {err}")))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ItineraryError::RateLimit {
                retry_after: retry_after.unwrap_or(1).max(1),
            });
        }

        let response_json: Option<Value> = serde_json::from_str(&response_text).ok();

        if !status.is_success() {
            let message = response_json
                .as_ref()
                .and_then(api_error_message)
                .unwrap_or(response_text);
            return Err(ItineraryError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let response_json = response_json.ok_or_else(|| {
            ItineraryError::Transport("Completion response was not valid JSON".to_string())
        })?;

        if let Some(message) = api_error_message(&response_json) {
            return Err(ItineraryError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response_json)
    }
}

#[async_trait]
impl ItineraryModel for OpenAIClient {
    fn model_version(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let body = ChatCompletionRequest::from_model_request(&self.model, request).into_value();

        debug!(
            target: "itinerary::model",
            model = %self.model,
            temperature = request.temperature,
            prompt_chars = request.prompt.len(),
            "sending chat completion"
        );

        let response = self.chat_completion(&body).await?;
        completion_text(&response)
    }
}

fn api_error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    Some(
        error
            .get("message")
            .and_then(|value| value.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| error.to_string()),
    )
}

/// Text of the first choice; a missing or null content is an empty response.
fn completion_text(response: &Value) -> Result<ModelResponse> {
    let choices = response
        .get("choices")
        .and_then(|value| value.as_array())
        .ok_or_else(|| {
            ItineraryError::Transport("Missing 'choices' array in completion response".to_string())
        })?;

    let first_choice = choices.first().ok_or_else(|| {
        ItineraryError::Transport("Completion response contained no choices".to_string())
    })?;

    let text = first_choice
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .unwrap_or_default();

    Ok(ModelResponse::new(text))
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    top_k: Option<u32>,
    max_tokens: Option<u32>,
    response_format: Option<Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            top_k: None,
            max_tokens: None,
            response_format: None,
        }
    }

    pub fn from_model_request(model: &str, request: &ModelRequest) -> Self {
        let messages = vec![json!({
            "role": "user",
            "content": request.prompt
        })];

        let chat = Self::new(model, messages)
            .with_temperature(request.temperature)
            .with_top_p(request.top_p)
            .with_top_k(request.top_k)
            .with_max_tokens(Some(request.max_output_tokens));

        match request.response_format {
            ResponseFormat::Json => chat.with_response_format(json!({ "type": "json_object" })),
            ResponseFormat::Text => chat,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_response_format(mut self, response_format: Value) -> Self {
        self.response_format = Some(response_format);
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(top_p) = self.top_p {
            body["top_p"] = json!(top_p);
        }

        if let Some(top_k) = self.top_k {
            body["top_k"] = json!(top_k);
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(response_format) = self.response_format {
            body["response_format"] = response_format;
        }

        body
    }
}
