use std::time::Duration;

use crate::{
    error::{ItineraryError, Result},
    services::openai_client::{DEFAULT_BASE_URL, DEFAULT_MODEL},
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Sampling and timeout knobs for model calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    /// First-attempt temperature.
    pub temperature: f64,
    /// Corrective retry temperature; always below `temperature`.
    pub retry_temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Upper bound on a single model call.
    pub timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            retry_temperature: 0.3,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Where and how to reach the model. A missing key means offline mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            api_key: read("OPENAI_API_KEY"),
            ..Self::default()
        };

        if let Some(base_url) = read("OPENAI_BASE_URL").or_else(|| read("OPENROUTER_BASE_URL")) {
            config.base_url = base_url;
        }

        if let Some(model) = read("ITINERARY_MODEL") {
            config.model = model;
        }

        if let Some(raw) = read("ITINERARY_TIMEOUT_SECS") {
            config.timeout = parse_timeout(&raw)?;
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.trim().is_empty()).then_some(api_key);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Drop the credential so every generation takes the synthesizer path.
    pub fn offline(mut self) -> Self {
        self.api_key = None;
        self
    }

    pub fn is_offline(&self) -> bool {
        self.api_key.is_none()
    }
}

/// Whole seconds, strictly positive.
pub fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ItineraryError::Config(
            "ITINERARY_TIMEOUT_SECS must be greater than zero".to_string(),
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(err) => Err(ItineraryError::Config(format!(
            "ITINERARY_TIMEOUT_SECS must be a whole number of seconds: {err}"
        ))),
    }
}
