use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    core::config::{GenerationSettings, GeneratorConfig},
    error::{FailureKind, ItineraryError, Result},
    schemas::validate_itinerary_document,
    services::{
        entropy::{Entropy, SystemEntropy},
        extraction::extract_json_object,
        model::{ItineraryModel, ModelRequest, ResponseFormat},
        openai_client::OpenAIClient,
        prompt::{build_fixup_prompt, build_prompt},
        synthesizer::synthesize,
    },
    types::{
        decode_candidate, FallbackReason, GenerationPath, GenerationResult, ItineraryDocument,
        Metadata, TripRequest,
    },
};

/// Confidence stamped on model output that did not report its own.
pub const MODEL_CONFIDENCE: f64 = 0.85;

/// Turns a trip request into three itineraries, degrading to the synthesizer
/// whenever the model is absent or unusable.
#[derive(Debug, Clone)]
pub struct ItineraryGenerator {
    model: Option<Arc<dyn ItineraryModel>>,
    entropy: Arc<dyn Entropy>,
    settings: GenerationSettings,
}

impl Default for ItineraryGenerator {
    fn default() -> Self {
        Self::offline()
    }
}

impl ItineraryGenerator {
    pub fn new(model: impl ItineraryModel + 'static) -> Self {
        Self::offline().with_model(Arc::new(model))
    }

    /// Synthesizer only; no model is ever called.
    pub fn offline() -> Self {
        Self {
            model: None,
            entropy: Arc::new(SystemEntropy),
            settings: GenerationSettings::default(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        let generator = Self::offline().with_timeout(config.timeout);
        match &config.api_key {
            Some(api_key) => generator.with_model(Arc::new(
                OpenAIClient::new(api_key.clone())
                    .with_base_url(config.base_url.clone())
                    .with_model(config.model.clone())
                    .with_request_timeout(config.timeout),
            )),
            None => generator,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(&GeneratorConfig::from_env()?))
    }

    pub fn with_model(mut self, model: Arc<dyn ItineraryModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_entropy(mut self, entropy: Arc<dyn Entropy>) -> Self {
        self.entropy = entropy;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.settings.temperature = temperature;
        self
    }

    pub fn with_retry_temperature(mut self, temperature: f64) -> Self {
        self.settings.retry_temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.settings.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Validate a raw request, then generate. Only caller mistakes are errors.
    pub async fn plan(&self, raw: &Value) -> Result<GenerationResult> {
        let request = TripRequest::from_value(raw).map_err(ItineraryError::InvalidRequest)?;
        Ok(self.generate(&request).await)
    }

    /// Generate itineraries. Always yields a document.
    ///
    /// At most two model calls are made; only a schema failure on the first
    /// earns the cooler corrective retry.
    pub async fn generate(&self, request: &TripRequest) -> GenerationResult {
        let Some(model) = self.model.as_deref() else {
            info!(
                target: "itinerary::orchestrator",
                "no model credential configured, using synthesizer"
            );
            return self.fallback(request, FallbackReason::NoCredential);
        };

        let prompt = build_prompt(request);

        let first_error = match self
            .attempt(model, &prompt, self.settings.temperature, request)
            .await
        {
            Ok(document) => return GenerationResult::new(document, GenerationPath::Model),
            Err(err) => err,
        };

        if !first_error.is_retryable() {
            return self.fallback_after(request, &first_error);
        }

        warn!(
            target: "itinerary::orchestrator",
            error = %first_error,
            temperature = self.settings.retry_temperature,
            "model output failed schema validation, retrying"
        );

        let fixup = build_fixup_prompt(&prompt);
        match self
            .attempt(model, &fixup, self.settings.retry_temperature, request)
            .await
        {
            Ok(document) => GenerationResult::new(document, GenerationPath::RetriedModel),
            Err(err) => self.fallback_after(request, &err),
        }
    }

    async fn attempt(
        &self,
        model: &dyn ItineraryModel,
        prompt: &str,
        temperature: f64,
        request: &TripRequest,
    ) -> Result<ItineraryDocument> {
        let model_request = ModelRequest {
            prompt: prompt.to_string(),
            temperature,
            top_p: self.settings.top_p,
            top_k: self.settings.top_k,
            max_output_tokens: self.settings.max_output_tokens,
            response_format: ResponseFormat::Json,
        };

        let response = tokio::time::timeout(self.settings.timeout, model.generate(&model_request))
            .await
            .map_err(|_| {
                ItineraryError::Timeout(format!(
                    "model call exceeded {}s",
                    self.settings.timeout.as_secs_f64()
                ))
            })??;

        debug!(
            target: "itinerary::orchestrator",
            chars = response.text.len(),
            temperature,
            "model responded"
        );

        let payload = extract_json_object(&response.text).ok_or(ItineraryError::NoJsonFound)?;
        validate_itinerary_document(&payload).map_err(ItineraryError::SchemaValidation)?;
        let candidate = decode_candidate(&payload)?;

        let metadata = Metadata {
            generated_at: Utc::now(),
            confidence_score: candidate.confidence_score().unwrap_or(MODEL_CONFIDENCE),
            request_id: self.entropy.token(),
            model_version: model.model_version().to_string(),
        };
        let mut document = candidate.into_document(metadata);
        document.fill_missing_currency(request.currency());
        Ok(document)
    }

    fn fallback_after(&self, request: &TripRequest, err: &ItineraryError) -> GenerationResult {
        let kind = err.failure_kind().unwrap_or(FailureKind::TransportError);
        warn!(
            target: "itinerary::orchestrator",
            kind = %kind,
            error = %err,
            "model path failed, using synthesizer"
        );
        self.fallback(request, FallbackReason::Failure(kind))
    }

    fn fallback(&self, request: &TripRequest, cause: FallbackReason) -> GenerationResult {
        let document = synthesize(request, self.entropy.as_ref());
        GenerationResult::new(document, GenerationPath::Fallback { cause })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{entropy::SeededEntropy, model::ModelResponse, synthesizer::MOCK_MODEL_VERSION},
        types::ItineraryType,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::{collections::VecDeque, sync::Mutex};

    /// Replays canned replies in order and records the temperatures it saw.
    #[derive(Debug, Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<ModelResponse>>>,
        temperatures: Mutex<Vec<f64>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<ModelResponse>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            })
        }

        fn temperatures(&self) -> Vec<f64> {
            self.temperatures.lock().unwrap().clone()
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ItineraryModel for ScriptedModel {
        fn model_version(&self) -> &str {
            "scripted-model"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
            self.temperatures.lock().unwrap().push(request.temperature);
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ItineraryError::Transport("script exhausted".into())))
        }
    }

    #[derive(Debug)]
    struct StalledModel;

    #[async_trait]
    impl ItineraryModel for StalledModel {
        fn model_version(&self) -> &str {
            "stalled"
        }

        async fn generate(&self, _request: &ModelRequest) -> Result<ModelResponse> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ModelResponse::new("{}"))
        }
    }

    fn request() -> TripRequest {
        TripRequest::from_value(&json!({
            "origin": "New York, USA",
            "destination": "Paris, France",
            "start_date": "2025-10-05",
            "end_date": "2025-10-08",
            "budget_total": 2000,
            "currency": "EUR",
            "preferred_themes": ["culture", "food"],
            "num_travelers": 2
        }))
        .unwrap()
    }

    fn model_itinerary(kind: &str, amount: u32) -> Value {
        json!({
            "id": format!("{kind}_model"),
            "type": kind,
            "title": format!("{kind} Paris"),
            "description": "From the model",
            "total_cost": { "amount": amount, "currency": "EUR" },
            "days": [{
                "day": 1,
                "date": "2025-10-05",
                "activities": [{ "name": "Louvre", "type": "cultural", "cost": { "amount": 20 } }],
                "daily_cost": { "amount": 20 }
            }],
            "highlights": ["Louvre"],
            "best_for": ["Art lovers"]
        })
    }

    fn model_document(confidence: f64) -> String {
        json!({
            "itineraries": [
                model_itinerary("balanced", 1700),
                model_itinerary("budget", 1200),
                model_itinerary("experience", 1950)
            ],
            "metadata": {
                "generated_at": "2025-01-01T00:00:00Z",
                "confidence_score": confidence,
                "request_id": "model-chosen-id"
            }
        })
        .to_string()
    }

    fn generator(model: Arc<ScriptedModel>) -> ItineraryGenerator {
        ItineraryGenerator::offline()
            .with_model(model)
            .with_entropy(Arc::new(SeededEntropy::new(11)))
    }

    #[tokio::test]
    async fn test_offline_uses_synthesizer() {
        let result = ItineraryGenerator::offline().generate(&request()).await;
        assert!(result.success());
        assert_eq!(
            result.path,
            GenerationPath::Fallback {
                cause: FallbackReason::NoCredential
            }
        );
        assert_eq!(result.document.metadata.model_version, MOCK_MODEL_VERSION);
        assert_eq!(result.document.itineraries.len(), 3);
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let model = ScriptedModel::new(vec![Ok(ModelResponse::new(model_document(0.92)))]);
        let result = generator(model.clone()).generate(&request()).await;

        assert_eq!(result.path, GenerationPath::Model);
        assert_eq!(model.temperatures(), vec![0.7]);

        let metadata = &result.document.metadata;
        assert_eq!(metadata.model_version, "scripted-model");
        assert_eq!(metadata.confidence_score, 0.92);
        assert_ne!(metadata.request_id, "model-chosen-id");
        assert_eq!(
            result
                .document
                .itinerary(ItineraryType::Experience)
                .map(|it| it.total_cost.amount),
            Some(1950.0)
        );
        assert_eq!(result.document.currencies(), vec!["EUR"]);
    }

    #[tokio::test]
    async fn test_fenced_reply_is_recovered() {
        let fenced = format!("Here you go:\n```json\n{}\n```", model_document(0.6));
        let model = ScriptedModel::new(vec![Ok(ModelResponse::new(fenced))]);
        let result = generator(model).generate(&request()).await;
        assert_eq!(result.path, GenerationPath::Model);
        assert_eq!(result.document.metadata.confidence_score, 0.6);
    }

    #[tokio::test]
    async fn test_schema_failure_retries_cooler_with_fixup() {
        let model = ScriptedModel::new(vec![
            Ok(ModelResponse::new(r#"{"itineraries": []}"#)),
            Ok(ModelResponse::new(model_document(0.8))),
        ]);
        let result = generator(model.clone()).generate(&request()).await;

        assert_eq!(result.path, GenerationPath::RetriedModel);
        assert_eq!(model.temperatures(), vec![0.7, 0.3]);

        let prompts = model.prompts();
        assert!(prompts[1].starts_with(&prompts[0]));
        assert!(prompts[1].contains("IMPORTANT"));
    }

    #[tokio::test]
    async fn test_double_schema_failure_falls_back() {
        let model = ScriptedModel::new(vec![
            Ok(ModelResponse::new(r#"{"itineraries": []}"#)),
            Ok(ModelResponse::new(r#"{"still": "wrong"}"#)),
        ]);
        let result = generator(model.clone()).generate(&request()).await;

        assert_eq!(
            result.path,
            GenerationPath::Fallback {
                cause: FallbackReason::Failure(FailureKind::SchemaValidationFailed)
            }
        );
        assert_eq!(model.temperatures().len(), 2);
        assert_eq!(result.document.metadata.model_version, MOCK_MODEL_VERSION);
        assert_eq!(result.document.metadata.confidence_score, 0.75);
    }

    #[tokio::test]
    async fn test_retry_failing_on_transport_falls_back() {
        let model = ScriptedModel::new(vec![
            Ok(ModelResponse::new(r#"{"itineraries": []}"#)),
            Err(ItineraryError::Http {
                status: 502,
                message: "bad gateway".into(),
            }),
        ]);
        let result = generator(model).generate(&request()).await;
        assert_eq!(
            result.path,
            GenerationPath::Fallback {
                cause: FallbackReason::Failure(FailureKind::TransportError)
            }
        );
    }

    #[tokio::test]
    async fn test_no_json_skips_retry() {
        let model = ScriptedModel::new(vec![Ok(ModelResponse::new("Sorry, I can't do that."))]);
        let result = generator(model.clone()).generate(&request()).await;

        assert_eq!(
            result.path,
            GenerationPath::Fallback {
                cause: FallbackReason::Failure(FailureKind::NoJsonFound)
            }
        );
        assert_eq!(model.temperatures(), vec![0.7]);
    }

    #[tokio::test]
    async fn test_loose_activity_details_pass_first_time() {
        let mut document: Value = serde_json::from_str(&model_document(0.8)).unwrap();
        for itinerary in document["itineraries"].as_array_mut().unwrap() {
            itinerary["days"][0]["day"] = json!(1.0);
            itinerary["days"][0]["activities"][0]["duration"] = json!(3);
            itinerary["days"][0]["activities"][0]["location"] = Value::Null;
            itinerary["days"][0]["activities"][0]["booking_info"] =
                json!({ "bookable": false, "provider": null, "booking_url": null });
        }
        let model = ScriptedModel::new(vec![Ok(ModelResponse::new(document.to_string()))]);
        let result = generator(model.clone()).generate(&request()).await;

        assert_eq!(result.path, GenerationPath::Model);
        assert_eq!(model.temperatures(), vec![0.7]);
        let activity = &result.document.itineraries[0].days[0].activities[0];
        assert_eq!(activity.duration, "3");
        assert_eq!(activity.booking_info.provider, "");
    }

    #[tokio::test]
    async fn test_truncated_reply_is_no_json() {
        let cut = r#"{"itineraries": [{"id": "b", "total_cost": {"amount": 900, "currency": "EUR"}, "days": ["#;
        let model = ScriptedModel::new(vec![Ok(ModelResponse::new(cut))]);
        let result = generator(model.clone()).generate(&request()).await;

        assert_eq!(
            result.path,
            GenerationPath::Fallback {
                cause: FallbackReason::Failure(FailureKind::NoJsonFound)
            }
        );
        assert_eq!(model.temperatures(), vec![0.7]);
    }

    #[tokio::test]
    async fn test_transport_error_skips_retry() {
        let model = ScriptedModel::new(vec![Err(ItineraryError::RateLimit { retry_after: 3 })]);
        let result = generator(model.clone()).generate(&request()).await;

        assert!(result.path.is_fallback());
        assert_eq!(model.temperatures().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_currencies_take_request_currency() {
        let mut document: Value = serde_json::from_str(&model_document(0.8)).unwrap();
        document["itineraries"][0]["total_cost"]["currency"] = json!("");
        let model = ScriptedModel::new(vec![Ok(ModelResponse::new(document.to_string()))]);

        let result = generator(model).generate(&request()).await;
        assert_eq!(result.path, GenerationPath::Model);
        assert_eq!(result.document.currencies(), vec!["EUR"]);
    }

    #[tokio::test]
    async fn test_stalled_model_times_out() {
        let generator =
            ItineraryGenerator::new(StalledModel).with_timeout(Duration::from_millis(50));
        let result = generator.generate(&request()).await;
        assert_eq!(
            result.path,
            GenerationPath::Fallback {
                cause: FallbackReason::Failure(FailureKind::TransportError)
            }
        );
    }

    #[tokio::test]
    async fn test_plan_rejects_invalid_request() {
        let err = ItineraryGenerator::offline()
            .plan(&json!({ "origin": "Lisbon" }))
            .await
            .unwrap_err();
        match err {
            ItineraryError::InvalidRequest(errors) => {
                assert!(errors.contains_path("destination"));
                assert!(errors.contains_path("budget_total"));
            }
            other => panic!("expected invalid request, got {other:?}"),
        }
    }

    #[test]
    fn test_from_config_without_key_is_offline() {
        let generator = ItineraryGenerator::from_config(&GeneratorConfig::default());
        assert!(!generator.has_model());

        let online = ItineraryGenerator::from_config(
            &GeneratorConfig::default().with_api_key("sk-test"),
        );
        assert!(online.has_model());
    }
}
