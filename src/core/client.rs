//! Async client for the CAI Universal Translation API

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::cache::{CacheKey, CacheStats, TranslationCache};
use crate::core::config::{duration_millis, normalize_base_url, ClientConfig};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{
    fallback_languages, BatchItemResult, BatchPayload, BatchResponse, BatchTranslationRequest,
    ClientMode, ErrorBody, FailureEvent, Language, LanguagesResponse, Operation, SelfTestReport,
    TranslatePayload, TranslateResponse, TranslationRequest,
};

/// Longest text accepted by a strict single translation, in characters
pub const MAX_TEXT_CHARS: usize = 5000;

/// Most texts accepted by a strict batch call
pub const MAX_BATCH_ITEMS: usize = 100;

/// Longest text accepted inside a strict batch, in characters
pub const MAX_BATCH_TEXT_CHARS: usize = 1000;

/// Upper bound for the best-effort language listing request
const BEST_EFFORT_LANGUAGES_TIMEOUT: Duration = Duration::from_secs(5);

/// Target language that best-effort clients never send to the API
const IDENTITY_LANGUAGE: &str = "en";

/// Callback receiving failures that a best-effort client swallows
pub type FailureHook = Arc<dyn Fn(&FailureEvent) + Send + Sync>;

/// Translation client with an explicit error policy.
///
/// In [`ClientMode::Strict`] every failure is returned as a
/// [`TranslationError`]. In [`ClientMode::BestEffort`] the `Result`s are
/// always `Ok`: failures fall back to the original text (or the built-in
/// language list), single translations are cached and the failure is
/// reported through `tracing` and the optional failure hook.
///
/// The cache and counters are guarded internally, so a client can be shared
/// across tasks behind an `Arc`.
pub struct TranslationClient {
    client: reqwest::Client,
    config: ClientConfig,
    cache: TranslationCache,
    failure_hook: Option<FailureHook>,
}

impl fmt::Debug for TranslationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationClient")
            .field("config", &self.config)
            .field("failure_hook", &self.failure_hook.is_some())
            .finish_non_exhaustive()
    }
}

impl TranslationClient {
    /// Create a new translation client
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        config.validate()?;
        config.base_url = normalize_base_url(&config.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent())
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        debug!("Created {} client for {}", config.mode(), config.base_url);

        Ok(Self {
            client,
            config,
            cache: TranslationCache::new(),
            failure_hook: None,
        })
    }

    /// Error-propagating client for `base_url`
    pub fn strict(base_url: &str) -> Result<Self> {
        Self::new(ClientConfig::strict().with_base_url(base_url))
    }

    /// Caching, fallback-on-failure client tagged with `app_name`
    pub fn best_effort(app_name: &str, base_url: &str) -> Result<Self> {
        Self::new(ClientConfig::best_effort(app_name).with_base_url(base_url))
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        Self::new(config)
    }

    /// Install a callback for failures swallowed in best-effort mode
    pub fn with_failure_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FailureEvent) + Send + Sync + 'static,
    {
        self.failure_hook = Some(Arc::new(hook));
        self
    }

    /// Error policy of this client
    pub fn mode(&self) -> ClientMode {
        self.config.mode()
    }

    /// Current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// API root requests are sent to
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    /// Point later requests at another API root
    pub fn set_base_url(&mut self, base_url: &str) {
        self.config.base_url = normalize_base_url(base_url);
    }

    /// Change the per-request timeout; a zero duration is rejected
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(TranslationError::ConfigError {
                message: "timeout must be greater than 0".to_string(),
            });
        }
        self.config.timeout_ms = Some(duration_millis(timeout));
        Ok(())
    }

    /// Translate a single request
    pub async fn translate(&self, request: &TranslationRequest) -> Result<String> {
        match self.mode() {
            ClientMode::Strict => self.translate_strict(request).await,
            ClientMode::BestEffort => Ok(self.translate_best_effort(request).await),
        }
    }

    /// Translate `text` from English into `target_lang`
    pub async fn translate_text(&self, text: &str, target_lang: &str) -> Result<String> {
        self.translate(&TranslationRequest::new(text, target_lang)).await
    }

    /// Translate several texts into one target language.
    ///
    /// Strict clients send one request to the batch endpoint; best-effort
    /// clients translate every text on its own so a failing item never
    /// affects the others.
    pub async fn batch_translate(&self, request: &BatchTranslationRequest) -> Result<Vec<BatchItemResult>> {
        match self.mode() {
            ClientMode::Strict => self.batch_translate_strict(request).await,
            ClientMode::BestEffort => Ok(self.batch_translate_best_effort(request).await),
        }
    }

    /// Get the languages the API can translate into
    pub async fn get_supported_languages(&self) -> Result<Vec<Language>> {
        match self.mode() {
            ClientMode::Strict => self.fetch_languages_strict().await,
            ClientMode::BestEffort => match self.fetch_languages_best_effort().await {
                Ok(languages) => Ok(languages),
                Err(e) => {
                    self.report_failure(Operation::Languages, None, None, &e);
                    Ok(fallback_languages())
                }
            },
        }
    }

    /// Fetch the raw `/health` payload
    pub async fn health_check(&self) -> Result<serde_json::Value> {
        let result = self.fetch_health().await;
        match (self.mode(), result) {
            (_, Ok(payload)) => Ok(payload),
            (ClientMode::Strict, Err(e)) => Err(e),
            (ClientMode::BestEffort, Err(e)) => {
                self.report_failure(Operation::Health, None, None, &e);
                Ok(serde_json::json!({
                    "status": "error",
                    "error": e.to_string(),
                }))
            }
        }
    }

    /// Empty the translation cache; counters are kept
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Cache size, counters and hit rate
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats(&self.config.app_name).await
    }

    /// Exercise languages, translation and caching against the live API
    pub async fn self_test(&self) -> SelfTestReport {
        let mut report = SelfTestReport::default();

        info!("Running self test against {}", self.config.base_url);

        match self.get_supported_languages().await {
            Ok(languages) => {
                report.api_connection = true;
                report.languages = !languages.is_empty();
                info!("Supported languages: {}", languages.len());
            }
            Err(e) => report.errors.push(e.to_string()),
        }

        let sample = "Hello, world!";
        match self.translate_text(sample, "es").await {
            Ok(first) => {
                report.translation = first != sample;
                info!("Translation test: '{}' -> '{}'", sample, first);

                match self.translate_text(sample, "es").await {
                    Ok(second) => report.cache = second == first,
                    Err(e) => report.errors.push(e.to_string()),
                }
            }
            Err(e) => report.errors.push(e.to_string()),
        }

        if report.passed() {
            info!("Self test completed successfully");
        } else {
            warn!("Self test finished with problems: {:?}", report);
        }

        report
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn translate_strict(&self, request: &TranslationRequest) -> Result<String> {
        if request.text.is_empty() {
            return Err(TranslationError::validation("Text must be a non-empty string"));
        }

        if request.target_lang.is_empty() {
            return Err(TranslationError::validation("Target language must be a non-empty string"));
        }

        if request.text.chars().count() > MAX_TEXT_CHARS {
            return Err(TranslationError::validation(format!(
                "Text too long (max {} characters)",
                MAX_TEXT_CHARS
            )));
        }

        let payload = TranslatePayload {
            text: &request.text,
            target_language: &request.target_lang,
            source_language: &request.source_lang,
            app_name: None,
        };

        let response = self
            .client
            .post(self.url("/api/translate"))
            .timeout(self.timeout())
            .json(&payload)
            .send()
            .await?;

        let response = check_response(response).await?;
        let data: TranslateResponse = decode(response).await?;

        if !data.success {
            return Err(TranslationError::api(
                data.error.unwrap_or_else(|| "Translation failed".to_string()),
            ));
        }

        Ok(data
            .translation
            .map(|t| t.into_text())
            .unwrap_or_else(|| request.text.clone()))
    }

    async fn translate_best_effort(&self, request: &TranslationRequest) -> String {
        match self.try_translate_best_effort(request).await {
            Ok(translation) => translation,
            Err(e) => {
                self.report_failure(
                    Operation::Translate,
                    Some(&request.text),
                    Some(&request.target_lang),
                    &e,
                );
                request.text.clone()
            }
        }
    }

    /// Cached translation that still reports what went wrong
    async fn try_translate_best_effort(&self, request: &TranslationRequest) -> Result<String> {
        if request.target_lang == IDENTITY_LANGUAGE || request.text.is_empty() {
            return Ok(request.text.clone());
        }

        let key = self.cache_key(request);
        if let Some(hit) = self.cache.lookup(&key).await {
            return Ok(hit);
        }

        let payload = TranslatePayload {
            text: &request.text,
            target_language: &request.target_lang,
            source_language: &request.source_lang,
            app_name: Some(&self.config.app_name),
        };

        let response = self
            .client
            .post(self.url("/translate"))
            .timeout(self.timeout())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let data: TranslateResponse = decode(response).await?;
        if !data.success {
            return Err(TranslationError::api(
                data.error.unwrap_or_else(|| "Translation failed".to_string()),
            ));
        }

        let translation = data
            .translation
            .map(|t| t.into_text())
            .ok_or_else(|| TranslationError::api("No translation in response"))?;

        self.cache.insert(key, translation.clone()).await;
        Ok(translation)
    }

    fn cache_key(&self, request: &TranslationRequest) -> CacheKey {
        if self.config.source_aware_cache {
            CacheKey::with_source(&request.text, &request.target_lang, &request.source_lang)
        } else {
            CacheKey::new(&request.text, &request.target_lang)
        }
    }

    async fn batch_translate_strict(&self, request: &BatchTranslationRequest) -> Result<Vec<BatchItemResult>> {
        validate_batch(request)?;

        let payload = BatchPayload {
            texts: &request.texts,
            target_language: &request.target_lang,
            source_language: &request.source_lang,
        };

        let response = self
            .client
            .post(self.url("/api/translate/batch"))
            .timeout(self.timeout())
            .json(&payload)
            .send()
            .await?;

        let response = check_response(response).await?;
        let data: BatchResponse = decode(response).await?;

        if !data.success {
            return Err(TranslationError::api(
                data.error.unwrap_or_else(|| "Batch translation failed".to_string()),
            ));
        }

        let results = data
            .results
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let original = item
                    .original_text
                    .or_else(|| request.texts.get(i).cloned())
                    .unwrap_or_default();

                if item.success {
                    let translated = item
                        .translation
                        .map(|t| t.into_text())
                        .unwrap_or_else(|| original.clone());
                    BatchItemResult::translated(original, translated, &request.target_lang)
                } else {
                    let error = item.error.unwrap_or_else(|| "Translation failed".to_string());
                    BatchItemResult::failed(original, &request.target_lang, error)
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "Batch of {} translated, {} succeeded",
            results.len(),
            results.iter().filter(|r| r.success).count()
        );

        Ok(results)
    }

    async fn batch_translate_best_effort(&self, request: &BatchTranslationRequest) -> Vec<BatchItemResult> {
        let mut results = Vec::with_capacity(request.texts.len());

        for text in &request.texts {
            let item = TranslationRequest::new(text.clone(), request.target_lang.clone())
                .with_source_lang(request.source_lang.clone());

            match self.try_translate_best_effort(&item).await {
                Ok(translated) => {
                    results.push(BatchItemResult::translated(text.clone(), translated, &request.target_lang));
                }
                Err(e) => {
                    self.report_failure(Operation::BatchItem, Some(text), Some(&request.target_lang), &e);
                    results.push(BatchItemResult::failed(text.clone(), &request.target_lang, e.to_string()));
                }
            }
        }

        results
    }

    async fn fetch_languages_strict(&self) -> Result<Vec<Language>> {
        let response = self
            .client
            .get(self.url("/api/languages"))
            .timeout(self.timeout())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let data: LanguagesResponse = decode(response).await?;
        if !data.success {
            return Err(TranslationError::api("Failed to get supported languages"));
        }

        Ok(data.languages)
    }

    async fn fetch_languages_best_effort(&self) -> Result<Vec<Language>> {
        let response = self
            .client
            .get(self.url("/languages"))
            .timeout(self.timeout().min(BEST_EFFORT_LANGUAGES_TIMEOUT))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let data: LanguagesResponse = decode(response).await?;
        if !data.success {
            return Err(TranslationError::api("Failed to get supported languages"));
        }

        Ok(data.languages)
    }

    async fn fetch_health(&self) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(self.url("/health"))
            .timeout(self.timeout())
            .send()
            .await?;

        decode(response).await
    }

    fn report_failure(
        &self,
        operation: Operation,
        text: Option<&str>,
        target_lang: Option<&str>,
        error: &TranslationError,
    ) {
        match (text, target_lang) {
            (Some(text), Some(target)) => {
                warn!("Translation failed for '{}' -> {} ({}): {}", text, target, operation, error)
            }
            _ => warn!("Best-effort {} failed: {}", operation, error),
        }

        if let Some(hook) = &self.failure_hook {
            hook(&FailureEvent {
                operation,
                text: text.map(str::to_string),
                target_lang: target_lang.map(str::to_string),
                message: error.to_string(),
            });
        }
    }
}

/// Check the input limits of a strict batch call
fn validate_batch(request: &BatchTranslationRequest) -> Result<()> {
    if request.texts.is_empty() {
        return Err(TranslationError::validation("Texts must be a non-empty list"));
    }

    if request.texts.len() > MAX_BATCH_ITEMS {
        return Err(TranslationError::validation(format!(
            "Too many texts (max {} per batch)",
            MAX_BATCH_ITEMS
        )));
    }

    if request.target_lang.is_empty() {
        return Err(TranslationError::validation("Target language must be a non-empty string"));
    }

    for (i, text) in request.texts.iter().enumerate() {
        if text.chars().count() > MAX_BATCH_TEXT_CHARS {
            return Err(TranslationError::validation_at(
                i,
                format!("Text at index {} too long (max {} characters)", i, MAX_BATCH_TEXT_CHARS),
            ));
        }
    }

    Ok(())
}

/// `ApiError` for a non-success status
fn status_error(status: StatusCode) -> TranslationError {
    TranslationError::ApiError {
        status: Some(status.as_u16()),
        message: format!(
            "API error: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        ),
    }
}

/// Map 429, 400 and other failures of the translate endpoints
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_header = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            Err(TranslationError::RateLimitError {
                retry_after: retry_after_header.or(body.retry_after),
            })
        }
        StatusCode::BAD_REQUEST => {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            Err(TranslationError::validation(
                body.error.unwrap_or_else(|| "Invalid request".to_string()),
            ))
        }
        _ => Err(status_error(status)),
    }
}

/// Read the body and parse it as JSON
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| TranslationError::ApiError {
        status: Some(status),
        message: format!("Invalid response: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use std::sync::Mutex;
    use tokio_test::assert_ok;

    /// Nothing listens on the discard port, so any request fails fast
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn strict() -> TranslationClient {
        TranslationClient::strict(UNREACHABLE).unwrap()
    }

    #[tokio::test]
    async fn test_strict_rejects_empty_text() {
        let err = strict().translate_text("", "es").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_strict_rejects_empty_target() {
        let err = strict().translate_text("Hello", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_strict_text_length_limit_counts_characters() {
        let too_long = "a".repeat(MAX_TEXT_CHARS + 1);
        let err = strict().translate_text(&too_long, "es").await.unwrap_err();
        assert_eq!(
            err,
            TranslationError::validation("Text too long (max 5000 characters)")
        );

        // 5000 multi-byte characters are still within the limit, so the
        // request reaches the (unreachable) network
        let at_limit = "é".repeat(MAX_TEXT_CHARS);
        let err = strict().translate_text(&at_limit, "es").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_batch_validation() {
        let empty = BatchTranslationRequest::new(Vec::<String>::new(), "es");
        assert_eq!(validate_batch(&empty).unwrap_err().kind(), ErrorKind::Validation);

        let too_many = BatchTranslationRequest::new(vec!["hi"; MAX_BATCH_ITEMS + 1], "es");
        assert_eq!(
            validate_batch(&too_many).unwrap_err(),
            TranslationError::validation("Too many texts (max 100 per batch)")
        );

        let no_target = BatchTranslationRequest::new(vec!["hi"], "");
        assert!(validate_batch(&no_target).is_err());

        let mut texts = vec!["short".to_string(); 5];
        texts[3] = "x".repeat(MAX_BATCH_TEXT_CHARS + 1);
        let long_item = BatchTranslationRequest::new(texts, "es");
        match validate_batch(&long_item).unwrap_err() {
            TranslationError::ValidationError { index, message } => {
                assert_eq!(index, Some(3));
                assert_eq!(message, "Text at index 3 too long (max 1000 characters)");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let full = BatchTranslationRequest::new(vec!["y".repeat(MAX_BATCH_TEXT_CHARS); MAX_BATCH_ITEMS], "es");
        assert_ok!(validate_batch(&full));
    }

    #[tokio::test]
    async fn test_best_effort_identity_short_circuit() {
        let client = TranslationClient::best_effort("TestApp", UNREACHABLE).unwrap();

        assert_eq!(client.translate_text("Hello", "en").await.unwrap(), "Hello");
        assert_eq!(client.translate_text("", "es").await.unwrap(), "");

        let stats = client.cache_stats().await;
        assert_eq!(stats.total_translations, 0);
        assert_eq!(stats.api_calls, 0);
    }

    #[tokio::test]
    async fn test_best_effort_network_failure_returns_original_and_reports() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let client = TranslationClient::best_effort("TestApp", UNREACHABLE)
            .unwrap()
            .with_failure_hook(move |event| sink.lock().unwrap().push(event.clone()));

        let result = client.translate_text("Good morning", "fr").await.unwrap();
        assert_eq!(result, "Good morning");

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation, Operation::Translate);
        assert_eq!(events[0].text.as_deref(), Some("Good morning"));
        assert_eq!(events[0].target_lang.as_deref(), Some("fr"));

        // Failures are not cached
        drop(events);
        assert_eq!(client.cache_stats().await.cache_size, 0);
    }

    #[tokio::test]
    async fn test_best_effort_health_reports_error_payload() {
        let client = TranslationClient::best_effort("TestApp", UNREACHABLE).unwrap();
        let payload = client.health_check().await.unwrap();
        assert_eq!(payload["status"], "error");
        assert!(payload["error"].as_str().is_some());
    }

    #[test]
    fn test_setters_update_config() {
        let mut client = strict();
        client.set_base_url("https://translate.example.com/");
        assert_ok!(client.set_timeout(Duration::from_secs(3)));

        assert_eq!(client.base_url(), "https://translate.example.com");
        assert_eq!(client.timeout(), Duration::from_secs(3));
        assert_eq!(client.url("/health"), "https://translate.example.com/health");
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut client = strict();
        let err = client.set_timeout(Duration::ZERO).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_oversized_timeout_saturates() {
        let mut client = TranslationClient::best_effort("TestApp", UNREACHABLE).unwrap();
        assert_ok!(client.set_timeout(Duration::MAX));
        assert_eq!(client.config().timeout_ms, Some(u64::MAX));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = TranslationClient::new(ClientConfig::strict().with_base_url("ftp://example.com")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_status_error_message() {
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err,
            TranslationError::ApiError {
                status: Some(500),
                message: "API error: 500 Internal Server Error".to_string(),
            }
        );
    }
}
