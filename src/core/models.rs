//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source language used when the caller does not pick one
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

/// Error policy of a client instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMode {
    /// Typed errors propagate to the caller
    Strict,
    /// Failures degrade to the original text or built-in fallbacks
    BestEffort,
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMode::Strict => write!(f, "strict"),
            ClientMode::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Translation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Text to translate
    pub text: String,
    /// Language code to translate into
    pub target_lang: String,
    /// Language code of `text`, `en` unless set
    pub source_lang: String,
}

impl TranslationRequest {
    /// Request translating English `text` into `target_lang`
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_lang: target_lang.into(),
            source_lang: DEFAULT_SOURCE_LANGUAGE.to_string(),
        }
    }

    /// Override the source language
    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = source_lang.into();
        self
    }
}

/// Batch translation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTranslationRequest {
    /// Texts to translate, in order
    pub texts: Vec<String>,
    /// Language code to translate into
    pub target_lang: String,
    /// Language code shared by all texts
    pub source_lang: String,
}

impl BatchTranslationRequest {
    /// Request translating English `texts` into `target_lang`
    pub fn new<I, S>(texts: I, target_lang: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            target_lang: target_lang.into(),
            source_lang: DEFAULT_SOURCE_LANGUAGE.to_string(),
        }
    }

    /// Override the source language
    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = source_lang.into();
        self
    }
}

/// Outcome of one item of a batch call.
///
/// `translated` equals `original` whenever `success` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResult {
    /// Input text
    pub original: String,
    /// Translation, or the input on failure
    pub translated: String,
    /// Whether the item was translated
    pub success: bool,
    /// Target language code
    pub language: String,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    /// Successful item
    pub fn translated(original: String, translated: String, language: &str) -> Self {
        Self {
            original,
            translated,
            success: true,
            language: language.to_string(),
            error: None,
        }
    }

    /// Failed item carrying the original text
    pub fn failed(original: String, language: &str, error: impl Into<String>) -> Self {
        Self {
            translated: original.clone(),
            original,
            success: false,
            language: language.to_string(),
            error: Some(error.into()),
        }
    }
}

/// Language descriptor as served by the unversioned `/languages` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDescriptor {
    /// ISO language code
    pub code: String,
    /// English name
    #[serde(default)]
    pub name: String,
    /// Flag emoji
    #[serde(default)]
    pub flag: String,
    /// Name in the language itself
    #[serde(default)]
    pub native: String,
}

/// Entry of a supported-languages listing.
///
/// The versioned API answers with bare codes, the unversioned one with full
/// descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Language {
    /// Bare language code
    Code(String),
    /// Code with display names
    Descriptor(LanguageDescriptor),
}

impl Language {
    /// Language code of either form
    pub fn code(&self) -> &str {
        match self {
            Language::Code(code) => code,
            Language::Descriptor(descriptor) => &descriptor.code,
        }
    }

    /// Full descriptor, if the API sent one
    pub fn descriptor(&self) -> Option<&LanguageDescriptor> {
        match self {
            Language::Code(_) => None,
            Language::Descriptor(descriptor) => Some(descriptor),
        }
    }
}

/// Common languages returned when the language listing cannot be fetched
const FALLBACK_LANGUAGES: &[(&str, &str, &str, &str)] = &[
    ("en", "English", "🇺🇸", "English"),
    ("es", "Spanish", "🇪🇸", "Español"),
    ("fr", "French", "🇫🇷", "Français"),
    ("de", "German", "🇩🇪", "Deutsch"),
    ("it", "Italian", "🇮🇹", "Italiano"),
    ("pt", "Portuguese", "🇵🇹", "Português"),
    ("ru", "Russian", "🇷🇺", "Русский"),
    ("ja", "Japanese", "🇯🇵", "日本語"),
    ("ko", "Korean", "🇰🇷", "한국어"),
    ("zh", "Chinese", "🇨🇳", "中文"),
];

/// Built-in language list used by best-effort clients
pub fn fallback_languages() -> Vec<Language> {
    FALLBACK_LANGUAGES
        .iter()
        .map(|(code, name, flag, native)| {
            Language::Descriptor(LanguageDescriptor {
                code: code.to_string(),
                name: name.to_string(),
                flag: flag.to_string(),
                native: native.to_string(),
            })
        })
        .collect()
}

/// Which client call a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Single translation
    Translate,
    /// One item of a batch
    BatchItem,
    /// Supported-languages listing
    Languages,
    /// Health check
    Health,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Translate => write!(f, "translate"),
            Operation::BatchItem => write!(f, "batch_item"),
            Operation::Languages => write!(f, "languages"),
            Operation::Health => write!(f, "health"),
        }
    }
}

/// Failure swallowed by a best-effort client, handed to the failure hook
#[derive(Debug, Clone)]
pub struct FailureEvent {
    /// Call that failed
    pub operation: Operation,
    /// Input text, for translation calls
    pub text: Option<String>,
    /// Target language, for translation calls
    pub target_lang: Option<String>,
    /// Error message
    pub message: String,
}

/// Result of [`crate::TranslationClient::self_test`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelfTestReport {
    /// Health endpoint answered
    pub api_connection: bool,
    /// A sample text came back translated
    pub translation: bool,
    /// Language listing was non-empty
    pub languages: bool,
    /// Repeating the sample returned the same translation
    pub cache: bool,
    /// Messages of every failed step
    pub errors: Vec<String>,
}

impl SelfTestReport {
    /// Every check succeeded
    pub fn passed(&self) -> bool {
        self.api_connection && self.translation && self.languages && self.cache && self.errors.is_empty()
    }
}

// Wire types

/// Body of `POST /api/translate` and `POST /translate`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranslatePayload<'a> {
    pub text: &'a str,
    pub target_language: &'a str,
    pub source_language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<&'a str>,
}

/// Body of `POST /api/translate/batch`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchPayload<'a> {
    pub texts: &'a [String],
    pub target_language: &'a str,
    pub source_language: &'a str,
}

/// `translation` is a bare string on the versioned API and an object on the
/// unversioned one
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum TranslationField {
    Text(String),
    #[serde(rename_all = "camelCase")]
    Detailed { translated_text: String },
}

impl TranslationField {
    pub fn into_text(self) -> String {
        match self {
            TranslationField::Text(text) => text,
            TranslationField::Detailed { translated_text } => translated_text,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateResponse {
    #[serde(default)]
    pub success: bool,
    pub translation: Option<TranslationField>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchResultItem {
    #[serde(default)]
    pub success: bool,
    pub translation: Option<TranslationField>,
    #[serde(default)]
    pub original_text: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub results: Vec<BatchResultItem>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LanguagesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub languages: Vec<Language>,
}

/// Error body of 400 and 429 answers
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub retry_after: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_english_source() {
        let request = TranslationRequest::new("Hello", "es");
        assert_eq!(request.source_lang, "en");

        let request = request.with_source_lang("fr");
        assert_eq!(request.source_lang, "fr");
    }

    #[test]
    fn test_fallback_languages_are_complete() {
        let languages = fallback_languages();
        assert_eq!(languages.len(), 10);
        for language in &languages {
            let descriptor = language.descriptor().unwrap();
            assert!(!descriptor.code.is_empty());
            assert!(!descriptor.name.is_empty());
            assert!(!descriptor.flag.is_empty());
            assert!(!descriptor.native.is_empty());
        }
        assert_eq!(languages[0].code(), "en");
        assert_eq!(languages[9].code(), "zh");
    }

    #[test]
    fn test_language_accepts_codes_and_descriptors() {
        let languages: Vec<Language> = serde_json::from_str(
            r#"["es", {"code":"fr","name":"French","flag":"🇫🇷","native":"Français"}]"#,
        )
        .unwrap();
        assert_eq!(languages[0], Language::Code("es".into()));
        assert_eq!(languages[1].code(), "fr");
        assert_eq!(languages[1].descriptor().unwrap().native, "Français");
    }

    #[test]
    fn test_translation_field_shapes() {
        let plain: TranslateResponse =
            serde_json::from_str(r#"{"success":true,"translation":"Hola"}"#).unwrap();
        assert_eq!(plain.translation.unwrap().into_text(), "Hola");

        let nested: TranslateResponse =
            serde_json::from_str(r#"{"success":true,"translation":{"translatedText":"Hola"}}"#).unwrap();
        assert_eq!(nested.translation.unwrap().into_text(), "Hola");

        let missing: TranslateResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!missing.success);
        assert!(missing.translation.is_none());
    }

    #[test]
    fn test_payload_uses_camel_case() {
        let payload = TranslatePayload {
            text: "Hi",
            target_language: "de",
            source_language: "en",
            app_name: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["targetLanguage"], "de");
        assert_eq!(json["sourceLanguage"], "en");
        assert!(json.get("appName").is_none());
    }

    #[test]
    fn test_failed_batch_item_keeps_original() {
        let item = BatchItemResult::failed("Hello".into(), "es", "Request timeout");
        assert!(!item.success);
        assert_eq!(item.translated, "Hello");
        assert_eq!(item.error.as_deref(), Some("Request timeout"));
    }
}
