//! CAI Translation - async Rust SDK for the CAI Universal Translation API
//!
//! The [`TranslationClient`] offers single and batch translation, language
//! listing and health checks against one JSON-over-HTTP API. Each client runs
//! in one of two explicitly chosen modes:
//!
//! - **strict**: input is validated up front and every failure is returned
//!   as a typed [`TranslationError`];
//! - **best-effort**: failures fall back to the original text, single
//!   translations are cached in memory and usage statistics are kept.
//!
//! ```no_run
//! use cai_translation::{ClientConfig, TranslationClient, TranslationRequest};
//!
//! # async fn demo() -> cai_translation::core::errors::Result<()> {
//! let client = TranslationClient::new(ClientConfig::strict().with_base_url("http://localhost:3000"))?;
//! let hola = client.translate(&TranslationRequest::new("Hello", "es")).await?;
//! println!("{}", hola);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;

// Re-export key types for convenience
pub use crate::core::{
    cache::{CacheKey, CacheStats, TranslationCache},
    client::{FailureHook, TranslationClient},
    config::ClientConfig,
    errors::{ErrorKind, TranslationError},
    models::{
        BatchItemResult, BatchTranslationRequest, ClientMode, FailureEvent, Language, LanguageDescriptor,
        Operation, SelfTestReport, TranslationRequest,
    },
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
