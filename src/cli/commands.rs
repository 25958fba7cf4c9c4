//! CLI command definitions and handlers

use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::core::client::TranslationClient;
use crate::core::config::{timeout_ms_from_secs, ClientConfig};
use crate::core::models::{BatchTranslationRequest, ClientMode, Language, TranslationRequest};

/// Commands for the CAI translation CLI
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate a single text
    Translate {
        /// Text to translate
        text: String,

        /// Target language (default: es)
        #[arg(short, long, default_value = "es")]
        target_lang: String,

        /// Source language (default: en)
        #[arg(long, default_value = "en")]
        source_lang: String,
    },

    /// Translate several texts at once
    Batch {
        /// Texts to translate
        texts: Vec<String>,

        /// Read additional texts from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Target language (default: es)
        #[arg(short, long, default_value = "es")]
        target_lang: String,

        /// Source language (default: en)
        #[arg(long, default_value = "en")]
        source_lang: String,
    },

    /// List supported languages
    Languages,

    /// Query the API health endpoint
    Health,

    /// Check connectivity, translation and caching end to end
    SelfTest,
}

/// Global overrides applied on top of the loaded configuration
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// API root to use instead of the configured one
    pub base_url: Option<String>,
    /// Request timeout in whole seconds
    pub timeout_secs: Option<u64>,
    /// `Some(true)` forces strict mode, `Some(false)` best-effort
    pub strict: Option<bool>,
    /// Attribution tag for best-effort requests
    pub app_name: Option<String>,
}

/// Build the client configuration from a file or the environment plus CLI overrides
pub fn load_config(config_file: Option<&Path>, overrides: Overrides) -> anyhow::Result<ClientConfig> {
    let mut config = match config_file {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::from_env()?,
    };

    if let Some(strict) = overrides.strict {
        config.strict = strict;
    }

    if let Some(url) = overrides.base_url {
        config = config.with_base_url(url);
    }

    if let Some(secs) = overrides.timeout_secs {
        config.timeout_ms = Some(timeout_ms_from_secs(secs)?);
    }

    if let Some(app_name) = overrides.app_name {
        config.app_name = app_name;
    }

    config.validate()?;
    Ok(config)
}

/// Handle single translation command
pub async fn handle_translate(
    client: &TranslationClient,
    text: String,
    target_lang: String,
    source_lang: String,
) -> anyhow::Result<()> {
    use tracing::info;

    info!("Translating {} characters {} -> {}", text.chars().count(), source_lang, target_lang);

    let request = TranslationRequest::new(text, target_lang).with_source_lang(source_lang);
    let translation = client.translate(&request).await?;

    println!("{}", translation);

    Ok(())
}

/// Handle batch translation command
pub async fn handle_batch(
    client: &TranslationClient,
    mut texts: Vec<String>,
    file: Option<PathBuf>,
    target_lang: String,
    source_lang: String,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::{Duration, Instant};
    use tracing::info;

    if let Some(path) = file {
        let content = std::fs::read_to_string(&path)?;
        texts.extend(content.lines().filter(|l| !l.trim().is_empty()).map(str::to_string));
    }

    if texts.is_empty() {
        anyhow::bail!("No texts to translate");
    }

    let start_time = Instant::now();
    info!("Translating batch of {} texts into {}", texts.len(), target_lang);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Translating {} texts", texts.len()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let request = BatchTranslationRequest::new(texts, target_lang).with_source_lang(source_lang);
    let result = client.batch_translate(&request).await;
    pb.finish_and_clear();

    let results = result?;
    let failed = results.iter().filter(|r| !r.success).count();

    for (i, item) in results.iter().enumerate() {
        match &item.error {
            None => println!("{}. {} -> {}", i + 1, item.original, item.translated),
            Some(error) => println!("{}. {} -> {} (failed: {})", i + 1, item.original, item.translated, error),
        }
    }

    println!("\n✅ Batch completed!");
    println!("   Translated: {}", results.len() - failed);
    println!("   Failed: {}", failed);
    println!("   Time: {:?}", start_time.elapsed());

    if client.mode() == ClientMode::BestEffort {
        print_cache_stats(client).await;
    }

    Ok(())
}

/// Handle languages command
pub async fn handle_languages(client: &TranslationClient) -> anyhow::Result<()> {
    let languages = client.get_supported_languages().await?;

    println!("🌍 {} supported languages:", languages.len());
    for language in &languages {
        match language {
            Language::Code(code) => println!("   {}", code),
            Language::Descriptor(d) => println!("   {} {} - {} ({})", d.flag, d.code, d.name, d.native),
        }
    }

    Ok(())
}

/// Handle health command
pub async fn handle_health(client: &TranslationClient) -> anyhow::Result<()> {
    let payload = client.health_check().await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// Handle self-test command
pub async fn handle_self_test(client: &TranslationClient) -> anyhow::Result<()> {
    println!("🧪 Testing CAI Translation client ({} mode)...", client.mode());

    let report = client.self_test().await;

    println!("   API connection: {}", check_mark(report.api_connection));
    println!("   Languages: {}", check_mark(report.languages));
    println!("   Translation: {}", check_mark(report.translation));
    println!("   Cache: {}", check_mark(report.cache));
    for error in &report.errors {
        eprintln!("   Error: {}", error);
    }

    if client.mode() == ClientMode::BestEffort {
        print_cache_stats(client).await;
    }

    if !report.passed() {
        anyhow::bail!("Self test failed");
    }

    println!("\n✅ Self test completed successfully!");
    Ok(())
}

async fn print_cache_stats(client: &TranslationClient) {
    let stats = client.cache_stats().await;
    println!("\n💾 Cache statistics:");
    println!("   Entries: {}", stats.cache_size);
    println!("   Lookups: {}", stats.total_translations);
    println!("   Hits: {} ({})", stats.cache_hits, stats.hit_rate_display());
    println!("   API calls: {}", stats.api_calls);
}

fn check_mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        ClientConfig::strict().to_file(&path).unwrap();

        let config = load_config(
            Some(&path),
            Overrides {
                base_url: Some("http://127.0.0.1:4000/".into()),
                timeout_secs: None,
                strict: Some(false),
                app_name: Some("CliApp".into()),
            },
        )
        .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:4000");
        assert!(!config.strict);
        assert_eq!(
            config.timeout(),
            std::time::Duration::from_millis(crate::core::config::BEST_EFFORT_TIMEOUT_MS)
        );
        assert_eq!(config.app_name, "CliApp");
    }

    #[test]
    fn test_load_config_explicit_timeout_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.yml");
        ClientConfig::strict().to_file(&path).unwrap();

        let config = load_config(
            Some(&path),
            Overrides {
                timeout_secs: Some(2),
                strict: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(config.timeout_ms, Some(2000));
    }

    #[test]
    fn test_load_config_rejects_overflowing_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        ClientConfig::strict().to_file(&path).unwrap();

        let result = load_config(
            Some(&path),
            Overrides {
                timeout_secs: Some(u64::MAX),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_best_effort_file_keeps_its_timeout_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.yaml");
        std::fs::write(&path, "strict: false\napp_name: FileApp\n").unwrap();

        let config = load_config(Some(&path), Overrides::default()).unwrap();

        assert_eq!(config.mode(), ClientMode::BestEffort);
        assert_eq!(config.timeout(), std::time::Duration::from_secs(10));
    }

    #[test]
    fn test_load_config_rejects_bad_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        ClientConfig::strict().to_file(&path).unwrap();

        let result = load_config(
            Some(&path),
            Overrides {
                base_url: Some("not-a-url".into()),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }
}
