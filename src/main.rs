//! Main entry point for the CAI translation CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cai_translation::cli::commands::{self, Commands, Overrides};
use cai_translation::TranslationClient;

/// CAI Translation - command-line client for the CAI Universal Translation API
#[derive(Parser, Debug)]
#[command(name = "cai-translate", version, about, long_about = None)]
struct Args {
    /// API base URL (defaults to CAI_API_URL or http://localhost:3000)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Fail with typed errors instead of falling back to the input
    #[arg(long, conflicts_with = "best_effort")]
    strict: bool,

    /// Cache results and fall back to the input on failure
    #[arg(long)]
    best_effort: bool,

    /// Application name sent with best-effort requests
    #[arg(long)]
    app_name: Option<String>,

    /// Client configuration file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Args {
    /// Mode chosen on the command line, if any
    fn mode_override(&self) -> Option<bool> {
        match (self.strict, self.best_effort) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cai_translation={},cai_translate={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let strict = args.mode_override();

    let Some(command) = args.command else {
        println!("Please specify a command. Use --help for more information.");
        return Ok(());
    };

    let config = commands::load_config(
        args.config.as_deref(),
        Overrides {
            base_url: args.base_url,
            timeout_secs: args.timeout,
            strict,
            app_name: args.app_name,
        },
    )?;
    let client = TranslationClient::new(config)?;

    // Execute command
    match command {
        Commands::Translate {
            text,
            target_lang,
            source_lang,
        } => {
            commands::handle_translate(&client, text, target_lang, source_lang).await?;
        }
        Commands::Batch {
            texts,
            file,
            target_lang,
            source_lang,
        } => {
            commands::handle_batch(&client, texts, file, target_lang, source_lang).await?;
        }
        Commands::Languages => commands::handle_languages(&client).await?,
        Commands::Health => commands::handle_health(&client).await?,
        Commands::SelfTest => commands::handle_self_test(&client).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flags() {
        let args = Args::try_parse_from(["cai-translate", "--strict", "health"]).unwrap();
        assert_eq!(args.mode_override(), Some(true));

        let args = Args::try_parse_from(["cai-translate", "--best-effort", "health"]).unwrap();
        assert_eq!(args.mode_override(), Some(false));

        let args = Args::try_parse_from(["cai-translate", "health"]).unwrap();
        assert_eq!(args.mode_override(), None);
    }

    #[test]
    fn test_mode_flags_conflict() {
        assert!(Args::try_parse_from(["cai-translate", "--strict", "--best-effort", "health"]).is_err());
    }
}
