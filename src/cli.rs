//! Command-line interface

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{initialize_gmail_hub, CredentialStatus, CredentialStore};
use crate::client::GmailMailClient;
use crate::config::Config;
use crate::error::Result;
use crate::models::MessageRef;
use crate::pipeline::{run_digest, DigestSettings, ProgressSink, RunOutcome};
use crate::summarizer::{OpenRouterSummarizer, SummarizerConfig};

#[derive(Parser, Debug)]
#[command(name = "todo-digest")]
#[command(version)]
#[command(about = "Summarize recent Gmail messages into a to-do digest email", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 client secret file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to the persisted OAuth2 token
    #[arg(long, default_value = ".todo-digest/token.json")]
    pub token_cache: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan recent mail and send the to-do digest
    Run {
        /// Build the digest and print it instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the state of the stored credential (no network access)
    Status,

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

/// Progress reporter using indicatif
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed:>6}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        bar.set_message("Listing recent messages...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn finish(&self, msg: &str) {
        self.bar.finish_and_clear();
        println!("{}", msg);
    }

    pub fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressReporter {
    fn on_listed(&self, count: usize) {
        if count > 0 {
            self.bar.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed:>6}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            self.bar.set_length(count as u64);
        }
    }

    fn on_message(&self, message_ref: &MessageRef) {
        self.bar.println(format!("Processing email ID: {}", message_ref));
        self.bar.set_message(message_ref.to_string());
        self.bar.inc(1);
    }

    fn on_skipped(&self, message_ref: &MessageRef) {
        self.bar
            .println(format!("  skipped {} (no plain-text content or todo items)", message_ref));
    }
}

/// Execute a digest run end to end
pub async fn run(cli: &Cli, dry_run: bool) -> Result<RunOutcome> {
    let mut config = Config::load(&cli.config).await?;
    if dry_run {
        config.execution.dry_run = true;
    }
    let settings = DigestSettings::from_config(&config);

    let store = CredentialStore::new(&cli.token_cache, &cli.credentials);
    let credential = store.acquire().await?;
    let hub = initialize_gmail_hub(&credential)?;
    let mail = GmailMailClient::new(hub, config.mail.sender.clone());

    let summarizer = OpenRouterSummarizer::new(SummarizerConfig::from_settings(&config.summarizer));
    if summarizer.config().api_key.is_none() {
        tracing::warn!(
            "{} is not set; completion requests will be unauthenticated",
            config.summarizer.api_key_env
        );
    }

    let reporter = ProgressReporter::new();
    let outcome = match run_digest(&mail, &summarizer, &settings, &reporter).await {
        Ok(outcome) => outcome,
        Err(e) => {
            reporter.abandon();
            return Err(e);
        }
    };

    reporter.finish(&outcome.describe(settings.lookback_hours));
    if let RunOutcome::DryRun { report, .. } = &outcome {
        println!("\nTo: {}\nSubject: {}\n", settings.recipient, settings.subject);
        println!("{}", report.render());
    }

    Ok(outcome)
}

/// Print the state of the stored credential
pub async fn status(cli: &Cli) -> Result<()> {
    let store = CredentialStore::new(&cli.token_cache, &cli.credentials);
    println!("Token file: {:?}", store.token_path());
    match store.status().await {
        CredentialStatus::Missing => println!("Status: missing (authorize once and store the token)"),
        CredentialStatus::Valid {
            expires_at: Some(expires_at),
        } => println!(
            "Status: valid until {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        CredentialStatus::Valid { expires_at: None } => println!("Status: valid (no expiry recorded)"),
        CredentialStatus::Expired { refreshable: true } => {
            println!("Status: expired (will be refreshed on next run)")
        }
        CredentialStatus::Expired { refreshable: false } => {
            println!("Status: expired and cannot be refreshed")
        }
        CredentialStatus::Unreadable(reason) => println!("Status: unreadable ({})", reason),
    }
    Ok(())
}
