//! Gmail To-Do Digest
//!
//! Scans a Gmail mailbox for recently received messages, asks a chat
//! completion service to derive actionable to-do items from each plain-text
//! body, and sends one aggregated digest email.
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_todo_digest::auth::{initialize_gmail_hub, CredentialStore};
//! use gmail_todo_digest::client::GmailMailClient;
//! use gmail_todo_digest::config::Config;
//! use gmail_todo_digest::pipeline::{run_digest, DigestSettings, NoProgress};
//! use gmail_todo_digest::summarizer::{OpenRouterSummarizer, SummarizerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let store = CredentialStore::new(".todo-digest/token.json", "credentials.json");
//!     let hub = initialize_gmail_hub(&store.acquire().await?)?;
//!     let mail = GmailMailClient::new(hub, config.mail.sender.clone());
//!     let summarizer =
//!         OpenRouterSummarizer::new(SummarizerConfig::from_settings(&config.summarizer));
//!
//!     let outcome = run_digest(
//!         &mail,
//!         &summarizer,
//!         &DigestSettings::from_config(&config),
//!         &NoProgress,
//!     )
//!     .await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - Persisted OAuth2 credential, refresh, and Gmail hub setup
//! - [`client`] - Mail operations (list, fetch body, send)
//! - [`message`] - RFC 822 text extraction and message building
//! - [`summarizer`] - Chat completion client producing to-do lists
//! - [`pipeline`] - The digest run
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`models`] - Core data structures

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod models;
pub mod pipeline;
pub mod summarizer;

pub use error::{DigestError, Result};

pub use models::{AggregatedReport, MessageRef, TodoSummary};

pub use auth::{CredentialStore, StoredCredential};
pub use client::{GmailMailClient, MailClient};
pub use config::Config;
pub use pipeline::{run_digest, DigestSettings, RunOutcome};
pub use summarizer::{OpenRouterSummarizer, Summarizer, SummarizerConfig};
