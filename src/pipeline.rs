//! Digest run: list, fetch, summarize, aggregate, send
//!
//! Everything runs sequentially. A message without plain-text content is
//! skipped; any error from fetching, summarizing or sending aborts the run
//! and nothing is delivered.

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::client::MailClient;
use crate::config::Config;
use crate::error::Result;
use crate::models::{AggregatedReport, MessageRef, TodoSummary};
use crate::summarizer::Summarizer;

/// Per-run settings taken from the configuration
#[derive(Debug, Clone)]
pub struct DigestSettings {
    pub lookback_hours: u32,
    pub recipient: String,
    pub subject: String,
    pub dry_run: bool,
}

impl DigestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            lookback_hours: config.mail.lookback_hours,
            recipient: config.mail.recipient.clone(),
            subject: config.mail.subject(),
            dry_run: config.execution.dry_run,
        }
    }
}

/// Terminal outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The list call returned nothing
    NoMessages,
    /// Messages were processed but none produced to-do items
    NothingToSend { processed: usize, skipped: usize },
    /// The digest was sent
    Sent {
        processed: usize,
        skipped: usize,
        summaries: usize,
    },
    /// The digest was built but not sent
    DryRun {
        processed: usize,
        skipped: usize,
        report: AggregatedReport,
    },
}

impl RunOutcome {
    /// One-line human-readable description
    pub fn describe(&self, lookback_hours: u32) -> String {
        match self {
            RunOutcome::NoMessages => {
                format!("No emails found in the last {} hours.", lookback_hours)
            }
            RunOutcome::NothingToSend { .. } => {
                "No actionable todo items found; no email sent.".to_string()
            }
            RunOutcome::Sent { summaries, .. } => format!(
                "Sent aggregated todo list email ({} messages with todo items).",
                summaries
            ),
            RunOutcome::DryRun { report, .. } => format!(
                "Dry run: aggregated todo list for {} messages was not sent.",
                report.len()
            ),
        }
    }
}

/// Observer for per-message progress
pub trait ProgressSink {
    fn on_listed(&self, _count: usize) {}
    fn on_message(&self, _message_ref: &MessageRef) {}
    fn on_skipped(&self, _message_ref: &MessageRef) {}
}

/// Progress sink that ignores everything
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Run one digest pass
pub async fn run_digest<M, S>(
    mail: &M,
    summarizer: &S,
    settings: &DigestSettings,
    progress: &dyn ProgressSink,
) -> Result<RunOutcome>
where
    M: MailClient + ?Sized,
    S: Summarizer + ?Sized,
{
    let run_id = Uuid::new_v4();
    let span = info_span!("digest_run", %run_id, lookback_hours = settings.lookback_hours);
    run_inner(mail, summarizer, settings, progress)
        .instrument(span)
        .await
}

async fn run_inner<M, S>(
    mail: &M,
    summarizer: &S,
    settings: &DigestSettings,
    progress: &dyn ProgressSink,
) -> Result<RunOutcome>
where
    M: MailClient + ?Sized,
    S: Summarizer + ?Sized,
{
    let refs = mail.list_recent(settings.lookback_hours).await?;
    progress.on_listed(refs.len());
    if refs.is_empty() {
        info!("No messages in window");
        return Ok(RunOutcome::NoMessages);
    }

    let mut report = AggregatedReport::new();
    let mut skipped = 0;

    for message_ref in &refs {
        progress.on_message(message_ref);
        info!("Processing email ID: {}", message_ref);

        let body = mail.fetch_body(message_ref).await?;
        if body.trim().is_empty() {
            info!("Message {} has no plain-text content, skipping", message_ref);
            skipped += 1;
            progress.on_skipped(message_ref);
            continue;
        }

        let todos = summarizer.summarize(&body).await?;
        if todos.is_empty() {
            info!("No todo items for message {}", message_ref);
            skipped += 1;
            progress.on_skipped(message_ref);
            continue;
        }

        report.push(TodoSummary::new(message_ref.clone(), todos));
    }

    let processed = refs.len();
    if report.is_empty() {
        return Ok(RunOutcome::NothingToSend { processed, skipped });
    }

    if settings.dry_run {
        info!("Dry run: not sending digest with {} entries", report.len());
        return Ok(RunOutcome::DryRun {
            processed,
            skipped,
            report,
        });
    }

    mail.send(&settings.recipient, &settings.subject, &report.render())
        .await?;

    Ok(RunOutcome::Sent {
        processed,
        skipped,
        summaries: report.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.mail.recipient = "me@example.com".to_string();
        config.mail.lookback_hours = 6;
        config.execution.dry_run = true;

        let settings = DigestSettings::from_config(&config);
        assert_eq!(settings.lookback_hours, 6);
        assert_eq!(settings.recipient, "me@example.com");
        assert_eq!(
            settings.subject,
            "Aggregated Todo List Items from the Past 6 Hours"
        );
        assert!(settings.dry_run);
    }

    #[test]
    fn test_outcome_descriptions() {
        assert_eq!(
            RunOutcome::NoMessages.describe(12),
            "No emails found in the last 12 hours."
        );
        assert!(RunOutcome::NothingToSend {
            processed: 2,
            skipped: 2
        }
        .describe(12)
        .contains("no email sent"));
        assert!(RunOutcome::Sent {
            processed: 3,
            skipped: 1,
            summaries: 2
        }
        .describe(12)
        .starts_with("Sent aggregated todo list email"));
    }
}
