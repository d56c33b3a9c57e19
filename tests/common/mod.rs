//! Common test utilities and fixtures

#![allow(dead_code)]

use gmail_todo_digest::client::MailClient;
use gmail_todo_digest::error::{DigestError, Result};
use gmail_todo_digest::models::MessageRef;
use gmail_todo_digest::pipeline::DigestSettings;
use gmail_todo_digest::summarizer::Summarizer;
use mockall::mock;

// Mock implementation of MailClient for testing
mock! {
    pub MailClient {}

    #[async_trait::async_trait]
    impl MailClient for MailClient {
        async fn list_recent(&self, window_hours: u32) -> Result<Vec<MessageRef>>;
        async fn fetch_body(&self, message_ref: &MessageRef) -> Result<String>;
        async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
    }
}

// Mock implementation of Summarizer for testing
mock! {
    pub Summarizer {}

    #[async_trait::async_trait]
    impl Summarizer for Summarizer {
        async fn summarize(&self, text: &str) -> Result<String>;
    }
}

/// Settings used by most pipeline tests
pub fn test_settings() -> DigestSettings {
    DigestSettings {
        lookback_hours: 12,
        recipient: "me@example.com".to_string(),
        subject: "Aggregated Todo List Items from the Past 12 Hours".to_string(),
        dry_run: false,
    }
}

pub fn refs(ids: &[&str]) -> Vec<MessageRef> {
    ids.iter().map(|id| MessageRef::new(*id)).collect()
}

pub fn transport_error() -> DigestError {
    DigestError::Summarization("request failed: connection reset".to_string())
}
