//! Summarization client: derive to-do items from an email body via a chat completion API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::debug;

use crate::config::SummarizerSettings;
use crate::error::{DigestError, Result};

const DEFAULT_SITE_URL: &str = "https://example.com";
const DEFAULT_SITE_NAME: &str = "MySite";

/// Build the fixed to-do extraction prompt for one email body
pub fn build_prompt(email_content: &str) -> String {
    format!(
        "Extract a list of actionable todo items from the following email content:\n\n{}\n\nTodo list:",
        email_content
    )
}

/// Trait for the completion service, mockable in tests
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Return the trimmed to-do list derived from `text`
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Resolved settings for one run: endpoint, model, and outbound identity
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub base_url: String,
    pub model: String,
    /// Missing keys are not rejected here; the API refuses the request instead
    pub api_key: Option<String>,
    pub site_url: String,
    pub site_name: String,
}

impl SummarizerConfig {
    /// Resolve the configured environment variable names into values
    pub fn from_settings(settings: &SummarizerSettings) -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            api_key: non_empty(&settings.api_key_env),
            site_url: non_empty(&settings.site_url_env)
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            site_name: non_empty(&settings.site_name_env)
                .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenRouter (OpenAI-compatible) chat completion client
pub struct OpenRouterSummarizer {
    http: Client,
    config: SummarizerConfig,
}

impl OpenRouterSummarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }
}

#[async_trait]
impl Summarizer for OpenRouterSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let prompt = build_prompt(text);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let url = self.config.completions_url();
        debug!("Requesting completion from {} with model {}", url, self.config.model);

        let mut builder = self
            .http
            .post(&url)
            .header("HTTP-Referer", &self.config.site_url)
            .header("X-Title", &self.config.site_name)
            .json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DigestError::Summarization(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Completion API error ({}): {}", status, error_text);
            return Err(DigestError::Summarization(format!(
                "completion API returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| DigestError::Summarization(format!("invalid response body: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DigestError::Summarization("response contained no choices".to_string()))?;

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, api_key: Option<&str>) -> SummarizerConfig {
        SummarizerConfig {
            base_url: format!("{}/api/v1", server.uri()),
            model: "perplexity/r1-1776".to_string(),
            api_key: api_key.map(str::to_string),
            site_url: "https://digest.example.com".to_string(),
            site_name: "Digest".to_string(),
        }
    }

    #[test]
    fn test_build_prompt_layout() {
        assert_eq!(
            build_prompt("Call Bob"),
            "Extract a list of actionable todo items from the following email content:\n\nCall Bob\n\nTodo list:"
        );
    }

    #[tokio::test]
    async fn test_summarize_sends_single_user_turn_and_trims() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("HTTP-Referer", "https://digest.example.com"))
            .and(header("X-Title", "Digest"))
            .and(body_partial_json(serde_json::json!({
                "model": "perplexity/r1-1776",
                "messages": [{ "role": "user", "content": build_prompt("Buy milk today") }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "gen-1",
                "choices": [
                    { "index": 0, "message": { "role": "assistant", "content": "\n- Buy milk\n  " } },
                    { "index": 1, "message": { "role": "assistant", "content": "ignored" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summarizer = OpenRouterSummarizer::new(config_for(&server, Some("sk-test")));
        let todos = summarizer.summarize("Buy milk today").await.unwrap();
        assert_eq!(todos, "- Buy milk");
    }

    #[tokio::test]
    async fn test_summarize_api_error_is_summarization_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("No auth credentials found"))
            .mount(&server)
            .await;

        // No API key configured: the request is still made and rejected remotely
        let summarizer = OpenRouterSummarizer::new(config_for(&server, None));
        let err = summarizer.summarize("anything").await.unwrap_err();
        match err {
            DigestError::Summarization(reason) => {
                assert!(reason.contains("401"));
                assert!(reason.contains("No auth credentials found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_summarize_without_choices_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let summarizer = OpenRouterSummarizer::new(config_for(&server, Some("k")));
        let err = summarizer.summarize("x").await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn test_summarize_transport_error() {
        let config = SummarizerConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            model: "m".to_string(),
            api_key: None,
            site_url: DEFAULT_SITE_URL.to_string(),
            site_name: DEFAULT_SITE_NAME.to_string(),
        };
        let err = OpenRouterSummarizer::new(config)
            .summarize("x")
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::Summarization(_)));
    }

    #[test]
    #[serial]
    fn test_config_from_settings_reads_env() {
        let settings = SummarizerSettings {
            api_key_env: "DIGEST_TEST_KEY".to_string(),
            site_url_env: "DIGEST_TEST_SITE_URL".to_string(),
            site_name_env: "DIGEST_TEST_SITE_NAME".to_string(),
            ..SummarizerSettings::default()
        };

        env::set_var("DIGEST_TEST_KEY", "sk-env");
        env::set_var("DIGEST_TEST_SITE_URL", "https://mine.example");
        env::remove_var("DIGEST_TEST_SITE_NAME");

        let config = SummarizerConfig::from_settings(&settings);
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.site_url, "https://mine.example");
        assert_eq!(config.site_name, DEFAULT_SITE_NAME);
        assert_eq!(config.model, "perplexity/r1-1776");

        env::remove_var("DIGEST_TEST_KEY");
        env::remove_var("DIGEST_TEST_SITE_URL");
    }

    #[test]
    #[serial]
    fn test_config_from_settings_missing_key_is_none() {
        let settings = SummarizerSettings {
            api_key_env: "DIGEST_TEST_ABSENT_KEY".to_string(),
            ..SummarizerSettings::default()
        };
        env::remove_var("DIGEST_TEST_ABSENT_KEY");

        let config = SummarizerConfig::from_settings(&settings);
        assert!(config.api_key.is_none());
        assert_eq!(
            config.completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }
}
