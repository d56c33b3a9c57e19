//! Mail client: list recent messages, fetch plain-text bodies, send the digest

use async_trait::async_trait;
use google_gmail1::api::Message;
use std::io::Cursor;
use tracing::{debug, info};

use crate::auth::GmailHub;
use crate::error::{describe_api_error, DigestError, Result};
use crate::message::{build_plain_text, extract_plain_text};
use crate::models::MessageRef;

/// Scope attached to read calls
const MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Scope attached to the send call
const SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// Gmail search query matching messages received within the last `hours`
pub fn recent_query(hours: u32) -> String {
    format!("newer_than:{}h", hours)
}

/// Trait defining mail operations for easier testing
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Identifiers of messages received within the last `window_hours`
    async fn list_recent(&self, window_hours: u32) -> Result<Vec<MessageRef>>;

    /// Decoded plain-text body of one message (possibly empty)
    async fn fetch_body(&self, message_ref: &MessageRef) -> Result<String>;

    /// Send a plain-text message
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Gmail-backed mail client
///
/// Only the first page of list results is read.
pub struct GmailMailClient {
    hub: GmailHub,
    sender: Option<String>,
}

impl GmailMailClient {
    /// # Arguments
    /// * `hub` - Authenticated Gmail API hub
    /// * `sender` - From address; looked up from the account profile when `None`
    pub fn new(hub: GmailHub, sender: Option<String>) -> Self {
        Self { hub, sender }
    }

    async fn resolve_sender(&self) -> Result<String> {
        if let Some(sender) = &self.sender {
            return Ok(sender.clone());
        }

        let (_, profile) = self
            .hub
            .users()
            .get_profile("me")
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await
            .map_err(|e| {
                DigestError::MailSend(format!(
                    "Failed to look up account address: {}",
                    describe_api_error(&e)
                ))
            })?;

        profile
            .email_address
            .ok_or_else(|| DigestError::MailSend("Account profile has no email address".to_string()))
    }
}

#[async_trait]
impl MailClient for GmailMailClient {
    async fn list_recent(&self, window_hours: u32) -> Result<Vec<MessageRef>> {
        let query = recent_query(window_hours);
        debug!("Listing messages with query {:?}", query);

        let (_, response) = self
            .hub
            .users()
            .messages_list("me")
            .q(&query)
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await
            .map_err(|e| DigestError::MailList(describe_api_error(&e)))?;

        let refs: Vec<MessageRef> = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| msg.id)
            .map(MessageRef)
            .collect();

        if response.next_page_token.is_some() {
            debug!("More results available beyond the first page; ignoring them");
        }

        info!("Found {} messages in the last {} hours", refs.len(), window_hours);
        Ok(refs)
    }

    async fn fetch_body(&self, message_ref: &MessageRef) -> Result<String> {
        let (_, message) = self
            .hub
            .users()
            .messages_get("me", message_ref.as_str())
            .format("raw")
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await
            .map_err(|e| DigestError::MailFetch {
                id: message_ref.to_string(),
                reason: describe_api_error(&e),
            })?;

        let raw = message.raw.ok_or_else(|| DigestError::MailFetch {
            id: message_ref.to_string(),
            reason: "response has no raw payload".to_string(),
        })?;

        let body = extract_plain_text(&raw);
        debug!(
            "Fetched message {} ({} raw bytes, {} text chars)",
            message_ref,
            raw.len(),
            body.chars().count()
        );
        Ok(body)
    }

    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let sender = self.resolve_sender().await?;
        let raw = build_plain_text(&sender, recipient, subject, body)?;
        let mime_type: mime::Mime = "message/rfc822"
            .parse()
            .map_err(|e| DigestError::MailSend(format!("Invalid upload type: {}", e)))?;

        let (_, sent) = self
            .hub
            .users()
            .messages_send(Message::default(), "me")
            .add_scope(SEND_SCOPE)
            .upload(Cursor::new(raw), mime_type)
            .await
            .map_err(|e| DigestError::MailSend(describe_api_error(&e)))?;

        info!(
            "Sent digest to {} (message id {})",
            recipient,
            sent.id.as_deref().unwrap_or("unknown")
        );
        Ok(())
    }
}
