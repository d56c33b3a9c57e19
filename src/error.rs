use thiserror::Error;

/// Type alias for Result with DigestError
pub type Result<T> = std::result::Result<T, DigestError>;

/// Error kinds for a digest run
///
/// None of these are recovered locally: every error aborts the run.
#[derive(Error, Debug)]
pub enum DigestError {
    /// No persisted OAuth token was found
    #[error("No stored credential at {0}; authorize once and store the token before running")]
    MissingCredential(String),

    /// The stored token is expired and could not be refreshed
    #[error("Credential refresh failed: {0}")]
    CredentialRefresh(String),

    /// Listing recent messages failed
    #[error("Failed to list messages: {0}")]
    MailList(String),

    /// Fetching or decoding a message failed
    #[error("Failed to fetch message {id}: {reason}")]
    MailFetch { id: String, reason: String },

    /// Sending the digest failed
    #[error("Failed to send email: {0}")]
    MailSend(String),

    /// The completion service call failed
    #[error("Summarization failed: {0}")]
    Summarization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl DigestError {
    /// Process exit code for this error kind
    pub fn exit_code(&self) -> i32 {
        match self {
            DigestError::MissingCredential(_) => 2,
            DigestError::CredentialRefresh(_) => 3,
            DigestError::MailList(_) => 4,
            DigestError::MailFetch { .. } => 5,
            DigestError::MailSend(_) => 6,
            DigestError::Summarization(_) => 7,
            DigestError::ConfigError(_) => 8,
            DigestError::IoError(_) | DigestError::SerializationError(_) => 1,
        }
    }
}

/// Render a Gmail API error as a short, readable reason
pub fn describe_api_error(error: &google_gmail1::Error) -> String {
    match error {
        // HTTP response with status code (non-success responses)
        google_gmail1::Error::Failure(response) => {
            let status = response.status();
            let reason = status.canonical_reason().unwrap_or("Unknown");
            match status.as_u16() {
                401 => format!("HTTP 401: {} (token rejected)", reason),
                403 => format!("HTTP 403: {} (missing scope or access denied)", reason),
                404 => "HTTP 404: resource not found".to_string(),
                429 => format!("HTTP 429: {} (rate limited)", reason),
                code => format!("HTTP {}: {}", code, reason),
            }
        }
        google_gmail1::Error::BadRequest(err) => format!("Bad request: {}", err),
        google_gmail1::Error::HttpError(err) => format!("Connection error: {}", err),
        google_gmail1::Error::Io(err) => format!("IO error: {}", err),
        other => other.to_string(),
    }
}
