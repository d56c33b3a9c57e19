//! Credential store: persisted OAuth2 token, refresh, and Gmail hub setup
//!
//! Interactive authorization is not performed here. The token file is
//! produced once by an external setup step; this module only loads it,
//! refreshes it when expired, and writes it back.

use chrono::{DateTime, Duration, Utc};
use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{DigestError, Result};

/// Gmail API scopes needed for a digest run
///
/// - gmail.modify: list and read messages
/// - gmail.send: send the digest
pub const REQUIRED_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.send",
];

/// Current on-disk token format
pub const CREDENTIAL_FORMAT_VERSION: u32 = 1;

/// Tokens this close to expiry are treated as expired
const EXPIRY_SKEW_SECS: i64 = 60;

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Persisted OAuth2 credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub version: u32,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredCredential {
    /// A token without a recorded expiry is assumed to be usable
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(EXPIRY_SKEW_SECS) > now,
            None => true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

/// State of the token file, read without any network access
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    Missing,
    Valid { expires_at: Option<DateTime<Utc>> },
    Expired { refreshable: bool },
    Unreadable(String),
}

/// Loads, refreshes and persists the OAuth2 credential for one run
pub struct CredentialStore {
    token_path: PathBuf,
    client_secret_path: PathBuf,
}

impl CredentialStore {
    /// # Arguments
    /// * `token_path` - Path of the persisted token JSON
    /// * `client_secret_path` - Path to the OAuth2 client secret (`credentials.json`),
    ///   read only when a refresh is needed
    pub fn new(token_path: impl Into<PathBuf>, client_secret_path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: token_path.into(),
            client_secret_path: client_secret_path.into(),
        }
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Return a valid credential, refreshing and re-persisting it if expired
    pub async fn acquire(&self) -> Result<StoredCredential> {
        let credential = self.load().await?.ok_or_else(|| {
            DigestError::MissingCredential(self.token_path.display().to_string())
        })?;

        if credential.is_valid() {
            debug!("Stored credential is valid");
            return Ok(credential);
        }

        if !credential.can_refresh() {
            return Err(DigestError::CredentialRefresh(
                "stored token is expired and has no refresh token".to_string(),
            ));
        }

        info!("Stored credential expired, refreshing");
        let refreshed = self.refresh(&credential).await?;
        self.save(&refreshed).await.map_err(|e| {
            DigestError::CredentialRefresh(format!("failed to persist refreshed token: {}", e))
        })?;
        Ok(refreshed)
    }

    /// Read the token file; `None` when it does not exist
    pub async fn load(&self) -> Result<Option<StoredCredential>> {
        let content = match tokio::fs::read_to_string(&self.token_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DigestError::IoError(e)),
        };

        let credential: StoredCredential = serde_json::from_str(&content).map_err(|e| {
            DigestError::CredentialRefresh(format!(
                "token file {} is not a valid credential: {}",
                self.token_path.display(),
                e
            ))
        })?;

        if credential.version != CREDENTIAL_FORMAT_VERSION {
            return Err(DigestError::CredentialRefresh(format!(
                "unsupported token file version {} (expected {})",
                credential.version, CREDENTIAL_FORMAT_VERSION
            )));
        }

        Ok(Some(credential))
    }

    /// Exchange the refresh token for a new access token
    ///
    /// A refresh token rotated by the endpoint replaces the stored one;
    /// otherwise the existing refresh token is kept.
    pub async fn refresh(&self, credential: &StoredCredential) -> Result<StoredCredential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| DigestError::CredentialRefresh("no refresh token".to_string()))?;

        let secret = yup_oauth2::read_application_secret(&self.client_secret_path)
            .await
            .map_err(|e| {
                DigestError::CredentialRefresh(format!(
                    "failed to read client secret {}: {}",
                    self.client_secret_path.display(),
                    e
                ))
            })?;

        let invalid_url = |e: oauth2::url::ParseError| {
            DigestError::CredentialRefresh(format!("invalid OAuth URL in client secret: {}", e))
        };
        let oauth_client = BasicClient::new(
            ClientId::new(secret.client_id),
            Some(ClientSecret::new(secret.client_secret)),
            AuthUrl::new(secret.auth_uri).map_err(invalid_url)?,
            Some(TokenUrl::new(secret.token_uri).map_err(invalid_url)?),
        );

        let token = oauth_client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(response) => DigestError::CredentialRefresh(
                    format!("token endpoint rejected the refresh: {}", response),
                ),
                other => DigestError::CredentialRefresh(format!("token request failed: {}", other)),
            })?;

        let scopes = token
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.as_str().to_string()).collect())
            .unwrap_or_else(|| credential.scopes.clone());

        Ok(StoredCredential {
            version: CREDENTIAL_FORMAT_VERSION,
            access_token: token.access_token().secret().to_string(),
            refresh_token: token
                .refresh_token()
                .map(|r| r.secret().to_string())
                .or_else(|| credential.refresh_token.clone()),
            expires_at: token
                .expires_in()
                .and_then(|d| Duration::from_std(d).ok())
                .map(|d| Utc::now() + d),
            scopes,
        })
    }

    /// Write the credential atomically, readable by the owner only
    pub async fn save(&self, credential: &StoredCredential) -> Result<()> {
        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(credential)?;
        let tmp_path = self.token_path.with_extension("tmp");
        tokio::fs::write(&tmp_path, content).await?;
        secure_token_file(&tmp_path).await?;
        tokio::fs::rename(&tmp_path, &self.token_path).await?;

        debug!("Persisted credential to {:?}", self.token_path);
        Ok(())
    }

    /// Inspect the token file without refreshing it
    pub async fn status(&self) -> CredentialStatus {
        match self.load().await {
            Ok(None) => CredentialStatus::Missing,
            Ok(Some(credential)) if credential.is_valid() => CredentialStatus::Valid {
                expires_at: credential.expires_at,
            },
            Ok(Some(credential)) => CredentialStatus::Expired {
                refreshable: credential.can_refresh(),
            },
            Err(e) => CredentialStatus::Unreadable(e.to_string()),
        }
    }
}

/// Initialize the Gmail API hub for an already-valid credential
///
/// The access token is handed to the hub as a static token: a run is short
/// enough that it never outlives the token acquired at start.
pub fn initialize_gmail_hub(credential: &StoredCredential) -> Result<GmailHub> {
    // Use HTTP/1 for compatibility (HTTP/2 is default but HTTP/1 works better with google-gmail1)
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| DigestError::ConfigError(format!("Failed to load TLS roots: {}", e)))?
        .https_or_http()
        .enable_http1()
        .build();

    Ok(hub_with_connector(connector, credential))
}

pub(crate) fn hub_with_connector(
    connector: hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    credential: &StoredCredential,
) -> GmailHub {
    let client =
        hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
            .build(connector);
    Gmail::new(client, credential.access_token.clone())
}

/// Secure token file permissions on Unix systems
///
/// Sets file permissions to 0600 (read/write for owner only)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows uses ACLs instead of Unix permissions
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
