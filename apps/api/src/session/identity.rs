//! Identity provider boundary. The core only ever sees a `SessionUser`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl SessionUser {
    /// Display name, falling back to email, then uid.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Credentials rejected: {0}")]
    Rejected(String),

    #[error("Identity provider unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Identity provider error (status {status}): {message}")]
    Provider { status: u16, message: String },
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected(code) => AppError::Auth(rejection_message(&code).to_string()),
            other => AppError::Configuration(other.to_string()),
        }
    }
}

fn rejection_message(code: &str) -> &'static str {
    match code {
        "USER_DISABLED" => "This account has been disabled.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Please try again later.",
        "INVALID_EMAIL" => "Please enter a valid email address.",
        _ => "Invalid email or password.",
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, IdentityError>;

    async fn sign_out(&self, user: &SessionUser) -> Result<(), IdentityError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Firebase Identity Toolkit
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Email/password sign-in against the Identity Toolkit REST API.
/// Tokens issued by the provider are not kept; only the user's identity is.
#[derive(Clone)]
pub struct FirebaseIdentity {
    client: Client,
    api_key: String,
    api_base: String,
}

impl FirebaseIdentity {
    pub fn new(api_key: String, api_base: String) -> Result<Self, IdentityError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn sign_in_endpoint(&self) -> String {
        format!("{}/accounts:signInWithPassword", self.api_base)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, IdentityError> {
        let response = self
            .client
            .post(self.sign_in_endpoint())
            .query(&[("key", &self.api_key)])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            // 400 carries credential problems; anything else is a provider/setup issue.
            if status.as_u16() == 400 {
                let code = message.split(':').next().unwrap_or("").trim().to_string();
                debug!("Sign-in rejected: {code}");
                return Err(IdentityError::Rejected(code));
            }
            warn!("Identity provider returned {}: {}", status, message);
            return Err(IdentityError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: SignInResponse = serde_json::from_str(&text).map_err(|e| {
            IdentityError::Provider {
                status: status.as_u16(),
                message: format!("unexpected sign-in response: {e}"),
            }
        })?;

        Ok(SessionUser {
            uid: body.local_id,
            email: body.email,
            display_name: body.display_name,
        })
    }

    async fn sign_out(&self, user: &SessionUser) -> Result<(), IdentityError> {
        // ID tokens are stateless; dropping our session is the whole sign-out.
        debug!(uid = %user.uid, "Identity sign-out");
        Ok(())
    }
}
