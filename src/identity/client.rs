//! REST client for the hosted identity provider.
//!
//! Every consequential auth operation (password verification, token issuance,
//! verification/reset email dispatch) happens on the provider's side; this
//! client only shapes requests, maps the provider's error codes to typed
//! errors, and never retries an authentication failure.

use crate::error::IdentityError;
use crate::identity::types::{FederatedProvider, Session, User};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct IdentityClient {
    /// Pre-computed `{base}/v1/accounts` prefix (avoids `format!` per request).
    cached_accounts_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl IdentityClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            cached_accounts_url: format!("{base}/v1/accounts"),
            api_key: api_key
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(ToOwned::to_owned),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn from_config(config: &crate::config::IdentityConfig) -> Self {
        Self::new(&config.base_url, config.api_key.as_deref())
    }

    pub async fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let response: AuthResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(session_from_auth(response))
    }

    pub async fn register_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let response: AuthResponse = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(session_from_auth(response))
    }

    pub async fn update_profile(
        &self,
        id_token: &str,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .call(
                "update",
                &UpdateProfileRequest {
                    id_token,
                    display_name,
                    return_secure_token: false,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn send_email_verification(&self, id_token: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "VERIFY_EMAIL",
                    id_token: Some(id_token),
                    email: None,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "PASSWORD_RESET",
                    id_token: None,
                    email: Some(email),
                },
            )
            .await?;
        Ok(())
    }

    /// Federated sign-in with an assertion (OAuth ID token) obtained
    /// out-of-band. Any provider-side rejection maps to
    /// [`IdentityError::Provider`].
    pub async fn sign_in_with_provider(
        &self,
        provider: FederatedProvider,
        assertion: &str,
    ) -> Result<Session, IdentityError> {
        let request = IdpRequest {
            post_body: format!(
                "id_token={assertion}&providerId={}",
                provider.provider_id()
            ),
            request_uri: "http://localhost",
            return_secure_token: true,
        };

        let response: AuthResponse =
            self.call("signInWithIdp", &request)
                .await
                .map_err(|err| match err {
                    IdentityError::Api { code, message } => {
                        IdentityError::Provider(format!("{code}: {message}"))
                    }
                    IdentityError::InvalidCredential => {
                        IdentityError::Provider("assertion rejected".into())
                    }
                    other => other,
                })?;
        Ok(session_from_auth(response))
    }

    /// Refresh the profile snapshot for the signed-in account.
    pub async fn lookup(&self, id_token: &str) -> Result<User, IdentityError> {
        let response: LookupResponse = self.call("lookup", &LookupRequest { id_token }).await?;
        let user = response
            .users
            .into_iter()
            .next()
            .ok_or(IdentityError::NotSignedIn)?;

        Ok(User {
            uid: user.local_id,
            email: user.email.unwrap_or_default(),
            display_name: user.display_name,
            email_verified: user.email_verified,
        })
    }

    async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, IdentityError>
    where
        Req: Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let api_key = self.api_key.as_deref().ok_or(IdentityError::MissingApiKey)?;
        let url = format!("{}:{operation}", self.cached_accounts_url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await
            .map_err(|err| IdentityError::Http(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| IdentityError::Http(err.to_string()))?;

        if !status.is_success() {
            return Err(map_api_error(&body, status.as_u16()));
        }

        serde_json::from_str(&body)
            .map_err(|err| IdentityError::Http(format!("malformed {operation} response: {err}")))
    }
}

fn session_from_auth(response: AuthResponse) -> Session {
    Session {
        id_token: response.id_token,
        refresh_token: response.refresh_token,
        user: User {
            uid: response.local_id,
            email: response.email.unwrap_or_default(),
            display_name: response.display_name,
            email_verified: response.email_verified,
        },
    }
}

/// Map the provider's error body to a typed error.
///
/// The provider reports codes like `EMAIL_EXISTS` or
/// `WEAK_PASSWORD : Password should be at least 6 characters` — the detail
/// after the separator is kept where it is user-actionable.
fn map_api_error(body: &str, status: u16) -> IdentityError {
    let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) else {
        return IdentityError::Http(format!("HTTP {status}: {body}"));
    };

    let raw = envelope.error.message;
    let (code, detail) = match raw.split_once(" : ") {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (raw.trim(), ""),
    };

    match code {
        "INVALID_EMAIL" => IdentityError::InvalidEmail,
        "INVALID_PASSWORD" => IdentityError::WrongPassword,
        "EMAIL_NOT_FOUND" => IdentityError::UserNotFound,
        "INVALID_LOGIN_CREDENTIALS" => IdentityError::InvalidCredential,
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "WEAK_PASSWORD" => IdentityError::WeakPassword(if detail.is_empty() {
            "choose a longer password".to_string()
        } else {
            detail.to_string()
        }),
        _ => IdentityError::Api {
            code: code.to_string(),
            message: if detail.is_empty() {
                format!("HTTP {status}")
            } else {
                detail.to_string()
            },
        },
    }
}
