//! # Auth Provider Client
//!
//! GoTrue-style auth provider integration: bearer-token user lookup,
//! code/OTP exchange for magic-link sign-in, logout, and the dev-only admin
//! magic-link generator.
//!
//! The provider owns all session state; this client is a pass-through. A
//! rejected token is `Ok(None)` from [`AuthProvider::user_from_token`], not
//! an error, so gated routes can answer 401 without special-casing.

use crate::infrastructure::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Authenticated user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    /// Stable user id.
    pub id: String,
    /// Primary email, when known.
    #[serde(default)]
    pub email: Option<String>,
}

/// Session tokens issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthSession {
    /// Access token for API calls.
    pub access_token: String,
    /// Refresh token, when issued.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Admin-generated magic link material.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct MagicLink {
    /// Full provider-hosted action link.
    #[serde(default)]
    pub action_link: Option<String>,
    /// Token hash for a local callback link.
    #[serde(default)]
    pub hashed_token: Option<String>,
}

/// Port to the auth provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves the user behind an access token.
    ///
    /// Returns `Ok(None)` when the provider rejects the token; `Err` only
    /// on infrastructure failure.
    ///
    /// # Errors
    ///
    /// Returns a remote error on transport or decoding failure.
    async fn user_from_token(&self, access_token: &str) -> RemoteResult<Option<AuthUser>>;

    /// Exchanges a one-time sign-in code for a session.
    ///
    /// # Errors
    ///
    /// Returns a remote error when the provider rejects the code or the
    /// call fails.
    async fn exchange_code(&self, code: &str) -> RemoteResult<AuthSession>;

    /// Verifies an OTP token hash (magic link, recovery, invite...).
    ///
    /// # Errors
    ///
    /// Returns a remote error when the provider rejects the token or the
    /// call fails.
    async fn verify_otp(&self, token_hash: &str, otp_type: &str) -> RemoteResult<AuthSession>;

    /// Revokes a session upstream.
    ///
    /// # Errors
    ///
    /// Returns a remote error on transport failure; callers absorb it.
    async fn sign_out(&self, access_token: &str) -> RemoteResult<()>;

    /// Generates a magic link for an email (admin surface, dev only).
    ///
    /// # Errors
    ///
    /// Returns a remote error when the admin call fails.
    async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> RemoteResult<MagicLink>;
}

/// GoTrue-backed auth client.
#[derive(Debug, Clone)]
pub struct GoTrueAuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl GoTrueAuthClient {
    /// Creates the client for a provider base URL.
    ///
    /// The anon key authenticates regular calls, the service-role key the
    /// admin surface.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Configuration`] when the client cannot be
    /// built.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        service_role_key: impl Into<String>,
    ) -> RemoteResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::configuration(format!("failed to build client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            service_role_key: service_role_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    async fn session_from(&self, response: reqwest::Response) -> RemoteResult<AuthSession> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }
        response
            .json::<AuthSession>()
            .await
            .map_err(|e| RemoteError::protocol(format!("failed to decode session: {e}")))
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuthClient {
    async fn user_from_token(&self, access_token: &str) -> RemoteResult<Option<AuthUser>> {
        let response = self
            .http
            .get(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }
        let user = response
            .json::<AuthUser>()
            .await
            .map_err(|e| RemoteError::protocol(format!("failed to decode user: {e}")))?;
        Ok(Some(user))
    }

    async fn exchange_code(&self, code: &str) -> RemoteResult<AuthSession> {
        let response = self
            .http
            .post(self.url("token?grant_type=pkce"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "auth_code": code }))
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;
        self.session_from(response).await
    }

    async fn verify_otp(&self, token_hash: &str, otp_type: &str) -> RemoteResult<AuthSession> {
        let response = self
            .http
            .post(self.url("verify"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "type": otp_type, "token_hash": token_hash }))
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;
        self.session_from(response).await
    }

    async fn sign_out(&self, access_token: &str) -> RemoteResult<()> {
        let response = self
            .http
            .post(self.url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }
        Ok(())
    }

    async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> RemoteResult<MagicLink> {
        let response = self
            .http
            .post(self.url("admin/generate_link"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({
                "type": "magiclink",
                "email": email,
                "options": { "redirect_to": redirect_to },
            }))
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }
        response
            .json::<MagicLink>()
            .await
            .map_err(|e| RemoteError::protocol(format!("failed to decode link: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GoTrueAuthClient {
        GoTrueAuthClient::new(server.uri(), "anon-key", "service-key").unwrap()
    }

    #[tokio::test]
    async fn user_lookup_sends_anon_key_and_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "u1", "email": "a@b.test"})),
            )
            .mount(&server)
            .await;

        let user = client(&server).user_from_token("tok-1").await.unwrap();
        assert_eq!(
            user,
            Some(AuthUser {
                id: "u1".to_string(),
                email: Some("a@b.test".to_string())
            })
        );
    }

    #[tokio::test]
    async fn rejected_token_is_none_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let user = client(&server).user_from_token("bad").await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn verify_otp_posts_type_and_token_hash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/verify"))
            .and(body_json(json!({"type": "magiclink", "token_hash": "hash-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at-1", "refresh_token": "rt-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = client(&server).verify_otp("hash-1", "magiclink").await.unwrap();
        assert_eq!(session.access_token, "at-1");
        assert_eq!(session.refresh_token.as_deref(), Some("rt-1"));
    }

    #[tokio::test]
    async fn magic_link_uses_the_service_role_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/generate_link"))
            .and(header("apikey", "service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "action_link": "https://auth.test/link",
                "hashed_token": "hash-1"
            })))
            .mount(&server)
            .await;

        let link = client(&server)
            .generate_magic_link("a@b.test", "https://app.test/auth/callback")
            .await
            .unwrap();
        assert_eq!(link.hashed_token.as_deref(), Some("hash-1"));
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/verify"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client(&server).verify_otp("hash-1", "magiclink").await;
        assert!(result.is_err());
    }
}
