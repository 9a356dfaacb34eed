// Thin client for a GoTrue-compatible auth API (Supabase-style).
// Covers only the endpoints the booking platform uses: phone OTP sign-in,
// OAuth redirect URLs, session refresh, sign-out and user lookup.

pub mod models;

use reqwest::{Client, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub use crate::models::{ApiError, Session, User};
pub use reqwest::StatusCode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request to auth provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("auth provider rejected the request ({status}): {body}")]
    Provider { status: StatusCode, body: ApiError },
}

#[derive(Debug, Clone)]
pub struct GoTrueOptions {
    /// Base URL of the auth API, e.g. `https://project.supabase.co/auth/v1`
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct GoTrueClient {
    options: GoTrueOptions,
    http: Client,
}

impl GoTrueClient {
    pub fn new(options: GoTrueOptions) -> Self {
        Self {
            options,
            http: Client::new(),
        }
    }

    /// Build the OAuth redirect URL for an external provider.
    ///
    /// No network call happens here; the browser is sent to this URL and the
    /// provider redirects back with a session.
    pub fn authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> String {
        let mut url = format!("{}/authorize?provider={}", self.options.base_url, provider);
        if let Some(redirect_to) = redirect_to {
            url.push_str("&redirect_to=");
            url.push_str(&urlencoding::encode(redirect_to));
        }
        url
    }

    /// Request an OTP to be delivered to `phone` over SMS
    pub async fn send_otp(&self, phone: &str) -> Result<(), Error> {
        let url = format!("{}/otp", self.options.base_url);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.options.api_key)
            .json(&json!({ "phone": phone, "channel": "sms" }))
            .send()
            .await?;

        self.check(response).await.map(|_| ())
    }

    /// Verify an OTP and exchange it for a session
    pub async fn verify_otp(&self, phone: &str, token: &str) -> Result<Session, Error> {
        let url = format!("{}/verify", self.options.base_url);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.options.api_key)
            .json(&json!({ "phone": phone, "token": token, "type": "sms" }))
            .send()
            .await?;

        Ok(self.check(response).await?.json::<Session>().await?)
    }

    /// Revoke the session behind `access_token`
    pub async fn sign_out(&self, access_token: &str) -> Result<(), Error> {
        let url = format!("{}/logout", self.options.base_url);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.options.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        self.check(response).await.map(|_| ())
    }

    /// Fetch the user record behind `access_token`
    pub async fn get_user(&self, access_token: &str) -> Result<User, Error> {
        let url = format!("{}/user", self.options.base_url);
        let response = self
            .http
            .get(url)
            .header("apikey", &self.options.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        Ok(self.check(response).await?.json::<User>().await?)
    }

    /// Exchange a refresh token for a fresh session
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, Error> {
        let url = format!(
            "{}/token?grant_type=refresh_token",
            self.options.base_url
        );
        let response = self
            .http
            .post(url)
            .header("apikey", &self.options.api_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        Ok(self.check(response).await?.json::<Session>().await?)
    }

    /// Map non-2xx responses into `Error::Provider`, decoding the error body
    async fn check(&self, response: Response) -> Result<Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<ApiError>().await.unwrap_or_default();
        error!("Auth provider error ({}): {}", status, body);
        Err(Error::Provider { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoTrueClient {
        GoTrueClient::new(GoTrueOptions {
            base_url: "https://project.supabase.co/auth/v1".to_string(),
            api_key: "anon-key".to_string(),
        })
    }

    #[test]
    fn test_authorize_url_without_redirect() {
        let url = client().authorize_url("google", None);
        assert_eq!(
            url,
            "https://project.supabase.co/auth/v1/authorize?provider=google"
        );
    }

    #[test]
    fn test_authorize_url_encodes_redirect() {
        let url = client().authorize_url("google", Some("https://app.example.com/auth/callback"));
        assert_eq!(
            url,
            "https://project.supabase.co/auth/v1/authorize?provider=google\
             &redirect_to=https%3A%2F%2Fapp.example.com%2Fauth%2Fcallback"
        );
    }
}
