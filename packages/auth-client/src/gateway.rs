//! Call surface over the identity provider
//!
//! `AuthGateway` is the seam the reconciliation engine depends on.
//! `GoTrueGateway` is the real implementation: it wraps the HTTP client,
//! caches the current session the way the provider's browser SDK does, and
//! emits session change events from its own successful calls (the provider
//! has no server push; sign-in, sign-out and refresh all originate here).

use async_trait::async_trait;
use chrono::Utc;
use gotrue::{GoTrueClient, Session, User};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// Kind of session change announced by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    /// Anything else the provider may announce; carried but never acted on
    Other,
}

#[derive(Debug, Clone)]
pub struct AuthChangeEvent {
    pub change: AuthChange,
    pub session: Option<Session>,
}

/// Opaque provider-side failure. Callers surface it; nothing in this crate
/// branches on its contents.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Provider(#[from] gotrue::Error),

    #[error("no active session")]
    NoSession,
}

/// Sign-in providers the login page offers. Phone sign-in goes through the
/// OTP endpoints rather than an authorize redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Phone,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Phone => "phone",
        }
    }
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Build the redirect URL that starts an OAuth sign-in. The session
    /// arrives later through the provider callback, not from this call.
    fn begin_oauth(&self, provider: OAuthProvider) -> String;

    async fn send_otp(&self, phone: &str) -> Result<(), GatewayError>;

    async fn verify_otp(&self, phone: &str, code: &str) -> Result<Session, GatewayError>;

    async fn sign_out(&self) -> Result<(), GatewayError>;

    /// Current session, refreshed first if it is past expiry
    async fn get_session(&self) -> Result<Option<Session>, GatewayError>;

    async fn get_user(&self) -> Result<Option<User>, GatewayError>;

    async fn refresh_session(&self) -> Result<Session, GatewayError>;

    /// Subscribe to session change events. Every call returns an independent
    /// receiver; events are broadcast to all of them.
    fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent>;
}

/// Gateway over a GoTrue-compatible auth API
pub struct GoTrueGateway {
    client: GoTrueClient,
    session: RwLock<Option<Session>>,
    oauth_redirect_url: Option<String>,
    events: broadcast::Sender<AuthChangeEvent>,
}

impl GoTrueGateway {
    pub fn new(client: GoTrueClient) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            client,
            session: RwLock::new(None),
            oauth_redirect_url: None,
            events,
        }
    }

    /// Set the URL the OAuth flow redirects back to after provider sign-in
    pub fn with_oauth_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_redirect_url = Some(url.into());
        self
    }

    /// Seed the session cache, e.g. with a session restored from storage
    pub async fn restore_session(&self, session: Session) {
        *self.session.write().await = Some(session);
    }

    fn emit(&self, change: AuthChange, session: Option<Session>) {
        // send fails only while no receiver is subscribed
        let _ = self.events.send(AuthChangeEvent { change, session });
    }
}

fn is_expired(session: &Session) -> bool {
    session
        .expires_at
        .map(|at| at <= Utc::now().timestamp())
        .unwrap_or(false)
}

#[async_trait]
impl AuthGateway for GoTrueGateway {
    fn begin_oauth(&self, provider: OAuthProvider) -> String {
        self.client
            .authorize_url(provider.as_str(), self.oauth_redirect_url.as_deref())
    }

    async fn send_otp(&self, phone: &str) -> Result<(), GatewayError> {
        debug!("Sending OTP to {}", phone);
        Ok(self.client.send_otp(phone).await?)
    }

    async fn verify_otp(&self, phone: &str, code: &str) -> Result<Session, GatewayError> {
        let session = self.client.verify_otp(phone, code).await?;
        info!("OTP verified for user {}", session.user.id);

        *self.session.write().await = Some(session.clone());
        self.emit(AuthChange::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let current = self.session.read().await.clone();
        if let Some(session) = current {
            self.client.sign_out(&session.access_token).await?;
        }

        *self.session.write().await = None;
        self.emit(AuthChange::SignedOut, None);
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, GatewayError> {
        let cached = self.session.read().await.clone();
        match cached {
            None => Ok(None),
            Some(session) if !is_expired(&session) => Ok(Some(session)),
            // Past expiry: a refresh either revives the session or surfaces
            // the provider's rejection
            Some(_) => self.refresh_session().await.map(Some),
        }
    }

    async fn get_user(&self) -> Result<Option<User>, GatewayError> {
        let current = self.session.read().await.clone();
        match current {
            Some(session) => Ok(Some(self.client.get_user(&session.access_token).await?)),
            None => Ok(None),
        }
    }

    async fn refresh_session(&self) -> Result<Session, GatewayError> {
        let current = self.session.read().await.clone();
        let refresh_token = match current {
            Some(session) => session.refresh_token,
            None => return Err(GatewayError::NoSession),
        };

        let session = self.client.refresh_session(&refresh_token).await?;
        debug!("Session refreshed for user {}", session.user.id);

        *self.session.write().await = Some(session.clone());
        self.emit(AuthChange::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn session_expiring_at(expires_at: Option<i64>) -> Session {
        Session {
            access_token: "access".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at,
            refresh_token: "refresh".to_string(),
            user: gotrue::User {
                id: Uuid::new_v4(),
                aud: "authenticated".to_string(),
                email: None,
                phone: Some("919876543210".to_string()),
                created_at: Utc::now(),
                updated_at: None,
            },
        }
    }

    #[test]
    fn test_provider_names_match_the_auth_api() {
        assert_eq!(OAuthProvider::Google.as_str(), "google");
        assert_eq!(OAuthProvider::Phone.as_str(), "phone");
    }

    #[test]
    fn test_expiry_check() {
        let future = (Utc::now() + Duration::hours(1)).timestamp();
        let past = (Utc::now() - Duration::hours(1)).timestamp();

        assert!(!is_expired(&session_expiring_at(Some(future))));
        assert!(is_expired(&session_expiring_at(Some(past))));
        // Providers that omit expires_at get the benefit of the doubt
        assert!(!is_expired(&session_expiring_at(None)));
    }

    #[tokio::test]
    async fn test_get_session_returns_cached_unexpired_session() {
        let gateway = GoTrueGateway::new(GoTrueClient::new(gotrue::GoTrueOptions {
            base_url: "http://localhost:9999/auth/v1".to_string(),
            api_key: "test".to_string(),
        }));

        assert!(gateway.get_session().await.unwrap().is_none());

        let session = session_expiring_at(Some((Utc::now() + Duration::hours(1)).timestamp()));
        gateway.restore_session(session.clone()).await;
        assert_eq!(gateway.get_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_refresh_without_session_is_an_error() {
        let gateway = GoTrueGateway::new(GoTrueClient::new(gotrue::GoTrueOptions {
            base_url: "http://localhost:9999/auth/v1".to_string(),
            api_key: "test".to_string(),
        }));

        assert!(matches!(
            gateway.refresh_session().await,
            Err(GatewayError::NoSession)
        ));
    }
}
