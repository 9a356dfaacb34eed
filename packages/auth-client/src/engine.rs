//! Session reconciliation engine
//!
//! Owns the canonical "who is signed in right now" state: bootstraps it from
//! the provider's current session, keeps it in sync with provider session
//! change events by re-running profile enrichment, and exposes direct
//! mutation entry points for flows that already hold a merged identity.
//!
//! The engine is the only writer of the state. Events are applied one at a
//! time in arrival order; an event's enrichment completes before the next
//! event is read off the subscription.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use gotrue::{GoTrueClient, GoTrueOptions, Session};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::gateway::{
    AuthChange, AuthChangeEvent, AuthGateway, GatewayError, GoTrueGateway, OAuthProvider,
};
use crate::profile::{PostgresProfiles, ProfileSource};
use crate::store::AuthStore;
use crate::types::{AuthState, AuthUser, UserRole, UserStatus};

pub struct AuthEngine {
    gateway: Arc<dyn AuthGateway>,
    profiles: Arc<dyn ProfileSource>,
    state: Arc<watch::Sender<AuthState>>,
    listener_started: AtomicBool,
}

/// Enrich a session into the authenticated resting state
async fn merged_state(profiles: &dyn ProfileSource, session: Session) -> AuthState {
    let profile = profiles.fetch_profile(session.user.id).await;
    let user = AuthUser::from_parts(session.user.clone(), profile);
    AuthState::authenticated(user, session)
}

/// Apply one provider session change.
///
/// Sign-in and token refresh re-run enrichment and replace the state in one
/// atomic update; sign-out clears it; anything else is ignored.
async fn apply_change(
    profiles: &dyn ProfileSource,
    state: &watch::Sender<AuthState>,
    event: AuthChangeEvent,
) {
    match (event.change, event.session) {
        (change @ (AuthChange::SignedIn | AuthChange::TokenRefreshed), Some(session)) => {
            debug!("Auth state changed ({:?}) for user {}", change, session.user.id);
            let next = merged_state(profiles, session).await;
            state.send_replace(next);
        }
        (AuthChange::SignedOut, _) => {
            debug!("Auth state changed (SignedOut)");
            state.send_replace(AuthState::anonymous());
        }
        _ => {}
    }
}

impl AuthEngine {
    pub fn new(gateway: Arc<dyn AuthGateway>, profiles: Arc<dyn ProfileSource>) -> Self {
        let (state, _) = watch::channel(AuthState::loading());
        Self {
            gateway,
            profiles,
            state: Arc::new(state),
            listener_started: AtomicBool::new(false),
        }
    }

    /// Wire a ready-to-use engine from configuration: provider client,
    /// session gateway and Postgres profile source, bootstrapped and with
    /// the event listener attached.
    pub async fn connect(config: &Config) -> Result<Arc<Self>> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        let client = GoTrueClient::new(GoTrueOptions {
            base_url: config.auth_url.clone(),
            api_key: config.auth_api_key.clone(),
        });
        let mut gateway = GoTrueGateway::new(client);
        if let Some(url) = &config.oauth_redirect_url {
            gateway = gateway.with_oauth_redirect_url(url.as_str());
        }

        let engine = Arc::new(Self::new(
            Arc::new(gateway),
            Arc::new(PostgresProfiles::new(pool)),
        ));
        engine.initialize().await;
        engine.ensure_listener();
        Ok(engine)
    }

    /// Bootstrap the auth state from the provider's current session.
    ///
    /// Always lands in a terminal resting state: a failed session query is
    /// logged and forced into the anonymous form, so `initialized` ends up
    /// true no matter what and the UI never hangs on `loading`.
    pub async fn initialize(&self) {
        self.state.send_modify(|state| state.loading = true);

        let next = match self.gateway.get_session().await {
            Ok(Some(session)) => merged_state(self.profiles.as_ref(), session).await,
            Ok(None) => AuthState::anonymous(),
            Err(e) => {
                error!("Failed to initialize auth state: {}", e);
                AuthState::anonymous()
            }
        };

        self.state.send_replace(next);
    }

    /// Subscribe to provider session change events, exactly once per engine.
    ///
    /// Repeat calls are silent no-ops; a flag on the engine instance guards
    /// the subscription so independent engines never share listener state.
    pub fn ensure_listener(&self) {
        if self.listener_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut events = self.gateway.subscribe();
        let profiles = Arc::clone(&self.profiles);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => apply_change(profiles.as_ref(), &state, event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Auth listener lagged, dropped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Apply a provider session change directly, outside the listener
    pub async fn apply_event(&self, event: AuthChangeEvent) {
        apply_change(self.profiles.as_ref(), &self.state, event).await;
    }

    /// Install a freshly merged identity, bypassing enrichment
    pub fn set_auth(&self, user: AuthUser, session: Session) {
        self.state
            .send_replace(AuthState::authenticated(user, session));
    }

    /// Drop to the anonymous resting state
    pub fn clear_auth(&self) {
        self.state.send_replace(AuthState::anonymous());
    }

    // ------------------------------------------------------------------
    // Sign-in flows
    // ------------------------------------------------------------------

    /// Start a Google OAuth sign-in; returns the URL to redirect the user
    /// to. The session arrives later through the provider callback and the
    /// signed-in event.
    pub fn sign_in_with_google(&self) -> String {
        self.gateway.begin_oauth(OAuthProvider::Google)
    }

    /// Ask the provider to deliver an OTP. Provider rejections come back
    /// unchanged for the caller to render.
    pub async fn send_phone_otp(&self, phone: &str) -> Result<(), GatewayError> {
        self.gateway.send_otp(phone).await
    }

    /// Verify a phone OTP and install the resulting identity.
    ///
    /// The gateway also announces the sign-in, so an attached listener will
    /// re-enrich to the same state; publishing here keeps callers that never
    /// started the listener correct too.
    pub async fn verify_phone_otp(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<Session, GatewayError> {
        let session = self.gateway.verify_otp(phone, code).await?;
        let next = merged_state(self.profiles.as_ref(), session.clone()).await;
        self.state.send_replace(next);
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<(), GatewayError> {
        self.gateway.sign_out().await?;
        self.clear_auth();
        Ok(())
    }

    // ------------------------------------------------------------------
    // State access
    // ------------------------------------------------------------------

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Raw watch subscription for hosts that project the state themselves
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Read-only reactive handle for the UI layer
    pub fn store(&self) -> AuthStore {
        AuthStore::new(self.state.subscribe())
    }

    // Derived predicates: pure reads of the current snapshot. These never
    // fetch and never mutate.

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn user_role(&self) -> Option<UserRole> {
        self.state.borrow().user_role()
    }

    pub fn user_status(&self) -> Option<UserStatus> {
        self.state.borrow().user_status()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().is_active()
    }

    pub fn is_inhouse_user(&self) -> bool {
        self.state.borrow().is_inhouse_user()
    }

    pub fn is_farmhouse_user(&self) -> bool {
        self.state.borrow().is_farmhouse_user()
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    pub fn is_super_admin(&self) -> bool {
        self.state.borrow().is_super_admin()
    }
}
