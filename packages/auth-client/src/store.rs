//! Read-only reactive projection of the engine state
//!
//! `AuthStore` is a thin wrapper over a `watch::Receiver`: every engine
//! mutation is visible to `get()` before the mutating call returns, and
//! `changed()` wakes subscribers on each update. Hosts that want a different
//! reactive primitive can build their own projection from
//! `AuthEngine::subscribe` the same way; no reconciliation logic lives here.

use gotrue::Session;
use tokio::sync::watch;

use crate::types::{AuthState, AuthUser, UserRole, UserStatus};

#[derive(Debug, Clone)]
pub struct AuthStore {
    state: watch::Receiver<AuthState>,
}

impl AuthStore {
    pub(crate) fn new(state: watch::Receiver<AuthState>) -> Self {
        Self { state }
    }

    /// Current state snapshot
    pub fn get(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Wait for the engine to publish a new state. Errors only when the
    /// engine has been dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.state.changed().await
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.state.borrow().user.clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn initialized(&self) -> bool {
        self.state.borrow().initialized
    }

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
