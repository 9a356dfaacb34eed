//! Auth domain data types
//!
//! `AuthUser` is the canonical merged identity: the provider-level user
//! record joined with the profile row the application keeps for it.

use chrono::{DateTime, Utc};
use gotrue::{Session, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::Profile;

/// Application roles, mirroring the `user_role` enum in Postgres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    InhouseAdmin,
    InhouseManager,
    InhouseViewer,
    FarmhouseOwner,
    FarmhouseAdmin,
    FarmhouseStaff,
}

impl UserRole {
    /// Roles allowed into the admin surface. Closed set, extend deliberately.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            UserRole::SuperAdmin | UserRole::InhouseAdmin | UserRole::FarmhouseAdmin
        )
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, UserRole::SuperAdmin)
    }

    /// Staff of the in-house booking organization
    pub fn is_inhouse(&self) -> bool {
        matches!(
            self,
            UserRole::InhouseAdmin | UserRole::InhouseManager | UserRole::InhouseViewer
        )
    }

    /// Users attached to a farmhouse partner organization
    pub fn is_farmhouse(&self) -> bool {
        matches!(
            self,
            UserRole::FarmhouseOwner | UserRole::FarmhouseAdmin | UserRole::FarmhouseStaff
        )
    }
}

/// Account lifecycle status, mirroring the `user_status` enum in Postgres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
pub enum UserStatus {
    Pending,
    Active,
    Inactive,
}

/// Provider identity merged with its application profile.
///
/// Profile fields are optional: a user whose profile row is missing or
/// unreadable is authenticated but carries no role, so every authorization
/// check on them answers false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub aud: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub role: Option<UserRole>,
    pub organization_id: Option<Uuid>,
    /// Empty when the profile grants no property access
    #[serde(default)]
    pub property_access: Vec<Uuid>,
    pub status: Option<UserStatus>,
    pub full_name: Option<String>,
}

impl AuthUser {
    /// Merge a provider user with its profile enrichment
    pub fn from_parts(user: User, profile: Profile) -> Self {
        Self {
            id: user.id,
            aud: user.aud,
            email: user.email,
            phone: user.phone,
            created_at: user.created_at,
            updated_at: user.updated_at,
            role: profile.role,
            organization_id: profile.organization_id,
            property_access: profile.property_access,
            status: profile.status,
            full_name: profile.full_name,
        }
    }
}

/// The reconciled auth state.
///
/// Invariant: `user` and `session` are set or cleared together; a resting
/// state never holds one without the other. `initialized` flips to true when
/// the first bootstrap completes and never reverts.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
    pub loading: bool,
    pub initialized: bool,
}

impl AuthState {
    /// Initial state while the first bootstrap is in flight
    pub fn loading() -> Self {
        Self {
            user: None,
            session: None,
            loading: true,
            initialized: false,
        }
    }

    /// Terminal resting state with nobody signed in
    pub fn anonymous() -> Self {
        Self {
            user: None,
            session: None,
            loading: false,
            initialized: true,
        }
    }

    /// Terminal resting state for a signed-in user
    pub fn authenticated(user: AuthUser, session: Session) -> Self {
        Self {
            user: Some(user),
            session: Some(session),
            loading: false,
            initialized: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.session.is_some()
    }

    pub fn user_role(&self) -> Option<UserRole> {
        self.user.as_ref().and_then(|user| user.role)
    }

    pub fn user_status(&self) -> Option<UserStatus> {
        self.user.as_ref().and_then(|user| user.status)
    }

    pub fn is_pending(&self) -> bool {
        self.user_status() == Some(UserStatus::Pending)
    }

    pub fn is_active(&self) -> bool {
        self.user_status() == Some(UserStatus::Active)
    }

    pub fn is_inhouse_user(&self) -> bool {
        self.user_role().map(|role| role.is_inhouse()).unwrap_or(false)
    }

    pub fn is_farmhouse_user(&self) -> bool {
        self.user_role().map(|role| role.is_farmhouse()).unwrap_or(false)
    }

    pub fn is_admin(&self) -> bool {
        self.user_role().map(|role| role.is_admin()).unwrap_or(false)
    }

    pub fn is_super_admin(&self) -> bool {
        self.user_role().map(|role| role.is_super_admin()).unwrap_or(false)
    }
}
