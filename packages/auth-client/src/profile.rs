//! Profile enrichment from the application datastore
//!
//! Lookups are fail-soft: a signed-in user whose profile row cannot be read
//! stays authenticated with an empty profile instead of being bounced, so a
//! datastore blip never signs anyone out. Callers cannot distinguish "no row"
//! from "store down" and must not try.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use crate::types::{UserRole, UserStatus};

/// Profile columns kept for each provider subject in the `users` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub role: Option<UserRole>,
    pub organization_id: Option<Uuid>,
    /// Empty when the row grants no property access
    #[serde(default)]
    #[sqlx(default)]
    pub property_access: Vec<Uuid>,
    pub status: Option<UserStatus>,
    pub full_name: Option<String>,
}

impl Profile {
    /// Find the profile row for a provider subject id
    pub async fn find_by_user_id(user_id: Uuid, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Profile>(
            "SELECT role, organization_id, \
                    COALESCE(property_access, ARRAY[]::uuid[]) AS property_access, \
                    status, full_name \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}

/// Source of profile enrichment for the reconciliation engine
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch enrichment for `user_id`. Never fails; any lookup problem
    /// degrades to the empty profile.
    async fn fetch_profile(&self, user_id: Uuid) -> Profile;
}

/// Profile source backed by the application's Postgres database
pub struct PostgresProfiles {
    pool: PgPool,
}

impl PostgresProfiles {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileSource for PostgresProfiles {
    async fn fetch_profile(&self, user_id: Uuid) -> Profile {
        match Profile::find_by_user_id(user_id, &self.pool).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!("No profile row for user {}", user_id);
                Profile::default()
            }
            Err(e) => {
                error!("Failed to fetch profile for user {}: {}", user_id, e);
                Profile::default()
            }
        }
    }
}
