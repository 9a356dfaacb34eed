use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the auth API, e.g. `https://project.supabase.co/auth/v1`
    pub auth_url: String,
    pub auth_api_key: String,
    pub database_url: String,
    /// Where OAuth sign-ins redirect back to after the provider step
    pub oauth_redirect_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            auth_url: env::var("SUPABASE_AUTH_URL")
                .context("SUPABASE_AUTH_URL must be set")?,
            auth_api_key: env::var("SUPABASE_ANON_KEY")
                .context("SUPABASE_ANON_KEY must be set")?,
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            oauth_redirect_url: env::var("OAUTH_REDIRECT_URL").ok(),
        })
    }
}
