// Farmstay Bookings - auth client core
//
// Reconciles the identity provider's session state with the locally cached
// user profile and exposes the merged state reactively. The engine in
// `engine` is the single owner of that state; `store` projects it to the UI
// layer, `gateway` talks to the provider, `profile` enriches provider
// identities with application roles, and `phone` gates sign-in form input.

pub mod config;
pub mod engine;
pub mod gateway;
pub mod phone;
pub mod profile;
pub mod store;
pub mod types;

pub use config::Config;
pub use engine::AuthEngine;
pub use gateway::{
    AuthChange, AuthChangeEvent, AuthGateway, GatewayError, GoTrueGateway, OAuthProvider,
};
pub use phone::{is_valid_otp, is_valid_phone_number, normalize_phone_number};
pub use profile::{PostgresProfiles, Profile, ProfileSource};
pub use store::AuthStore;
pub use types::{AuthState, AuthUser, UserRole, UserStatus};
