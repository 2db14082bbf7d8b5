//! Durable-backend handle, selected once at startup.
//! Call sites depend on the `Backend` trait and never branch on configuration:
//! a concrete remote client or a well-defined disabled variant implements the
//! same interface.

mod disabled;
mod remote;

pub use disabled::DisabledBackend;
pub use remote::RemoteBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::identity::{Profile, ProfileRole};

/// Metadata the identity provider attaches to a session's user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Subject of an identity-provider session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: SessionMetadata,
}

/// An identity-provider session as delivered on every auth-state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: SessionUser,
}

/// Result of a sign-up attempt: the provider either issues a session right
/// away or withholds it until the email address is confirmed.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationRequired,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// False for the disabled variant; used only for startup reporting.
    fn enabled(&self) -> bool;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<AuthSession>;

    async fn sign_up(&self, full_name: &str, email: &str, password: &str)
        -> AppResult<SignUpOutcome>;

    /// Server-side session invalidation. Local state clearing never depends on
    /// this succeeding.
    async fn sign_out(&self) -> AppResult<()>;

    /// Durable role for a session subject id. `Ok(None)` means no profile row.
    async fn fetch_role(&self, user_id: &str) -> AppResult<Option<ProfileRole>>;

    /// Full profile listing for the admin screen.
    async fn fetch_profiles(&self) -> AppResult<Vec<Profile>>;

    /// Remote procedure mutating a target profile's role.
    async fn set_user_role(&self, target_user_id: &str, new_role: ProfileRole) -> AppResult<()>;

    /// Remote procedure persisting an ORCID identifier on a target profile.
    async fn update_profile_orcid(&self, target_user_id: &str, orcid: &str) -> AppResult<()>;

    /// Hosted OAuth authorize URL for browser shells; no network involved.
    fn oauth_authorize_url(&self, provider: &str, redirect_to: &str) -> AppResult<String>;
}
