use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::identity::{Profile, ProfileRole};

use super::{AuthSession, Backend, SignUpOutcome};

/// Stand-in used when the backend endpoint or key is unset: every sign-in
/// method and mutation reports the configuration gap, so the application
/// degrades to the guest-only path without call sites branching on
/// configuration. Sign-out still succeeds — local state clearing never
/// depends on a reachable backend.
pub struct DisabledBackend;

#[async_trait]
impl Backend for DisabledBackend {
    fn enabled(&self) -> bool {
        false
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> AppResult<AuthSession> {
        Err(AppError::backend_not_configured())
    }

    async fn sign_up(&self, _full_name: &str, _email: &str, _password: &str)
        -> AppResult<SignUpOutcome>
    {
        Err(AppError::backend_not_configured())
    }

    async fn sign_out(&self) -> AppResult<()> {
        Ok(())
    }

    async fn fetch_role(&self, _user_id: &str) -> AppResult<Option<ProfileRole>> {
        Err(AppError::backend_not_configured())
    }

    async fn fetch_profiles(&self) -> AppResult<Vec<Profile>> {
        Err(AppError::backend_not_configured())
    }

    async fn set_user_role(&self, _target_user_id: &str, _new_role: ProfileRole) -> AppResult<()> {
        Err(AppError::backend_not_configured())
    }

    async fn update_profile_orcid(&self, _target_user_id: &str, _orcid: &str) -> AppResult<()> {
        Err(AppError::backend_not_configured())
    }

    fn oauth_authorize_url(&self, _provider: &str, _redirect_to: &str) -> AppResult<String> {
        Err(AppError::backend_not_configured())
    }
}
