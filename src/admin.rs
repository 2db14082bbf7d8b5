//! Role-management workflow: direct role changes and profile edits with the
//! reserved-identifier elevation side effect. Admin gating happens at the call
//! site through [`crate::identity::is_admin`]; enforcement proper lives in the
//! durable backend's policy layer.

use crate::backend::Backend;
use crate::error::{AppError, AppResult};
use crate::identity::{Profile, ProfileRole};
use crate::orcid::reserved_admin_orcid;

/// Outcome of a profile edit. The elevation step is non-transactional: a saved
/// profile with a failed role grant is terminal and reported as such, never
/// rolled back or retried.
#[derive(Debug)]
pub enum ProfileSaveOutcome {
    Saved,
    SavedAndElevated,
    SavedRoleGrantFailed { error: AppError },
}

impl ProfileSaveOutcome {
    /// Message key for the UI shell's feedback line.
    pub fn message_key(&self) -> &'static str {
        match self {
            ProfileSaveOutcome::Saved => "update_success",
            ProfileSaveOutcome::SavedAndElevated => "update_success_role_granted",
            ProfileSaveOutcome::SavedRoleGrantFailed { .. } => "update_success_role_fail",
        }
    }
}

/// Profile listing for the management screen. Callers re-fetch through this
/// after any mutation; consistency comes only from re-reading the source of
/// truth.
pub async fn fetch_profiles(backend: &dyn Backend) -> AppResult<Vec<Profile>> {
    backend.fetch_profiles().await
}

/// Promote or demote a target user. On failure the backend's message is
/// surfaced verbatim to the operator; there is no retry and no optimistic
/// local update.
pub async fn change_role(
    backend: &dyn Backend,
    target_user_id: &str,
    new_role: ProfileRole,
) -> AppResult<()> {
    backend.set_user_role(target_user_id, new_role).await?;
    tracing::info!("role change applied target={} role={}", target_user_id, new_role.as_str());
    Ok(())
}

/// Persist an ORCID identifier on a target profile. Submitting the reserved
/// identifier additionally grants the target admin through a second mutation;
/// the two steps are not a transaction.
pub async fn save_profile_orcid(
    backend: &dyn Backend,
    target_user_id: &str,
    orcid: &str,
) -> AppResult<ProfileSaveOutcome> {
    backend.update_profile_orcid(target_user_id, orcid).await?;
    if orcid != reserved_admin_orcid() {
        return Ok(ProfileSaveOutcome::Saved);
    }
    match backend.set_user_role(target_user_id, ProfileRole::Admin).await {
        Ok(()) => Ok(ProfileSaveOutcome::SavedAndElevated),
        Err(error) => {
            tracing::warn!(
                "profile saved but role grant failed target={}: {}",
                target_user_id,
                error
            );
            Ok(ProfileSaveOutcome::SavedRoleGrantFailed { error })
        }
    }
}
