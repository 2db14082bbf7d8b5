//! Role-management workflow against a scripted backend double: direct role
//! changes, the reserved-identifier elevation, and its partial-failure path.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use atelier::admin::{change_role, fetch_profiles, save_profile_orcid, ProfileSaveOutcome};
use atelier::backend::{AuthSession, Backend, SignUpOutcome};
use atelier::error::{AppError, AppResult};
use atelier::identity::{Profile, ProfileRole};
use atelier::orcid::reserved_admin_orcid;

#[derive(Default)]
struct DirectoryState {
    profiles: Vec<Profile>,
    calls: Vec<String>,
    fail_role_mutation: bool,
    fail_profile_mutation: bool,
}

#[derive(Default)]
struct FakeDirectory {
    state: Mutex<DirectoryState>,
}

impl FakeDirectory {
    fn with_profiles(profiles: Vec<Profile>) -> Arc<Self> {
        Arc::new(FakeDirectory {
            state: Mutex::new(DirectoryState { profiles, ..Default::default() }),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }
}

fn profile(id: &str, role: ProfileRole) -> Profile {
    Profile {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        full_name: format!("User {}", id),
        picture: String::new(),
        role,
        orcid: None,
    }
}

#[async_trait]
impl Backend for FakeDirectory {
    fn enabled(&self) -> bool {
        true
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> AppResult<AuthSession> {
        Err(AppError::unexpected("unused", "not part of this suite"))
    }

    async fn sign_up(&self, _full_name: &str, _email: &str, _password: &str)
        -> AppResult<SignUpOutcome>
    {
        Err(AppError::unexpected("unused", "not part of this suite"))
    }

    async fn sign_out(&self) -> AppResult<()> {
        Ok(())
    }

    async fn fetch_role(&self, _user_id: &str) -> AppResult<Option<ProfileRole>> {
        Ok(None)
    }

    async fn fetch_profiles(&self) -> AppResult<Vec<Profile>> {
        Ok(self.state.lock().profiles.clone())
    }

    async fn set_user_role(&self, target_user_id: &str, new_role: ProfileRole) -> AppResult<()> {
        let mut st = self.state.lock();
        st.calls.push(format!("set_user_role:{}:{}", target_user_id, new_role.as_str()));
        if st.fail_role_mutation {
            return Err(AppError::mutation("mutation_failed", "permission denied for set-user-role"));
        }
        for p in st.profiles.iter_mut() {
            if p.id == target_user_id {
                p.role = new_role;
            }
        }
        Ok(())
    }

    async fn update_profile_orcid(&self, target_user_id: &str, orcid: &str) -> AppResult<()> {
        let mut st = self.state.lock();
        st.calls.push(format!("update_profile_orcid:{}:{}", target_user_id, orcid));
        if st.fail_profile_mutation {
            return Err(AppError::mutation("mutation_failed", "row-level policy rejected update"));
        }
        for p in st.profiles.iter_mut() {
            if p.id == target_user_id {
                p.orcid = Some(orcid.to_string());
            }
        }
        Ok(())
    }

    fn oauth_authorize_url(&self, _provider: &str, _redirect_to: &str) -> AppResult<String> {
        Ok(String::new())
    }
}

#[tokio::test]
async fn promote_mutates_then_refetch_shows_new_role() {
    let dir = FakeDirectory::with_profiles(vec![profile("U1", ProfileRole::User)]);

    change_role(dir.as_ref(), "U1", ProfileRole::Admin).await.unwrap();
    assert_eq!(dir.calls(), vec!["set_user_role:U1:admin"]);

    // No optimistic update: consistency comes from re-reading the source of truth.
    let refreshed = fetch_profiles(dir.as_ref()).await.unwrap();
    assert_eq!(refreshed[0].role, ProfileRole::Admin);
}

#[tokio::test]
async fn demote_sends_user_role() {
    let dir = FakeDirectory::with_profiles(vec![profile("U2", ProfileRole::Admin)]);
    change_role(dir.as_ref(), "U2", ProfileRole::User).await.unwrap();
    assert_eq!(dir.calls(), vec!["set_user_role:U2:user"]);
    assert_eq!(fetch_profiles(dir.as_ref()).await.unwrap()[0].role, ProfileRole::User);
}

#[tokio::test]
async fn role_mutation_failure_is_surfaced_verbatim() {
    let dir = FakeDirectory::with_profiles(vec![profile("U1", ProfileRole::User)]);
    dir.state.lock().fail_role_mutation = true;

    let err = change_role(dir.as_ref(), "U1", ProfileRole::Admin).await.unwrap_err();
    assert!(matches!(err, AppError::Mutation { .. }));
    assert_eq!(err.message(), "permission denied for set-user-role");
}

#[tokio::test]
async fn plain_orcid_saves_without_elevation() {
    let dir = FakeDirectory::with_profiles(vec![profile("U1", ProfileRole::User)]);

    let outcome = save_profile_orcid(dir.as_ref(), "U1", "0000-0001-2345-6789").await.unwrap();
    assert_eq!(outcome.message_key(), "update_success");
    assert!(matches!(outcome, ProfileSaveOutcome::Saved));
    // Only the profile mutation ran.
    assert_eq!(dir.calls(), vec!["update_profile_orcid:U1:0000-0001-2345-6789"]);
    assert_eq!(
        fetch_profiles(dir.as_ref()).await.unwrap()[0].orcid.as_deref(),
        Some("0000-0001-2345-6789")
    );
}

#[tokio::test]
async fn reserved_orcid_triggers_elevation() {
    let dir = FakeDirectory::with_profiles(vec![profile("U1", ProfileRole::User)]);
    let reserved = reserved_admin_orcid();

    let outcome = save_profile_orcid(dir.as_ref(), "U1", &reserved).await.unwrap();
    assert_eq!(outcome.message_key(), "update_success_role_granted");
    assert!(matches!(outcome, ProfileSaveOutcome::SavedAndElevated));
    assert_eq!(
        dir.calls(),
        vec![
            format!("update_profile_orcid:U1:{}", reserved),
            "set_user_role:U1:admin".to_string()
        ]
    );
    assert_eq!(fetch_profiles(dir.as_ref()).await.unwrap()[0].role, ProfileRole::Admin);
}

#[tokio::test]
async fn elevation_failure_is_partial_not_rolled_back() {
    let dir = FakeDirectory::with_profiles(vec![profile("U1", ProfileRole::User)]);
    dir.state.lock().fail_role_mutation = true;
    let reserved = reserved_admin_orcid();

    let outcome = save_profile_orcid(dir.as_ref(), "U1", &reserved).await.unwrap();
    let ProfileSaveOutcome::SavedRoleGrantFailed { error } = outcome else {
        panic!("expected a partial-failure outcome");
    };
    assert!(matches!(error, AppError::Mutation { .. }));

    // The profile update stands: no compensating transaction.
    let refreshed = fetch_profiles(dir.as_ref()).await.unwrap();
    assert_eq!(refreshed[0].orcid.as_deref(), Some(reserved.as_str()));
    assert_eq!(refreshed[0].role, ProfileRole::User);
}

#[tokio::test]
async fn profile_mutation_failure_skips_elevation_entirely() {
    let dir = FakeDirectory::with_profiles(vec![profile("U1", ProfileRole::User)]);
    dir.state.lock().fail_profile_mutation = true;
    let reserved = reserved_admin_orcid();

    let err = save_profile_orcid(dir.as_ref(), "U1", &reserved).await.unwrap_err();
    assert!(matches!(err, AppError::Mutation { .. }));
    assert_eq!(dir.calls().len(), 1, "the role mutation must not run");
}
