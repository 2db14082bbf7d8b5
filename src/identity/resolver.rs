use std::sync::Arc;

use crate::backend::{AuthSession, Backend, SignUpOutcome};
use crate::error::AppResult;

use super::cache::LocalCache;
use super::session::SessionStore;
use super::user::{avatar_url, ProfileRole, Role, User};

/// Turns identity-provider sessions (or their absence) into the single
/// application-level `User` value held by the [`SessionStore`], and owns the
/// local guest path.
///
/// Every transition goes through a store ticket, so a resolution whose profile
/// lookup finishes after a newer event has applied is discarded.
pub struct SessionResolver {
    backend: Arc<dyn Backend>,
    cache: LocalCache,
    store: Arc<SessionStore>,
}

impl SessionResolver {
    pub fn new(backend: Arc<dyn Backend>, cache: LocalCache, store: Arc<SessionStore>) -> Self {
        SessionResolver { backend, cache, store }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Cold-start seeding from the local cache, before any session event has
    /// arrived. A cached provider user wins over a guest marker; the first
    /// real session event supersedes whatever this restores.
    pub fn bootstrap(&self) {
        let ticket = self.store.begin_event();
        if let Some(cached) = self.cache.load_user() {
            self.store.apply(ticket, Some(cached));
        } else if let Some(guest) = self.cache.load_guest() {
            self.store.apply(ticket, Some(guest));
        } else {
            self.store.apply(ticket, None);
        }
    }

    /// Handle one session event from the identity provider. Fired at least
    /// once at startup and on every sign-in, sign-out and token refresh.
    pub async fn on_session_event(&self, session: Option<AuthSession>) {
        let ticket = self.store.begin_event();
        match session {
            Some(session) => {
                let user = self.derive_user(&session).await;
                if self.store.apply(ticket, Some(user.clone())) {
                    if let Err(e) = self.cache.store_user(&user) {
                        tracing::warn!("failed to cache resolved user: {}", e);
                    }
                    // A provider identity always wins over a stale guest marker.
                    self.cache.clear_guest();
                }
            }
            None => {
                if let Some(guest) = self.cache.load_guest() {
                    self.store.apply(ticket, Some(guest));
                } else if self.store.apply(ticket, None) {
                    self.cache.clear_user();
                }
            }
        }
    }

    /// Profile lookup failure never blocks sign-in; the role degrades to
    /// `user` until the next resolution.
    async fn derive_user(&self, session: &AuthSession) -> User {
        let role = match self.backend.fetch_role(&session.user.id).await {
            Ok(Some(ProfileRole::Admin)) => Role::Admin,
            Ok(_) => Role::User,
            Err(e) => {
                tracing::warn!("profile lookup failed for {}: {}", session.user.id, e);
                Role::User
            }
        };
        let meta = &session.user.user_metadata;
        let name = meta
            .full_name
            .clone()
            .or_else(|| meta.name.clone())
            .unwrap_or_else(|| "User".to_string());
        let seed = meta
            .name
            .clone()
            .or_else(|| meta.full_name.clone())
            .unwrap_or_else(|| "User".to_string());
        let picture = meta.picture.clone().unwrap_or_else(|| avatar_url(&seed));
        User {
            id: session.user.id.clone(),
            name,
            email: session.user.email.clone().unwrap_or_default(),
            picture,
            role,
        }
    }

    /// Local-only guest login: fixed-shape user, persisted marker, no network.
    pub fn login_as_guest(&self) -> User {
        let ticket = self.store.begin_event();
        let guest = User::guest();
        if let Err(e) = self.cache.store_guest(&guest) {
            tracing::warn!("failed to persist guest marker: {}", e);
        }
        self.store.apply(ticket, Some(guest.clone()));
        guest
    }

    /// Clear the guest marker and cached user, resolve to absent, then request
    /// server-side invalidation. Invalidation failure is logged, not surfaced;
    /// local clearing always succeeds.
    pub async fn logout(&self) {
        let ticket = self.store.begin_event();
        self.cache.clear_guest();
        self.cache.clear_user();
        self.store.apply(ticket, None);
        if let Err(e) = self.backend.sign_out().await {
            tracing::warn!("server-side sign-out failed: {}", e);
        }
    }

    /// Password sign-in, feeding the issued session straight into resolution.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<()> {
        let session = self.backend.sign_in_with_password(email, password).await?;
        self.on_session_event(Some(session)).await;
        Ok(())
    }

    /// Sign-up; when the provider issues a session immediately it is resolved,
    /// otherwise the caller reports that confirmation is pending.
    pub async fn sign_up(&self, full_name: &str, email: &str, password: &str)
        -> AppResult<SignUpOutcome>
    {
        let outcome = self.backend.sign_up(full_name, email, password).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.on_session_event(Some(session.clone())).await;
        }
        Ok(outcome)
    }
}
