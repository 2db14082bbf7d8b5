use serde::{Deserialize, Serialize};

/// Fixed subject id for the provider-less guest path.
pub const GUEST_USER_ID: &str = "guest_user_01";
pub const GUEST_NAME: &str = "Guest User";
pub const GUEST_EMAIL: &str = "guest@example.com";

const AVATAR_BASE: &str = "https://api.dicebear.com/8.x/initials/svg";

/// Application-level role. `Guest` is never granted by the identity provider;
/// it exists only for the local fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }
}

/// Durable role on the server-of-record profile row. The in-memory
/// `User.role` is a snapshot of this, fetched at session-resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    Admin,
    User,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileRole::Admin => "admin",
            ProfileRole::User => "user",
        }
    }

    /// Clamp an arbitrary role string: `admin` only when exactly `"admin"`.
    pub fn clamp(raw: &str) -> Self {
        if raw == "admin" { ProfileRole::Admin } else { ProfileRole::User }
    }
}

/// The single authoritative user value consumed across the application.
/// Derived on every authentication-state transition, cached locally, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
    pub role: Role,
}

impl User {
    /// Fixed-shape guest user for the local-only login path.
    pub fn guest() -> Self {
        User {
            id: GUEST_USER_ID.to_string(),
            name: GUEST_NAME.to_string(),
            email: GUEST_EMAIL.to_string(),
            picture: avatar_url("Guest"),
            role: Role::Guest,
        }
    }
}

/// Server-of-record profile row as exposed to the admin screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub picture: String,
    pub role: ProfileRole,
    #[serde(default)]
    pub orcid: Option<String>,
}

/// Deterministic avatar-generator URL keyed by display name.
pub fn avatar_url(seed: &str) -> String {
    format!("{}?seed={}", AVATAR_BASE, urlencoding::encode(seed))
}
