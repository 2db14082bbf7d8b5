use super::user::{Role, User};

/// The authorization gate. Every admin-only control consults this predicate;
/// no view or workflow duplicates the role comparison inline.
pub fn is_admin(user: Option<&User>) -> bool {
    matches!(user, Some(u) if u.role == Role::Admin)
}
