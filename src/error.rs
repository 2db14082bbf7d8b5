//! Unified application error model.
//! One enum covers every failure this crate reports: configuration, auth,
//! profile lookup, identifier verification, and remote mutations. Each variant
//! carries a stable `code` (the message key a UI shell feeds its translation
//! table) and a human-readable message.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Durable backend unset or placeholder; the system runs guest-only.
    Configuration { code: String, message: String },
    /// Sign-in/sign-up rejected by the identity provider.
    Auth { code: String, message: String },
    /// Profile row lookup failed; sign-in proceeds with a degraded role.
    ProfileLookup { code: String, message: String },
    /// Identifier failed the format gate; no network call was made.
    FormatInvalid { code: String, message: String },
    /// Directory lookup returned not-found semantics.
    NotFound { code: String, message: String },
    /// Any other non-success response from a remote collaborator.
    Remote { code: String, message: String },
    /// Role/profile mutation rejected; surfaced verbatim, never retried.
    Mutation { code: String, message: String },
    /// Transport or decode failure that must not escape as a panic.
    Unexpected { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Configuration { code, .. }
            | AppError::Auth { code, .. }
            | AppError::ProfileLookup { code, .. }
            | AppError::FormatInvalid { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Remote { code, .. }
            | AppError::Mutation { code, .. }
            | AppError::Unexpected { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Configuration { message, .. }
            | AppError::Auth { message, .. }
            | AppError::ProfileLookup { message, .. }
            | AppError::FormatInvalid { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Remote { message, .. }
            | AppError::Mutation { message, .. }
            | AppError::Unexpected { message, .. } => message.as_str(),
        }
    }

    pub fn configuration(code: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::Configuration { code: code.into(), message: msg.into() }
    }
    pub fn auth(code: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::Auth { code: code.into(), message: msg.into() }
    }
    pub fn profile_lookup(code: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::ProfileLookup { code: code.into(), message: msg.into() }
    }
    pub fn format_invalid(code: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::FormatInvalid { code: code.into(), message: msg.into() }
    }
    pub fn not_found(code: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::NotFound { code: code.into(), message: msg.into() }
    }
    pub fn remote(code: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::Remote { code: code.into(), message: msg.into() }
    }
    pub fn mutation(code: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::Mutation { code: code.into(), message: msg.into() }
    }
    pub fn unexpected(code: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::Unexpected { code: code.into(), message: msg.into() }
    }

    /// Default configuration error used wherever a disabled backend rejects a call.
    pub fn backend_not_configured() -> Self {
        AppError::configuration(
            "backend_not_configured",
            "Durable backend is not configured; running in guest-only mode.",
        )
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Unexpected { code: "transport_error".into(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_messages_round_trip() {
        let e = AppError::auth("signin_invalid_credentials", "bad credentials");
        assert_eq!(e.code_str(), "signin_invalid_credentials");
        assert_eq!(e.message(), "bad credentials");
        assert_eq!(e.to_string(), "signin_invalid_credentials: bad credentials");
    }

    #[test]
    fn variants_stay_distinct() {
        let nf = AppError::not_found("orcid_not_found", "missing");
        let rm = AppError::remote("orcid_lookup_failed", "status 500");
        assert_ne!(nf, rm);
        assert!(matches!(nf, AppError::NotFound { .. }));
        assert!(matches!(rm, AppError::Remote { .. }));
    }

    #[test]
    fn serde_tagging_uses_snake_case() {
        let e = AppError::format_invalid("orcid_format_invalid", "Invalid ORCID iD format.");
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["type"], "format_invalid");
        assert_eq!(v["code"], "orcid_format_invalid");
    }
}
