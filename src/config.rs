//! Deploy-time configuration. The backend endpoint and public key arrive as
//! environment variables; unset or placeholder values select the disabled
//! backend and the application runs in a degraded, guest-only mode.

use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::{Backend, DisabledBackend, RemoteBackend};

pub const BACKEND_URL_ENV: &str = "ATELIER_BACKEND_URL";
pub const BACKEND_KEY_ENV: &str = "ATELIER_BACKEND_KEY";
pub const DATA_DIR_ENV: &str = "ATELIER_DATA_DIR";

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Option<String>,
    pub backend_key: Option<String>,
    pub data_dir: PathBuf,
}

/// Deployment templates ship `YOUR_...` markers; treat those as unset.
fn placeholder(value: &str) -> bool {
    value.trim().is_empty() || value.trim().starts_with("YOUR_")
}

fn env_setting(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !placeholder(&v) => Some(v.trim().to_string()),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Self {
        let backend_url = env_setting(BACKEND_URL_ENV);
        let backend_key = env_setting(BACKEND_KEY_ENV);
        let data_dir = std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("atelier-data"));
        if backend_url.is_none() || backend_key.is_none() {
            tracing::warn!(
                "durable backend is not configured ({} / {}); running in guest-only mode",
                BACKEND_URL_ENV,
                BACKEND_KEY_ENV
            );
        }
        Config { backend_url, backend_key, data_dir }
    }

    /// Select the backend handle once; call sites depend on the trait and
    /// never re-check configuration.
    pub fn backend(&self) -> Arc<dyn Backend> {
        match (&self.backend_url, &self.backend_key) {
            (Some(url), Some(key)) => match RemoteBackend::new(url, key) {
                Ok(remote) => Arc::new(remote),
                Err(e) => {
                    tracing::warn!("backend endpoint rejected ({}); degrading to guest-only", e);
                    Arc::new(DisabledBackend)
                }
            },
            _ => Arc::new(DisabledBackend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_count_as_unset() {
        assert!(placeholder(""));
        assert!(placeholder("   "));
        assert!(placeholder("YOUR_BACKEND_URL"));
        assert!(!placeholder("https://project.supabase.co"));
    }

    #[test]
    fn unconfigured_selects_disabled_backend() {
        let cfg = Config {
            backend_url: None,
            backend_key: None,
            data_dir: PathBuf::from("atelier-data"),
        };
        assert!(!cfg.backend().enabled());
    }

    #[test]
    fn configured_selects_remote_backend() {
        let cfg = Config {
            backend_url: Some("https://project.supabase.co".into()),
            backend_key: Some("anon-key".into()),
            data_dir: PathBuf::from("atelier-data"),
        };
        assert!(cfg.backend().enabled());
    }

    #[test]
    fn invalid_endpoint_degrades_to_disabled() {
        let cfg = Config {
            backend_url: Some("not a url".into()),
            backend_key: Some("anon-key".into()),
            data_dir: PathBuf::from("atelier-data"),
        };
        assert!(!cfg.backend().enabled());
    }
}
