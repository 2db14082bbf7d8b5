use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::identity::{Profile, ProfileRole};

use super::{AuthSession, Backend, SignUpOutcome};

/// Client for the hosted Postgres/REST backend (Supabase-compatible surface:
/// GoTrue auth under `/auth/v1`, PostgREST rows and RPC under `/rest/v1`,
/// named functions under `/functions/v1`).
///
/// After a password sign-in the operator's access token is attached to every
/// request in place of the anonymous key; row-level authorization is enforced
/// server-side.
pub struct RemoteBackend {
    base: Url,
    anon_key: String,
    http: reqwest::Client,
    bearer: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct RoleRow {
    role: String,
}

#[derive(Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<super::SessionUser>,
}

#[derive(Deserialize)]
struct FunctionResponse {
    #[serde(default)]
    error: Option<String>,
}

impl RemoteBackend {
    pub fn new(base: &str, anon_key: &str) -> AppResult<Self> {
        let base = Url::parse(base)
            .map_err(|e| AppError::configuration("backend_url_invalid", e.to_string()))?;
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(RemoteBackend { base, anon_key: anon_key.to_string(), http, bearer: RwLock::new(None) })
    }

    fn join(&self, path: &str) -> AppResult<Url> {
        self.base
            .join(path)
            .map_err(|e| AppError::unexpected("invalid_url", e.to_string()))
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).unwrap());
        let token = self.bearer.read().clone().unwrap_or_else(|| self.anon_key.clone());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    async fn invoke_function(&self, name: &str, body: serde_json::Value) -> AppResult<()> {
        let url = self.join(&format!("functions/v1/{}", name))?;
        let resp = self.http.post(url).headers(self.headers()).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::mutation("mutation_failed", remote_message(&text, status)));
        }
        // Functions can report a failure inside a 200 body.
        if let Ok(parsed) = serde_json::from_str::<FunctionResponse>(&text) {
            if let Some(err) = parsed.error {
                return Err(AppError::mutation("mutation_failed", err));
            }
        }
        Ok(())
    }
}

/// Prefer the backend's own message when a response body carries one.
fn remote_message(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<AuthErrorBody>(body) {
        if let Some(m) = parsed.error_description.or(parsed.msg) {
            return m;
        }
    }
    if body.trim().is_empty() {
        format!("backend responded with status {}", status)
    } else {
        body.trim().to_string()
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    fn enabled(&self) -> bool {
        true
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let url = self.join("auth/v1/token?grant_type=password")?;
        let resp = self
            .http
            .post(url)
            .headers(self.headers())
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = remote_message(&text, status);
            if message.to_ascii_lowercase().contains("not confirmed") {
                return Err(AppError::auth("signin_email_not_confirmed", message));
            }
            return Err(AppError::auth("signin_invalid_credentials", message));
        }
        let session: AuthSession = resp.json().await?;
        *self.bearer.write() = Some(session.access_token.clone());
        tracing::info!("signed in subject={}", session.user.id);
        Ok(session)
    }

    async fn sign_up(&self, full_name: &str, email: &str, password: &str)
        -> AppResult<SignUpOutcome>
    {
        let url = self.join("auth/v1/signup")?;
        let resp = self
            .http
            .post(url)
            .headers(self.headers())
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": {"full_name": full_name}
            }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::auth("signup_error", remote_message(&text, status)));
        }
        let body: SignUpResponse = resp.json().await?;
        match (body.access_token, body.user) {
            (Some(access_token), Some(user)) => {
                *self.bearer.write() = Some(access_token.clone());
                Ok(SignUpOutcome::SignedIn(AuthSession { access_token, user }))
            }
            // A user without a session means the address still needs confirming.
            _ => Ok(SignUpOutcome::ConfirmationRequired),
        }
    }

    async fn sign_out(&self) -> AppResult<()> {
        let url = self.join("auth/v1/logout")?;
        let resp = self.http.post(url).headers(self.headers()).send().await?;
        *self.bearer.write() = None;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::auth(
                "signout_failed",
                format!("backend responded with status {}", status),
            ));
        }
        Ok(())
    }

    async fn fetch_role(&self, user_id: &str) -> AppResult<Option<ProfileRole>> {
        let url = self.join(&format!(
            "rest/v1/profiles?id=eq.{}&select=role",
            urlencoding::encode(user_id)
        ))?;
        let resp = self.http.get(url).headers(self.headers()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::profile_lookup(
                "profile_lookup_failed",
                format!("backend responded with status {}", status),
            ));
        }
        let rows: Vec<RoleRow> = resp.json().await?;
        Ok(rows.first().map(|r| ProfileRole::clamp(&r.role)))
    }

    async fn fetch_profiles(&self) -> AppResult<Vec<Profile>> {
        let url = self.join("rest/v1/rpc/get_all_users")?;
        let resp = self
            .http
            .post(url)
            .headers(self.headers())
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::remote("profiles_fetch_failed", remote_message(&text, status)));
        }
        Ok(resp.json().await?)
    }

    async fn set_user_role(&self, target_user_id: &str, new_role: ProfileRole) -> AppResult<()> {
        self.invoke_function(
            "set-user-role",
            serde_json::json!({"targetUserId": target_user_id, "newRole": new_role.as_str()}),
        )
        .await
    }

    async fn update_profile_orcid(&self, target_user_id: &str, orcid: &str) -> AppResult<()> {
        self.invoke_function(
            "update-user-profile",
            serde_json::json!({"targetUserId": target_user_id, "orcid": orcid}),
        )
        .await
    }

    fn oauth_authorize_url(&self, provider: &str, redirect_to: &str) -> AppResult<String> {
        let mut url = self.join("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to);
        Ok(url.to_string())
    }
}
