//! Hosted Supabase backend: PostgREST rows + GoTrue sessions over HTTPS

pub mod auth;
pub mod filters;
pub mod rest;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

use crate::config::BackendConfig;
use crate::infrastructure::session::SessionStore;
use crate::shared::{AdminError, AdminResult, RemoteError};

pub use auth::SupabaseAuth;
pub use rest::SupabaseRest;

/// HTTP plumbing shared by both adapters.
pub struct Connection {
    http: Client,
    base: Url,
    anon_key: String,
    sessions: Arc<SessionStore>,
}

impl Connection {
    pub fn new(config: &BackendConfig) -> AdminResult<Self> {
        let mut base = Url::parse(&config.url)
            .map_err(|e| AdminError::Config(format!("backend.url: {}", e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        if config.anon_key.is_empty() {
            return Err(AdminError::Config("backend.anon_key is not set".into()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| AdminError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            anon_key: config.anon_key.clone(),
            sessions: Arc::new(SessionStore::new()),
        })
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// `<base>/<path>`; `path` has no leading slash.
    fn endpoint(&self, path: &str) -> AdminResult<Url> {
        self.base
            .join(path)
            .map_err(|e| AdminError::Config(format!("bad endpoint {}: {}", path, e)))
    }

    /// Request carrying `apikey` and a bearer: the session token when
    /// signed in, otherwise the anon key.
    async fn request(&self, method: reqwest::Method, path: &str) -> AdminResult<RequestBuilder> {
        let bearer = self
            .sessions
            .access_token()
            .await
            .unwrap_or_else(|| self.anon_key.clone());
        self.build(method, path, &bearer)
    }

    /// Request carrying only the anon key.
    fn anonymous(&self, method: reqwest::Method, path: &str) -> AdminResult<RequestBuilder> {
        self.build(method, path, &self.anon_key)
    }

    fn build(&self, method: reqwest::Method, path: &str, bearer: &str) -> AdminResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer))
    }
}

/// Both adapters over one connection.
pub struct SupabaseBackend {
    pub rows: Arc<SupabaseRest>,
    pub auth: Arc<SupabaseAuth>,
}

pub fn connect(config: &BackendConfig) -> AdminResult<SupabaseBackend> {
    let connection = Arc::new(Connection::new(config)?);
    Ok(SupabaseBackend {
        rows: Arc::new(SupabaseRest::new(connection.clone())),
        auth: Arc::new(SupabaseAuth::new(connection)),
    })
}

/// Turn a non-2xx response into a [`RemoteError`], keeping the backend's
/// own message.
async fn remote_error(response: Response) -> AdminError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    remote_error_from_body(status.as_u16(), status.canonical_reason(), &body)
}

fn remote_error_from_body(status: u16, reason: Option<&str>, body: &str) -> AdminError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let message = parsed
        .as_ref()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                reason.unwrap_or("Request failed").to_string()
            } else {
                body.trim().to_string()
            }
        });

    let code = parsed.as_ref().and_then(|v| {
        ["error_code", "code"]
            .iter()
            .find_map(|key| v.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    });

    let mut err = RemoteError::new(Some(status), message);
    if let Some(code) = code {
        err = err.with_code(code);
    }
    AdminError::Remote(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgrest_error_keeps_message_and_code() {
        let err = remote_error_from_body(
            409,
            Some("Conflict"),
            r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value violates unique constraint \"users_email_key\""}"#,
        );
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint \"users_email_key\""
        );
        match err {
            AdminError::Remote(remote) => {
                assert_eq!(remote.status, Some(409));
                assert_eq!(remote.code.as_deref(), Some("23505"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn gotrue_error_shapes() {
        let legacy = remote_error_from_body(
            400,
            None,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(legacy.to_string(), "Invalid login credentials");

        let current = remote_error_from_body(
            400,
            None,
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        assert_eq!(current.to_string(), "Invalid login credentials");
    }

    #[test]
    fn empty_body_falls_back_to_reason() {
        let err = remote_error_from_body(503, Some("Service Unavailable"), "");
        assert_eq!(err.to_string(), "Service Unavailable");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn connect_rejects_bad_config() {
        let config = BackendConfig {
            url: "not a url".into(),
            anon_key: "anon".into(),
            timeout_secs: 5,
        };
        assert!(matches!(connect(&config), Err(AdminError::Config(_))));
    }
}
