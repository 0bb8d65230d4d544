//! Local session store and token helpers shared by both backends

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{AuthEvent, AuthUser, Session};
use crate::notifications::{AuthEventBus, AuthEventSubscriber};
use crate::shared::{AdminError, AdminResult};

/// Claims read from a GoTrue access token.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Read the claims without checking the signature; only the auth service
/// can verify its own tokens.
pub fn peek_claims(token: &str) -> AdminResult<AccessClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| AdminError::remote(None, format!("Invalid access token: {}", e)))
}

pub fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Holds at most one session and announces every transition.
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    events: AuthEventBus,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            events: AuthEventBus::new(),
        }
    }

    pub async fn get(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Replace the session and publish `event`.
    pub async fn set(&self, session: Session, event: AuthEvent) {
        debug!(user_id = %session.user.id, event = event.event_type(), "Session stored");
        *self.current.write().await = Some(session);
        self.events.publish(event);
    }

    /// Drop the session; publishes `SignedOut` only if one existed.
    pub async fn clear(&self) {
        let previous = self.current.write().await.take();
        if previous.is_some() {
            self.events.publish(AuthEvent::SignedOut);
        }
    }

    pub fn publish(&self, event: AuthEvent) {
        self.events.publish(event);
    }

    pub fn subscribe(&self) -> AuthEventSubscriber {
        self.events.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a session from raw token fields, filling the user from the claims.
pub fn session_from_tokens(
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    user: Option<AuthUser>,
) -> AdminResult<Session> {
    let claims = peek_claims(&access_token)?;
    let user = user.unwrap_or(AuthUser {
        id: claims.sub,
        email: claims.email,
    });
    Ok(Session {
        access_token,
        refresh_token,
        expires_at: expires_at.or(claims.exp).and_then(timestamp),
        user,
    })
}

/// Session carried by a recovery / magic-link redirect.
pub struct RedirectSession {
    pub session: Session,
    /// `type=recovery`: the holder followed a password reset link.
    pub recovery: bool,
}

impl RedirectSession {
    pub fn parse(redirect_url: &str) -> AdminResult<Self> {
        let params = redirect_params(redirect_url)?;

        if let Some(description) = params.get("error_description") {
            return Err(AdminError::remote(Some(401), description.clone()));
        }
        let access_token = params
            .get("access_token")
            .cloned()
            .ok_or_else(|| AdminError::Validation("Redirect URL carries no session".into()))?;

        let expires_at = params
            .get("expires_at")
            .and_then(|v| v.parse().ok())
            .or_else(|| {
                params
                    .get("expires_in")
                    .and_then(|v| v.parse::<i64>().ok())
                    .map(|secs| Utc::now().timestamp() + secs)
            });
        let session = session_from_tokens(
            access_token,
            params.get("refresh_token").cloned(),
            expires_at,
            None,
        )?;

        Ok(Self {
            session,
            recovery: params.get("type").map(String::as_str) == Some("recovery"),
        })
    }
}

/// Key/value pairs of a redirect URL; fragment entries win over the query.
fn redirect_params(redirect_url: &str) -> AdminResult<HashMap<String, String>> {
    let url = url::Url::parse(redirect_url)
        .map_err(|e| AdminError::Validation(format!("Invalid redirect URL: {}", e)))?;

    let mut params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    if let Some(fragment) = url.fragment() {
        params.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
    }
    Ok(params)
}
