//! GoTrue session adapter

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{remote_error, Connection};
use crate::domain::{AuthEvent, AuthGateway, AuthUser, CreateUserDto, Session};
use crate::infrastructure::session::{session_from_tokens, RedirectSession};
use crate::notifications::AuthEventSubscriber;
use crate::shared::{AdminError, AdminResult};

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<AuthUser>,
}

impl TokenResponse {
    fn into_session(self) -> AdminResult<Session> {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        session_from_tokens(self.access_token, self.refresh_token, expires_at, self.user)
    }
}

pub struct SupabaseAuth {
    connection: Arc<Connection>,
}

impl SupabaseAuth {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> AdminResult<Session> {
        let response = self
            .connection
            .anonymous(Method::POST, "auth/v1/token")?
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        response.json::<TokenResponse>().await?.into_session()
    }

    async fn refresh(&self, refresh_token: &str) -> AdminResult<Session> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }
}

#[async_trait]
impl AuthGateway for SupabaseAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AdminResult<Session> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;

        info!(user_id = %session.user.id, "Signed in");
        self.connection
            .sessions()
            .set(
                session.clone(),
                AuthEvent::SignedIn {
                    user_id: session.user.id.clone(),
                },
            )
            .await;
        Ok(session)
    }

    async fn sign_up(&self, request: &CreateUserDto) -> AdminResult<AuthUser> {
        let response = self
            .connection
            .anonymous(Method::POST, "auth/v1/signup")?
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "data": request.metadata,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        // With auto-confirm the body is a full session, otherwise the bare user.
        let body: Value = response.json().await?;
        let user_value = body.get("user").cloned().unwrap_or(body);
        let user: AuthUser = serde_json::from_value(user_value)?;

        info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    async fn sign_out(&self) -> AdminResult<()> {
        let sessions = self.connection.sessions();
        if sessions.get().await.is_none() {
            return Ok(());
        }

        let response = self
            .connection
            .request(Method::POST, "auth/v1/logout")
            .await?
            .send()
            .await?;

        let status = response.status();
        // A session the server no longer knows is signed out either way
        if !status.is_success() && !matches!(status.as_u16(), 401 | 403 | 404) {
            return Err(remote_error(response).await);
        }

        sessions.clear().await;
        info!("Signed out");
        Ok(())
    }

    async fn session(&self) -> AdminResult<Option<Session>> {
        let sessions = self.connection.sessions();
        let Some(current) = sessions.get().await else {
            return Ok(None);
        };
        if !current.is_expired_at(Utc::now()) {
            return Ok(Some(current));
        }

        let Some(refresh_token) = current.refresh_token.as_deref() else {
            debug!("Session expired without a refresh token");
            sessions.clear().await;
            return Ok(None);
        };

        match self.refresh(refresh_token).await {
            Ok(session) => {
                sessions
                    .set(
                        session.clone(),
                        AuthEvent::TokenRefreshed {
                            user_id: session.user.id.clone(),
                        },
                    )
                    .await;
                Ok(Some(session))
            }
            Err(err) => {
                warn!(error = %err, "Session refresh failed");
                sessions.clear().await;
                Err(err)
            }
        }
    }

    async fn current_user(&self) -> AdminResult<Option<AuthUser>> {
        if self.session().await?.is_none() {
            return Ok(None);
        }

        let response = self
            .connection
            .request(Method::GET, "auth/v1/user")
            .await?
            .send()
            .await?;

        if matches!(response.status().as_u16(), 401 | 403) {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        Ok(Some(response.json().await?))
    }

    async fn update_password(&self, new_password: &str) -> AdminResult<()> {
        let Some(session) = self.session().await? else {
            return Err(AdminError::remote(Some(401), "Auth session missing!"));
        };

        let response = self
            .connection
            .request(Method::PUT, "auth/v1/user")
            .await?
            .json(&json!({ "password": new_password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        info!(user_id = %session.user.id, "Password updated");
        self.connection.sessions().publish(AuthEvent::UserUpdated {
            user_id: session.user.id,
        });
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AdminResult<()> {
        let response = self
            .connection
            .anonymous(Method::POST, "auth/v1/recover")?
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        info!(email, "Password recovery email requested");
        Ok(())
    }

    async fn restore_from_redirect(&self, redirect_url: &str) -> AdminResult<Session> {
        let RedirectSession {
            session,
            recovery,
        } = RedirectSession::parse(redirect_url)?;

        let user_id = session.user.id.clone();
        let event = if recovery {
            AuthEvent::PasswordRecovery { user_id }
        } else {
            AuthEvent::SignedIn { user_id }
        };
        self.connection.sessions().set(session.clone(), event).await;
        Ok(session)
    }

    fn subscribe(&self) -> AuthEventSubscriber {
        self.connection.sessions().subscribe()
    }
}
