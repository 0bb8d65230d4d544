//! In-memory auth service
//!
//! Accounts with bcrypt hashes, HS256 access tokens, refresh tokens and a
//! recovery mailbox. Signing up inserts the `users` profile row the way the
//! hosted backend's trigger does.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

use super::rows::InMemoryRowStore;
use crate::domain::{AuthEvent, AuthGateway, AuthUser, CreateUserDto, RowStore, Session, UserRole};
use crate::infrastructure::session::{timestamp, RedirectSession, SessionStore};
use crate::notifications::AuthEventSubscriber;
use crate::shared::{AdminError, AdminResult, RemoteError};

/// Cheap cost: these hashes only ever live in memory.
const HASH_COST: u32 = 4;

const MIN_PASSWORD_LEN: usize = 6;

/// Phone number given to seeded profiles.
pub const SEED_PHONE: &str = "+254700000000";

#[derive(Debug, Clone)]
struct Account {
    id: String,
    email: String,
    password_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    email: String,
    exp: i64,
    iat: i64,
}

/// A recovery email the service "sent".
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryEmail {
    pub email: String,
    /// Redirect link with the recovery session in its fragment; empty
    /// when no account matches.
    pub link: Option<String>,
}

fn auth_error(status: u16, code: &str, message: &str) -> AdminError {
    AdminError::Remote(RemoteError::new(Some(status), message).with_code(code))
}

fn hashing_error(err: bcrypt::BcryptError) -> AdminError {
    AdminError::remote(Some(500), format!("Password hashing failed: {}", err))
}

pub struct InMemoryAuth {
    rows: Arc<InMemoryRowStore>,
    accounts: DashMap<String, Account>,
    refresh_tokens: DashMap<String, String>,
    secret: String,
    token_ttl: Duration,
    sessions: SessionStore,
    outbox: Mutex<Vec<RecoveryEmail>>,
}

impl InMemoryAuth {
    pub fn new(rows: Arc<InMemoryRowStore>) -> Self {
        Self::with_token_ttl(rows, Duration::hours(1))
    }

    pub fn with_token_ttl(rows: Arc<InMemoryRowStore>, token_ttl: Duration) -> Self {
        Self {
            rows,
            accounts: DashMap::new(),
            refresh_tokens: DashMap::new(),
            secret: uuid::Uuid::new_v4().to_string(),
            token_ttl,
            sessions: SessionStore::new(),
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Create an account plus profile row, as an operator would when
    /// bootstrapping the project. The profile gets [`SEED_PHONE`].
    pub async fn seed_account(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: UserRole,
    ) -> AdminResult<String> {
        let user = self
            .register(&CreateUserDto {
                email: email.to_string(),
                password: password.to_string(),
                metadata: crate::domain::NewUserMetadata {
                    full_name: full_name.to_string(),
                    phone_number: SEED_PHONE.to_string(),
                    role,
                },
            })
            .await?;
        Ok(user.id)
    }

    /// Recovery emails sent so far, oldest first.
    pub async fn sent_recovery_emails(&self) -> Vec<RecoveryEmail> {
        self.outbox.lock().await.clone()
    }

    fn issue(&self, account: &Account) -> AdminResult<Session> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;
        let claims = TokenClaims {
            sub: account.id.clone(),
            email: account.email.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AdminError::remote(Some(500), format!("Token signing failed: {}", e)))?;

        let refresh_token = uuid::Uuid::new_v4().simple().to_string();
        self.refresh_tokens
            .insert(refresh_token.clone(), account.email.clone());

        Ok(Session {
            access_token,
            refresh_token: Some(refresh_token),
            expires_at: timestamp(claims.exp),
            user: AuthUser {
                id: account.id.clone(),
                email: Some(account.email.clone()),
            },
        })
    }

    fn verify(&self, token: &str) -> Option<TokenClaims> {
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims)
    }

    async fn register(&self, request: &CreateUserDto) -> AdminResult<AuthUser> {
        let key = request.email.trim().to_lowercase();
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(auth_error(
                422,
                "weak_password",
                "Password should be at least 6 characters.",
            ));
        }
        if self.accounts.contains_key(&key) {
            return Err(auth_error(422, "user_already_exists", "User already registered"));
        }

        let password_hash = bcrypt::hash(&request.password, HASH_COST).map_err(hashing_error)?;
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            email: key.clone(),
            password_hash,
        };

        // Profile trigger
        self.rows
            .insert(
                "users",
                json!({
                    "id": account.id,
                    "email": account.email,
                    "full_name": request.metadata.full_name,
                    "phone_number": request.metadata.phone_number,
                    "role": request.metadata.role,
                }),
            )
            .await?;

        let user = AuthUser {
            id: account.id.clone(),
            email: Some(account.email.clone()),
        };
        self.accounts.insert(key, account);
        Ok(user)
    }

    fn account_by_id(&self, id: &str) -> Option<Account> {
        self.accounts
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl AuthGateway for InMemoryAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AdminResult<Session> {
        let invalid = || auth_error(400, "invalid_credentials", "Invalid login credentials");

        let account = self
            .accounts
            .get(&email.trim().to_lowercase())
            .map(|a| a.value().clone())
            .ok_or_else(invalid)?;
        if !bcrypt::verify(password, &account.password_hash).map_err(hashing_error)? {
            return Err(invalid());
        }

        let session = self.issue(&account)?;
        info!(user_id = %account.id, "Signed in");
        self.sessions
            .set(
                session.clone(),
                AuthEvent::SignedIn {
                    user_id: account.id,
                },
            )
            .await;
        Ok(session)
    }

    async fn sign_up(&self, request: &CreateUserDto) -> AdminResult<AuthUser> {
        let user = self.register(request).await?;
        info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    async fn sign_out(&self) -> AdminResult<()> {
        if let Some(session) = self.sessions.get().await {
            if let Some(token) = session.refresh_token {
                self.refresh_tokens.remove(&token);
            }
        }
        self.sessions.clear().await;
        Ok(())
    }

    async fn session(&self) -> AdminResult<Option<Session>> {
        let Some(current) = self.sessions.get().await else {
            return Ok(None);
        };
        if !current.is_expired_at(Utc::now()) {
            return Ok(Some(current));
        }

        let account = current
            .refresh_token
            .as_ref()
            .and_then(|token| self.refresh_tokens.remove(token))
            .and_then(|(_, email)| self.accounts.get(&email).map(|a| a.value().clone()));
        let Some(account) = account else {
            self.sessions.clear().await;
            return Err(auth_error(
                400,
                "refresh_token_not_found",
                "Invalid Refresh Token: Refresh Token Not Found",
            ));
        };

        let session = self.issue(&account)?;
        self.sessions
            .set(
                session.clone(),
                AuthEvent::TokenRefreshed {
                    user_id: account.id,
                },
            )
            .await;
        Ok(Some(session))
    }

    async fn current_user(&self) -> AdminResult<Option<AuthUser>> {
        let Some(session) = self.session().await? else {
            return Ok(None);
        };
        Ok(self.verify(&session.access_token).map(|claims| AuthUser {
            id: claims.sub,
            email: Some(claims.email),
        }))
    }

    async fn update_password(&self, new_password: &str) -> AdminResult<()> {
        let session = self
            .session()
            .await?
            .ok_or_else(|| auth_error(401, "session_not_found", "Auth session missing!"))?;
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(auth_error(
                422,
                "weak_password",
                "Password should be at least 6 characters.",
            ));
        }

        let account = self
            .account_by_id(&session.user.id)
            .ok_or_else(|| auth_error(404, "user_not_found", "User not found"))?;
        let password_hash = bcrypt::hash(new_password, HASH_COST).map_err(hashing_error)?;
        if let Some(mut stored) = self.accounts.get_mut(&account.email) {
            stored.password_hash = password_hash;
        }

        info!(user_id = %account.id, "Password updated");
        self.sessions.publish(AuthEvent::UserUpdated {
            user_id: account.id,
        });
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AdminResult<()> {
        let key = email.trim().to_lowercase();
        let account = self.accounts.get(&key).map(|a| a.value().clone());

        // Unknown addresses get the same answer, nothing is delivered.
        let link = match account {
            Some(account) => {
                let session = self.issue(&account)?;
                let refresh = session.refresh_token.unwrap_or_default();
                Some(format!(
                    "{}#access_token={}&refresh_token={}&expires_in={}&token_type=bearer&type=recovery",
                    redirect_to,
                    session.access_token,
                    refresh,
                    self.token_ttl.num_seconds()
                ))
            }
            None => None,
        };

        self.outbox.lock().await.push(RecoveryEmail { email: key, link });
        Ok(())
    }

    async fn restore_from_redirect(&self, redirect_url: &str) -> AdminResult<Session> {
        let RedirectSession { session, recovery } = RedirectSession::parse(redirect_url)?;
        if self.verify(&session.access_token).is_none() {
            return Err(auth_error(
                401,
                "bad_jwt",
                "Email link is invalid or has expired",
            ));
        }

        let user_id = session.user.id.clone();
        let event = if recovery {
            AuthEvent::PasswordRecovery { user_id }
        } else {
            AuthEvent::SignedIn { user_id }
        };
        self.sessions.set(session.clone(), event).await;
        Ok(session)
    }

    fn subscribe(&self) -> AuthEventSubscriber {
        self.sessions.subscribe()
    }
}
