//! Outbound ports: row operations and the session boundary
//!
//! Both traits are single-shot: implementations must not retry, cache or
//! reinterpret backend errors.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::identity::{AuthUser, Session};
use crate::domain::query::{ListParams, RowPage};
use crate::domain::user::CreateUserDto;
use crate::notifications::AuthEventSubscriber;
use crate::shared::AdminResult;

/// Row operations against named tables and views.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Filtered, sorted, optionally paginated select with total count.
    async fn select(&self, table: &str, params: &ListParams) -> AdminResult<RowPage>;

    /// Single row by primary key; `AdminError::NotFound` when absent.
    async fn select_one(&self, table: &str, id: &str) -> AdminResult<Value>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: Value) -> AdminResult<Value>;

    /// Patch one row by primary key and return it as stored.
    async fn update(&self, table: &str, id: &str, changes: Value) -> AdminResult<Value>;

    /// Delete one row by primary key and return what was deleted.
    async fn delete(&self, table: &str, id: &str) -> AdminResult<Value>;

    /// Call a server-side function.
    async fn rpc(&self, function: &str, args: Value) -> AdminResult<Value>;
}

/// Session boundary of the hosted auth service.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AdminResult<Session>;

    /// Create an account. The caller's own session is left untouched.
    async fn sign_up(&self, request: &CreateUserDto) -> AdminResult<AuthUser>;

    async fn sign_out(&self) -> AdminResult<()>;

    /// Current session, refreshed if it has expired and can be.
    async fn session(&self) -> AdminResult<Option<Session>>;

    /// Account of the current session, confirmed with the auth service.
    async fn current_user(&self) -> AdminResult<Option<AuthUser>>;

    async fn update_password(&self, new_password: &str) -> AdminResult<()>;

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AdminResult<()>;

    /// Adopt the session carried by a recovery / magic-link redirect URL.
    async fn restore_from_redirect(&self, redirect_url: &str) -> AdminResult<Session>;

    fn subscribe(&self) -> AuthEventSubscriber;
}
