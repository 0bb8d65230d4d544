//! Data-access adapter: CRUD verbs over a [`Resource`]
//!
//! Every call is a single pass-through to the [`RowStore`]; failures come
//! back exactly as the backend reported them.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::resources::Resource;
use crate::domain::{ListParams, ReportView, RowStore, UserRole};
use crate::shared::{AdminError, AdminResult};

/// `{ data, total }` of a list call.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
}

/// `{ data }` of a single-row call.
#[derive(Debug, Clone, PartialEq)]
pub struct OneResponse<T> {
    pub data: T,
}

fn observe<T>(target: &str, verb: &'static str, result: &AdminResult<T>) {
    metrics::counter!("admin_remote_calls_total", "resource" => target.to_string(), "verb" => verb)
        .increment(1);
    if let Err(err) = result {
        metrics::counter!("admin_remote_failures_total", "resource" => target.to_string(), "verb" => verb)
            .increment(1);
        warn!(resource = target, verb, status = ?err.status(), error = %err, "Remote call failed");
    }
}

/// Writes to a read-only resource fail before any remote call.
fn writable(resource: Resource) -> AdminResult<()> {
    if resource.is_read_only() {
        warn!(resource = %resource, "Write refused on read-only resource");
        return Err(AdminError::Validation(format!(
            "{} records are read-only",
            resource.singular()
        )));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(row: Value) -> AdminResult<T> {
    Ok(serde_json::from_value(row)?)
}

#[derive(Clone)]
pub struct DataProvider {
    store: Arc<dyn RowStore>,
}

impl DataProvider {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn get_list(
        &self,
        resource: Resource,
        params: &ListParams,
    ) -> AdminResult<ListResponse<Value>> {
        debug!(resource = %resource, filters = params.filters.len(), "getList");
        let result = self.store.select(resource.name(), params).await;
        observe(resource.name(), "list", &result);
        let page = result?;
        Ok(ListResponse {
            data: page.rows,
            total: page.total,
        })
    }

    pub async fn get_one(&self, resource: Resource, id: &str) -> AdminResult<OneResponse<Value>> {
        let result = self.store.select_one(resource.name(), id).await;
        observe(resource.name(), "get", &result);
        Ok(OneResponse { data: result? })
    }

    pub async fn create<V: Serialize + ?Sized>(
        &self,
        resource: Resource,
        values: &V,
    ) -> AdminResult<OneResponse<Value>> {
        writable(resource)?;
        let row = serde_json::to_value(values)?;
        let result = self.store.insert(resource.name(), row).await;
        observe(resource.name(), "create", &result);
        Ok(OneResponse { data: result? })
    }

    pub async fn update<V: Serialize + ?Sized>(
        &self,
        resource: Resource,
        id: &str,
        values: &V,
    ) -> AdminResult<OneResponse<Value>> {
        writable(resource)?;
        let changes = serde_json::to_value(values)?;
        let result = self.store.update(resource.name(), id, changes).await;
        observe(resource.name(), "update", &result);
        Ok(OneResponse { data: result? })
    }

    pub async fn delete_one(&self, resource: Resource, id: &str) -> AdminResult<OneResponse<Value>> {
        writable(resource)?;
        let result = self.store.delete(resource.name(), id).await;
        observe(resource.name(), "delete", &result);
        Ok(OneResponse { data: result? })
    }

    // ── Typed helpers ───────────────────────────────────────────

    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        params: &ListParams,
    ) -> AdminResult<ListResponse<T>> {
        let ListResponse { data, total } = self.get_list(resource, params).await?;
        Ok(ListResponse {
            data: data.into_iter().map(decode).collect::<AdminResult<_>>()?,
            total,
        })
    }

    pub async fn one<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> AdminResult<T> {
        decode(self.get_one(resource, id).await?.data)
    }

    /// Every row of a read-only view.
    pub async fn report<T: DeserializeOwned>(&self, view: ReportView) -> AdminResult<Vec<T>> {
        let result = self.store.select(view.as_str(), &ListParams::new()).await;
        observe(view.as_str(), "report", &result);
        result?.rows.into_iter().map(decode).collect()
    }

    /// Unpaginated match count.
    pub async fn count(&self, resource: Resource, params: ListParams) -> AdminResult<u64> {
        let params = ListParams {
            pagination: Some(crate::shared::Pagination::new(1, 1)),
            select: Some("id".to_string()),
            ..params
        };
        Ok(self.get_list(resource, &params).await?.total)
    }

    /// `get_user_role(_user_id)`; `None` when the user has no profile.
    pub async fn user_role(&self, user_id: &str) -> AdminResult<Option<UserRole>> {
        let result = self
            .store
            .rpc("get_user_role", json!({ "_user_id": user_id }))
            .await;
        observe("get_user_role", "rpc", &result);
        Ok(result?.as_str().map(|role| UserRole::from(role.to_string())))
    }

    /// `is_admin(_user_id)`
    pub async fn is_admin(&self, user_id: &str) -> AdminResult<bool> {
        let result = self
            .store
            .rpc("is_admin", json!({ "_user_id": user_id }))
            .await;
        observe("is_admin", "rpc", &result);
        Ok(result?.as_bool().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Course, Filter, UserStats};
    use crate::infrastructure::InMemoryRowStore;
    use crate::shared::Pagination;

    fn provider() -> (Arc<InMemoryRowStore>, DataProvider) {
        let store = Arc::new(InMemoryRowStore::new());
        (store.clone(), DataProvider::new(store))
    }

    #[tokio::test]
    async fn list_returns_data_and_total() {
        let (_, provider) = provider();
        for title in ["Rust", "Go", "Design Basics"] {
            provider
                .create(Resource::Courses, &json!({ "title": title }))
                .await
                .unwrap();
        }

        let params = ListParams::new()
            .filter(Filter::contains("title", "s"))
            .paginate(Pagination::new(1, 1));
        let response: ListResponse<Course> = provider.list(Resource::Courses, &params).await.unwrap();
        assert_eq!(response.total, 2);
        assert_eq!(response.data.len(), 1);
        assert!(!response.data[0].published());
    }

    #[tokio::test]
    async fn errors_pass_through_unmodified() {
        let (_, provider) = provider();
        let err = provider
            .update(Resource::Users, "ghost", &json!({ "full_name": "Ghost" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::NotFound { .. }));
    }

    #[tokio::test]
    async fn payments_cannot_be_written() {
        let (store, provider) = provider();
        let row = store
            .insert("payments", json!({ "amount": 15000, "status": "completed" }))
            .await
            .unwrap();
        let id = row["id"].as_str().unwrap();

        let err = provider
            .create(Resource::Payments, &json!({ "amount": 1 }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Payment records are read-only");
        assert!(provider
            .update(Resource::Payments, id, &json!({ "status": "failed" }))
            .await
            .is_err());
        assert!(provider.delete_one(Resource::Payments, id).await.is_err());

        let stored = provider.get_one(Resource::Payments, id).await.unwrap().data;
        assert_eq!(stored["status"], json!("completed"));
    }

    #[tokio::test]
    async fn count_ignores_pagination() {
        let (_, provider) = provider();
        for n in 0..25 {
            provider
                .create(Resource::Courses, &json!({ "title": format!("Course {}", n), "is_published": n < 7 }))
                .await
                .unwrap();
        }
        let published = provider
            .count(
                Resource::Courses,
                ListParams::new().filter(Filter::eq("is_published", true)),
            )
            .await
            .unwrap();
        assert_eq!(published, 7);
    }

    #[tokio::test]
    async fn reports_and_role_functions() {
        let (_, provider) = provider();
        let tutor = provider
            .create(
                Resource::Users,
                &json!({ "full_name": "Tom", "email": "tom@x.io", "role": "tutor" }),
            )
            .await
            .unwrap()
            .data;
        let id = tutor["id"].as_str().unwrap();

        assert_eq!(provider.user_role(id).await.unwrap(), Some(UserRole::Tutor));
        assert_eq!(provider.user_role("nobody").await.unwrap(), None);
        assert!(!provider.is_admin(id).await.unwrap());

        let stats: Vec<UserStats> = provider.report(ReportView::UserStats).await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].role, Some(UserRole::Tutor));
        assert_eq!(stats[0].active_users, Some(1));
    }
}
