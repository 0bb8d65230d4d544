//! PostgREST row adapter

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::filters::{content_range_total, list_query};
use super::{remote_error, Connection};
use crate::domain::{ListParams, RowPage, RowStore};
use crate::shared::{AdminError, AdminResult};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

pub struct SupabaseRest {
    connection: Arc<Connection>,
}

impl SupabaseRest {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    fn table_path(table: &str) -> String {
        format!("rest/v1/{}", table)
    }

    fn id_filter(id: &str) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id))]
    }

    /// First row of a `return=representation` array; empty means no row
    /// matched the id.
    fn single_row(table: &str, id: &str, body: Value) -> AdminResult<Value> {
        match body {
            Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
            Value::Array(_) => Err(AdminError::not_found(table, id)),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl RowStore for SupabaseRest {
    async fn select(&self, table: &str, params: &ListParams) -> AdminResult<RowPage> {
        let query = list_query(params);
        debug!(table, ?query, "PostgREST select");

        let response = self
            .connection
            .request(Method::GET, &Self::table_path(table))
            .await?
            .query(&query)
            .header("Prefer", "count=exact")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total);
        let rows: Vec<Value> = response.json().await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok(RowPage { rows, total })
    }

    async fn select_one(&self, table: &str, id: &str) -> AdminResult<Value> {
        let response = self
            .connection
            .request(Method::GET, &Self::table_path(table))
            .await?
            .query(&[("select", "*".to_string())])
            .query(&Self::id_filter(id))
            .header("Accept", SINGLE_OBJECT)
            .send()
            .await?;

        // PostgREST answers 406 when the single-object request matched 0 rows
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Err(AdminError::not_found(table, id));
        }
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn insert(&self, table: &str, row: Value) -> AdminResult<Value> {
        debug!(table, "PostgREST insert");
        let response = self
            .connection
            .request(Method::POST, &Self::table_path(table))
            .await?
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        let body: Value = response.json().await?;
        Self::single_row(table, "(new)", body)
    }

    async fn update(&self, table: &str, id: &str, changes: Value) -> AdminResult<Value> {
        debug!(table, id, "PostgREST update");
        let response = self
            .connection
            .request(Method::PATCH, &Self::table_path(table))
            .await?
            .query(&Self::id_filter(id))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&changes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        let body: Value = response.json().await?;
        Self::single_row(table, id, body)
    }

    async fn delete(&self, table: &str, id: &str) -> AdminResult<Value> {
        debug!(table, id, "PostgREST delete");
        let response = self
            .connection
            .request(Method::DELETE, &Self::table_path(table))
            .await?
            .query(&Self::id_filter(id))
            .header("Prefer", RETURN_REPRESENTATION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        let body: Value = response.json().await?;
        Self::single_row(table, id, body)
    }

    async fn rpc(&self, function: &str, args: Value) -> AdminResult<Value> {
        let response = self
            .connection
            .request(Method::POST, &format!("rest/v1/rpc/{}", function))
            .await?
            .json(&args)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::domain::{Filter, Sorter};
    use crate::shared::Pagination;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rest_for(server: &MockServer) -> SupabaseRest {
        let config = BackendConfig {
            url: server.uri(),
            anon_key: "anon-key".into(),
            timeout_secs: 5,
        };
        SupabaseRest::new(Arc::new(Connection::new(&config).unwrap()))
    }

    #[tokio::test]
    async fn select_sends_filters_and_reads_content_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/course_phases"))
            .and(query_param("course_id", "eq.c1"))
            .and(query_param("order", "phase_number.asc"))
            .and(query_param("offset", "20"))
            .and(query_param("limit", "20"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(header("prefer", "count=exact"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-range", "20-20/21")
                    .set_body_json(json!([{ "id": "p21", "phase_number": 21 }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let params = ListParams::new()
            .filter(Filter::eq("course_id", "c1"))
            .sort(Sorter::asc("phase_number"))
            .paginate(Pagination::new(2, 20));
        let page = rest_for(&server)
            .select("course_phases", &params)
            .await
            .unwrap();

        assert_eq!(page.total, 21);
        assert_eq!(page.rows.len(), 1);
    }

    #[tokio::test]
    async fn missing_count_falls_back_to_row_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "a" }, { "id": "b" }])))
            .mount(&server)
            .await;

        let page = rest_for(&server)
            .select("courses", &ListParams::new())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn select_one_maps_406_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", "eq.missing"))
            .and(header("accept", SINGLE_OBJECT))
            .respond_with(ResponseTemplate::new(406).set_body_json(json!({
                "code": "PGRST116",
                "message": "JSON object requested, multiple (or no) rows returned"
            })))
            .mount(&server)
            .await;

        let err = rest_for(&server)
            .select_one("users", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::NotFound { ref resource, .. } if resource == "users"));
    }

    #[tokio::test]
    async fn insert_returns_stored_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/courses"))
            .and(header("prefer", RETURN_REPRESENTATION))
            .and(body_json(json!({ "title": "Rust 101" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                { "id": "c1", "title": "Rust 101" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let row = rest_for(&server)
            .insert("courses", json!({ "title": "Rust 101" }))
            .await
            .unwrap();
        assert_eq!(row["id"], "c1");
    }

    #[tokio::test]
    async fn remote_errors_are_surfaced_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/courses"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23503",
                "message": "update or delete on table \"courses\" violates foreign key constraint"
            })))
            .mount(&server)
            .await;

        let err = rest_for(&server).delete("courses", "c1").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "update or delete on table \"courses\" violates foreign key constraint"
        );
        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = rest_for(&server)
            .update("users", "ghost", json!({ "full_name": "Ghost" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::NotFound { .. }));
    }

    #[tokio::test]
    async fn rpc_posts_arguments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_user_role"))
            .and(body_json(json!({ "_user_id": "u1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("tutor")))
            .mount(&server)
            .await;

        let role = rest_for(&server)
            .rpc("get_user_role", json!({ "_user_id": "u1" }))
            .await
            .unwrap();
        assert_eq!(role, json!("tutor"));
    }
}
