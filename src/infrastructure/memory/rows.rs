//! In-memory row store
//!
//! Stands in for PostgREST in tests and offline demos: the five tables,
//! the three report views (computed on read) and the two role functions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::eval::{self, Projection};
use crate::domain::{ListParams, RowPage, RowStore};
use crate::shared::{AdminError, AdminResult, RemoteError};

pub const TABLES: [&str; 5] = ["users", "courses", "course_phases", "enrollments", "payments"];

/// Foreign key used to embed `embedded` rows into `table` rows.
fn relation(table: &str, embedded: &str) -> Option<&'static str> {
    match (table, embedded) {
        ("enrollments", "users") | ("payments", "users") => Some("student_id"),
        ("enrollments", "courses") | ("course_phases", "courses") => Some("course_id"),
        ("enrollments", "course_phases") => Some("phase_id"),
        ("payments", "enrollments") => Some("enrollment_id"),
        _ => None,
    }
}

/// Column defaults applied on insert.
fn defaults(table: &str) -> Value {
    match table {
        "users" => json!({ "role": "student", "is_active": true }),
        "courses" => json!({ "is_published": false, "category": "tech" }),
        "enrollments" => json!({ "payment_status": "pending", "access_granted": false }),
        "payments" => json!({ "status": "pending" }),
        _ => json!({}),
    }
}

fn postgrest_error(status: u16, code: &str, message: impl Into<String>) -> AdminError {
    AdminError::Remote(RemoteError::new(Some(status), message).with_code(code))
}

fn str_field<'a>(row: &'a Value, field: &str) -> Option<&'a str> {
    row.get(field).and_then(Value::as_str)
}

pub struct InMemoryRowStore {
    tables: DashMap<String, Vec<Value>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        let tables = DashMap::new();
        for table in TABLES {
            tables.insert(table.to_string(), Vec::new());
        }
        Self { tables }
    }

    /// Snapshot of a table (or computed view).
    pub fn rows(&self, table: &str) -> AdminResult<Vec<Value>> {
        match table {
            "user_stats" => Ok(self.user_stats()),
            "enrollment_stats" => Ok(self.enrollment_stats()),
            "revenue_summary" => Ok(self.revenue_summary()),
            _ => self
                .tables
                .get(table)
                .map(|rows| rows.value().clone())
                .ok_or_else(|| Self::unknown_relation(table)),
        }
    }

    fn unknown_relation(table: &str) -> AdminError {
        postgrest_error(
            404,
            "42P01",
            format!("relation \"public.{}\" does not exist", table),
        )
    }

    fn is_view(table: &str) -> bool {
        matches!(table, "user_stats" | "enrollment_stats" | "revenue_summary")
    }

    fn read_only(table: &str) -> AdminError {
        postgrest_error(
            405,
            "55000",
            format!("cannot insert into view \"{}\"", table),
        )
    }

    fn find(&self, table: &str, id: &str) -> Option<Value> {
        self.tables
            .get(table)?
            .iter()
            .find(|row| str_field(row, "id") == Some(id))
            .cloned()
    }

    fn check_unique(&self, table: &str, row: &Value, except_id: Option<&str>) -> AdminResult<()> {
        if table != "users" {
            return Ok(());
        }
        let Some(email) = str_field(row, "email") else {
            return Ok(());
        };
        let taken = self.tables.get(table).is_some_and(|rows| {
            rows.iter().any(|other| {
                str_field(other, "email").is_some_and(|e| e.eq_ignore_ascii_case(email))
                    && str_field(other, "id") != except_id
            })
        });
        if taken {
            return Err(postgrest_error(
                409,
                "23505",
                "duplicate key value violates unique constraint \"users_email_key\"",
            ));
        }
        Ok(())
    }

    fn embed(&self, table: &str, row: &mut Value, projection: &Projection) {
        for (embedded, columns) in &projection.embeds {
            let target = relation(table, embedded)
                .and_then(|fk| str_field(row, fk).map(str::to_string))
                .and_then(|id| self.find(embedded, &id))
                .map(|found| eval::project(&found, columns))
                .unwrap_or(Value::Null);
            if let Value::Object(map) = row {
                map.insert(embedded.clone(), target);
            }
        }
    }

    fn user_stats(&self) -> Vec<Value> {
        let users = self.rows("users").unwrap_or_default();
        let mut by_role: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for user in &users {
            let role = str_field(user, "role").unwrap_or("student").to_string();
            let active = user.get("is_active").and_then(Value::as_bool).unwrap_or(true);
            let entry = by_role.entry(role).or_default();
            entry.0 += 1;
            if active {
                entry.1 += 1;
            }
        }
        by_role
            .into_iter()
            .map(|(role, (total, active))| {
                json!({
                    "role": role,
                    "total_users": total,
                    "active_users": active,
                    "inactive_users": total - active,
                })
            })
            .collect()
    }

    fn enrollment_stats(&self) -> Vec<Value> {
        let enrollments = self.rows("enrollments").unwrap_or_default();
        let payments = self.rows("payments").unwrap_or_default();
        let mut groups: BTreeMap<(String, String), (i64, i64, i64, f64)> = BTreeMap::new();

        for enrollment in &enrollments {
            let title = str_field(enrollment, "course_id")
                .and_then(|id| self.find("courses", id))
                .and_then(|c| str_field(&c, "title").map(str::to_string))
                .unwrap_or_default();
            let phase = str_field(enrollment, "phase_id")
                .and_then(|id| self.find("course_phases", id))
                .and_then(|p| str_field(&p, "phase_name").map(str::to_string))
                .unwrap_or_default();
            let entry = groups.entry((title, phase)).or_default();
            entry.0 += 1;
            match str_field(enrollment, "payment_status") {
                Some("paid") => entry.1 += 1,
                Some("pending") | None => entry.2 += 1,
                _ => {}
            }
            let enrollment_id = str_field(enrollment, "id");
            entry.3 += payments
                .iter()
                .filter(|p| str_field(p, "enrollment_id") == enrollment_id)
                .filter(|p| str_field(p, "status") == Some("completed"))
                .filter_map(|p| p.get("amount").and_then(Value::as_f64))
                .sum::<f64>();
        }

        groups
            .into_iter()
            .map(|((title, phase), (total, paid, pending, revenue))| {
                json!({
                    "course_title": title,
                    "phase_name": phase,
                    "total_enrollments": total,
                    "paid_enrollments": paid,
                    "pending_enrollments": pending,
                    "total_revenue": revenue,
                })
            })
            .collect()
    }

    fn revenue_summary(&self) -> Vec<Value> {
        let payments = self.rows("payments").unwrap_or_default();
        let mut groups: BTreeMap<(String, String), (i64, f64)> = BTreeMap::new();

        for payment in payments
            .iter()
            .filter(|p| str_field(p, "status") == Some("completed"))
        {
            let day = str_field(payment, "payment_date")
                .or_else(|| str_field(payment, "created_at"))
                .map(|d| d.chars().take(10).collect::<String>())
                .unwrap_or_default();
            let method = str_field(payment, "payment_method").unwrap_or("").to_string();
            let entry = groups.entry((day, method)).or_default();
            entry.0 += 1;
            entry.1 += payment.get("amount").and_then(Value::as_f64).unwrap_or(0.0);
        }

        groups
            .into_iter()
            .rev()
            .map(|((day, method), (count, revenue))| {
                json!({
                    "payment_day": day,
                    "payment_method": method,
                    "total_payments": count,
                    "total_revenue": revenue,
                })
            })
            .collect()
    }
}

impl Default for InMemoryRowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn select(&self, table: &str, params: &ListParams) -> AdminResult<RowPage> {
        let mut rows: Vec<Value> = self
            .rows(table)?
            .into_iter()
            .filter(|row| params.filters.iter().all(|f| eval::matches(row, f)))
            .collect();
        eval::sort(&mut rows, &params.sorters);

        let total = rows.len() as u64;
        if let Some(page) = params.pagination {
            rows = rows
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect();
        }

        if let Some(select) = &params.select {
            let projection = Projection::parse(select);
            for row in rows.iter_mut() {
                if !projection.all_columns() {
                    *row = eval::project(row, &projection.columns);
                }
                self.embed(table, row, &projection);
            }
        }

        debug!(table, total, returned = rows.len(), "In-memory select");
        Ok(RowPage { rows, total })
    }

    async fn select_one(&self, table: &str, id: &str) -> AdminResult<Value> {
        if !self.tables.contains_key(table) {
            return Err(Self::unknown_relation(table));
        }
        self.find(table, id)
            .ok_or_else(|| AdminError::not_found(table, id))
    }

    async fn insert(&self, table: &str, row: Value) -> AdminResult<Value> {
        if Self::is_view(table) {
            return Err(Self::read_only(table));
        }
        let Value::Object(values) = row else {
            return Err(postgrest_error(400, "PGRST102", "Empty or invalid json"));
        };

        let now = Utc::now().to_rfc3339();
        let mut stored: Map<String, Value> = match defaults(table) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        stored.insert("id".into(), json!(uuid::Uuid::new_v4().to_string()));
        stored.insert("created_at".into(), json!(now));
        stored.insert("updated_at".into(), json!(now));
        stored.extend(values);
        let stored = Value::Object(stored);

        self.check_unique(table, &stored, None)?;
        self.tables
            .get_mut(table)
            .ok_or_else(|| Self::unknown_relation(table))?
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, table: &str, id: &str, changes: Value) -> AdminResult<Value> {
        if Self::is_view(table) {
            return Err(Self::read_only(table));
        }
        let Value::Object(changes) = changes else {
            return Err(postgrest_error(400, "PGRST102", "Empty or invalid json"));
        };
        if let Some(email) = changes.get("email") {
            self.check_unique(table, &json!({ "email": email }), Some(id))?;
        }

        let mut rows = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Self::unknown_relation(table))?;
        let row = rows
            .iter_mut()
            .find(|row| str_field(row, "id") == Some(id))
            .ok_or_else(|| AdminError::not_found(table, id))?;

        if let Value::Object(map) = row {
            map.extend(changes);
            map.insert("updated_at".into(), json!(Utc::now().to_rfc3339()));
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> AdminResult<Value> {
        if Self::is_view(table) {
            return Err(Self::read_only(table));
        }
        let mut rows = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Self::unknown_relation(table))?;
        let position = rows
            .iter()
            .position(|row| str_field(row, "id") == Some(id))
            .ok_or_else(|| AdminError::not_found(table, id))?;
        Ok(rows.remove(position))
    }

    async fn rpc(&self, function: &str, args: Value) -> AdminResult<Value> {
        let user_id = str_field(&args, "_user_id").unwrap_or_default().to_string();
        let role = self
            .find("users", &user_id)
            .and_then(|u| str_field(&u, "role").map(str::to_string));

        match function {
            "get_user_role" => Ok(role.map(Value::String).unwrap_or(Value::Null)),
            "is_admin" => Ok(Value::Bool(role.as_deref() == Some("admin"))),
            _ => Err(postgrest_error(
                404,
                "PGRST202",
                format!(
                    "Could not find the function public.{} in the schema cache",
                    function
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Filter, Sorter};
    use crate::shared::Pagination;

    async fn seeded() -> InMemoryRowStore {
        let store = InMemoryRowStore::new();
        for n in 1..=45 {
            store
                .insert(
                    "users",
                    json!({
                        "full_name": format!("Student {:02}", n),
                        "email": format!("s{}@academy.io", n),
                        "phone_number": "+254700000000",
                        "is_active": n % 5 != 0,
                    }),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn pages_are_bounded_and_counted() {
        let store = seeded().await;
        let params = ListParams::new()
            .sort(Sorter::asc("full_name"))
            .paginate(Pagination::new(3, 20));
        let page = store.select("users", &params).await.unwrap();

        assert_eq!(page.total, 45);
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.rows[0]["full_name"], "Student 41");
    }

    #[tokio::test]
    async fn filters_narrow_the_total() {
        let store = seeded().await;
        let params = ListParams::new()
            .filter(Filter::eq("is_active", false))
            .paginate(Pagination::default());
        assert_eq!(store.select("users", &params).await.unwrap().total, 9);
    }

    #[tokio::test]
    async fn insert_applies_defaults_and_unique_email() {
        let store = seeded().await;
        let row = store
            .insert("enrollments", json!({ "student_id": "u", "course_id": "c", "phase_id": "p" }))
            .await
            .unwrap();
        assert_eq!(row["payment_status"], "pending");
        assert_eq!(row["access_granted"], false);

        let err = store
            .insert("users", json!({ "full_name": "Dup", "email": "S1@academy.io" }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn embeds_follow_foreign_keys() {
        let store = InMemoryRowStore::new();
        let user = store
            .insert("users", json!({ "full_name": "Jane Doe", "email": "jane@academy.io" }))
            .await
            .unwrap();
        let course = store
            .insert("courses", json!({ "title": "Web Development" }))
            .await
            .unwrap();
        store
            .insert(
                "enrollments",
                json!({ "student_id": user["id"], "course_id": course["id"], "phase_id": "gone" }),
            )
            .await
            .unwrap();

        let params = ListParams::new().select("*,users(full_name),courses(title),course_phases(phase_name)");
        let page = store.select("enrollments", &params).await.unwrap();
        let row = &page.rows[0];
        assert_eq!(row["users"], json!({ "full_name": "Jane Doe" }));
        assert_eq!(row["courses"], json!({ "title": "Web Development" }));
        assert_eq!(row["course_phases"], Value::Null);
    }

    #[tokio::test]
    async fn views_are_computed_and_read_only() {
        let store = seeded().await;
        store
            .insert("users", json!({ "full_name": "Boss", "email": "boss@academy.io", "role": "admin" }))
            .await
            .unwrap();

        let stats = store
            .select("user_stats", &ListParams::new())
            .await
            .unwrap();
        let student = stats
            .rows
            .iter()
            .find(|r| r["role"] == "student")
            .unwrap();
        assert_eq!(student["total_users"], 45);
        assert_eq!(student["inactive_users"], 9);

        let err = store.insert("user_stats", json!({})).await.unwrap_err();
        assert_eq!(err.status(), Some(405));
    }

    #[tokio::test]
    async fn role_functions() {
        let store = InMemoryRowStore::new();
        let admin = store
            .insert("users", json!({ "full_name": "Boss", "email": "boss@academy.io", "role": "admin" }))
            .await
            .unwrap();
        let args = json!({ "_user_id": admin["id"] });

        assert_eq!(store.rpc("is_admin", args.clone()).await.unwrap(), json!(true));
        assert_eq!(store.rpc("get_user_role", args).await.unwrap(), json!("admin"));
        assert_eq!(
            store.rpc("get_user_role", json!({ "_user_id": "nobody" })).await.unwrap(),
            Value::Null
        );
        assert!(store.rpc("drop_everything", json!({})).await.is_err());
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_row() {
        let store = seeded().await;
        let first = store.rows("users").unwrap()[0]["id"].as_str().unwrap().to_string();
        store.delete("users", &first).await.unwrap();
        assert_eq!(store.rows("users").unwrap().len(), 44);
        assert!(matches!(
            store.delete("users", &first).await,
            Err(AdminError::NotFound { .. })
        ));
    }
}
