//! Evaluates `ListParams` against JSON rows the way PostgREST would.

use std::cmp::Ordering;

use serde_json::Value;

use crate::domain::{Filter, FilterOperator, SortOrder, Sorter};

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Order of two non-null scalars: numerically when both are numbers,
/// otherwise by their text (ISO timestamps order correctly as text).
fn compare_scalars(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => text(a).cmp(&text(b)),
    }
}

fn equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(a), Value::String(b)) | (Value::String(b), Value::Bool(a)) => {
            a.to_string() == *b
        }
        (a, b) => compare_scalars(a, b) == Ordering::Equal,
    }
}

pub fn matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Or(members) => members.is_empty() || members.iter().any(|f| matches(row, f)),
        Filter::Field {
            field,
            operator,
            value,
        } => {
            let actual = row.get(field).unwrap_or(&Value::Null);
            match operator {
                FilterOperator::Eq => equals(actual, value),
                FilterOperator::Ne => !actual.is_null() && !equals(actual, value),
                FilterOperator::Contains => {
                    !actual.is_null() && text(actual).to_lowercase().contains(&text(value).to_lowercase())
                }
                op => {
                    if actual.is_null() || value.is_null() {
                        return false;
                    }
                    let ord = compare_scalars(actual, value);
                    match op {
                        FilterOperator::Gt => ord == Ordering::Greater,
                        FilterOperator::Gte => ord != Ordering::Less,
                        FilterOperator::Lt => ord == Ordering::Less,
                        _ => ord != Ordering::Greater,
                    }
                }
            }
        }
    }
}

/// Ascending puts nulls last, descending puts them first.
fn compare_field(a: &Value, b: &Value, sorter: &Sorter) -> Ordering {
    let left = a.get(&sorter.field).unwrap_or(&Value::Null);
    let right = b.get(&sorter.field).unwrap_or(&Value::Null);
    let ord = match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_scalars(left, right),
    };
    match sorter.order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

pub fn sort(rows: &mut [Value], sorters: &[Sorter]) {
    rows.sort_by(|a, b| {
        sorters
            .iter()
            .map(|s| compare_field(a, b, s))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

/// A parsed `select` list: plain columns plus embedded `table(cols)`.
#[derive(Debug, Default, PartialEq)]
pub struct Projection {
    pub columns: Vec<String>,
    pub embeds: Vec<(String, Vec<String>)>,
}

impl Projection {
    pub fn parse(select: &str) -> Self {
        let mut projection = Self::default();
        let mut depth = 0usize;
        let mut current = String::new();
        let mut parts = Vec::new();

        for c in select.chars() {
            match c {
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
                c if c.is_whitespace() => {}
                c => current.push(c),
            }
        }
        parts.push(current);

        for part in parts.into_iter().filter(|p| !p.is_empty()) {
            match part.split_once('(') {
                Some((table, rest)) => {
                    let inner = rest.trim_end_matches(')');
                    let cols = inner.split(',').map(str::to_string).collect();
                    projection.embeds.push((table.to_string(), cols));
                }
                None => projection.columns.push(part),
            }
        }
        projection
    }

    pub fn all_columns(&self) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c == "*")
    }
}

/// Keep only `columns` of `row` (`*` keeps everything).
pub fn project(row: &Value, columns: &[String]) -> Value {
    if columns.iter().any(|c| c == "*") {
        return row.clone();
    }
    let Value::Object(map) = row else {
        return row.clone();
    };
    Value::Object(
        map.iter()
            .filter(|(k, _)| columns.iter().any(|c| c == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contains_is_case_insensitive() {
        let row = json!({ "full_name": "Jane Wanjiku", "email": "jane@x.io" });
        assert!(matches(&row, &Filter::contains("full_name", "WANJ")));
        assert!(matches(
            &row,
            &Filter::search(["full_name", "email"], "x.io")
        ));
        assert!(!matches(&row, &Filter::contains("phone_number", "254")));
    }

    #[test]
    fn equality_across_types() {
        let row = json!({ "is_active": false, "phase_number": 2, "price": 1500.5 });
        assert!(matches(&row, &Filter::eq("is_active", false)));
        assert!(matches(&row, &Filter::eq("is_active", "false")));
        assert!(matches(&row, &Filter::eq("phase_number", 2)));
        assert!(matches(
            &row,
            &Filter::compare("price", FilterOperator::Gt, 1000)
        ));
        assert!(matches(&row, &Filter::eq("missing", Value::Null)));
    }

    #[test]
    fn sorting_places_nulls_like_postgres() {
        let mut rows = vec![
            json!({ "id": "a", "n": 2 }),
            json!({ "id": "b", "n": null }),
            json!({ "id": "c", "n": 1 }),
        ];
        sort(&mut rows, &[Sorter::asc("n")]);
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["c", "a", "b"]);

        sort(&mut rows, &[Sorter::desc("n")]);
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn projection_parses_embeds() {
        let projection = Projection::parse("*, users(full_name), course_phases(phase_name,price)");
        assert!(projection.all_columns());
        assert_eq!(
            projection.embeds,
            vec![
                ("users".to_string(), vec!["full_name".to_string()]),
                (
                    "course_phases".to_string(),
                    vec!["phase_name".to_string(), "price".to_string()]
                ),
            ]
        );

        let row = json!({ "id": "u", "role": "admin", "email": "a@b" });
        assert_eq!(project(&row, &["role".to_string()]), json!({ "role": "admin" }));
    }
}
