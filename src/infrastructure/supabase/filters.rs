//! `ListParams` → PostgREST query string

use serde_json::Value;

use crate::domain::{Filter, FilterOperator, ListParams, Sorter};

fn operator_token(operator: FilterOperator) -> &'static str {
    match operator {
        FilterOperator::Eq => "eq",
        FilterOperator::Ne => "neq",
        FilterOperator::Contains => "ilike",
        FilterOperator::Gt => "gt",
        FilterOperator::Gte => "gte",
        FilterOperator::Lt => "lt",
        FilterOperator::Lte => "lte",
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// `op.value` part of a single condition.
fn condition(operator: FilterOperator, value: &Value) -> String {
    match (operator, value) {
        (FilterOperator::Eq, Value::Null) => "is.null".to_string(),
        (FilterOperator::Ne, Value::Null) => "not.is.null".to_string(),
        (FilterOperator::Contains, v) => format!("ilike.*{}*", scalar(v)),
        (op, v) => format!("{}.{}", operator_token(op), scalar(v)),
    }
}

/// Values inside `or=(...)` must be double-quoted when they hold
/// PostgREST delimiters.
fn quote_in_group(cond: &str) -> String {
    let Some((op, value)) = cond.split_once('.') else {
        return cond.to_string();
    };
    // `not.is.null` / `is.null` carry no user data
    if op == "not" || op == "is" {
        return cond.to_string();
    }
    let needs_quotes = value
        .chars()
        .any(|c| matches!(c, ',' | '(' | ')' | ':' | '"' | ' ' | '\\'));
    if needs_quotes {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{}.\"{}\"", op, escaped)
    } else {
        cond.to_string()
    }
}

fn group_member(filter: &Filter) -> String {
    match filter {
        Filter::Field {
            field,
            operator,
            value,
        } => format!("{}.{}", field, quote_in_group(&condition(*operator, value))),
        Filter::Or(members) => format!("or({})", or_group(members)),
    }
}

fn or_group(members: &[Filter]) -> String {
    members
        .iter()
        .map(group_member)
        .collect::<Vec<_>>()
        .join(",")
}

/// Query pairs for one filter.
pub fn filter_pair(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Field {
            field,
            operator,
            value,
        } => (field.clone(), condition(*operator, value)),
        Filter::Or(members) => ("or".to_string(), format!("({})", or_group(members))),
    }
}

pub fn order_value(sorters: &[Sorter]) -> Option<String> {
    if sorters.is_empty() {
        return None;
    }
    Some(
        sorters
            .iter()
            .map(|s| format!("{}.{}", s.field, s.order.as_str()))
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Full query for a list call.
pub fn list_query(params: &ListParams) -> Vec<(String, String)> {
    let mut query = vec![(
        "select".to_string(),
        params.select.clone().unwrap_or_else(|| "*".to_string()),
    )];

    query.extend(
        params
            .filters
            .iter()
            .filter(|f| !matches!(f, Filter::Or(members) if members.is_empty()))
            .map(filter_pair),
    );

    if let Some(order) = order_value(&params.sorters) {
        query.push(("order".to_string(), order));
    }

    if let Some(page) = params.pagination {
        query.push(("offset".to_string(), page.offset().to_string()));
        query.push(("limit".to_string(), page.limit().to_string()));
    }

    query
}

/// Total from `Content-Range: 0-19/57`. `*` (count not computed) yields `None`.
pub fn content_range_total(header: &str) -> Option<u64> {
    header
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
}
