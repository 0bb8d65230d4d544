//! Backend-agnostic list query: filters, sorters, pagination.

use serde_json::Value;

use crate::shared::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    /// Case-insensitive substring match.
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Field {
        field: String,
        operator: FilterOperator,
        value: Value,
    },
    /// Matches when any member matches.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Field {
            field: field.into(),
            operator: FilterOperator::Eq,
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            operator: FilterOperator::Contains,
            value: Value::String(value.into()),
        }
    }

    pub fn compare(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self::Field {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// `contains` over several columns, OR-ed together.
    pub fn search<I, S>(fields: I, term: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Or(
            fields
                .into_iter()
                .map(|field| Self::contains(field, term))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorter {
    pub field: String,
    pub order: SortOrder,
}

impl Sorter {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Parameters of a list call. `pagination: None` fetches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub filters: Vec<Filter>,
    pub sorters: Vec<Sorter>,
    pub pagination: Option<Pagination>,
    /// Column list / embedded resources, e.g. `*,users(full_name)`.
    pub select: Option<String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn sort(mut self, sorter: Sorter) -> Self {
        self.sorters.push(sorter);
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }
}

/// One page of rows plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPage {
    pub rows: Vec<Value>,
    pub total: u64,
}
