use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 3;

/// A task as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub completed: bool,
}

/// Body of `POST /tasks/`.
///
/// Missing fields deserialize as empty strings so that they are reported by
/// the same "required" check as explicitly empty ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CreateTaskRequest {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn has_required_fields(&self) -> bool {
        !self.name.is_empty() && !self.description.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedTasksResponse {
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn created(name: &str) -> Self {
        Self {
            message: format!("Tarefa '{name}' criada com sucesso!"),
        }
    }

    pub fn completed(name: &str) -> Self {
        Self {
            message: format!("Tarefa '{name}' marcada como concluída!"),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Columns a task list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Description,
    Completed,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::Id,
        SortField::Name,
        SortField::Description,
        SortField::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Description => "description",
            SortField::Completed => "completed",
        }
    }

    /// Comma-separated list of accepted `sort_by` values.
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ListQueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or(ListQueryError::InvalidSortField)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ListQueryError {
    #[error("Parâmetros inválidos: 'page' e 'limit' devem ser maiores que 0")]
    InvalidPagination,
    #[error("Campo de ordenação inválido. Use um dos seguintes: {allowed}", allowed = SortField::allowed_list())]
    InvalidSortField,
}

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

fn default_sort_by() -> String {
    SortField::default().as_str().to_string()
}

/// Query string of `GET /tasks/`, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
}

impl Default for ListTasksQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: default_sort_by(),
        }
    }
}

impl ListTasksQuery {
    /// Checks pagination bounds first, then the sort field.
    pub fn validate(&self) -> Result<PageRequest, ListQueryError> {
        if self.page < 1 || self.limit < 1 {
            return Err(ListQueryError::InvalidPagination);
        }
        let sort_by = self.sort_by.parse()?;
        Ok(PageRequest {
            page: self.page,
            limit: self.limit,
            sort_by,
        })
    }
}

/// A validated page selection; `page` and `limit` are both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
    pub sort_by: SortField,
}

impl PageRequest {
    /// Rows to skip. Saturates instead of overflowing, which just yields an
    /// empty page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}
