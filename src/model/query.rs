use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::logic::ValidationErrors;
use crate::model::Persona;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Fields a listing can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Nombres,
    Apellidos,
    Cedula,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Nombres => "nombres",
            SortField::Apellidos => "apellidos",
            SortField::Cedula => "cedula",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }

    /// Column name in the `personas` table.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Nombres => "nombres",
            SortField::Apellidos => "apellidos",
            SortField::Cedula => "cedula",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nombres" => Ok(SortField::Nombres),
            "apellidos" => Ok(SortField::Apellidos),
            "cedula" => Ok(SortField::Cedula),
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            other => Err(format!(
                "sortBy '{}' no es válido; use nombres, apellidos, cedula, createdAt o updatedAt",
                other
            )),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("sortOrder '{}' no es válido; use asc o desc", s)),
        }
    }
}

/// Raw query string of `GET /api/personas`, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Typed listing request handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ListQuery {
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Search term with surrounding whitespace removed, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

impl TryFrom<ListParams> for ListQuery {
    type Error = ValidationErrors;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();
        let mut query = ListQuery::default();

        if let Some(raw) = params.page.as_deref() {
            match raw.trim().parse::<u32>() {
                Ok(page) if page >= 1 => query.page = page,
                _ => errors.push("page", "page debe ser un entero mayor o igual a 1"),
            }
        }

        if let Some(raw) = params.limit.as_deref() {
            match raw.trim().parse::<u32>() {
                Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => query.limit = limit,
                _ => errors.push(
                    "limit",
                    format!("limit debe ser un entero entre 1 y {}", MAX_LIMIT),
                ),
            }
        }

        if let Some(raw) = params.sort_by.as_deref() {
            match raw.trim().parse::<SortField>() {
                Ok(field) => query.sort_by = field,
                Err(message) => errors.push("sortBy", message),
            }
        }

        if let Some(raw) = params.sort_order.as_deref() {
            match raw.trim().parse::<SortOrder>() {
                Ok(order) => query.sort_order = order,
                Err(message) => errors.push("sortOrder", message),
            }
        }

        query.search = params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        errors.into_result(query)
    }
}

/// `ceil(total / limit)`, zero for an empty collection.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

/// One page of a listing together with the totals needed to page through it.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaPage {
    pub personas: Vec<Persona>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaListResponse {
    pub personas: Vec<Persona>,
    pub pagination: Pagination,
}

impl From<PersonaPage> for PersonaListResponse {
    fn from(page: PersonaPage) -> Self {
        Self {
            personas: page.personas,
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total: page.total,
                pages: page.pages,
            },
        }
    }
}
