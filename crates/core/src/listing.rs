//! Listing rules: page/limit clamping, the video sort allow-list, LIKE
//! escaping for free-text search, and the pagination metadata block.
//!
//! Everything here is pure so the repository layer only has to turn a
//! [`VideoListFilter`] into SQL.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::{parse_id, DbId};

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of items per page.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Maximum number of items per page.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Maximum length of a free-text search query after trimming.
pub const MAX_QUERY_LEN: usize = 200;

/// Clamp a user-provided limit to `1..=max`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a user-provided 1-based page number to at least 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Deserialize a page number or limit, treating anything that is not an
/// integer (`page=abc`, `limit=`) as absent so the default applies.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        Some(Raw::Other(_)) | None => None,
    })
}

/// A normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: clamp_page(page),
            limit: clamp_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
        }
    }

    /// Rows to skip for this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Video columns a caller may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Title,
    #[default]
    CreatedAt,
    Views,
    Duration,
}

impl SortField {
    /// Accepted wire names, in the order they are documented.
    pub const ALLOWED: &'static [&'static str] = &["title", "createdAt", "views", "duration"];

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            "title" => Ok(Self::Title),
            "createdAt" => Ok(Self::CreatedAt),
            "views" => Ok(Self::Views),
            "duration" => Ok(Self::Duration),
            other => Err(CoreError::validation(format!(
                "Invalid sortBy '{other}'. Must be one of: {:?}",
                Self::ALLOWED
            ))),
        }
    }

    /// The SQL column backing this field. Only ever yields a fixed literal.
    pub fn column(self) -> &'static str {
        match self {
            Self::Title => "v.title",
            Self::CreatedAt => "v.created_at",
            Self::Views => "v.views",
            Self::Duration => "v.duration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" | "1" => Ok(Self::Asc),
            "desc" | "-1" => Ok(Self::Desc),
            other => Err(CoreError::validation(format!(
                "Invalid sortType '{other}'. Must be 'asc' or 'desc'"
            ))),
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

// ---------------------------------------------------------------------------
// Free-text search
// ---------------------------------------------------------------------------

/// Escape `%`, `_` and `\` so user input is matched literally by
/// `ILIKE ... ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build a case-insensitive substring pattern, or `None` for blank input.
pub fn contains_pattern(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }
    let bounded: String = trimmed.chars().take(MAX_QUERY_LEN).collect();
    Some(format!("%{}%", escape_like(&bounded)))
}

// ---------------------------------------------------------------------------
// Video listing filter
// ---------------------------------------------------------------------------

/// Raw listing parameters exactly as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListParams {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<i64>,
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
}

/// Validated listing filter consumed by the video repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoListFilter {
    pub page: PageRequest,
    /// Escaped `ILIKE` pattern for the title.
    pub title_pattern: Option<String>,
    pub owner_id: Option<DbId>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// The requesting user; their own unpublished videos stay visible.
    pub viewer_id: Option<DbId>,
}

impl VideoListFilter {
    /// Validate raw parameters.
    ///
    /// A malformed `userId` is rejected rather than silently dropped, as is
    /// any sort field or direction outside the allow-list.
    pub fn from_params(params: &VideoListParams, viewer_id: Option<DbId>) -> Result<Self, CoreError> {
        let owner_id = match params.user_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_id(raw, "userId")?),
        };

        let sort_field = match params.sort_by.as_deref() {
            None | Some("") => SortField::default(),
            Some(raw) => SortField::parse(raw)?,
        };

        let sort_direction = match params.sort_type.as_deref() {
            None | Some("") => SortDirection::default(),
            Some(raw) => SortDirection::parse(raw)?,
        };

        Ok(Self {
            page: PageRequest::new(params.page, params.limit),
            title_pattern: params.query.as_deref().and_then(contains_pattern),
            owner_id,
            sort_field,
            sort_direction,
            viewer_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Pagination metadata
// ---------------------------------------------------------------------------

/// Pagination block returned alongside every paged list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total_docs: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    pub fn new(request: PageRequest, total_docs: i64) -> Self {
        let total_docs = total_docs.max(0);
        let total_pages = if total_docs == 0 {
            0
        } else {
            (total_docs + request.limit - 1) / request.limit
        };
        Self {
            page: request.page,
            limit: request.limit,
            total_docs,
            total_pages,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

/// A page of items plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, request: PageRequest, total_docs: i64) -> Self {
        Self {
            docs,
            pagination: PageMeta::new(request, total_docs),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
