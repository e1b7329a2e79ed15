//! Cursor pagination request and response types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::podcast::PodcastResponse;

/// Page size used when the request gives none (or a non-positive one).
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Which way a page window moves from its cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageDirection {
    /// Ascending, keys strictly greater than the cursor
    #[default]
    Next,
    /// Descending, keys strictly less than the cursor
    Prev,
}

impl PageDirection {
    /// Parse from string, returning `Next` for anything unrecognised.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "prev" | "previous" => Self::Prev,
            _ => Self::Next,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PageDirection::Next => "next",
            PageDirection::Prev => "prev",
        }
    }
}

impl fmt::Display for PageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw discover query parameters.
///
/// Every field is kept as text so malformed values normalise to defaults
/// instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoverQuery {
    pub cursor: Option<String>,
    pub direction: Option<String>,
    pub limit: Option<String>,
}

impl DiscoverQuery {
    /// Cursor position; unparseable values mean "no cursor".
    pub fn cursor(&self) -> Option<u64> {
        self.cursor.as_deref().and_then(|c| c.trim().parse().ok())
    }

    pub fn direction(&self) -> PageDirection {
        self.direction
            .as_deref()
            .map(PageDirection::from_str_or_default)
            .unwrap_or_default()
    }

    /// Requested limit; unparseable values read as 0 (which later defaults).
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// One page of discovered podcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastCursor {
    pub podcasts: Vec<PodcastResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<u64>,
    pub has_next: bool,
    pub has_previous: bool,
}
