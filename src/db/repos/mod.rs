pub mod cursor;
mod prompts;

pub use cursor::*;
pub use prompts::*;

/// Page size used when a list request does not give one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page size a list request may ask for.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Build a `%substring%` LIKE pattern, escaping wildcards with a backslash.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Sort order for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL comparison operator, ORDER BY direction, and whether the fetched rows
    /// must be reversed before returning, for keyset pagination on
    /// `(created_at, id)`.
    ///
    /// - Desc + Forward: rows below the cursor, ORDER BY DESC
    /// - Desc + Backward: rows above the cursor, ORDER BY ASC, then reverse
    /// - Asc + Forward: rows above the cursor, ORDER BY ASC
    /// - Asc + Backward: rows below the cursor, ORDER BY DESC, then reverse
    pub fn cursor_query_params(
        &self,
        direction: CursorDirection,
    ) -> (&'static str, &'static str, bool) {
        match (self, direction) {
            (SortOrder::Desc, CursorDirection::Forward) => ("<", "DESC", false),
            (SortOrder::Desc, CursorDirection::Backward) => (">", "ASC", true),
            (SortOrder::Asc, CursorDirection::Forward) => (">", "ASC", false),
            (SortOrder::Asc, CursorDirection::Backward) => ("<", "DESC", true),
        }
    }

    /// ORDER BY direction for a first page (no cursor).
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Cursor-based listing parameters.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Maximum number of records to return.
    pub limit: Option<i64>,
    /// Keyset position to continue from.
    pub cursor: Option<Cursor>,
    pub direction: CursorDirection,
    pub sort_order: SortOrder,
    /// Include soft-deleted records in results.
    pub include_deleted: bool,
}

impl ListParams {
    /// Requested limit clamped to `1..=MAX_PAGE_SIZE`.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of a cursor-paginated list.
#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    /// Whether more items exist past this page.
    pub has_more: bool,
    pub cursors: PageCursors,
}

impl<T> ListResult<T> {
    pub fn new(items: Vec<T>, has_more: bool, cursors: PageCursors) -> Self {
        Self {
            items,
            has_more,
            cursors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit_defaults_and_clamps() {
        assert_eq!(ListParams::default().effective_limit(), DEFAULT_PAGE_SIZE);

        let params = ListParams {
            limit: Some(1_000),
            ..Default::default()
        };
        assert_eq!(params.effective_limit(), MAX_PAGE_SIZE);

        let params = ListParams {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(params.effective_limit(), 1);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("editor"), "%editor%");
        assert_eq!(like_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn test_cursor_query_params_desc() {
        assert_eq!(
            SortOrder::Desc.cursor_query_params(CursorDirection::Forward),
            ("<", "DESC", false)
        );
        assert_eq!(
            SortOrder::Desc.cursor_query_params(CursorDirection::Backward),
            (">", "ASC", true)
        );
    }
}
