//! Keyset pagination cursors.
//!
//! A cursor is the `(created_at, id)` pair of the last row a client saw,
//! encoded as URL-safe base64 so it can travel in a query string. Timestamps
//! are carried at millisecond precision, so rows are stored with
//! [`truncate_to_millis`] timestamps to keep comparisons exact in SQLite,
//! which stores `DateTime` as TEXT.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("invalid cursor format")]
    InvalidFormat,
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid timestamp in cursor")]
    InvalidTimestamp,
    #[error("invalid UUID in cursor")]
    InvalidUuid,
}

/// A position in a list ordered by `(created_at, id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    /// Encode as base64 of `{timestamp_millis}:{uuid}`.
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.created_at.timestamp_millis(), self.id);
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    pub fn decode(encoded: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded)?;
        let raw = String::from_utf8(bytes).map_err(|_| CursorError::InvalidFormat)?;

        // UUIDs use hyphens, so the first ':' is the separator
        let (millis, uuid) = raw.split_once(':').ok_or(CursorError::InvalidFormat)?;

        let millis: i64 = millis.parse().map_err(|_| CursorError::InvalidTimestamp)?;
        let created_at =
            DateTime::from_timestamp_millis(millis).ok_or(CursorError::InvalidTimestamp)?;
        let id = Uuid::parse_str(uuid).map_err(|_| CursorError::InvalidUuid)?;

        Ok(Self { created_at, id })
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for Cursor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cursor::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Which side of the cursor to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
    /// Older items (the next page when listing newest first)
    #[default]
    Forward,
    /// Newer items (the previous page)
    Backward,
}

/// Cursors handed back to the client for the adjacent pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageCursors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Cursor>,
}

impl PageCursors {
    /// Build cursors from a page of items in display order.
    ///
    /// `cursor` is the cursor the page was requested with; its presence means
    /// the page is not the first one.
    pub fn from_items<T, F>(
        items: &[T],
        has_more: bool,
        direction: CursorDirection,
        cursor: Option<&Cursor>,
        get_cursor: F,
    ) -> Self
    where
        F: Fn(&T) -> Cursor,
    {
        let (Some(first), Some(last)) = (items.first(), items.last()) else {
            return Self::default();
        };
        let first = get_cursor(first);
        let last = get_cursor(last);

        match direction {
            CursorDirection::Forward => Self {
                next: has_more.then_some(last),
                prev: cursor.map(|_| first),
            },
            // Items are already back in display order, so the newer edge is
            // `first` and the cursor side is `last`.
            CursorDirection::Backward => Self {
                next: cursor.map(|_| last),
                prev: has_more.then_some(first),
            },
        }
    }
}

#[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
pub fn cursor_from_row(created_at: DateTime<Utc>, id: Uuid) -> Cursor {
    Cursor::new(created_at, id)
}

/// Truncate a timestamp to the millisecond precision cursors carry.
#[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(dt)
}
