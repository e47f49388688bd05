//! Addressing of locations inside the node table.
//!
//! Grammar: `/nodes/{id}`, `/nodes/{id}/children/{index|-}`,
//! `/nodes/{id}/{field}`. Parsing never fails; missing segments are simply
//! absent and it is up to the applicator to decide what an incomplete path
//! means.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The only collection the applicator understands.
pub const NODES: &str = "nodes";

/// Index segment meaning "append at the end".
pub const APPEND: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchPath(pub Vec<String>);

/// Resolved insertion position in a children list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    End,
    Index(usize),
}

impl PatchPath {
    /// Splits on `/`, discarding empty segments (leading, trailing, doubled).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uix::patch::path::PatchPath;
    /// let path = PatchPath::parse("/nodes/hdr/children/-");
    /// assert_eq!(path.collection(), Some("nodes"));
    /// assert_eq!(path.id(), Some("hdr"));
    /// assert_eq!(path.field(), Some("children"));
    /// assert_eq!(path.index(), Some("-"));
    /// ```
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    fn segment(&self, n: usize) -> Option<&str> {
        self.0.get(n).map(String::as_str)
    }

    pub fn collection(&self) -> Option<&str> {
        self.segment(0)
    }

    pub fn id(&self) -> Option<&str> {
        self.segment(1)
    }

    pub fn field(&self) -> Option<&str> {
        self.segment(2)
    }

    pub fn index(&self) -> Option<&str> {
        self.segment(3)
    }

    pub fn is_nodes(&self) -> bool {
        self.collection() == Some(NODES)
    }

    /// Resolves the index segment against a list of `len` entries.
    ///
    /// `-`, a missing index, or anything that does not start with an integer
    /// appends. An integer prefix is honoured (`"2abc"` is 2); positions past
    /// the end clamp to the end and negative positions count back from it.
    pub fn insert_at(&self, len: usize) -> InsertAt {
        let Some(raw) = self.index() else {
            return InsertAt::End;
        };
        if raw == APPEND {
            return InsertAt::End;
        }
        match leading_integer(raw) {
            Some(n) if n < 0 => {
                let back = n.unsigned_abs() as usize;
                InsertAt::Index(len.saturating_sub(back))
            }
            Some(n) => InsertAt::Index((n as usize).min(len)),
            None => InsertAt::End,
        }
    }
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

// Parses an optional sign followed by at least one digit, ignoring the rest.
fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
