use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of active loans a single member may hold.
pub const MAX_LOANS_PER_MEMBER: i64 = 10;

/// Book ID - row identifier of the books table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(i32);

impl BookId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Member ID - row identifier of the members table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(i32);

impl MemberId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loan ID - row identifier of the loans table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(i32);

impl LoanId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row count and highest assigned id of one table.
///
/// An empty table reports the "no rows" sentinel: `count == 0`, `max_id == 0`.
/// The next id handed out is always `max_id + 1`, so deleting the highest row
/// and adding a new one reuses the freed id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub count: i64,
    pub max_id: i32,
}

impl TableStats {
    pub const EMPTY: TableStats = TableStats { count: 0, max_id: 0 };

    pub fn next_id(&self) -> i32 {
        self.max_id + 1
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Which entity an error or lookup is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Book,
    Member,
    Loan,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Book => "book",
            EntityKind::Member => "member",
            EntityKind::Loan => "loan",
        };
        f.write_str(name)
    }
}

/// Trims the text and collapses inner whitespace runs to one space.
///
/// Stored titles, authors and names are always normalized, so duplicate
/// detection only has to compare case-insensitively.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive identity key of a normalized text pair.
pub fn identity_key(first: &str, second: &str) -> (String, String) {
    (
        normalize_text(first).to_lowercase(),
        normalize_text(second).to_lowercase(),
    )
}
