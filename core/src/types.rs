//! Shared primitive types used across the whole crate.

use std::fmt;
use std::str::FromStr;

/// Internal operator id (sqlite rowid).
pub type OperatorId = i64;

/// External chat identity an operator registers with.
pub type ExternalId = i64;

/// Balance entry id (sqlite rowid).
pub type EntryId = i64;

/// Stable name key of an admin; resolves to a top-admin via the mapping.
pub type AdminId = String;

/// Stable name key of a top-admin.
pub type TopAdminId = String;

/// The site an operator works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Lf,
    Mv,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Lf => write!(f, "LF"),
            Site::Mv => write!(f, "MV"),
        }
    }
}

impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LF" => Ok(Site::Lf),
            "MV" => Ok(Site::Mv),
            other => Err(format!("unknown site '{other}'")),
        }
    }
}
