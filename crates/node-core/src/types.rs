use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Amount = u64;
pub type Fee = u64;
pub type BlockHeight = u64;
pub type Difficulty = u32;

/// Maximum size, in bytes, of a transaction's metadata blob (and, for
/// `DataStorage`, its data blob counted against the same budget).
pub const MAX_METADATA_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_unix(seconds: i64) -> Self {
        Self(seconds)
    }

    pub fn as_unix(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime())
    }
}

/// Which consensus sub-engine sealed a block. `Hybrid` is retained in the
/// data model for §3 fidelity but is never itself written by the hybrid
/// selector — see DESIGN.md's Open Question resolution; the selector always
/// tags the block with whichever concrete sub-engine it picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusTag {
    Pow,
    Pos,
    Hybrid,
}

impl fmt::Display for ConsensusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsensusTag::Pow => "pow",
            ConsensusTag::Pos => "pos",
            ConsensusTag::Hybrid => "hybrid",
        };
        write!(f, "{s}")
    }
}
