//! Core data types for woven threads.
//!
//! A [`Thread`] is one immutable, hash-linked event record. Field names on
//! the wire are camelCase and must stay that way: exported scrolls and
//! stored tapestries written by other clients use the same layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hash::{canonical_payload, digest};

/// Sentinel `previousHash` of the first thread in a chain.
pub const GENESIS_HASH: &str = "GENESIS_HASH";

/// Number of leading hash characters used as a thread id.
pub const THREAD_ID_LEN: usize = 12;

/// The intention a thread was woven with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intention {
    Serenity,
    Vibrancy,
    Awe,
    Legacy,
    Unknown,
}

impl Intention {
    pub const ALL: [Intention; 5] = [
        Intention::Serenity,
        Intention::Vibrancy,
        Intention::Awe,
        Intention::Legacy,
        Intention::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intention::Serenity => "serenity",
            Intention::Vibrancy => "vibrancy",
            Intention::Awe => "awe",
            Intention::Legacy => "legacy",
            Intention::Unknown => "unknown",
        }
    }
}

impl FromStr for Intention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intention::ALL
            .into_iter()
            .find(|intention| intention.as_str() == s)
            .ok_or_else(|| format!("unknown intention '{}'", s))
    }
}

impl fmt::Display for Intention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time of day a thread was woven at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Dawn,
    Midday,
    Dusk,
    Night,
    Unknown,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 5] = [
        TimeOfDay::Dawn,
        TimeOfDay::Midday,
        TimeOfDay::Dusk,
        TimeOfDay::Night,
        TimeOfDay::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Dawn => "dawn",
            TimeOfDay::Midday => "midday",
            TimeOfDay::Dusk => "dusk",
            TimeOfDay::Night => "night",
            TimeOfDay::Unknown => "unknown",
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDay::ALL
            .into_iter()
            .find(|time| time.as_str() == s)
            .ok_or_else(|| format!("unknown time of day '{}'", s))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker attached to a thread that failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    Corrupted,
}

/// A woven thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Short identifier (first 12 hash characters for new threads)
    pub id: String,

    pub intention: Intention,

    pub time: TimeOfDay,

    /// Free text, at most 50 characters of safe text
    pub region: String,

    /// Free text, at most 100 characters of safe text
    pub title: String,

    /// Milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Hash of the preceding thread, or [`GENESIS_HASH`]
    pub previous_hash: String,

    /// SHA-256 of the canonical payload, lowercase hex
    pub hash: String,

    /// Set by verification when this thread breaks the chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_status: Option<IntegrityStatus>,
}

impl Thread {
    /// Compute this thread's hash as if it were linked to `previous_hash`.
    ///
    /// Only the six canonical fields participate; `id`, the stored `hash`
    /// and the integrity marker do not.
    pub fn compute_hash(&self, previous_hash: &str) -> String {
        digest(&canonical_payload(
            self.intention.as_str(),
            self.time.as_str(),
            &self.region,
            &self.title,
            self.timestamp,
            previous_hash,
        ))
    }

    pub fn is_corrupted(&self) -> bool {
        matches!(self.integrity_status, Some(IntegrityStatus::Corrupted))
    }
}

/// Input for weaving a new thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewThread {
    pub intention: Intention,
    pub time: TimeOfDay,
    pub region: String,
    pub title: String,
}

impl NewThread {
    pub fn new(
        intention: Intention,
        time: TimeOfDay,
        region: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            intention,
            time,
            region: region.into(),
            title: title.into(),
        }
    }

    /// Seal the input into a linked thread.
    pub(crate) fn weave(self, timestamp: i64, previous_hash: &str) -> Thread {
        let mut thread = Thread {
            id: String::new(),
            intention: self.intention,
            time: self.time,
            region: self.region,
            title: self.title,
            timestamp,
            previous_hash: previous_hash.to_string(),
            hash: String::new(),
            integrity_status: None,
        };
        thread.hash = thread.compute_hash(previous_hash);
        thread.id = thread.hash[..THREAD_ID_LEN].to_string();
        thread
    }
}
