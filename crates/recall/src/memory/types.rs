//! Memory types for the Recall system
//!
//! Defines the record stored in each tier and the persisted document layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Classification of memory tiers based on cognitive psychology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryTier {
    /// What happened (conversations, events)
    Episodic,
    /// Facts and knowledge
    Semantic,
    /// Preferences and patterns
    Procedural,
}

impl MemoryTier {
    /// All tiers in declaration order; searches walk tiers in this order
    pub const ALL: [MemoryTier; 3] = [
        MemoryTier::Episodic,
        MemoryTier::Semantic,
        MemoryTier::Procedural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryTier::Episodic => "episodic",
            MemoryTier::Semantic => "semantic",
            MemoryTier::Procedural => "procedural",
        }
    }
}

impl fmt::Display for MemoryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "episodic" => Ok(MemoryTier::Episodic),
            "semantic" => Ok(MemoryTier::Semantic),
            "procedural" => Ok(MemoryTier::Procedural),
            other => Err(format!(
                "Unknown memory type: {other}. Use episodic, semantic, or procedural."
            )),
        }
    }
}

/// A single record in one memory tier. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique within the tier, increasing with append order
    pub id: u64,
    pub tier: MemoryTier,
    pub content: String,
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    pub metadata: BTreeMap<String, String>,
}

/// Record as persisted inside its tier list (the tier is the list key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredRecord {
    pub id: u64,
    pub content: String,
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl StoredRecord {
    pub(crate) fn into_record(self, tier: MemoryTier) -> MemoryRecord {
        MemoryRecord {
            id: self.id,
            tier,
            content: self.content,
            timestamp: self.timestamp,
            metadata: self.metadata,
        }
    }
}

impl From<&MemoryRecord> for StoredRecord {
    fn from(record: &MemoryRecord) -> Self {
        Self {
            id: record.id,
            content: record.content.clone(),
            timestamp: record.timestamp,
            metadata: record.metadata.clone(),
        }
    }
}

/// The persisted store document: one ordered list per tier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreDocument {
    #[serde(default)]
    pub episodic: Vec<StoredRecord>,
    #[serde(default)]
    pub semantic: Vec<StoredRecord>,
    #[serde(default)]
    pub procedural: Vec<StoredRecord>,
}

/// Record counts per tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub episodic: usize,
    pub semantic: usize,
    pub procedural: usize,
}

impl MemoryStats {
    pub fn total(&self) -> usize {
        self.episodic + self.semantic + self.procedural
    }

    pub fn count(&self, tier: MemoryTier) -> usize {
        match tier {
            MemoryTier::Episodic => self.episodic,
            MemoryTier::Semantic => self.semantic,
            MemoryTier::Procedural => self.procedural,
        }
    }
}

/// ISO-8601 timestamps: written as RFC 3339, read with or without an offset.
/// Offset-less values are taken as UTC.
mod iso8601 {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| D::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}
