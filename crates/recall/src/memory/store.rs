//! Tiered, persistent memory store
//!
//! Three ordered record lists (episodic, semantic, procedural) persisted as a
//! single JSON document. Every mutation rewrites the whole document before it
//! becomes visible in memory, so a successful `write` is always durable and a
//! failed one leaves both the file and the in-memory state untouched.
//!
//! Writers are serialized by a dedicated mutex. Readers take a shared lock on
//! the committed state and therefore see either the state before or after any
//! concurrent write, never a partial record.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{RecallError, Result};
use crate::memory::search::QueryTokens;
use crate::memory::types::{MemoryRecord, MemoryStats, MemoryTier, StoreDocument, StoredRecord};

#[derive(Debug, Clone, Default, PartialEq)]
struct Tiers {
    episodic: Vec<MemoryRecord>,
    semantic: Vec<MemoryRecord>,
    procedural: Vec<MemoryRecord>,
}

impl Tiers {
    fn tier(&self, tier: MemoryTier) -> &Vec<MemoryRecord> {
        match tier {
            MemoryTier::Episodic => &self.episodic,
            MemoryTier::Semantic => &self.semantic,
            MemoryTier::Procedural => &self.procedural,
        }
    }

    fn tier_mut(&mut self, tier: MemoryTier) -> &mut Vec<MemoryRecord> {
        match tier {
            MemoryTier::Episodic => &mut self.episodic,
            MemoryTier::Semantic => &mut self.semantic,
            MemoryTier::Procedural => &mut self.procedural,
        }
    }

    fn from_document(doc: StoreDocument) -> Result<Self> {
        let convert = |records: Vec<StoredRecord>, tier: MemoryTier| -> Result<Vec<MemoryRecord>> {
            let records: Vec<MemoryRecord> =
                records.into_iter().map(|r| r.into_record(tier)).collect();
            if records.windows(2).any(|w| w[0].id >= w[1].id) {
                return Err(RecallError::Storage(format!(
                    "{tier} ids are not strictly increasing"
                )));
            }
            Ok(records)
        };

        Ok(Self {
            episodic: convert(doc.episodic, MemoryTier::Episodic)?,
            semantic: convert(doc.semantic, MemoryTier::Semantic)?,
            procedural: convert(doc.procedural, MemoryTier::Procedural)?,
        })
    }

    fn to_document(&self) -> StoreDocument {
        StoreDocument {
            episodic: self.episodic.iter().map(StoredRecord::from).collect(),
            semantic: self.semantic.iter().map(StoredRecord::from).collect(),
            procedural: self.procedural.iter().map(StoredRecord::from).collect(),
        }
    }

    fn stats(&self) -> MemoryStats {
        MemoryStats {
            episodic: self.episodic.len(),
            semantic: self.semantic.len(),
            procedural: self.procedural.len(),
        }
    }
}

/// Persistent store for the three memory tiers
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    tiers: RwLock<Tiers>,
    writer: Mutex<()>,
}

impl MemoryStore {
    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store and is not created; the file is
    /// only written by the first mutation.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tiers = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let doc: StoreDocument = serde_json::from_slice(&bytes).map_err(|e| {
                    RecallError::Storage(format!(
                        "Failed to parse memory store {}: {e}",
                        path.display()
                    ))
                })?;
                Tiers::from_document(doc)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No memory store at {}, starting empty", path.display());
                Tiers::default()
            }
            Err(e) => {
                return Err(RecallError::Storage(format!(
                    "Failed to read memory store {}: {e}",
                    path.display()
                )));
            }
        };

        let stats = tiers.stats();
        info!(
            path = %path.display(),
            episodic = stats.episodic,
            semantic = stats.semantic,
            procedural = stats.procedural,
            "Memory store loaded"
        );

        Ok(Self {
            path,
            tiers: RwLock::new(tiers),
            writer: Mutex::new(()),
        })
    }

    /// Location of the persisted document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records matching `query` in the requested tiers.
    ///
    /// Tiers are visited in declaration order (episodic, semantic, procedural)
    /// whatever order they are requested in; records keep insertion order.
    pub async fn search(&self, query: &str, tiers: &[MemoryTier]) -> Vec<MemoryRecord> {
        let tokens = QueryTokens::new(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let guard = self.tiers.read().await;
        let state: &Tiers = &guard;
        let results: Vec<MemoryRecord> = MemoryTier::ALL
            .into_iter()
            .filter(|tier| tiers.contains(tier))
            .flat_map(|tier| state.tier(tier).iter())
            .filter(|record| tokens.matches(&record.content))
            .cloned()
            .collect();

        debug!(query, matches = results.len(), "Memory search");
        results
    }

    /// Append a record to `tier` and persist the whole store before returning.
    ///
    /// The new id is one past the tier's last id, i.e. `count + 1` for a tier
    /// that has never had a record deleted.
    pub async fn write(
        &self,
        content: impl Into<String>,
        tier: MemoryTier,
        metadata: BTreeMap<String, String>,
    ) -> Result<MemoryRecord> {
        let _writer = self.writer.lock().await;

        let mut next = self.tiers.read().await.clone();
        let records = next.tier_mut(tier);
        let id = records.last().map_or(1, |last| last.id + 1);
        let record = MemoryRecord {
            id,
            tier,
            content: content.into(),
            timestamp: Utc::now(),
            metadata,
        };
        records.push(record.clone());

        self.persist(&next).await?;
        *self.tiers.write().await = next;

        debug!(tier = %tier, id, "Memory written");
        Ok(record)
    }

    /// Remove a record. Operator action only; the pipeline never deletes.
    pub async fn delete(&self, tier: MemoryTier, id: u64) -> Result<Option<MemoryRecord>> {
        let _writer = self.writer.lock().await;

        let mut next = self.tiers.read().await.clone();
        let records = next.tier_mut(tier);
        let Some(pos) = records.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let removed = records.remove(pos);

        self.persist(&next).await?;
        *self.tiers.write().await = next;

        info!(tier = %tier, id, "Memory deleted");
        Ok(Some(removed))
    }

    /// Store a fact in semantic memory
    pub async fn add_fact(&self, fact: &str, source: &str) -> Result<MemoryRecord> {
        let metadata = BTreeMap::from([("source".to_string(), source.to_string())]);
        self.write(fact, MemoryTier::Semantic, metadata).await
    }

    /// Store a user preference in procedural memory
    pub async fn add_user_preference(&self, user_id: &str, preference: &str) -> Result<MemoryRecord> {
        let metadata = BTreeMap::from([
            ("user_id".to_string(), user_id.to_string()),
            ("type".to_string(), "preference".to_string()),
        ]);
        self.write(preference, MemoryTier::Procedural, metadata).await
    }

    /// All records of one tier in insertion order
    pub async fn list(&self, tier: MemoryTier) -> Vec<MemoryRecord> {
        self.tiers.read().await.tier(tier).clone()
    }

    pub async fn get(&self, tier: MemoryTier, id: u64) -> Option<MemoryRecord> {
        self.tiers
            .read()
            .await
            .tier(tier)
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// All records, tier by tier
    pub async fn snapshot(&self) -> Vec<MemoryRecord> {
        let guard = self.tiers.read().await;
        let state: &Tiers = &guard;
        MemoryTier::ALL
            .into_iter()
            .flat_map(|tier| state.tier(tier).iter().cloned())
            .collect()
    }

    pub async fn stats(&self) -> MemoryStats {
        self.tiers.read().await.stats()
    }

    async fn persist(&self, tiers: &Tiers) -> Result<()> {
        let json = serde_json::to_vec_pretty(&tiers.to_document())
            .map_err(|e| RecallError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RecallError::Storage(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp = self.temp_path();
        let write_err =
            |e: std::io::Error| RecallError::Storage(format!("Failed to write {}: {e}", tmp.display()));
        let mut file = tokio::fs::File::create(&tmp).await.map_err(write_err)?;
        file.write_all(&json).await.map_err(write_err)?;
        // Contents must be on disk before the rename can expose them.
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            RecallError::Storage(format!(
                "Failed to replace memory store {}: {e}",
                self.path.display()
            ))
        })?;
        self.sync_parent_dir().await;

        Ok(())
    }

    /// Flush the directory entry written by the rename.
    ///
    /// Best effort: not every platform lets a directory be opened for syncing.
    async fn sync_parent_dir(&self) {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let synced = match tokio::fs::File::open(parent).await {
            Ok(dir) => dir.sync_all().await,
            Err(e) => Err(e),
        };
        if let Err(e) = synced {
            debug!("Could not sync {}: {}", parent.display(), e);
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "memory_store.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
