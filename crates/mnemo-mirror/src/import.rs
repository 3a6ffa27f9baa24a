//! Mirror import: Markdown documents back into the store.
//!
//! Mirror files are human-editable, so import is defensive: malformed
//! documents are skipped with a warning, and a store record recalled more
//! recently than the file wins the merge. The mirrored `score` and
//! `temperature` fields are display-only and never read back.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use mnemo_types::{HierarchyError, Memory, Result};

use crate::MarkdownMirror;

/// What an import run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Documents merged into the store.
    pub imported: usize,
    /// Documents dropped because the store record was recalled more recently.
    pub conflicts: usize,
    /// Documents skipped as unreadable or malformed.
    pub skipped: usize,
}

/// The fields import reads from a document's frontmatter.
#[derive(Debug, Deserialize)]
struct FrontMatter {
    id: String,
    owner_scope: String,
    importance: f32,
    access_count: u32,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    related: BTreeSet<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    cold_since: Option<DateTime<Utc>>,
}

impl MarkdownMirror {
    /// Import every `.md` document under `path` (a directory or a single
    /// file), merging with last-writer-wins on `last_accessed_at`.
    pub async fn import_path(&self, path: &Path) -> Result<ImportOutcome> {
        let matter = Matter::<YAML>::new();
        let mut outcome = ImportOutcome::default();

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "unreadable mirror entry, skipping");
                    outcome.skipped += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file()
                || entry.path().extension().map_or(true, |ext| ext != "md")
            {
                continue;
            }

            let memory = match parse_document(&matter, entry.path()) {
                Ok(m) => m,
                Err(e) => {
                    warn!(error = %e, "malformed mirror document, skipping");
                    outcome.skipped += 1;
                    continue;
                }
            };

            let existing = self.store.get(&memory.owner_scope, &memory.id).await?;
            if let Some(existing) = existing {
                if existing.last_accessed_at > memory.last_accessed_at {
                    warn!(
                        id = %memory.id,
                        "store record is newer than mirror document, keeping store"
                    );
                    outcome.conflicts += 1;
                    continue;
                }
            }
            self.store.upsert(memory).await?;
            outcome.imported += 1;
        }

        debug!(
            path = %path.display(),
            imported = outcome.imported,
            conflicts = outcome.conflicts,
            skipped = outcome.skipped,
            "mirror import complete"
        );
        Ok(outcome)
    }
}

fn parse_document(matter: &Matter<YAML>, path: &Path) -> Result<Memory> {
    let raw = fs::read_to_string(path)?;
    let parsed = matter.parse(&raw);
    let pod = parsed.data.ok_or_else(|| HierarchyError::MirrorFormat {
        path: path.display().to_string(),
        reason: "missing frontmatter".to_string(),
    })?;
    let front: FrontMatter = pod
        .deserialize()
        .map_err(|e| HierarchyError::MirrorFormat {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    Ok(Memory {
        id: front.id,
        owner_scope: front.owner_scope,
        content: parsed.content.trim().to_string(),
        importance: front.importance.clamp(0.0, 1.0),
        access_count: front.access_count,
        created_at: front.created_at,
        last_accessed_at: front.last_accessed_at,
        tags: front.tags,
        related_ids: front.related,
        archived: front.archived,
        archived_at: front.archived_at,
        cold_since: front.cold_since,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};
    use mnemo_engine::{ExponentialDecay, RecallScorer, TemperatureClassifier};
    use mnemo_store::{FixedClock, InMemoryStore, MemoryStore};
    use mnemo_types::ScoreWeights;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn mirror(store: Arc<InMemoryStore>, root: &Path) -> MarkdownMirror {
        let scorer = RecallScorer::new(
            ScoreWeights::default(),
            Arc::new(ExponentialDecay::with_defaults()),
        )
        .unwrap();
        MarkdownMirror::new(
            store,
            Arc::new(FixedClock::new(t0())),
            scorer,
            TemperatureClassifier::with_defaults(),
            root,
        )
    }

    #[tokio::test]
    async fn test_round_trip_preserves_memory() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let mut original = Memory::new("alice", "the API gateway is nginx", 0.7, t0())
            .with_tag("infra")
            .with_related("01HREL");
        original.access_count = 3;
        original.cold_since = Some(t0() - Duration::days(5));
        store.upsert(original.clone()).await.unwrap();

        let mirror = mirror(store, dir.path());
        mirror.export_all("alice").await.unwrap();

        // Re-import into a fresh store.
        let empty = Arc::new(InMemoryStore::new());
        let importer = self::mirror(empty.clone(), dir.path());
        let outcome = importer.import_path(dir.path()).await.unwrap();

        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.conflicts, 0);
        let restored = empty.get("alice", &original.id).await.unwrap().unwrap();
        assert_eq!(restored, original);
    }

    #[tokio::test]
    async fn test_newer_store_record_wins() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let mut m = Memory::new("alice", "original wording", 0.5, t0());
        store.upsert(m.clone()).await.unwrap();

        let mirror = mirror(store.clone(), dir.path());
        mirror.export_all("alice").await.unwrap();

        // A recall lands after the export.
        m.last_accessed_at = t0() + Duration::hours(1);
        m.access_count = 1;
        store.upsert(m.clone()).await.unwrap();

        let outcome = mirror.import_path(dir.path()).await.unwrap();
        assert_eq!(outcome.conflicts, 1);
        assert_eq!(outcome.imported, 0);
        let kept = store.get("alice", &m.id).await.unwrap().unwrap();
        assert_eq!(kept.access_count, 1);
        assert_eq!(kept.content, "original wording");
    }

    #[tokio::test]
    async fn test_edited_document_updates_store() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let m = Memory::new("alice", "the old wording", 0.5, t0());
        store.upsert(m.clone()).await.unwrap();

        let mirror = mirror(store.clone(), dir.path());
        mirror.export_all("alice").await.unwrap();

        // A human fixes the content in place.
        let path = dir
            .path()
            .join("alice")
            .join("cool")
            .join(format!("{}.md", m.id));
        let edited = fs::read_to_string(&path)
            .unwrap()
            .replace("the old wording", "the corrected wording");
        fs::write(&path, edited).unwrap();

        let outcome = mirror.import_path(dir.path()).await.unwrap();
        assert_eq!(outcome.imported, 1);
        let merged = store.get("alice", &m.id).await.unwrap().unwrap();
        assert_eq!(merged.content, "the corrected wording");
    }

    #[tokio::test]
    async fn test_malformed_document_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let m = Memory::new("alice", "good one", 0.5, t0());
        store.upsert(m.clone()).await.unwrap();

        let mirror = mirror(store.clone(), dir.path());
        mirror.export_all("alice").await.unwrap();
        fs::write(dir.path().join("alice").join("broken.md"), "no frontmatter here").unwrap();

        let outcome = mirror.import_path(dir.path()).await.unwrap();
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.imported, 1);
    }

    #[tokio::test]
    async fn test_mirrored_score_is_not_read_back() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let m = Memory::new("alice", "score is derived", 0.5, t0());
        store.upsert(m.clone()).await.unwrap();

        let mirror = mirror(store.clone(), dir.path());
        mirror.export_all("alice").await.unwrap();

        // Tamper with the mirrored score; the record must import unchanged.
        let path = dir
            .path()
            .join("alice")
            .join("cool")
            .join(format!("{}.md", m.id));
        let tampered = fs::read_to_string(&path)
            .unwrap()
            .replace("score: 0.", "score: 9.");
        fs::write(&path, tampered).unwrap();

        let outcome = mirror.import_path(dir.path()).await.unwrap();
        assert_eq!(outcome.imported, 1);
        let restored = store.get("alice", &m.id).await.unwrap().unwrap();
        assert_eq!(restored, m);
    }
}
