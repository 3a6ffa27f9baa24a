//! Mirror export: memory records to Markdown documents.

use std::fs;
use std::path::PathBuf;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mnemo_store::MemoryFilter;
use mnemo_types::{Memory, Result};

use crate::{MarkdownMirror, TIER_DIRS};

/// What an export run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
    /// Documents written.
    pub exported: usize,
    /// Documents whose tier directory changed, removing a stale copy.
    pub relocated: usize,
}

impl MarkdownMirror {
    /// Export one memory to its tier directory, removing stale copies left
    /// in other tiers. Returns the written path and whether a stale copy was
    /// removed.
    ///
    /// The `score` and `temperature` lines are recomputed from the clock at
    /// export time, so two exports of an unchanged record produce identical
    /// bytes only while the clock reads the same instant. Import ignores
    /// both fields; the stored record round-trips regardless.
    pub fn export(&self, memory: &Memory) -> Result<(PathBuf, bool)> {
        let now = self.clock.now();
        let score = self.scorer.maintenance_score(memory, now);
        let tier = if memory.archived {
            "archive"
        } else {
            self.classifier.classify(score).as_str()
        };

        let dir = self.root.join(&memory.owner_scope).join(tier);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.md", memory.id));
        fs::write(&path, render(memory, tier, score))?;

        let mut relocated = false;
        for stale_tier in TIER_DIRS.iter().filter(|t| **t != tier) {
            let stale = self
                .root
                .join(&memory.owner_scope)
                .join(stale_tier)
                .join(format!("{}.md", memory.id));
            if stale.exists() {
                fs::remove_file(&stale)?;
                relocated = true;
            }
        }
        Ok((path, relocated))
    }

    /// Export every memory in a scope, archived ones included.
    pub async fn export_all(&self, scope: &str) -> Result<ExportOutcome> {
        let memories = self
            .store
            .query(scope, &MemoryFilter::active().with_archived())
            .await?;

        let mut outcome = ExportOutcome::default();
        for memory in &memories {
            let (_, relocated) = self.export(memory)?;
            outcome.exported += 1;
            if relocated {
                outcome.relocated += 1;
            }
        }
        debug!(
            scope,
            exported = outcome.exported,
            relocated = outcome.relocated,
            "mirror export complete"
        );
        Ok(outcome)
    }
}

/// Render one memory as Markdown with YAML frontmatter.
///
/// Field order, float formatting, and timestamp precision are fixed so the
/// same record always renders the same bytes. `score` and `temperature` are
/// derived values included for the human reader; import ignores them.
fn render(memory: &Memory, tier: &str, score: f32) -> String {
    let mut doc = String::new();
    doc.push_str("---\n");
    doc.push_str(&format!("id: {}\n", memory.id));
    doc.push_str(&format!("owner_scope: {}\n", yaml_escape(&memory.owner_scope)));
    doc.push_str(&format!("temperature: {}\n", tier));
    doc.push_str(&format!("importance: {}\n", memory.importance));
    doc.push_str(&format!("access_count: {}\n", memory.access_count));
    doc.push_str(&format!(
        "created_at: {}\n",
        memory.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    ));
    doc.push_str(&format!(
        "last_accessed_at: {}\n",
        memory
            .last_accessed_at
            .to_rfc3339_opts(SecondsFormat::Micros, true)
    ));
    doc.push_str(&format!("score: {score:.4}\n"));
    if memory.tags.is_empty() {
        doc.push_str("tags: []\n");
    } else {
        doc.push_str("tags:\n");
        for tag in &memory.tags {
            doc.push_str(&format!("  - {}\n", yaml_escape(tag)));
        }
    }
    if memory.related_ids.is_empty() {
        doc.push_str("related: []\n");
    } else {
        doc.push_str("related:\n");
        for id in &memory.related_ids {
            doc.push_str(&format!("  - {id}\n"));
        }
    }
    doc.push_str(&format!("archived: {}\n", memory.archived));
    if let Some(at) = memory.archived_at {
        doc.push_str(&format!(
            "archived_at: {}\n",
            at.to_rfc3339_opts(SecondsFormat::Micros, true)
        ));
    }
    if let Some(since) = memory.cold_since {
        doc.push_str(&format!(
            "cold_since: {}\n",
            since.to_rfc3339_opts(SecondsFormat::Micros, true)
        ));
    }
    doc.push_str("---\n\n");
    doc.push_str(&memory.content);
    doc.push('\n');
    doc
}

/// Quote a string for a YAML frontmatter value when it needs it.
fn yaml_escape(s: &str) -> String {
    if s.contains(':')
        || s.contains('"')
        || s.contains('\'')
        || s.contains('#')
        || s.contains('{')
        || s.contains('}')
    {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        s.to_string()
    }
}
