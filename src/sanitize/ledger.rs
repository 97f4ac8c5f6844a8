// Append-only ledger of author name changes.
//
// Every rename, merge and delete is recorded and the file is rewritten on
// each append, so a crash mid-session loses at most the change in flight.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_LEDGER_FILE: &str = "author_changes.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Renamed,
    Merged,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub author_id: i64,
    pub old_name: String,
    pub new_name: String,
    #[serde(default)]
    pub merged_with: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    changes: Vec<Change>,
    #[serde(default)]
    last_updated: String,
}

pub struct ChangeLedger {
    path: PathBuf,
    changes: Vec<Change>,
}

impl ChangeLedger {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut changes = Vec::new();
        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            match serde_json::from_str::<LedgerFile>(&raw) {
                Ok(file) => changes = file.changes,
                Err(e) => log::warn!("could not parse {}: {e}", path.display()),
            }
        }
        Ok(ChangeLedger { path, changes })
    }

    pub fn append(
        &mut self,
        kind: ChangeKind,
        author_id: i64,
        old_name: &str,
        new_name: &str,
        merged_with: Option<&str>,
    ) -> Result<()> {
        self.changes.push(Change {
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind,
            author_id,
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            merged_with: merged_with.map(str::to_string),
        });
        self.save()
    }

    /// The most recent `count` changes, oldest first.
    pub fn latest(&self, count: usize) -> &[Change] {
        let start = self.changes.len().saturating_sub(count);
        &self.changes[start..]
    }

    pub fn by_kind(&self, kind: ChangeKind) -> Vec<&Change> {
        self.changes.iter().filter(|c| c.kind == kind).collect()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_to(path.as_ref())
    }

    fn save(&self) -> Result<()> {
        self.write_to(&self.path)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let file = LedgerFile {
            changes: self.changes.clone(),
            last_updated: chrono::Utc::now().to_rfc3339(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changes.json");

        let mut ledger = ChangeLedger::load(&path).unwrap();
        ledger
            .append(ChangeKind::Renamed, 1, "C.S. Lewis", "C. S. Lewis", None)
            .unwrap();
        ledger
            .append(
                ChangeKind::Merged,
                2,
                "CS Lewis",
                "C. S. Lewis",
                Some("C. S. Lewis"),
            )
            .unwrap();

        let reloaded = ChangeLedger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.latest(1)[0].kind, ChangeKind::Merged);
        assert_eq!(reloaded.by_kind(ChangeKind::Renamed).len(), 1);
    }

    #[test]
    fn test_kind_serializes_uppercase() {
        let json = serde_json::to_string(&ChangeKind::Renamed).unwrap();
        assert_eq!(json, "\"RENAMED\"");
    }

    #[test]
    fn test_latest_window() {
        let dir = TempDir::new().unwrap();
        let mut ledger = ChangeLedger::load(dir.path().join("c.json")).unwrap();
        for i in 0..5 {
            ledger
                .append(ChangeKind::Deleted, i, &format!("old{i}"), "", None)
                .unwrap();
        }
        let latest = ledger.latest(3);
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].old_name, "old2");
        assert_eq!(ledger.latest(10).len(), 5);
    }
}
