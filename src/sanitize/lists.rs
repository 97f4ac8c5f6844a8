// Allow-list and deny-list for author names, persisted as JSON.
//
// A missing file loads as an empty list. Deny-list patterns that fail to
// compile are skipped with a warning rather than poisoning the whole list.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_ALLOW_FILE: &str = "author_allowlist.json";
pub const DEFAULT_DENY_FILE: &str = "author_denylist.json";

// ----------------------------------------------------------------------
// Allow-list
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowEntry {
    pub added: String,
    pub notes: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AllowFile {
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    metadata: BTreeMap<String, AllowEntry>,
    #[serde(default)]
    count: usize,
    #[serde(default)]
    last_updated: String,
}

/// Names known to be correct. A listed name is never flagged, whatever the
/// other heuristics say.
pub struct AllowList {
    path: PathBuf,
    names: BTreeSet<String>,
    metadata: BTreeMap<String, AllowEntry>,
}

impl AllowList {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut list = AllowList {
            path,
            names: BTreeSet::new(),
            metadata: BTreeMap::new(),
        };
        if list.path.exists() {
            let raw = fs::read_to_string(&list.path)?;
            match serde_json::from_str::<AllowFile>(&raw) {
                Ok(file) => {
                    list.names = file.names.into_iter().collect();
                    list.metadata = file.metadata;
                }
                Err(e) => {
                    log::warn!("could not parse {}: {e}", list.path.display());
                }
            }
        }
        Ok(list)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn add(&mut self, name: &str, notes: &str) -> Result<()> {
        self.names.insert(name.to_string());
        if !notes.is_empty() {
            self.metadata.insert(
                name.to_string(),
                AllowEntry {
                    added: chrono::Utc::now().to_rfc3339(),
                    notes: notes.to_string(),
                },
            );
        }
        self.save()
    }

    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let removed = self.names.remove(name);
        self.metadata.remove(name);
        self.save()?;
        Ok(removed)
    }

    pub fn save(&self) -> Result<()> {
        self.write_to(&self.path)
    }

    /// Write a copy of the list to another path.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_to(path.as_ref())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let file = AllowFile {
            names: self.names.iter().cloned().collect(),
            metadata: self.metadata.clone(),
            count: self.names.len(),
            last_updated: chrono::Utc::now().to_rfc3339(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Deny-list
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenyPattern {
    pub pattern: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DenyFile {
    #[serde(default)]
    patterns: Vec<DenyPattern>,
    #[serde(default)]
    exact_names: Vec<String>,
    #[serde(default)]
    total_patterns: usize,
    #[serde(default)]
    total_names: usize,
    #[serde(default)]
    last_updated: String,
}

/// Names and regex patterns known to be bad.
pub struct DenyList {
    path: PathBuf,
    patterns: Vec<DenyPattern>,
    compiled: Vec<Option<Regex>>,
    exact_names: BTreeSet<String>,
}

impl DenyList {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut list = DenyList {
            path,
            patterns: Vec::new(),
            compiled: Vec::new(),
            exact_names: BTreeSet::new(),
        };
        if list.path.exists() {
            let raw = fs::read_to_string(&list.path)?;
            match serde_json::from_str::<DenyFile>(&raw) {
                Ok(file) => {
                    list.exact_names = file.exact_names.into_iter().collect();
                    for entry in file.patterns {
                        list.push_pattern(entry);
                    }
                }
                Err(e) => {
                    log::warn!("could not parse {}: {e}", list.path.display());
                }
            }
        }
        Ok(list)
    }

    fn push_pattern(&mut self, entry: DenyPattern) {
        match Regex::new(&entry.pattern) {
            Ok(re) => self.compiled.push(Some(re)),
            Err(e) => {
                log::warn!("skipping unparseable deny pattern {:?}: {e}", entry.pattern);
                self.compiled.push(None);
            }
        }
        self.patterns.push(entry);
    }

    /// Match a name against the list. Exact matches win over patterns and
    /// report a fixed reason. Pattern hits report the pattern's own reason.
    pub fn matches(&self, name: &str) -> Option<String> {
        if self.exact_names.contains(name) {
            return Some("exact match in deny-list".to_string());
        }
        for (entry, compiled) in self.patterns.iter().zip(&self.compiled) {
            if let Some(re) = compiled {
                if re.is_match(name) {
                    let reason = if entry.reason.is_empty() {
                        "matched pattern"
                    } else {
                        &entry.reason
                    };
                    return Some(reason.to_string());
                }
            }
        }
        None
    }

    pub fn add_pattern(&mut self, pattern: &str, reason: &str) -> Result<()> {
        self.push_pattern(DenyPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        });
        self.save()
    }

    pub fn add_exact(&mut self, name: &str) -> Result<()> {
        self.exact_names.insert(name.to_string());
        self.save()
    }

    pub fn patterns(&self) -> &[DenyPattern] {
        &self.patterns
    }

    pub fn exact_names(&self) -> impl Iterator<Item = &String> {
        self.exact_names.iter()
    }

    pub fn save(&self) -> Result<()> {
        self.write_to(&self.path)
    }

    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_to(path.as_ref())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let file = DenyFile {
            patterns: self.patterns.clone(),
            exact_names: self.exact_names.iter().cloned().collect(),
            total_patterns: self.patterns.len(),
            total_names: self.exact_names.len(),
            last_updated: chrono::Utc::now().to_rfc3339(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}
