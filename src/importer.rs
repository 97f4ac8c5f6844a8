// Batch importer for thequoteshub.com.
//
// Quotes are fetched page by page and committed one transaction per page.
// Progress is checkpointed to disk so an interrupted import resumes from
// the page after the last completed one. The run stops at max_pages or
// after three consecutive empty pages.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::db::Store;
use crate::entities::NewQuote;

pub const DEFAULT_API_BASE: &str = "https://thequoteshub.com/api";
pub const DEFAULT_CHECKPOINT_FILE: &str = "import_progress.json";
pub const DEFAULT_CATEGORIES_FILE: &str = "categories.json";

const MAX_EMPTY_PAGES: u32 = 3;
const PAGE_DELAY: Duration = Duration::from_millis(500);
const RULE: &str = "============================================================";

// ----------------------------------------------------------------------
// Checkpoint
// ----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_page: u64,
    pub total_imported: u64,
    pub total_failed: u64,
    pub total_skipped: u64,
    pub timestamp: i64,
}

impl Checkpoint {
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("writing checkpoint {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Option<Checkpoint>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading checkpoint {}", path.display()))?;
        let checkpoint = serde_json::from_str(&raw)
            .with_context(|| format!("parsing checkpoint {}", path.display()))?;
        Ok(Some(checkpoint))
    }

    pub fn clear(path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("removing checkpoint {}", path.display()))?;
            println!("Progress file cleared.");
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------
// API payloads
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiQuote {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The API answers either with a bare array of quotes or an object that
/// wraps them under a "quotes" key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiPage {
    List(Vec<ApiQuote>),
    Wrapped {
        #[serde(default)]
        quotes: Vec<ApiQuote>,
    },
}

pub fn parse_page(value: serde_json::Value) -> anyhow::Result<Vec<ApiQuote>> {
    let page: ApiPage = serde_json::from_value(value).context("unexpected page shape")?;
    Ok(match page {
        ApiPage::List(quotes) => quotes,
        ApiPage::Wrapped { quotes } => quotes,
    })
}

// ----------------------------------------------------------------------
// Importer
// ----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub page_size: u64,
    pub start_page: u64,
    pub max_pages: Option<u64>,
    pub resume: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            page_size: 100,
            start_page: 1,
            max_pages: None,
            resume: true,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ImportStats {
    pub pages_processed: u64,
    pub imported: u64,
    pub skipped: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct PageResult {
    success: u64,
    skip: u64,
    error: u64,
    empty: bool,
}

pub struct Importer<'a> {
    store: &'a Store,
    agent: ureq::Agent,
    base_url: String,
    checkpoint_path: PathBuf,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a Store) -> Self {
        Importer::with_base_url(store, DEFAULT_API_BASE)
    }

    pub fn with_base_url(store: &'a Store, base_url: impl Into<String>) -> Self {
        Importer {
            store,
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(15))
                .build(),
            base_url: base_url.into(),
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_FILE),
        }
    }

    pub fn checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = path.into();
        self
    }

    /// Load the category catalog from a `{name: [keywords]}` JSON file and
    /// upsert it into the database.
    pub fn load_categories(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        let catalog: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&raw).context("parsing category catalog")?;

        println!("Loading categories into database...");
        self.store.categories().sync_from_catalog(&catalog)?;
        println!("Loaded {} categories", catalog.len());
        Ok(())
    }

    fn fetch_page(&self, page: u64, page_size: u64) -> anyhow::Result<serde_json::Value> {
        let url = format!(
            "{}/quotes?page={page}&page_size={page_size}",
            self.base_url
        );
        let value = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("fetching page {page}"))?
            .into_json()
            .with_context(|| format!("decoding page {page}"))?;
        Ok(value)
    }

    /// Import one quote record. Returns true when a row was inserted, false
    /// for empty or duplicate text.
    fn import_record(&self, record: &ApiQuote) -> anyhow::Result<bool> {
        if record.text.is_empty() {
            return Ok(false);
        }
        if self.store.quotes().exists_text(&record.text)? {
            return Ok(false);
        }

        let author_name = match record.author.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "Unknown",
        };
        let author = self.store.authors().get_or_create(author_name)?;

        let source = match record.id {
            Some(id) => format!("thequoteshub.com (ID: {id})"),
            None => "thequoteshub.com".to_string(),
        };
        let quote = self.store.quotes().insert_full(&NewQuote {
            text: &record.text,
            author_id: author.id,
            source: Some(&source),
            tags: record.tags.clone(),
            ..NewQuote::default()
        })?;

        self.categorize(quote.id, &record.text)?;
        Ok(true)
    }

    /// Attach every category whose keyword list hits the quote text.
    fn categorize(&self, quote_id: i64, text: &str) -> anyhow::Result<()> {
        let text_lower = text.to_lowercase();
        for category in self.store.categories().all()? {
            if category
                .keywords
                .iter()
                .any(|keyword| text_lower.contains(keyword.as_str()))
            {
                self.store.quotes().add_to_category(quote_id, category.id)?;
            }
        }
        Ok(())
    }

    fn import_page(&self, page: u64, page_size: u64) -> PageResult {
        println!("\nFetching page {page} (up to {page_size} quotes)...");

        let value = match self.fetch_page(page, page_size) {
            Ok(value) => value,
            Err(e) => {
                println!("✗ Failed to fetch page {page}: {e:#}");
                return PageResult {
                    error: 1,
                    ..PageResult::default()
                };
            }
        };

        let records = match parse_page(value) {
            Ok(records) => records,
            Err(e) => {
                println!("✗ Failed to parse page {page}: {e:#}");
                return PageResult {
                    error: 1,
                    ..PageResult::default()
                };
            }
        };

        if records.is_empty() {
            println!("○ Page {page} is empty (end of data)");
            return PageResult {
                empty: true,
                ..PageResult::default()
            };
        }

        println!("Processing {} quotes from page {page}...", records.len());
        self.import_records(page, &records)
    }

    /// One transaction per page. A failure rolls the whole page back and
    /// counts every pending insert as failed.
    fn import_records(&self, page: u64, records: &[ApiQuote]) -> PageResult {
        let tx = match self.store.conn().unchecked_transaction() {
            Ok(tx) => tx,
            Err(e) => {
                println!("✗ Error starting transaction for page {page}: {e}");
                return PageResult {
                    error: records.len() as u64,
                    ..PageResult::default()
                };
            }
        };

        let mut result = PageResult::default();
        for record in records {
            match self.import_record(record) {
                Ok(true) => result.success += 1,
                Ok(false) => result.skip += 1,
                Err(e) => {
                    println!("✗ Error importing quote: {e:#}");
                    result.error += 1;
                }
            }
        }

        match tx.commit() {
            Ok(()) => {
                println!(
                    "✓ Page {page}: Added {}, Skipped {} duplicates",
                    result.success, result.skip
                );
                result
            }
            Err(e) => {
                println!("✗ Error committing page {page}: {e}");
                PageResult {
                    error: result.success,
                    skip: result.skip,
                    ..PageResult::default()
                }
            }
        }
    }

    /// Iterate pages until the end of data, a fetch limit, or max_pages.
    pub fn run(&self, config: &ImportConfig) -> anyhow::Result<ImportStats> {
        let mut stats = ImportStats::default();
        let mut current_page = config.start_page;

        if config.resume {
            match Checkpoint::load(&self.checkpoint_path)? {
                Some(progress) => {
                    current_page = progress.last_page + 1;
                    stats.imported = progress.total_imported;
                    stats.failed = progress.total_failed;
                    stats.skipped = progress.total_skipped;
                    println!("\n{RULE}");
                    println!("RESUMING FROM PREVIOUS SESSION");
                    println!("{RULE}");
                    println!("Last completed page: {}", progress.last_page);
                    println!("Previously imported: {}", stats.imported);
                    println!("Previously skipped: {}", stats.skipped);
                    println!("Previously failed: {}", stats.failed);
                    println!("Resuming from page: {current_page}");
                    println!("{RULE}\n");
                }
                None => println!("No progress file found. Starting fresh import."),
            }
        } else {
            Checkpoint::clear(&self.checkpoint_path)?;
        }

        let mut consecutive_empty: u32 = 0;
        let mut reached_end = false;

        loop {
            if let Some(max_pages) = config.max_pages {
                if stats.pages_processed >= max_pages {
                    println!("\nReached maximum page limit ({max_pages} pages)");
                    break;
                }
            }

            let result = self.import_page(current_page, config.page_size);
            stats.imported += result.success;
            stats.skipped += result.skip;
            stats.failed += result.error;

            // Checkpoint after every page so an interrupted or failed run
            // resumes from the page after the last one attempted.
            self.save_checkpoint(current_page, &stats)?;

            if result.empty {
                consecutive_empty += 1;
                println!("  Empty pages in a row: {consecutive_empty}/{MAX_EMPTY_PAGES}");
                if consecutive_empty >= MAX_EMPTY_PAGES {
                    println!("\n✓ Reached end of data ({MAX_EMPTY_PAGES} consecutive empty pages)");
                    reached_end = true;
                    break;
                }
            } else {
                consecutive_empty = 0;
            }

            if current_page % 10 == 0 {
                println!("\n--- Progress Update ---");
                println!("Pages processed: {}", stats.pages_processed + 1);
                println!("Total imported: {}", stats.imported);
                println!("Total skipped: {}", stats.skipped);
                println!("Total failed: {}", stats.failed);
                println!("----------------------\n");
            }

            current_page += 1;
            stats.pages_processed += 1;
            std::thread::sleep(PAGE_DELAY);
        }

        println!("\n{RULE}");
        println!("IMPORT COMPLETE!");
        println!("{RULE}");
        println!("Total pages processed: {}", stats.pages_processed);
        println!("Successfully imported: {}", stats.imported);
        println!("Skipped (duplicates): {}", stats.skipped);
        println!("Failed: {}", stats.failed);
        println!("{RULE}\n");

        if reached_end {
            println!("Import fully completed! Clearing progress file...");
            Checkpoint::clear(&self.checkpoint_path)?;
        } else if stats.pages_processed > 0 {
            println!(
                "Progress saved. Run again with resume to continue from page {current_page}."
            );
        }
        Ok(stats)
    }

    fn save_checkpoint(&self, last_page: u64, stats: &ImportStats) -> anyhow::Result<()> {
        Checkpoint {
            last_page,
            total_imported: stats.imported,
            total_failed: stats.failed,
            total_skipped: stats.skipped,
            timestamp: chrono::Utc::now().timestamp(),
        }
        .save(&self.checkpoint_path)
    }

    pub fn print_database_stats(&self) -> anyhow::Result<()> {
        let stats = self.store.stats()?;
        println!("\n{RULE}");
        println!("DATABASE STATISTICS");
        println!("{RULE}");
        println!("Total Quotes: {}", stats.total_quotes);
        println!("Total Authors: {}", stats.total_authors);
        println!("Total Categories: {}", stats.total_categories);
        println!("{RULE}\n");
        Ok(())
    }

    pub fn print_checkpoint_info(&self) -> anyhow::Result<()> {
        match Checkpoint::load(&self.checkpoint_path)? {
            Some(progress) => {
                println!("\n{RULE}");
                println!("SAVED PROGRESS FOUND");
                println!("{RULE}");
                println!("Last completed page: {}", progress.last_page);
                println!("Total imported: {}", progress.total_imported);
                println!("Total skipped: {}", progress.total_skipped);
                println!("Total failed: {}", progress.total_failed);
                println!("Next page to import: {}", progress.last_page + 1);
                println!("{RULE}\n");
            }
            None => println!("\nNo saved progress found."),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_checkpoint_roundtrip_and_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");

        assert!(Checkpoint::load(&path).unwrap().is_none());

        let checkpoint = Checkpoint {
            last_page: 12,
            total_imported: 1100,
            total_failed: 3,
            total_skipped: 42,
            timestamp: 1700000000,
        };
        checkpoint.save(&path).unwrap();
        assert_eq!(Checkpoint::load(&path).unwrap().unwrap(), checkpoint);

        Checkpoint::clear(&path).unwrap();
        assert!(Checkpoint::load(&path).unwrap().is_none());
        // Clearing twice is fine.
        Checkpoint::clear(&path).unwrap();
    }

    #[test]
    fn test_run_checkpoints_every_page_and_keeps_file_on_early_stop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");

        let store = Store::open_in_memory().unwrap();
        // Nothing listens on this port, so the only page fails to fetch.
        let importer =
            Importer::with_base_url(&store, "http://127.0.0.1:1").checkpoint_path(&path);

        let config = ImportConfig {
            max_pages: Some(1),
            resume: false,
            ..ImportConfig::default()
        };
        let stats = importer.run(&config).unwrap();
        assert_eq!(stats.pages_processed, 1);
        assert_eq!(stats.failed, 1);

        // The page was checkpointed as soon as it was attempted, and an
        // early stop leaves the file in place for the next run.
        let checkpoint = Checkpoint::load(&path).unwrap().unwrap();
        assert_eq!(checkpoint.last_page, 1);
        assert_eq!(checkpoint.total_failed, 1);
    }

    #[test]
    fn test_parse_page_bare_array() {
        let value = json!([
            {"id": 1, "text": "hello", "author": "A", "tags": ["t"]},
            {"id": 2, "text": "world"}
        ]);
        let records = parse_page(value).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tags, vec!["t"]);
        assert!(records[1].author.is_none());
    }

    #[test]
    fn test_parse_page_wrapped_object() {
        let value = json!({"quotes": [{"id": 7, "text": "wrapped"}], "page": 3});
        let records = parse_page(value).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "wrapped");
    }

    #[test]
    fn test_import_record_skips_empty_and_duplicate() {
        let store = Store::open_in_memory().unwrap();
        let importer = Importer::new(&store);

        let empty = ApiQuote {
            id: None,
            text: String::new(),
            author: None,
            tags: Vec::new(),
        };
        assert!(!importer.import_record(&empty).unwrap());

        let record = ApiQuote {
            id: Some(5),
            text: "fresh words".to_string(),
            author: Some("Somebody".to_string()),
            tags: vec!["life".to_string()],
        };
        assert!(importer.import_record(&record).unwrap());
        assert!(!importer.import_record(&record).unwrap());
        assert_eq!(store.quotes().count().unwrap(), 1);

        let quote = &store.quotes().all().unwrap()[0];
        assert_eq!(quote.source.as_deref(), Some("thequoteshub.com (ID: 5)"));
        assert_eq!(quote.tags, vec!["life"]);
    }

    #[test]
    fn test_import_record_falls_back_to_unknown_author() {
        let store = Store::open_in_memory().unwrap();
        let importer = Importer::new(&store);

        let record = ApiQuote {
            id: None,
            text: "anonymous words".to_string(),
            author: Some(String::new()),
            tags: Vec::new(),
        };
        assert!(importer.import_record(&record).unwrap());
        assert!(store.authors().get_by_name("Unknown").unwrap().is_some());
    }

    #[test]
    fn test_categorize_by_keywords() {
        let store = Store::open_in_memory().unwrap();
        store
            .categories()
            .create("love", &["love".to_string(), "heart".to_string()])
            .unwrap();
        store
            .categories()
            .create("war", &["battle".to_string()])
            .unwrap();

        let importer = Importer::new(&store);
        let record = ApiQuote {
            id: None,
            text: "Love conquers the heart".to_string(),
            author: Some("Poet".to_string()),
            tags: Vec::new(),
        };
        importer.import_record(&record).unwrap();

        assert_eq!(store.quotes().by_category("love", None).unwrap().len(), 1);
        assert!(store.quotes().by_category("war", None).unwrap().is_empty());
    }

    #[test]
    fn test_load_categories_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("categories.json");
        fs::write(
            &path,
            r#"{"wisdom": ["wise", "knowledge"], "humor": ["funny"]}"#,
        )
        .unwrap();

        let store = Store::open_in_memory().unwrap();
        let importer = Importer::new(&store);
        importer.load_categories(&path).unwrap();

        assert_eq!(store.categories().count().unwrap(), 2);
        assert_eq!(
            store
                .categories()
                .get_by_name("wisdom")
                .unwrap()
                .unwrap()
                .keywords,
            vec!["wise", "knowledge"]
        );
    }
}
