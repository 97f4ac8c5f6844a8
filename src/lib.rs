// QuoteKeeper - Core Library
// Exposes all modules for use in the CLI and tests

pub mod db;
pub mod entities;
pub mod error;
pub mod importer;
pub mod sanitize;

// Re-export commonly used types
pub use db::{setup_database, Store, StoreStats, DEFAULT_DB_PATH};
pub use entities::{
    Author, AuthorStore, Category, CategoryStore, FavoriteKind, FavoritesStore, NewQuote, Quote,
    QuoteStore, SearchQuery, User, UserStore,
};
pub use error::{Result, StoreError};
pub use importer::{ApiQuote, Checkpoint, ImportConfig, ImportStats, Importer};
pub use sanitize::{
    AllowList, Change, ChangeKind, ChangeLedger, DenyList, FormatSuggester, GarbageDetector,
    NameClassifier, ReviewSession, Template,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
