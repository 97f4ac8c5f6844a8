use rusqlite::Connection;
use std::path::Path;

use crate::entities::{AuthorStore, CategoryStore, FavoritesStore, QuoteStore, UserStore};
use crate::error::Result;

/// Default database file, created next to the list files.
pub const DEFAULT_DB_PATH: &str = "quotes.db";

/// Owns the SQLite connection and hands out per-entity stores.
///
/// One `Store` per session; every mutation goes through the same connection,
/// so a decision in the review loop is a single transaction boundary.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Store> {
        let conn = Connection::open(path.as_ref())?;
        setup_database(&conn)?;
        Ok(Store { conn })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Store> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Store { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn authors(&self) -> AuthorStore<'_> {
        AuthorStore::new(&self.conn)
    }

    pub fn quotes(&self) -> QuoteStore<'_> {
        QuoteStore::new(&self.conn)
    }

    pub fn categories(&self) -> CategoryStore<'_> {
        CategoryStore::new(&self.conn)
    }

    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    pub fn favorites(&self) -> FavoritesStore<'_> {
        FavoritesStore::new(&self.conn)
    }

    /// Overall database statistics.
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total_quotes: self.quotes().count()?,
            total_authors: self.authors().count()?,
            total_categories: self.categories().count()?,
            total_users: self.users().count()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    pub total_quotes: i64,
    pub total_authors: i64,
    pub total_categories: i64,
    pub total_users: i64,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            birth_year INTEGER,
            death_year INTEGER,
            nationality TEXT,
            profession TEXT,
            bio TEXT,
            needs_review INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS quotes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            author_id INTEGER NOT NULL REFERENCES authors(id),
            year INTEGER,
            source TEXT,
            context TEXT,
            tags TEXT,
            created_at TEXT NOT NULL,
            verified INTEGER NOT NULL DEFAULT 0,
            needs_review INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            keywords TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            last_login TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    // Many-to-many link tables
    conn.execute(
        "CREATE TABLE IF NOT EXISTS quote_categories (
            quote_id INTEGER NOT NULL REFERENCES quotes(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            UNIQUE(quote_id, category_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS user_quote_favorites (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            quote_id INTEGER NOT NULL REFERENCES quotes(id) ON DELETE CASCADE,
            favorited_at TEXT NOT NULL,
            UNIQUE(user_id, quote_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS user_author_favorites (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
            favorited_at TEXT NOT NULL,
            UNIQUE(user_id, author_id)
        )",
        [],
    )?;

    // Indexes
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quotes_author ON quotes(author_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quotes_needs_review ON quotes(needs_review)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_authors_needs_review ON authors(needs_review)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quotes_created ON quotes(created_at)",
        [],
    )?;

    Ok(())
}
