// User favorites for quotes and authors.
//
// Adding an already-favorited item is a Duplicate error, removing one that
// was never favorited is NotFound, matching the store-wide taxonomy.

use rusqlite::{params, Connection};

use crate::entities::{Author, Quote};
use crate::error::{Result, StoreError};

/// What kind of thing a favorite points at. Picks the link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteKind {
    Quote,
    Author,
}

impl FavoriteKind {
    fn table(self) -> &'static str {
        match self {
            FavoriteKind::Quote => "user_quote_favorites",
            FavoriteKind::Author => "user_author_favorites",
        }
    }

    fn target_table(self) -> &'static str {
        match self {
            FavoriteKind::Quote => "quotes",
            FavoriteKind::Author => "authors",
        }
    }

    fn target_col(self) -> &'static str {
        match self {
            FavoriteKind::Quote => "quote_id",
            FavoriteKind::Author => "author_id",
        }
    }

    fn label(self) -> &'static str {
        match self {
            FavoriteKind::Quote => "Quote",
            FavoriteKind::Author => "Author",
        }
    }
}

pub struct FavoritesStore<'a> {
    conn: &'a Connection,
}

impl<'a> FavoritesStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        FavoritesStore { conn }
    }

    fn check_exists(&self, table: &str, label: &str, id: i64) -> Result<()> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"),
            params![id],
            |r| r.get(0),
        )?;
        if count == 0 {
            return Err(StoreError::not_found(format!("{label} {id}")));
        }
        Ok(())
    }

    fn check_user_and_target(&self, user_id: i64, kind: FavoriteKind, target_id: i64) -> Result<()> {
        self.check_exists("users", "User", user_id)?;
        self.check_exists(kind.target_table(), kind.label(), target_id)
    }

    pub fn add(&self, user_id: i64, kind: FavoriteKind, target_id: i64) -> Result<()> {
        self.check_user_and_target(user_id, kind, target_id)?;
        if self.is_favorited(user_id, kind, target_id)? {
            return Err(StoreError::duplicate(format!(
                "favorite {} {target_id} for user {user_id}",
                kind.label()
            )));
        }
        let now = chrono::Utc::now().to_rfc3339();
        let sql = format!(
            "INSERT INTO {} (user_id, {}, favorited_at) VALUES (?1, ?2, ?3)",
            kind.table(),
            kind.target_col()
        );
        self.conn.execute(&sql, params![user_id, target_id, now])?;
        Ok(())
    }

    pub fn remove(&self, user_id: i64, kind: FavoriteKind, target_id: i64) -> Result<()> {
        self.check_user_and_target(user_id, kind, target_id)?;
        let sql = format!(
            "DELETE FROM {} WHERE user_id = ?1 AND {} = ?2",
            kind.table(),
            kind.target_col()
        );
        let deleted = self.conn.execute(&sql, params![user_id, target_id])?;
        if deleted == 0 {
            return Err(StoreError::not_found(format!(
                "{} {target_id} in favorites",
                kind.label()
            )));
        }
        Ok(())
    }

    pub fn is_favorited(&self, user_id: i64, kind: FavoriteKind, target_id: i64) -> Result<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = ?1 AND {} = ?2",
            kind.table(),
            kind.target_col()
        );
        let count: i64 = self
            .conn
            .query_row(&sql, params![user_id, target_id], |r| r.get(0))?;
        Ok(count > 0)
    }

    pub fn count(&self, user_id: i64, kind: FavoriteKind) -> Result<i64> {
        self.check_exists("users", "User", user_id)?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", kind.table());
        Ok(self.conn.query_row(&sql, params![user_id], |r| r.get(0))?)
    }

    /// A user's favorite quotes, most recently favorited first.
    pub fn quotes_for_user(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<Quote>> {
        self.check_exists("users", "User", user_id)?;
        let limit_clause = Self::limit_clause(limit)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT q.id, q.text, q.author_id, q.year, q.source, q.context, q.tags,
                    q.created_at, q.verified, q.needs_review
             FROM quotes q JOIN user_quote_favorites f ON f.quote_id = q.id
             WHERE f.user_id = ?1 ORDER BY f.favorited_at DESC, q.id DESC {limit_clause}"
        ))?;
        let rows = stmt.query_map(params![user_id], crate::entities::quote::row_to_quote)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// A user's favorite authors, most recently favorited first.
    pub fn authors_for_user(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<Author>> {
        self.check_exists("users", "User", user_id)?;
        let limit_clause = Self::limit_clause(limit)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT a.id, a.name, a.birth_year, a.death_year, a.nationality,
                    a.profession, a.bio, a.needs_review
             FROM authors a JOIN user_author_favorites f ON f.author_id = a.id
             WHERE f.user_id = ?1 ORDER BY f.favorited_at DESC, a.id DESC {limit_clause}"
        ))?;
        let rows = stmt.query_map(params![user_id], crate::entities::author::row_to_author)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Authors ranked by favorite count, zero-favorite authors included.
    pub fn most_favorited_authors(&self, limit: i64) -> Result<Vec<(Author, i64)>> {
        if limit < 1 {
            return Err(StoreError::validation("limit must be a positive integer"));
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT a.id, a.name, a.birth_year, a.death_year, a.nationality,
                    a.profession, a.bio, a.needs_review, COUNT(f.user_id) AS fav_count
             FROM authors a LEFT JOIN user_author_favorites f ON f.author_id = a.id
             GROUP BY a.id ORDER BY fav_count DESC LIMIT {limit}"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((crate::entities::author::row_to_author(row)?, row.get(8)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn limit_clause(limit: Option<i64>) -> Result<String> {
        match limit {
            Some(n) if n < 1 => Err(StoreError::validation("limit must be a positive integer")),
            Some(n) => Ok(format!("LIMIT {n}")),
            None => Ok(String::new()),
        }
    }
}
