// Author entity + store.
//
// Authors own their quotes: deleting an author deletes every quote it owns,
// merging moves the quotes first. Both run inside one transaction so the
// review loop never observes a half-applied mutation.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub birth_year: Option<i64>,
    pub death_year: Option<i64>,
    pub nationality: Option<String>,
    pub profession: Option<String>,
    pub bio: Option<String>,
    pub needs_review: bool,
}

pub(crate) fn row_to_author(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        name: row.get(1)?,
        birth_year: row.get(2)?,
        death_year: row.get(3)?,
        nationality: row.get(4)?,
        profession: row.get(5)?,
        bio: row.get(6)?,
        needs_review: row.get::<_, i64>(7)? != 0,
    })
}

const AUTHOR_COLS: &str =
    "id, name, birth_year, death_year, nationality, profession, bio, needs_review";

pub struct AuthorStore<'a> {
    conn: &'a Connection,
}

impl<'a> AuthorStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        AuthorStore { conn }
    }

    pub fn all(&self) -> Result<Vec<Author>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {AUTHOR_COLS} FROM authors ORDER BY id"))?;
        let rows = stmt.query_map([], row_to_author)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get(&self, id: i64) -> Result<Option<Author>> {
        let author = self
            .conn
            .query_row(
                &format!("SELECT {AUTHOR_COLS} FROM authors WHERE id = ?1"),
                params![id],
                row_to_author,
            )
            .optional()?;
        Ok(author)
    }

    pub fn get_or_err(&self, id: i64) -> Result<Author> {
        self.get(id)?
            .ok_or_else(|| StoreError::not_found(format!("Author {id}")))
    }

    /// Exact-name lookup. Empty names are a validation error.
    pub fn get_by_name(&self, name: &str) -> Result<Option<Author>> {
        if name.is_empty() {
            return Err(StoreError::validation("author name must be non-empty"));
        }
        let author = self
            .conn
            .query_row(
                &format!("SELECT {AUTHOR_COLS} FROM authors WHERE name = ?1"),
                params![name],
                row_to_author,
            )
            .optional()?;
        Ok(author)
    }

    /// Partial-name search, case-insensitive.
    pub fn search(&self, name: &str) -> Result<Vec<Author>> {
        if name.is_empty() {
            return Err(StoreError::validation("author name must be non-empty"));
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {AUTHOR_COLS} FROM authors WHERE name LIKE ?1 ORDER BY name"
        ))?;
        let pattern = format!("%{name}%");
        let rows = stmt.query_map(params![pattern], row_to_author)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM authors", [], |r| r.get(0))?)
    }

    /// Authors with the most quotes, as (name, quote count) pairs.
    pub fn top_quoted(&self, limit: i64) -> Result<Vec<(String, i64)>> {
        if limit < 1 {
            return Err(StoreError::validation("limit must be a positive integer"));
        }
        let mut stmt = self.conn.prepare(
            "SELECT a.name, COUNT(q.id) AS quote_count
             FROM authors a JOIN quotes q ON q.author_id = a.id
             GROUP BY a.id ORDER BY quote_count DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn create(&self, name: &str) -> Result<Author> {
        if name.is_empty() {
            return Err(StoreError::validation("author name must be non-empty"));
        }
        let result = self
            .conn
            .execute("INSERT INTO authors (name) VALUES (?1)", params![name]);
        match result {
            Ok(_) => self.get_or_err(self.conn.last_insert_rowid()),
            Err(e) if StoreError::is_constraint_violation(&e) => {
                Err(StoreError::duplicate(format!("author '{name}'")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get an existing author by exact name or create a new one.
    pub fn get_or_create(&self, name: &str) -> Result<Author> {
        if let Some(author) = self.get_by_name(name)? {
            return Ok(author);
        }
        self.create(name)
    }

    /// Rename an author. A collision with another author's name is reported
    /// as Duplicate so the caller can offer a merge instead. A successful
    /// rename clears the review flag.
    pub fn rename(&self, id: i64, new_name: &str) -> Result<Author> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(StoreError::validation("author name must be non-empty"));
        }
        if let Some(existing) = self.get_by_name(new_name)? {
            if existing.id != id {
                return Err(StoreError::duplicate(format!("author '{new_name}'")));
            }
        }
        let updated = self.conn.execute(
            "UPDATE authors SET name = ?1, needs_review = 0 WHERE id = ?2",
            params![new_name, id],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("Author {id}")));
        }
        self.get_or_err(id)
    }

    /// Delete an author and every quote it owns.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.get_or_err(id)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM quotes WHERE author_id = ?1", params![id])?;
        tx.execute("DELETE FROM authors WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    /// Move every quote from `from_id` to `to_id`, then delete `from_id`.
    /// Returns the number of quotes moved.
    pub fn merge(&self, from_id: i64, to_id: i64) -> Result<usize> {
        if from_id == to_id {
            return Err(StoreError::validation("cannot merge an author into itself"));
        }
        self.get_or_err(from_id)?;
        self.get_or_err(to_id)?;
        let tx = self.conn.unchecked_transaction()?;
        let moved = tx.execute(
            "UPDATE quotes SET author_id = ?1 WHERE author_id = ?2",
            params![to_id, from_id],
        )?;
        tx.execute("DELETE FROM authors WHERE id = ?1", params![from_id])?;
        tx.commit()?;
        Ok(moved)
    }

    pub fn quote_count(&self, id: i64) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM quotes WHERE author_id = ?1",
            params![id],
            |r| r.get(0),
        )?)
    }

    // ------------------------------------------------------------------
    // Review flag
    // ------------------------------------------------------------------

    pub fn needs_review(&self, limit: Option<i64>) -> Result<Vec<Author>> {
        let sql = match limit {
            Some(n) if n < 1 => {
                return Err(StoreError::validation("limit must be a positive integer"))
            }
            Some(n) => format!(
                "SELECT {AUTHOR_COLS} FROM authors WHERE needs_review = 1 ORDER BY id LIMIT {n}"
            ),
            None => {
                format!("SELECT {AUTHOR_COLS} FROM authors WHERE needs_review = 1 ORDER BY id")
            }
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_author)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn mark_for_review(&self, id: i64) -> Result<()> {
        self.set_review_flag(id, true)
    }

    pub fn clear_review(&self, id: i64) -> Result<()> {
        self.set_review_flag(id, false)
    }

    fn set_review_flag(&self, id: i64, flag: bool) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE authors SET needs_review = ?1 WHERE id = ?2",
            params![flag as i64, id],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("Author {id}")));
        }
        Ok(())
    }

    pub fn count_needs_review(&self) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM authors WHERE needs_review = 1",
            [],
            |r| r.get(0),
        )?)
    }
}
