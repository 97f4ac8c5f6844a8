// Quote entity + store.
//
// Tags are stored as a JSON array in a TEXT column. A missing or empty
// column deserializes to an empty Vec, so callers never see an Option.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub id: i64,
    pub text: String,
    pub author_id: i64,
    pub year: Option<i64>,
    pub source: Option<String>,
    pub context: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub verified: bool,
    pub needs_review: bool,
}

/// Fields for a new quote. `text` and `author_id` are required, the rest
/// default to empty.
#[derive(Debug, Default)]
pub struct NewQuote<'a> {
    pub text: &'a str,
    pub author_id: i64,
    pub year: Option<i64>,
    pub source: Option<&'a str>,
    pub context: Option<&'a str>,
    pub tags: Vec<String>,
    pub verified: bool,
}

/// Combined search filters. Unset fields do not constrain the query.
/// The `match_all_*` switches flip OR semantics to AND for their list.
#[derive(Debug, Default)]
pub struct SearchQuery<'a> {
    pub text: Vec<&'a str>,
    pub author: Option<&'a str>,
    pub categories: Vec<&'a str>,
    pub limit: Option<i64>,
    pub match_all_text: bool,
    pub match_all_categories: bool,
}

const DEFAULT_SEARCH_LIMIT: usize = 20;

fn decode_tags(raw: Option<String>) -> Vec<String> {
    match raw {
        Some(s) if !s.is_empty() => serde_json::from_str(&s).unwrap_or_default(),
        _ => Vec::new(),
    }
}

pub(crate) fn row_to_quote(row: &Row<'_>) -> rusqlite::Result<Quote> {
    Ok(Quote {
        id: row.get(0)?,
        text: row.get(1)?,
        author_id: row.get(2)?,
        year: row.get(3)?,
        source: row.get(4)?,
        context: row.get(5)?,
        tags: decode_tags(row.get(6)?),
        created_at: row.get(7)?,
        verified: row.get::<_, i64>(8)? != 0,
        needs_review: row.get::<_, i64>(9)? != 0,
    })
}

const QUOTE_COLS: &str =
    "id, text, author_id, year, source, context, tags, created_at, verified, needs_review";

fn prefixed_cols(prefix: &str) -> String {
    QUOTE_COLS
        .split(", ")
        .map(|c| format!("{prefix}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct QuoteStore<'a> {
    conn: &'a Connection,
}

impl<'a> QuoteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        QuoteStore { conn }
    }

    fn check_limit(limit: i64) -> Result<()> {
        if limit < 1 {
            return Err(StoreError::validation("limit must be a positive integer"));
        }
        Ok(())
    }

    pub fn all(&self) -> Result<Vec<Quote>> {
        self.query(&format!("SELECT {QUOTE_COLS} FROM quotes ORDER BY id"), [])
    }

    pub fn get(&self, id: i64) -> Result<Option<Quote>> {
        let quote = self
            .conn
            .query_row(
                &format!("SELECT {QUOTE_COLS} FROM quotes WHERE id = ?1"),
                params![id],
                row_to_quote,
            )
            .optional()?;
        Ok(quote)
    }

    pub fn get_or_err(&self, id: i64) -> Result<Quote> {
        self.get(id)?
            .ok_or_else(|| StoreError::not_found(format!("Quote {id}")))
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM quotes", [], |r| r.get(0))?)
    }

    /// Whether any quote with exactly this text already exists. Used by the
    /// importer to skip duplicates before inserting.
    pub fn exists_text(&self, text: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM quotes WHERE text = ?1",
            params![text],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn insert(&self, text: &str, author_id: i64, source: Option<&str>) -> Result<Quote> {
        self.insert_full(&NewQuote {
            text,
            author_id,
            source,
            ..NewQuote::default()
        })
    }

    pub fn insert_full(&self, new: &NewQuote<'_>) -> Result<Quote> {
        let text = new.text.trim();
        if text.is_empty() {
            return Err(StoreError::validation("quote text must be non-empty"));
        }
        let tags_json = serde_json::to_string(&new.tags)?;
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO quotes (text, author_id, year, source, context, tags, created_at, verified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                text,
                new.author_id,
                new.year,
                new.source,
                new.context,
                tags_json,
                created_at,
                new.verified as i64,
            ],
        )?;
        self.get_or_err(self.conn.last_insert_rowid())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM quotes WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::not_found(format!("Quote {id}")));
        }
        Ok(())
    }

    /// Flexible filtered search. Text terms, partial author name and
    /// category names all narrow the result together.
    pub fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<Quote>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(author) = query.author {
            args.push(format!("%{author}%"));
            clauses.push(format!(
                "q.author_id IN (SELECT id FROM authors WHERE name LIKE ?{})",
                args.len()
            ));
        }

        if !query.categories.is_empty() {
            if query.match_all_categories {
                for name in &query.categories {
                    args.push(name.to_string());
                    clauses.push(format!(
                        "q.id IN (SELECT qc.quote_id FROM quote_categories qc
                                  JOIN categories c ON c.id = qc.category_id
                                  WHERE c.name = ?{})",
                        args.len()
                    ));
                }
            } else {
                let placeholders: Vec<String> = query
                    .categories
                    .iter()
                    .map(|name| {
                        args.push(name.to_string());
                        format!("?{}", args.len())
                    })
                    .collect();
                clauses.push(format!(
                    "q.id IN (SELECT qc.quote_id FROM quote_categories qc
                              JOIN categories c ON c.id = qc.category_id
                              WHERE c.name IN ({}))",
                    placeholders.join(", ")
                ));
            }
        }

        if !query.text.is_empty() {
            let joiner = if query.match_all_text { " AND " } else { " OR " };
            let term_clauses: Vec<String> = query
                .text
                .iter()
                .map(|term| {
                    args.push(format!("%{term}%"));
                    format!("q.text LIKE ?{}", args.len())
                })
                .collect();
            clauses.push(format!("({})", term_clauses.join(joiner)));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let limit_clause = match query.limit {
            Some(n) => {
                Self::check_limit(n)?;
                format!("LIMIT {n}")
            }
            None => String::new(),
        };
        let sql = format!(
            "SELECT {} FROM quotes q {where_clause} ORDER BY q.id {limit_clause}",
            prefixed_cols("q")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), row_to_quote)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Search with relevance scoring: results are ordered by how many of
    /// the text terms each quote contains, highest first. Without text
    /// terms this is a plain filtered search.
    pub fn advanced_search(&self, query: &SearchQuery<'_>) -> Result<Vec<Quote>> {
        let limit = match query.limit {
            Some(n) => {
                Self::check_limit(n)?;
                n as usize
            }
            None => DEFAULT_SEARCH_LIMIT,
        };

        let unlimited = SearchQuery {
            text: query.text.clone(),
            author: query.author,
            categories: query.categories.clone(),
            limit: None,
            match_all_text: query.match_all_text,
            match_all_categories: query.match_all_categories,
        };
        let mut results = self.search(&unlimited)?;

        if query.text.is_empty() {
            results.truncate(limit);
            return Ok(results);
        }

        let terms: Vec<String> = query.text.iter().map(|t| t.to_lowercase()).collect();
        let mut scored: Vec<(Quote, usize)> = results
            .drain(..)
            .map(|quote| {
                let haystack = quote.text.to_lowercase();
                let score = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                (quote, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(quote, _)| quote).collect())
    }

    /// Random quotes, optionally restricted to one category.
    pub fn random(&self, category: Option<&str>, count: i64) -> Result<Vec<Quote>> {
        Self::check_limit(count)?;
        match category {
            Some(name) => self.query(
                &format!(
                    "SELECT {QUOTE_COLS} FROM quotes WHERE id IN (
                         SELECT qc.quote_id FROM quote_categories qc
                         JOIN categories c ON c.id = qc.category_id
                         WHERE c.name = ?1
                     ) ORDER BY RANDOM() LIMIT {count}"
                ),
                params![name],
            ),
            None => self.query(
                &format!("SELECT {QUOTE_COLS} FROM quotes ORDER BY RANDOM() LIMIT {count}"),
                [],
            ),
        }
    }

    /// Quotes by partial author-name match.
    pub fn by_author(&self, author_name: &str, limit: Option<i64>) -> Result<Vec<Quote>> {
        if author_name.is_empty() {
            return Err(StoreError::validation("author name must be non-empty"));
        }
        let limit_clause = match limit {
            Some(n) => {
                Self::check_limit(n)?;
                format!("LIMIT {n}")
            }
            None => String::new(),
        };
        let sql = format!(
            "SELECT {QUOTE_COLS} FROM quotes WHERE author_id IN (
                 SELECT id FROM authors WHERE name LIKE ?1
             ) ORDER BY id {limit_clause}"
        );
        self.query(&sql, params![format!("%{author_name}%")])
    }

    pub fn by_author_id(&self, author_id: i64, limit: Option<i64>) -> Result<Vec<Quote>> {
        let sql = match limit {
            Some(n) => {
                Self::check_limit(n)?;
                format!(
                    "SELECT {QUOTE_COLS} FROM quotes WHERE author_id = ?1 ORDER BY id LIMIT {n}"
                )
            }
            None => format!("SELECT {QUOTE_COLS} FROM quotes WHERE author_id = ?1 ORDER BY id"),
        };
        self.query(&sql, params![author_id])
    }

    pub fn by_category(&self, category: &str, limit: Option<i64>) -> Result<Vec<Quote>> {
        let limit_clause = match limit {
            Some(n) => {
                Self::check_limit(n)?;
                format!("LIMIT {n}")
            }
            None => String::new(),
        };
        let sql = format!(
            "SELECT {QUOTE_COLS} FROM quotes WHERE id IN (
                 SELECT qc.quote_id FROM quote_categories qc
                 JOIN categories c ON c.id = qc.category_id
                 WHERE c.name = ?1
             ) ORDER BY id {limit_clause}"
        );
        self.query(&sql, params![category])
    }

    pub fn shortest(&self, limit: i64) -> Result<Vec<Quote>> {
        Self::check_limit(limit)?;
        self.query(
            &format!("SELECT {QUOTE_COLS} FROM quotes ORDER BY LENGTH(text) ASC LIMIT {limit}"),
            [],
        )
    }

    pub fn longest(&self, limit: i64) -> Result<Vec<Quote>> {
        Self::check_limit(limit)?;
        self.query(
            &format!("SELECT {QUOTE_COLS} FROM quotes ORDER BY LENGTH(text) DESC LIMIT {limit}"),
            [],
        )
    }

    pub fn recent(&self, limit: i64) -> Result<Vec<Quote>> {
        Self::check_limit(limit)?;
        self.query(
            &format!("SELECT {QUOTE_COLS} FROM quotes ORDER BY created_at DESC, id DESC LIMIT {limit}"),
            [],
        )
    }

    /// Quotes ranked by how many users favorited them, as (quote, count).
    /// Quotes nobody favorited are included with a zero count.
    pub fn most_favorited(&self, limit: i64) -> Result<Vec<(Quote, i64)>> {
        Self::check_limit(limit)?;
        let sql = format!(
            "SELECT {}, COUNT(f.user_id) AS fav_count
             FROM quotes q LEFT JOIN user_quote_favorites f ON f.quote_id = q.id
             GROUP BY q.id ORDER BY fav_count DESC LIMIT {limit}",
            prefixed_cols("q")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok((row_to_quote(row)?, row.get(10)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Attach a quote to a category. Repeats are silently ignored.
    pub fn add_to_category(&self, quote_id: i64, category_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO quote_categories (quote_id, category_id) VALUES (?1, ?2)",
            params![quote_id, category_id],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Review flag
    // ------------------------------------------------------------------

    pub fn needs_review(&self, limit: Option<i64>) -> Result<Vec<Quote>> {
        let sql = match limit {
            Some(n) => {
                Self::check_limit(n)?;
                format!(
                    "SELECT {QUOTE_COLS} FROM quotes WHERE needs_review = 1 ORDER BY id LIMIT {n}"
                )
            }
            None => format!("SELECT {QUOTE_COLS} FROM quotes WHERE needs_review = 1 ORDER BY id"),
        };
        self.query(&sql, [])
    }

    pub fn mark_for_review(&self, id: i64) -> Result<()> {
        self.set_review_flag(id, true)
    }

    pub fn clear_review(&self, id: i64) -> Result<()> {
        self.set_review_flag(id, false)
    }

    fn set_review_flag(&self, id: i64, flag: bool) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE quotes SET needs_review = ?1 WHERE id = ?2",
            params![flag as i64, id],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("Quote {id}")));
        }
        Ok(())
    }

    pub fn count_needs_review(&self) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM quotes WHERE needs_review = 1",
            [],
            |r| r.get(0),
        )?)
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Quote>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_quote)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    fn seeded() -> (Store, i64) {
        let store = Store::open_in_memory().unwrap();
        let author = store.authors().create("Test Author").unwrap();
        (store, author.id)
    }

    #[test]
    fn test_insert_and_get() {
        let (store, author_id) = seeded();
        let quote = store
            .quotes()
            .insert_full(&NewQuote {
                text: "The beginning is the most important part.",
                author_id,
                year: Some(-380),
                source: Some("The Republic"),
                tags: vec!["wisdom".to_string()],
                ..NewQuote::default()
            })
            .unwrap();

        let fetched = store.quotes().get_or_err(quote.id).unwrap();
        assert_eq!(fetched.text, "The beginning is the most important part.");
        assert_eq!(fetched.year, Some(-380));
        assert_eq!(fetched.tags, vec!["wisdom"]);
        assert!(!fetched.verified);
    }

    #[test]
    fn test_insert_empty_text_rejected() {
        let (store, author_id) = seeded();
        let err = store.quotes().insert("   ", author_id, None).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_exists_text() {
        let (store, author_id) = seeded();
        store.quotes().insert("unique text", author_id, None).unwrap();
        assert!(store.quotes().exists_text("unique text").unwrap());
        assert!(!store.quotes().exists_text("missing text").unwrap());
    }

    #[test]
    fn test_search_text_any_vs_all() {
        let (store, author_id) = seeded();
        let quotes = store.quotes();
        quotes.insert("love conquers all", author_id, None).unwrap();
        quotes.insert("love is patient", author_id, None).unwrap();
        quotes.insert("patience pays off", author_id, None).unwrap();

        let any = quotes
            .search(&SearchQuery {
                text: vec!["love", "patience"],
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(any.len(), 3);

        let all = quotes
            .search(&SearchQuery {
                text: vec!["love", "patient"],
                match_all_text: true,
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].text, "love is patient");
    }

    #[test]
    fn test_search_combines_author_and_category() {
        let (store, author_id) = seeded();
        let other = store.authors().create("Other Author").unwrap();
        let cat = store.categories().create("wisdom", &[]).unwrap();
        let quotes = store.quotes();
        let hit = quotes.insert("wise words", author_id, None).unwrap();
        quotes.insert("wise words elsewhere", other.id, None).unwrap();
        quotes.insert("uncategorized words", author_id, None).unwrap();
        quotes.add_to_category(hit.id, cat.id).unwrap();

        let results = quotes
            .search(&SearchQuery {
                text: vec!["words"],
                author: Some("Test"),
                categories: vec!["wisdom"],
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, hit.id);
    }

    #[test]
    fn test_search_match_all_categories() {
        let (store, author_id) = seeded();
        let love = store.categories().create("love", &[]).unwrap();
        let loss = store.categories().create("loss", &[]).unwrap();
        let quotes = store.quotes();
        let both = quotes.insert("love and loss", author_id, None).unwrap();
        let one = quotes.insert("only love", author_id, None).unwrap();
        quotes.add_to_category(both.id, love.id).unwrap();
        quotes.add_to_category(both.id, loss.id).unwrap();
        quotes.add_to_category(one.id, love.id).unwrap();

        let any = quotes
            .search(&SearchQuery {
                categories: vec!["love", "loss"],
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(any.len(), 2);

        let all = quotes
            .search(&SearchQuery {
                categories: vec!["love", "loss"],
                match_all_categories: true,
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, both.id);
    }

    #[test]
    fn test_advanced_search_orders_by_relevance() {
        let (store, author_id) = seeded();
        let quotes = store.quotes();
        quotes.insert("courage alone", author_id, None).unwrap();
        quotes
            .insert("courage and bravery together", author_id, None)
            .unwrap();

        let results = quotes
            .advanced_search(&SearchQuery {
                text: vec!["courage", "bravery"],
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "courage and bravery together");
    }

    #[test]
    fn test_by_category_and_author_name() {
        let (store, author_id) = seeded();
        let cat = store.categories().create("wisdom", &[]).unwrap();
        let q = store.quotes().insert("be wise", author_id, None).unwrap();
        store.quotes().insert("unrelated", author_id, None).unwrap();
        store.quotes().add_to_category(q.id, cat.id).unwrap();

        let hits = store.quotes().by_category("wisdom", None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, q.id);

        let by_name = store.quotes().by_author("test", Some(10)).unwrap();
        assert_eq!(by_name.len(), 2);
    }

    #[test]
    fn test_shortest_longest_recent() {
        let (store, author_id) = seeded();
        let quotes = store.quotes();
        quotes.insert("tiny", author_id, None).unwrap();
        quotes
            .insert("a considerably longer quotation", author_id, None)
            .unwrap();

        assert_eq!(quotes.shortest(1).unwrap()[0].text, "tiny");
        assert_eq!(
            quotes.longest(1).unwrap()[0].text,
            "a considerably longer quotation"
        );
        assert_eq!(quotes.recent(5).unwrap().len(), 2);
        assert!(matches!(
            quotes.recent(0).unwrap_err(),
            StoreError::Validation(_)
        ));
    }

    #[test]
    fn test_random_respects_category() {
        let (store, author_id) = seeded();
        let cat = store.categories().create("stoic", &[]).unwrap();
        let q = store.quotes().insert("stoic words", author_id, None).unwrap();
        store.quotes().insert("other words", author_id, None).unwrap();
        store.quotes().add_to_category(q.id, cat.id).unwrap();

        assert!(store.quotes().random(None, 1).unwrap().len() == 1);
        let from_cat = store.quotes().random(Some("stoic"), 5).unwrap();
        assert_eq!(from_cat.len(), 1);
        assert_eq!(from_cat[0].id, q.id);
        assert!(store.quotes().random(Some("missing"), 1).unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (store, _) = seeded();
        let err = store.quotes().delete(99).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_review_flag_roundtrip() {
        let (store, author_id) = seeded();
        let q = store.quotes().insert("check me", author_id, None).unwrap();
        store.quotes().mark_for_review(q.id).unwrap();
        assert_eq!(store.quotes().needs_review(None).unwrap().len(), 1);
        assert_eq!(store.quotes().count_needs_review().unwrap(), 1);
        store.quotes().clear_review(q.id).unwrap();
        assert!(store.quotes().needs_review(None).unwrap().is_empty());
    }
}
