// Category entity + store.
//
// Each category carries a keyword list (JSON in a TEXT column) used by the
// importer to auto-assign categories from quote text and tags.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub keywords: Vec<String>,
}

fn row_to_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    let raw: Option<String> = row.get(2)?;
    let keywords = match raw {
        Some(s) if !s.is_empty() => serde_json::from_str(&s).unwrap_or_default(),
        _ => Vec::new(),
    };
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        keywords,
    })
}

pub struct CategoryStore<'a> {
    conn: &'a Connection,
}

impl<'a> CategoryStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        CategoryStore { conn }
    }

    pub fn all(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, keywords FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], row_to_category)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get(&self, id: i64) -> Result<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name, keywords FROM categories WHERE id = ?1",
                params![id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    pub fn get_or_err(&self, id: i64) -> Result<Category> {
        self.get(id)?
            .ok_or_else(|| StoreError::not_found(format!("Category {id}")))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name, keywords FROM categories WHERE name = ?1",
                params![name],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?)
    }

    pub fn create(&self, name: &str, keywords: &[String]) -> Result<Category> {
        if name.is_empty() {
            return Err(StoreError::validation("category name must be non-empty"));
        }
        let keywords_json = serde_json::to_string(keywords)?;
        let result = self.conn.execute(
            "INSERT INTO categories (name, keywords) VALUES (?1, ?2)",
            params![name, keywords_json],
        );
        match result {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                self.get(id)?
                    .ok_or_else(|| StoreError::not_found(format!("Category {id}")))
            }
            Err(e) if StoreError::is_constraint_violation(&e) => {
                Err(StoreError::duplicate(format!("category '{name}'")))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_or_create(&self, name: &str) -> Result<Category> {
        if let Some(category) = self.get_by_name(name)? {
            return Ok(category);
        }
        self.create(name, &[])
    }

    /// Replace a category's keyword list.
    pub fn set_keywords(&self, id: i64, keywords: &[String]) -> Result<()> {
        let keywords_json = serde_json::to_string(keywords)?;
        let updated = self.conn.execute(
            "UPDATE categories SET keywords = ?1 WHERE id = ?2",
            params![keywords_json, id],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("Category {id}")));
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::not_found(format!("Category {id}")));
        }
        Ok(())
    }

    /// All categories with how many quotes each holds, including zeroes.
    pub fn with_counts(&self) -> Result<Vec<(Category, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.keywords, COUNT(qc.quote_id) AS quote_count
             FROM categories c LEFT JOIN quote_categories qc ON qc.category_id = c.id
             GROUP BY c.id ORDER BY c.name",
        )?;
        let rows = stmt.query_map([], |row| Ok((row_to_category(row)?, row.get(3)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Categories ranked by quote count, most quoted first.
    pub fn most_popular(&self, limit: i64) -> Result<Vec<(Category, i64)>> {
        if limit < 1 {
            return Err(StoreError::validation("limit must be a positive integer"));
        }
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.keywords, COUNT(qc.quote_id) AS quote_count
             FROM categories c JOIN quote_categories qc ON qc.category_id = c.id
             GROUP BY c.id ORDER BY quote_count DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| Ok((row_to_category(row)?, row.get(3)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Categories that hold no quotes at all.
    pub fn empty(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, keywords FROM categories
             WHERE id NOT IN (SELECT DISTINCT category_id FROM quote_categories)
             ORDER BY name",
        )?;
        let rows = stmt.query_map([], row_to_category)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Upsert categories from a name -> keywords catalog. Existing rows get
    /// their keyword lists replaced, new names are inserted. Returns how many
    /// rows were created.
    pub fn sync_from_catalog(&self, catalog: &BTreeMap<String, Vec<String>>) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut created = 0;
        for (name, keywords) in catalog {
            let keywords_json = serde_json::to_string(keywords)?;
            let updated = tx.execute(
                "UPDATE categories SET keywords = ?1 WHERE name = ?2",
                params![keywords_json, name],
            )?;
            if updated == 0 {
                tx.execute(
                    "INSERT INTO categories (name, keywords) VALUES (?1, ?2)",
                    params![name, keywords_json],
                )?;
                created += 1;
            }
        }
        tx.commit()?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    #[test]
    fn test_create_and_lookup() {
        let store = Store::open_in_memory().unwrap();
        let cats = store.categories();
        let cat = cats
            .create("wisdom", &["wise".to_string(), "knowledge".to_string()])
            .unwrap();
        assert_eq!(cat.keywords, vec!["wise", "knowledge"]);

        let fetched = cats.get_by_name("wisdom").unwrap().unwrap();
        assert_eq!(fetched.id, cat.id);
        assert!(matches!(
            cats.create("wisdom", &[]).unwrap_err(),
            StoreError::Duplicate(_)
        ));
    }

    #[test]
    fn test_with_counts_includes_empty() {
        let store = Store::open_in_memory().unwrap();
        let author = store.authors().create("A").unwrap();
        let used = store.categories().create("used", &[]).unwrap();
        store.categories().create("unused", &[]).unwrap();
        let q = store.quotes().insert("text", author.id, None).unwrap();
        store.quotes().add_to_category(q.id, used.id).unwrap();

        let counts = store.categories().with_counts().unwrap();
        assert_eq!(counts.len(), 2);
        let unused = counts.iter().find(|(c, _)| c.name == "unused").unwrap();
        assert_eq!(unused.1, 0);

        let empty = store.categories().empty().unwrap();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].name, "unused");
    }

    #[test]
    fn test_most_popular_ordering() {
        let store = Store::open_in_memory().unwrap();
        let author = store.authors().create("A").unwrap();
        let hot = store.categories().create("hot", &[]).unwrap();
        let cold = store.categories().create("cold", &[]).unwrap();
        for i in 0..3 {
            let q = store
                .quotes()
                .insert(&format!("hot quote {i}"), author.id, None)
                .unwrap();
            store.quotes().add_to_category(q.id, hot.id).unwrap();
        }
        let q = store.quotes().insert("cold quote", author.id, None).unwrap();
        store.quotes().add_to_category(q.id, cold.id).unwrap();

        let popular = store.categories().most_popular(5).unwrap();
        assert_eq!(popular[0].0.name, "hot");
        assert_eq!(popular[0].1, 3);
    }

    #[test]
    fn test_sync_from_catalog_upserts() {
        let store = Store::open_in_memory().unwrap();
        let cats = store.categories();
        cats.create("wisdom", &["old".to_string()]).unwrap();

        let mut catalog = BTreeMap::new();
        catalog.insert("wisdom".to_string(), vec!["wise".to_string()]);
        catalog.insert("humor".to_string(), vec!["funny".to_string()]);

        let created = cats.sync_from_catalog(&catalog).unwrap();
        assert_eq!(created, 1);
        assert_eq!(
            cats.get_by_name("wisdom").unwrap().unwrap().keywords,
            vec!["wise"]
        );
        assert_eq!(
            cats.get_by_name("humor").unwrap().unwrap().keywords,
            vec!["funny"]
        );
    }
}
