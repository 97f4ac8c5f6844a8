// User accounts.
//
// Passwords are stored as `sha256$<salt>$<hex digest>` with a random UUID
// salt per user. Authentication recomputes the digest with the stored salt
// and compares, updating last_login on success.

use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub last_login: Option<String>,
    pub is_active: bool,
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
        last_login: row.get(5)?,
        is_active: row.get::<_, i64>(6)? != 0,
    })
}

const USER_COLS: &str = "id, username, email, password_hash, created_at, last_login, is_active";

fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = Sha256::digest(format!("{salt}{password}").as_bytes());
    format!("sha256${salt}${:x}", digest)
}

fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some("sha256"), Some(salt), Some(hex)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let digest = Sha256::digest(format!("{salt}{password}").as_bytes());
    format!("{:x}", digest) == hex
}

pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        UserStore { conn }
    }

    pub fn all(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLS} FROM users ORDER BY id"))?;
        let rows = stmt.query_map([], row_to_user)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_or_err(&self, id: i64) -> Result<User> {
        self.get(id)?
            .ok_or_else(|| StoreError::not_found(format!("User {id}")))
    }

    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE username = ?1"),
                params![username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
    }

    pub fn create(&self, username: &str, email: &str, password: &str) -> Result<User> {
        if username.len() < 3 {
            return Err(StoreError::validation(
                "username must be at least 3 characters",
            ));
        }
        if !email.contains('@') {
            return Err(StoreError::validation("email must contain '@'"));
        }
        if password.len() < 6 {
            return Err(StoreError::validation(
                "password must be at least 6 characters",
            ));
        }
        let created_at = chrono::Utc::now().to_rfc3339();
        let result = self.conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![username, email, hash_password(password), created_at],
        );
        match result {
            Ok(_) => self.get_or_err(self.conn.last_insert_rowid()),
            Err(e) if StoreError::is_constraint_violation(&e) => {
                Err(StoreError::duplicate("username or email"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials against a username or an email address. Returns
    /// the user on success after stamping last_login. Unknown accounts,
    /// bad passwords and deactivated accounts all come back as None.
    pub fn authenticate(&self, username_or_email: &str, password: &str) -> Result<Option<User>> {
        let found = match self.get_by_username(username_or_email)? {
            Some(user) => Some(user),
            None => self.get_by_email(username_or_email)?,
        };
        let Some(user) = found else {
            return Ok(None);
        };
        if !user.is_active || !verify_password(password, &user.password_hash) {
            return Ok(None);
        }
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![now, user.id],
        )?;
        self.get_or_err(user.id).map(Some)
    }

    pub fn update_password(&self, id: i64, new_password: &str) -> Result<()> {
        if new_password.len() < 6 {
            return Err(StoreError::validation(
                "password must be at least 6 characters",
            ));
        }
        let updated = self.conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![hash_password(new_password), id],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("User {id}")));
        }
        Ok(())
    }

    pub fn activate(&self, id: i64) -> Result<()> {
        self.set_active(id, true)
    }

    pub fn deactivate(&self, id: i64) -> Result<()> {
        self.set_active(id, false)
    }

    fn set_active(&self, id: i64, active: bool) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE users SET is_active = ?1 WHERE id = ?2",
            params![active as i64, id],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("User {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    #[test]
    fn test_create_validations() {
        let store = Store::open_in_memory().unwrap();
        let users = store.users();

        assert!(matches!(
            users.create("ab", "a@b.com", "secret1").unwrap_err(),
            StoreError::Validation(_)
        ));
        assert!(matches!(
            users.create("alice", "not-an-email", "secret1").unwrap_err(),
            StoreError::Validation(_)
        ));
        assert!(matches!(
            users.create("alice", "a@b.com", "short").unwrap_err(),
            StoreError::Validation(_)
        ));

        let user = users.create("alice", "a@b.com", "secret1").unwrap();
        assert!(user.is_active);
        assert!(user.password_hash.starts_with("sha256$"));
        assert!(!user.password_hash.contains("secret1"));
    }

    #[test]
    fn test_duplicate_username_or_email() {
        let store = Store::open_in_memory().unwrap();
        let users = store.users();
        users.create("alice", "a@b.com", "secret1").unwrap();

        let err = users.create("alice", "other@b.com", "secret1").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        let err = users.create("bob", "a@b.com", "secret1").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn test_authenticate_stamps_last_login() {
        let store = Store::open_in_memory().unwrap();
        let users = store.users();
        users.create("alice", "a@b.com", "secret1").unwrap();

        assert!(users.authenticate("alice", "wrong").unwrap().is_none());
        assert!(users.authenticate("nobody", "secret1").unwrap().is_none());

        let user = users.authenticate("alice", "secret1").unwrap().unwrap();
        assert!(user.last_login.is_some());

        // Email works in place of the username.
        assert!(users.authenticate("a@b.com", "secret1").unwrap().is_some());
    }

    #[test]
    fn test_deactivated_user_cannot_log_in() {
        let store = Store::open_in_memory().unwrap();
        let users = store.users();
        let user = users.create("alice", "a@b.com", "secret1").unwrap();
        users.deactivate(user.id).unwrap();
        assert!(users.authenticate("alice", "secret1").unwrap().is_none());

        users.activate(user.id).unwrap();
        assert!(users.authenticate("alice", "secret1").unwrap().is_some());
    }

    #[test]
    fn test_update_password() {
        let store = Store::open_in_memory().unwrap();
        let users = store.users();
        let user = users.create("alice", "a@b.com", "secret1").unwrap();
        users.update_password(user.id, "newpass9").unwrap();

        assert!(users.authenticate("alice", "secret1").unwrap().is_none());
        assert!(users.authenticate("alice", "newpass9").unwrap().is_some());
    }

    #[test]
    fn test_distinct_salts_per_hash() {
        let a = hash_password("same");
        let b = hash_password("same");
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
        assert!(!verify_password("other", &a));
    }
}
