//! Relational storage for users and documents
//!
//! SQLite-backed schema kept for the account/document layer. No
//! writing-assistance operation touches it; the only consumer is the
//! trivial user listing endpoint.

use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

use crate::error::{Result, ScribeError};

/// A registered user
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at: String,
}

/// SQLite-backed store
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `db_path` and run migrations
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)
            .map_err(|e| ScribeError::Storage(format!("Failed to open {}: {e}", db_path.display())))?;

        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER REFERENCES users(id),
                title TEXT,
                content TEXT NOT NULL,
                ai_suggestion TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
            )
            .map_err(|e| ScribeError::Storage(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Insert a user and return the stored row
    pub fn create_user(&self, email: &str) -> Result<User> {
        self.conn
            .execute("INSERT INTO users (email) VALUES (?1)", [email])
            .map_err(|e| ScribeError::Storage(format!("Insert user failed: {e}")))?;
        let id = self.conn.last_insert_rowid();

        self.conn
            .query_row(
                "SELECT id, email, created_at FROM users WHERE id = ?1",
                [id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .map_err(|e| ScribeError::Storage(format!("Read user failed: {e}")))
    }

    /// List all users, oldest first
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, email, created_at FROM users ORDER BY id")
            .map_err(|e| ScribeError::Storage(format!("List users failed: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .map_err(|e| ScribeError::Storage(format!("List users failed: {e}")))?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row.map_err(|e| ScribeError::Storage(format!("List users failed: {e}")))?);
        }
        Ok(users)
    }
}
