use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};

use crate::application::errors::StorageError;
use crate::domain::entities::Memo;
use crate::domain::traits::MemoStore;

/// SQLite database holding the bot's memos
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn init_tables(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS memo (
            id INTEGER NOT NULL PRIMARY KEY,
            user_to TEXT NOT NULL,
            user_from TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_memo_user_to ON memo(user_to)",
        [],
    )?;

    Ok(())
}

fn memo_from_row(row: &rusqlite::Row<'_>) -> SqliteResult<Memo> {
    let created_at: String = row.get(4)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Memo {
        id: row.get(0)?,
        user_to: row.get(1)?,
        user_from: row.get(2)?,
        message: row.get(3)?,
        created_at,
    })
}

impl MemoStore for Database {
    fn save_memo(
        &self,
        user_to: &str,
        user_from: &str,
        message: &str,
    ) -> Result<i64, StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO memo (user_to, user_from, message, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_to, user_from, message, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn memos_from(&self, user_from: &str) -> Result<Vec<Memo>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_to, user_from, message, created_at FROM memo
             WHERE user_from = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map([user_from], memo_from_row)?;

        let mut memos = Vec::new();
        for memo in rows {
            memos.push(memo?);
        }
        Ok(memos)
    }

    fn take_memos_for(&self, user_to: &str) -> Result<Vec<Memo>, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let memos = {
            let mut stmt = tx.prepare(
                "SELECT id, user_to, user_from, message, created_at FROM memo
                 WHERE user_to = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map([user_to], memo_from_row)?;
            rows.collect::<SqliteResult<Vec<Memo>>>()?
        };

        if !memos.is_empty() {
            tx.execute("DELETE FROM memo WHERE user_to = ?1", [user_to])?;
        }
        tx.commit()?;

        Ok(memos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_list_by_sender() {
        let db = Database::in_memory().unwrap();
        db.save_memo("Bob", "Alice", "first").unwrap();
        db.save_memo("Carol", "Alice", "second").unwrap();
        db.save_memo("Alice", "Bob", "other").unwrap();

        let memos = db.memos_from("Alice").unwrap();
        assert_eq!(memos.len(), 2);
        assert_eq!(memos[0].user_to, "Bob");
        assert_eq!(memos[0].message, "first");
        assert_eq!(memos[1].user_to, "Carol");
    }

    #[test]
    fn test_take_removes_delivered_memos() {
        let db = Database::in_memory().unwrap();
        db.save_memo("Bob", "Alice", "one").unwrap();
        db.save_memo("Bob", "Carol", "two").unwrap();
        db.save_memo("Dave", "Alice", "three").unwrap();

        let taken = db.take_memos_for("Bob").unwrap();
        let messages: Vec<&str> = taken.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two"]);

        assert!(db.take_memos_for("Bob").unwrap().is_empty());
        assert_eq!(db.memos_from("Alice").unwrap().len(), 1);
    }

    #[test]
    fn test_take_for_unknown_user_is_empty() {
        let db = Database::in_memory().unwrap();
        assert!(db.take_memos_for("Nobody").unwrap().is_empty());
    }
}
