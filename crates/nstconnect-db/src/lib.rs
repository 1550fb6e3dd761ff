pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub use queries::notifications::NewNotification;
pub use queries::users::{NewUser, ProfileUpdate};

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let db = Self::init(conn)?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Private in-memory database, used by tests and one-off tooling.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Like `with_conn`, but hands out `&mut Connection` so the closure can
    /// open a transaction.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&mut conn)
    }

    /// Deletes every row from every table, children first. The schema stays.
    pub fn wipe(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for table in [
                "notifications",
                "messages",
                "likes",
                "comments",
                "posts",
                "friends",
                "friend_requests",
                "users",
            ] {
                tx.execute(&format!("DELETE FROM {}", table), [])?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::test_support::{db, new_id, user};

    #[test]
    fn wipe_empties_every_table() {
        let db = db();
        let a = user(&db, "Rahul");
        let b = user(&db, "Priya");
        db.create_friendship(&a, &b).unwrap();
        db.insert_post(&new_id(), &a, "hello", None).unwrap();
        db.insert_message(&new_id(), &a, &b, "hi").unwrap();

        db.wipe().unwrap();

        assert!(!db.user_exists(&a).unwrap());
        assert!(db.get_feed(&b, 10, 0).unwrap().is_empty());
        assert!(db.get_thread(&a, &b).unwrap().is_empty());
    }
}
