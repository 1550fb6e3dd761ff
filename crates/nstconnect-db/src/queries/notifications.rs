use anyhow::Result;
use rusqlite::{Connection, params};

use nstconnect_types::models::NotificationType;

use crate::Database;
use crate::models::NotificationRow;

pub struct NewNotification<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub kind: NotificationType,
    pub reference_id: Option<&'a str>,
    pub message: &'a str,
}

impl Database {
    pub fn create_notification(&self, notification: &NewNotification<'_>) -> Result<()> {
        self.with_conn_mut(|conn| insert_notification(conn, notification))
    }

    /// All notifications for a user, newest first.
    pub fn get_notifications(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, type, reference_id, message, is_read, created_at
                 FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: row.get(2)?,
                        reference_id: row.get(3)?,
                        message: row.get(4)?,
                        is_read: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Marks one notification read. Returns false unless it belongs to `user_id`.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
                [user_id],
            )?;
            Ok(changed)
        })
    }

    pub fn count_unread_notifications(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

pub(crate) fn insert_notification(conn: &Connection, n: &NewNotification<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, type, reference_id, message) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![n.id, n.user_id, n.kind.as_str(), n.reference_id, n.message],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, new_id, user};

    fn like_note<'a>(id: &'a str, user_id: &'a str) -> NewNotification<'a> {
        NewNotification {
            id,
            user_id,
            kind: NotificationType::Like,
            reference_id: None,
            message: "Someone liked your post",
        }
    }

    #[test]
    fn only_the_owner_can_mark_read() {
        let db = db();
        let owner = user(&db, "Rahul");
        let other = user(&db, "Priya");
        let id = new_id();
        db.create_notification(&like_note(&id, &owner)).unwrap();

        assert!(!db.mark_notification_read(&id, &other).unwrap());
        assert_eq!(db.count_unread_notifications(&owner).unwrap(), 1);

        assert!(db.mark_notification_read(&id, &owner).unwrap());
        assert_eq!(db.count_unread_notifications(&owner).unwrap(), 0);
        assert!(db.get_notifications(&owner).unwrap()[0].is_read);
    }

    #[test]
    fn mark_all_counts_only_unread() {
        let db = db();
        let owner = user(&db, "Arjun");
        let first = new_id();
        let second = new_id();
        db.create_notification(&like_note(&first, &owner)).unwrap();
        db.create_notification(&like_note(&second, &owner)).unwrap();
        db.mark_notification_read(&first, &owner).unwrap();

        assert_eq!(db.mark_all_notifications_read(&owner).unwrap(), 1);
        assert_eq!(db.mark_all_notifications_read(&owner).unwrap(), 0);
    }
}
