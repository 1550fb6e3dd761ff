use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::Database;
use crate::models::{ConversationRow, MessageRow};
use crate::queries::summary_at;

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, is_read, created_at";

impl Database {
    pub fn insert_message(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content) VALUES (?1, ?2, ?3, ?4)",
                params![id, sender_id, receiver_id, content],
            )?;
            let sql = format!("SELECT {} FROM messages WHERE id = ?1", MESSAGE_COLUMNS);
            let row = conn.query_row(&sql, [id], map_message)?;
            Ok(row)
        })
    }

    /// Both directions of a conversation, oldest first.
    pub fn get_thread(&self, user_id: &str, other_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM messages
                 WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
                 ORDER BY created_at ASC, rowid ASC",
                MESSAGE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, other_id], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Everyone `user_id` has exchanged messages with, most recent first.
    pub fn get_conversations(&self, user_id: &str) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "WITH partners AS (
                     SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END AS partner_id,
                            MAX(created_at) AS last_at,
                            MAX(rowid) AS last_row
                     FROM messages
                     WHERE sender_id = ?1 OR receiver_id = ?1
                     GROUP BY partner_id
                 )
                 SELECT u.id, u.name, u.profile_pic, u.headline, u.department,
                        (SELECT COUNT(*) FROM messages m
                         WHERE m.sender_id = u.id AND m.receiver_id = ?1 AND m.is_read = 0)
                 FROM partners p
                 JOIN users u ON u.id = p.partner_id
                 ORDER BY p.last_at DESC, p.last_row DESC",
            )?;
            let partners = stmt
                .query_map([user_id], |row| Ok((summary_at(row, 0)?, row.get::<_, i64>(5)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut conversations = Vec::with_capacity(partners.len());
            for (partner, unread_count) in partners {
                let last_message = query_last_message(conn, user_id, &partner.id)?;
                conversations.push(ConversationRow {
                    partner,
                    last_message,
                    unread_count,
                });
            }
            Ok(conversations)
        })
    }

    /// Marks everything `sender_id` sent to `reader_id` as read.
    pub fn mark_thread_read(&self, reader_id: &str, sender_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
                params![reader_id, sender_id],
            )?;
            Ok(changed)
        })
    }
}

fn query_last_message(conn: &Connection, user_id: &str, other_id: &str) -> Result<Option<MessageRow>> {
    let sql = format!(
        "SELECT {} FROM messages
         WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
         ORDER BY created_at DESC, rowid DESC
         LIMIT 1",
        MESSAGE_COLUMNS
    );
    let row = conn.query_row(&sql, params![user_id, other_id], map_message).optional()?;
    Ok(row)
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        is_read: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, new_id, user};

    #[test]
    fn thread_includes_both_directions_in_order() {
        let db = db();
        let a = user(&db, "Rahul");
        let b = user(&db, "Priya");
        let c = user(&db, "Arjun");
        db.insert_message(&new_id(), &a, &b, "hey").unwrap();
        db.insert_message(&new_id(), &b, &a, "hi!").unwrap();
        db.insert_message(&new_id(), &a, &c, "unrelated").unwrap();

        let thread = db.get_thread(&b, &a).unwrap();
        let contents: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["hey", "hi!"]);
    }

    #[test]
    fn conversations_report_last_message_and_unread() {
        let db = db();
        let a = user(&db, "Sneha");
        let b = user(&db, "Vikram");
        db.insert_message(&new_id(), &b, &a, "one").unwrap();
        db.insert_message(&new_id(), &b, &a, "two").unwrap();

        let convos = db.get_conversations(&a).unwrap();
        assert_eq!(convos.len(), 1);
        assert_eq!(convos[0].partner.name, "Vikram");
        assert_eq!(convos[0].unread_count, 2);
        assert_eq!(convos[0].last_message.as_ref().unwrap().content, "two");

        assert_eq!(db.mark_thread_read(&a, &b).unwrap(), 2);
        assert_eq!(db.get_conversations(&a).unwrap()[0].unread_count, 0);

        // The sender side has nothing unread.
        assert_eq!(db.get_conversations(&b).unwrap()[0].unread_count, 0);
    }
}
