use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::Database;
use crate::models::{CommentRow, PostRow};
use crate::queries::summary_at;

/// Feed projection. `?1` is always the viewing user, for `liked_by_viewer`.
const POST_SELECT: &str = "
    SELECT p.id, p.author_id, p.content, p.image, p.created_at,
           u.id, u.name, u.profile_pic, u.headline, u.department,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id),
           EXISTS (SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1)
    FROM posts p
    JOIN users u ON u.id = p.author_id";

const COMMENT_SELECT: &str = "
    SELECT c.id, c.post_id, c.author_id, c.content, c.created_at,
           u.id, u.name, u.profile_pic, u.headline, u.department
    FROM comments c
    JOIN users u ON u.id = c.author_id";

impl Database {
    // -- Posts --

    pub fn insert_post(
        &self,
        id: &str,
        author_id: &str,
        content: &str,
        image: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_id, content, image) VALUES (?1, ?2, ?3, ?4)",
                params![id, author_id, content, image],
            )?;
            Ok(())
        })
    }

    /// One page of the feed, newest first, as seen by `viewer_id`.
    pub fn get_feed(&self, viewer_id: &str, limit: u32, offset: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} ORDER BY p.created_at DESC, p.rowid DESC LIMIT ?2 OFFSET ?3",
                POST_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![viewer_id, limit, offset], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_post(&self, id: &str, viewer_id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id, viewer_id))
    }

    pub fn get_post_author(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let author = conn
                .query_row("SELECT author_id FROM posts WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(author)
        })
    }

    /// Deletes a post; likes and comments go with it.
    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(deleted == 1)
        })
    }

    // -- Likes --

    /// Toggle a like: removes it if present, inserts it if not.
    /// Returns true when the like now exists.
    pub fn toggle_like(&self, id: &str, post_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM likes WHERE post_id = ?1 AND user_id = ?2",
                    params![post_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = match existing {
                Some(existing_id) => {
                    tx.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
                    false
                }
                None => {
                    tx.execute(
                        "INSERT INTO likes (id, post_id, user_id) VALUES (?1, ?2, ?3)",
                        params![id, post_id, user_id],
                    )?;
                    true
                }
            };
            tx.commit()?;
            Ok(liked)
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<CommentRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (id, post_id, author_id, content) VALUES (?1, ?2, ?3, ?4)",
                params![id, post_id, author_id, content],
            )?;
            let sql = format!("{} WHERE c.id = ?1", COMMENT_SELECT);
            let row = conn.query_row(&sql, [id], map_comment)?;
            Ok(row)
        })
    }

    /// Comments on a post, oldest first.
    pub fn get_comments(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE c.post_id = ?1 ORDER BY c.created_at ASC, c.rowid ASC",
                COMMENT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([post_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_post(conn: &Connection, id: &str, viewer_id: &str) -> Result<Option<PostRow>> {
    let sql = format!("{} WHERE p.id = ?2", POST_SELECT);
    let row = conn.query_row(&sql, params![viewer_id, id], map_post).optional()?;
    Ok(row)
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        content: row.get(2)?,
        image: row.get(3)?,
        created_at: row.get(4)?,
        author: summary_at(row, 5)?,
        like_count: row.get(10)?,
        comment_count: row.get(11)?,
        liked_by_viewer: row.get(12)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        author: summary_at(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, new_id, user};

    #[test]
    fn liking_twice_unlikes() {
        let db = db();
        let author = user(&db, "Rahul");
        let fan = user(&db, "Priya");
        let post = new_id();
        db.insert_post(&post, &author, "hello", None).unwrap();

        assert!(db.toggle_like(&new_id(), &post, &fan).unwrap());
        let seen = db.get_post(&post, &fan).unwrap().unwrap();
        assert!(seen.liked_by_viewer);
        assert_eq!(seen.like_count, 1);

        assert!(!db.toggle_like(&new_id(), &post, &fan).unwrap());
        let seen = db.get_post(&post, &fan).unwrap().unwrap();
        assert!(!seen.liked_by_viewer);
        assert_eq!(seen.like_count, 0);
    }

    #[test]
    fn feed_is_newest_first_and_paged() {
        let db = db();
        let author = user(&db, "Arjun");
        for text in ["first", "second", "third"] {
            db.insert_post(&new_id(), &author, text, None).unwrap();
        }

        let page = db.get_feed(&author, 2, 0).unwrap();
        let contents: Vec<_> = page.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, ["third", "second"]);

        let rest = db.get_feed(&author, 2, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].content, "first");
        assert_eq!(rest[0].author.name, "Arjun");
    }

    #[test]
    fn deleting_a_post_cascades() {
        let db = db();
        let author = user(&db, "Sneha");
        let post = new_id();
        db.insert_post(&post, &author, "bye", None).unwrap();
        db.toggle_like(&new_id(), &post, &author).unwrap();
        db.insert_comment(&new_id(), &post, &author, "note").unwrap();

        assert!(db.delete_post(&post).unwrap());
        assert!(db.get_comments(&post).unwrap().is_empty());
        let likes: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM likes", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(likes, 0);
        assert!(!db.delete_post(&post).unwrap());
    }

    #[test]
    fn comments_come_back_oldest_first() {
        let db = db();
        let author = user(&db, "Vikram");
        let post = new_id();
        db.insert_post(&post, &author, "thoughts?", None).unwrap();
        let first = db.insert_comment(&new_id(), &post, &author, "one").unwrap();
        db.insert_comment(&new_id(), &post, &author, "two").unwrap();

        assert_eq!(first.author.name, "Vikram");
        let all = db.get_comments(&post).unwrap();
        let contents: Vec<_> = all.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["one", "two"]);
    }
}
