pub mod friends;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod users;

use rusqlite::Row;

use crate::models::UserSummaryRow;

/// Reads the five summary columns starting at `offset`, in the order
/// `id, name, profile_pic, headline, department`.
pub(crate) fn summary_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<UserSummaryRow> {
    Ok(UserSummaryRow {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        profile_pic: row.get(offset + 2)?,
        headline: row.get(offset + 3)?,
        department: row.get(offset + 4)?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, NewUser};

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    /// Inserts a user named `name` and returns its id.
    pub fn user(db: &Database, name: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let email = format!("{}@nst.edu", name.to_lowercase());
        db.create_user(&NewUser {
            id: &id,
            name,
            email: &email,
            password_hash: "not-a-real-hash",
            department: Some("Computer Science"),
            graduation_year: Some(2025),
        })
        .unwrap();
        id
    }

    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
