use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::Database;
use crate::models::{UserRow, UserSummaryRow};
use crate::queries::summary_at;

const USER_COLUMNS: &str = "id, name, email, password, department, bio, headline, skills, \
     graduation_year, profile_pic, linkedin_url, github_url, created_at";

pub struct NewUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub department: Option<&'a str>,
    pub graduation_year: Option<i32>,
}

/// Columns a profile edit may touch. `None` keeps the stored value.
#[derive(Default)]
pub struct ProfileUpdate<'a> {
    pub name: Option<&'a str>,
    pub department: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub headline: Option<&'a str>,
    pub skills: Option<&'a str>,
    pub graduation_year: Option<i32>,
    pub profile_pic: Option<&'a str>,
    pub linkedin_url: Option<&'a str>,
    pub github_url: Option<&'a str>,
}

impl Database {
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password, department, graduation_year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id,
                    user.name,
                    user.email,
                    user.password_hash,
                    user.department,
                    user.graduation_year,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn user_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn get_user_summary(&self, id: &str) -> Result<Option<UserSummaryRow>> {
        self.with_conn(|conn| query_user_summary(conn, id))
    }

    /// Returns `(friends, posts)` for the profile header.
    pub fn count_profile_stats(&self, id: &str) -> Result<(i64, i64)> {
        self.with_conn(|conn| {
            let counts = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM friends WHERE user_id = ?1),
                        (SELECT COUNT(*) FROM posts WHERE author_id = ?1)",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(counts)
        })
    }

    /// Applies a partial profile edit. Returns false if the user is unknown.
    pub fn update_profile(&self, id: &str, update: &ProfileUpdate<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    name            = COALESCE(?2, name),
                    department      = COALESCE(?3, department),
                    bio             = COALESCE(?4, bio),
                    headline        = COALESCE(?5, headline),
                    skills          = COALESCE(?6, skills),
                    graduation_year = COALESCE(?7, graduation_year),
                    profile_pic     = COALESCE(?8, profile_pic),
                    linkedin_url    = COALESCE(?9, linkedin_url),
                    github_url      = COALESCE(?10, github_url)
                 WHERE id = ?1",
                params![
                    id,
                    update.name,
                    update.department,
                    update.bio,
                    update.headline,
                    update.skills,
                    update.graduation_year,
                    update.profile_pic,
                    update.linkedin_url,
                    update.github_url,
                ],
            )?;
            Ok(changed == 1)
        })
    }

    /// Case-insensitive substring match on name or department. SQLite's
    /// `LIKE` and `NOCASE` only fold ASCII letters.
    pub fn search_users(&self, term: &str, limit: u32) -> Result<Vec<UserSummaryRow>> {
        let pattern = format!("%{}%", escape_like(term));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, profile_pic, headline, department
                 FROM users
                 WHERE name LIKE ?1 ESCAPE '\\' OR department LIKE ?1 ESCAPE '\\'
                 ORDER BY name COLLATE NOCASE, rowid
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![pattern, limit], |row| summary_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is one of our own literals, never user input.
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], map_user).optional()?;
    Ok(row)
}

pub(crate) fn query_user_summary(conn: &Connection, id: &str) -> Result<Option<UserSummaryRow>> {
    let row = conn
        .query_row(
            "SELECT id, name, profile_pic, headline, department FROM users WHERE id = ?1",
            [id],
            |row| summary_at(row, 0),
        )
        .optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        department: row.get(4)?,
        bio: row.get(5)?,
        headline: row.get(6)?,
        skills: row.get(7)?,
        graduation_year: row.get(8)?,
        profile_pic: row.get(9)?,
        linkedin_url: row.get(10)?,
        github_url: row.get(11)?,
        created_at: row.get(12)?,
    })
}
