/// Database row types — these map directly to SQLite rows.
/// Distinct from nstconnect-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub headline: Option<String>,
    pub skills: Option<String>,
    pub graduation_year: Option<i32>,
    pub profile_pic: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub created_at: String,
}

/// The subset of `users` columns embedded in other resources.
#[derive(Clone)]
pub struct UserSummaryRow {
    pub id: String,
    pub name: String,
    pub profile_pic: Option<String>,
    pub headline: Option<String>,
    pub department: Option<String>,
}

pub struct FriendRequestRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: String,
    pub created_at: String,
}

pub struct IncomingRequestRow {
    pub request: FriendRequestRow,
    pub sender: UserSummaryRow,
}

pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub image: Option<String>,
    pub created_at: String,
    pub author: UserSummaryRow,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_viewer: bool,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
    pub author: UserSummaryRow,
}

pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

pub struct ConversationRow {
    pub partner: UserSummaryRow,
    pub last_message: Option<MessageRow>,
    pub unread_count: i64,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub reference_id: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}
