//! Row → response mapping. Stored ids and timestamps are text; a value that
//! fails to parse is logged and replaced by its default rather than failing
//! the whole listing.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use nstconnect_db::models::{
    CommentRow, FriendRequestRow, MessageRow, NotificationRow, PostRow, UserRow, UserSummaryRow,
};
use nstconnect_types::api::{
    CommentResponse, DirectMessage, FriendRequestResponse, NotificationResponse, PostCount,
    PostResponse, ProfileCount, UserProfile, UserSummary,
};
use nstconnect_types::models::{NotificationType, RequestStatus};

pub(crate) fn parse_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand may carry SQLite's "YYYY-MM-DD HH:MM:SS".
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub(crate) fn user_profile(row: UserRow, count: Option<ProfileCount>) -> UserProfile {
    UserProfile {
        id: parse_id(&row.id),
        name: row.name,
        email: row.email,
        department: row.department,
        bio: row.bio,
        headline: row.headline,
        skills: row.skills,
        graduation_year: row.graduation_year,
        profile_pic: row.profile_pic,
        linkedin_url: row.linkedin_url,
        github_url: row.github_url,
        created_at: parse_timestamp(&row.created_at),
        count,
    }
}

pub(crate) fn user_summary(row: UserSummaryRow) -> UserSummary {
    UserSummary {
        id: parse_id(&row.id),
        name: row.name,
        profile_pic: row.profile_pic,
        headline: row.headline,
        department: row.department,
    }
}

pub(crate) fn post(row: PostRow) -> PostResponse {
    PostResponse {
        id: parse_id(&row.id),
        author_id: parse_id(&row.author_id),
        content: row.content,
        image: row.image,
        created_at: parse_timestamp(&row.created_at),
        author: user_summary(row.author),
        count: PostCount {
            likes: row.like_count,
            comments: row.comment_count,
        },
        is_liked: row.liked_by_viewer,
    }
}

pub(crate) fn comment(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: parse_id(&row.id),
        post_id: parse_id(&row.post_id),
        author_id: parse_id(&row.author_id),
        content: row.content,
        created_at: parse_timestamp(&row.created_at),
        author: user_summary(row.author),
    }
}

pub(crate) fn friend_request(row: FriendRequestRow, sender: Option<UserSummaryRow>) -> FriendRequestResponse {
    FriendRequestResponse {
        id: parse_id(&row.id),
        sender_id: parse_id(&row.sender_id),
        receiver_id: parse_id(&row.receiver_id),
        status: request_status(&row),
        created_at: parse_timestamp(&row.created_at),
        sender: sender.map(user_summary),
    }
}

pub(crate) fn request_status(row: &FriendRequestRow) -> RequestStatus {
    row.status.parse().unwrap_or_else(|e| {
        // The column has a CHECK constraint, so this only fires on a hand-edited DB.
        warn!("Friend request '{}': {}", row.id, e);
        RequestStatus::Rejected
    })
}

pub(crate) fn direct_message(row: MessageRow) -> DirectMessage {
    DirectMessage {
        id: parse_id(&row.id),
        sender_id: parse_id(&row.sender_id),
        receiver_id: parse_id(&row.receiver_id),
        content: row.content,
        is_read: row.is_read,
        created_at: parse_timestamp(&row.created_at),
    }
}

/// `None` when the stored type is unknown; such rows are skipped.
pub(crate) fn notification(row: NotificationRow) -> Option<NotificationResponse> {
    let kind: NotificationType = match row.kind.parse() {
        Ok(kind) => kind,
        Err(e) => {
            warn!("Skipping notification '{}': {}", row.id, e);
            return None;
        }
    };

    Some(NotificationResponse {
        id: parse_id(&row.id),
        user_id: parse_id(&row.user_id),
        kind,
        reference_id: row.reference_id.as_deref().map(parse_id),
        message: row.message,
        is_read: row.is_read,
        created_at: parse_timestamp(&row.created_at),
        sender: None,
        friend_request_id: None,
    })
}
