use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{NotificationType, RequestStatus};

// -- JWT Claims --

/// JWT claims issued at signup/login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

// -- Auth --

/// The mobile client sends the graduation year either as a number or as the
/// raw text of an input field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YearInput {
    Number(i32),
    Text(String),
}

impl YearInput {
    /// `None` for blank text. `Err` carries the text that failed to parse.
    pub fn resolve(&self) -> Result<Option<i32>, String> {
        match self {
            Self::Number(n) => Ok(Some(*n)),
            Self::Text(s) if s.trim().is_empty() => Ok(None),
            Self::Text(s) => s.trim().parse().map(Some).map_err(|_| s.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: Option<String>,
    pub graduation_year: Option<YearInput>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub headline: Option<String>,
    pub skills: Option<String>,
    pub graduation_year: Option<i32>,
    pub profile_pic: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<ProfileCount>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProfileCount {
    pub friends: i64,
    pub posts: i64,
}

/// The public card of a user, embedded in posts, comments, friend lists and
/// search results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub profile_pic: Option<String>,
    pub headline: Option<String>,
    pub department: Option<String>,
}

/// Profile edit. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub headline: Option<String>,
    pub skills: Option<String>,
    pub graduation_year: Option<YearInput>,
    pub profile_pic: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

// -- Posts --

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: UserSummary,
    #[serde(rename = "_count")]
    pub count: PostCount,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PostCount {
    pub likes: i64,
    pub comments: i64,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub message: String,
    pub liked: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: UserSummary,
}

// -- Friends --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserSummary>,
}

/// Plain acknowledgement body, e.g. `{"message": "Friend request accepted"}`.
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: Uuid,
    pub name: String,
    pub profile_pic: Option<String>,
    pub last_message: Option<DirectMessage>,
    pub unread_count: i64,
}

// -- Notifications --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub reference_id: Option<Uuid>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friend_request_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedCount {
    pub updated: usize,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graduation_year_accepts_number_or_text() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"name":"A","email":"a@x.io","password":"secret1","graduationYear":"2026"}"#,
        )
        .unwrap();
        assert_eq!(req.graduation_year.unwrap().resolve(), Ok(Some(2026)));

        let req: SignupRequest = serde_json::from_str(
            r#"{"name":"A","email":"a@x.io","password":"secret1","graduationYear":2025}"#,
        )
        .unwrap();
        assert_eq!(req.graduation_year.unwrap().resolve(), Ok(Some(2025)));

        assert_eq!(YearInput::Text("  ".into()).resolve(), Ok(None));
        assert!(YearInput::Text("soon".into()).resolve().is_err());
    }

    #[test]
    fn profile_count_is_underscored() {
        let profile = UserProfile {
            id: Uuid::nil(),
            name: "A".into(),
            email: "a@x.io".into(),
            department: None,
            bio: None,
            headline: None,
            skills: None,
            graduation_year: Some(2024),
            profile_pic: None,
            linkedin_url: None,
            github_url: None,
            created_at: DateTime::default(),
            count: Some(ProfileCount { friends: 2, posts: 5 }),
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["_count"]["friends"], 2);
        assert_eq!(value["graduationYear"], 2024);
        assert!(value.get("password").is_none());
    }
}
