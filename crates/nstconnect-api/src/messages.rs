use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use uuid::Uuid;

use nstconnect_types::api::{Claims, ConversationSummary, DirectMessage, SendMessageRequest, UpdatedCount};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, convert, run_db};

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::bad_request("Message content is required"));
    }
    if req.receiver_id == claims.sub {
        return Err(ApiError::bad_request("Cannot message yourself"));
    }

    let message_id = Uuid::new_v4().to_string();
    let sender_id = claims.sub.to_string();
    let receiver_id = req.receiver_id.to_string();
    let content = req.content;

    let row = run_db(&state, move |db| {
        if !db.user_exists(&receiver_id)? {
            return Err(ApiError::not_found("User not found"));
        }
        Ok(db.insert_message(&message_id, &sender_id, &receiver_id, &content)?)
    })
    .await?;

    debug!("User {} messaged {}", claims.sub, req.receiver_id);
    Ok((StatusCode::CREATED, Json(convert::direct_message(row))))
}

pub async fn get_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let rows = run_db(&state, move |db| Ok(db.get_conversations(&user_id)?)).await?;

    let conversations: Vec<ConversationSummary> = rows
        .into_iter()
        .map(|row| ConversationSummary {
            id: convert::parse_id(&row.partner.id),
            name: row.partner.name,
            profile_pic: row.partner.profile_pic,
            last_message: row.last_message.map(convert::direct_message),
            unread_count: row.unread_count,
        })
        .collect();
    Ok(Json(conversations))
}

pub async fn get_thread(
    State(state): State<AppState>,
    ApiPath(other_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let rows = run_db(&state, move |db| Ok(db.get_thread(&user_id, &other_id.to_string())?)).await?;
    let thread: Vec<DirectMessage> = rows.into_iter().map(convert::direct_message).collect();
    Ok(Json(thread))
}

pub async fn mark_thread_read(
    State(state): State<AppState>,
    ApiPath(sender_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let reader_id = claims.sub.to_string();
    let updated = run_db(&state, move |db| {
        Ok(db.mark_thread_read(&reader_id, &sender_id.to_string())?)
    })
    .await?;
    Ok(Json(UpdatedCount { updated }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};

    use crate::test_support::TestApp;

    async fn send(app: &TestApp, token: &str, to: &str, content: &str) -> (StatusCode, Value) {
        app.request(
            Method::POST,
            "/api/messages",
            Some(token),
            Some(json!({ "receiverId": to, "content": content })),
        )
        .await
    }

    #[tokio::test]
    async fn send_validates_content_and_receiver() {
        let app = TestApp::new();
        let (a_id, a) = app.signup("Rahul").await;
        let (b_id, _) = app.signup("Priya").await;

        let (status, _) = send(&app, &a, &b_id, "   ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, &a, &a_id, "note to self").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, &a, &uuid::Uuid::new_v4().to_string(), "hello?").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, &a, &b_id, "Hey Priya").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["senderId"], a_id);
        assert_eq!(body["receiverId"], b_id);
        assert_eq!(body["isRead"], false);
    }

    #[tokio::test]
    async fn thread_is_two_way_and_oldest_first() {
        let app = TestApp::new();
        let (a_id, a) = app.signup("Arjun").await;
        let (b_id, b) = app.signup("Sneha").await;
        send(&app, &a, &b_id, "first").await;
        send(&app, &b, &a_id, "second").await;

        let (status, thread) = app.request(Method::GET, &format!("/api/messages/{}", b_id), Some(&a), None).await;
        assert_eq!(status, StatusCode::OK);
        let contents: Vec<_> = thread.as_array().unwrap().iter().map(|m| m["content"].clone()).collect();
        assert_eq!(contents, vec![json!("first"), json!("second")]);
    }

    #[tokio::test]
    async fn conversations_track_last_message_and_unread() {
        let app = TestApp::new();
        let (a_id, a) = app.signup("Vikram").await;
        let (b_id, b) = app.signup("Ananya").await;
        let (c_id, c) = app.signup("Rohan").await;

        send(&app, &b, &a_id, "one").await;
        send(&app, &b, &a_id, "two").await;
        send(&app, &c, &a_id, "latest").await;

        let (_, convos) = app.request(Method::GET, "/api/messages/conversations", Some(&a), None).await;
        let convos = convos.as_array().unwrap();
        assert_eq!(convos.len(), 2);
        assert_eq!(convos[0]["id"], c_id);
        assert_eq!(convos[0]["lastMessage"]["content"], "latest");
        assert_eq!(convos[1]["id"], b_id);
        assert_eq!(convos[1]["unreadCount"], 2);

        let (status, body) = app
            .request(Method::PUT, &format!("/api/messages/{}/read", b_id), Some(&a), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], 2);

        let (_, convos) = app.request(Method::GET, "/api/messages/conversations", Some(&a), None).await;
        assert_eq!(convos[1]["unreadCount"], 0);

        // The sender's own view is unaffected by the reader's unread state.
        let (_, convos) = app.request(Method::GET, "/api/messages/conversations", Some(&c), None).await;
        assert_eq!(convos[0]["id"], a_id);
        assert_eq!(convos[0]["unreadCount"], 0);
    }
}
