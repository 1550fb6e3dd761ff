use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use nstconnect_db::models::FriendRequestRow;
use nstconnect_db::queries::friends::AcceptOutcome;
use nstconnect_db::{Database, NewNotification};
use nstconnect_types::api::{Claims, FriendRequestResponse, StatusMessage, UserSummary};
use nstconnect_types::models::NotificationType;

use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::notifications::notify_best_effort;
use crate::{AppState, convert, run_db};

pub async fn send_request(
    State(state): State<AppState>,
    ApiPath(receiver_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.sub == receiver_id {
        return Err(ApiError::bad_request("Cannot send request to yourself"));
    }

    let request_id = Uuid::new_v4().to_string();
    let sender_id = claims.sub.to_string();

    let row = run_db(&state, move |db| {
        let receiver = receiver_id.to_string();
        if !db.user_exists(&receiver)? {
            return Err(ApiError::not_found("User not found"));
        }
        if db.find_pending_request(&sender_id, &receiver)?.is_some() {
            return Err(ApiError::bad_request("Request already sent"));
        }
        if db.are_friends(&sender_id, &receiver)? {
            return Err(ApiError::bad_request("Already friends"));
        }

        let row = db
            .create_friend_request(&request_id, &sender_id, &receiver)?
            .ok_or_else(|| ApiError::bad_request("Request already sent"))?;

        notify_best_effort(
            db,
            &NewNotification {
                id: &Uuid::new_v4().to_string(),
                user_id: &receiver,
                kind: NotificationType::FriendRequest,
                reference_id: Some(&row.id),
                message: "You have a new connection request",
            },
        );
        Ok(row)
    })
    .await?;

    info!("User {} sent friend request {} to {}", claims.sub, row.id, receiver_id);
    Ok((StatusCode::CREATED, Json(convert::friend_request(row, None))))
}

/// Loads a request the caller may act on: it must exist, be addressed to
/// the caller and still be pending.
fn actionable_request(db: &Database, request_id: &str, caller: &str) -> Result<FriendRequestRow, ApiError> {
    let request = db
        .get_friend_request(request_id)?
        .filter(|r| r.receiver_id == caller)
        .ok_or_else(|| ApiError::bad_request("Invalid request"))?;

    if !convert::request_status(&request).is_pending() {
        return Err(already_processed());
    }
    Ok(request)
}

fn already_processed() -> ApiError {
    ApiError::bad_request("Request already processed")
}

pub async fn accept_request(
    State(state): State<AppState>,
    ApiPath(request_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.sub.to_string();

    let outcome = run_db(&state, move |db| {
        let request = actionable_request(db, &request_id.to_string(), &caller)?;
        let notification_id = Uuid::new_v4().to_string();
        let outcome = db.accept_friend_request(
            &request,
            &NewNotification {
                id: &notification_id,
                user_id: &request.sender_id,
                kind: NotificationType::FriendAccepted,
                reference_id: Some(&request.receiver_id),
                message: "Your connection request was accepted",
            },
        )?;
        Ok(outcome)
    })
    .await?;

    match outcome {
        AcceptOutcome::NotPending => Err(already_processed()),
        AcceptOutcome::Accepted | AcceptOutcome::AlreadyFriends => {
            info!("User {} accepted friend request {}", claims.sub, request_id);
            Ok(Json(StatusMessage::new("Friend request accepted")))
        }
    }
}

pub async fn reject_request(
    State(state): State<AppState>,
    ApiPath(request_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.sub.to_string();

    run_db(&state, move |db| {
        let request = actionable_request(db, &request_id.to_string(), &caller)?;
        if !db.reject_friend_request(&request.id)? {
            return Err(already_processed());
        }
        Ok(())
    })
    .await?;

    info!("User {} rejected friend request {}", claims.sub, request_id);
    Ok(Json(StatusMessage::new("Friend request rejected")))
}

pub async fn get_friends(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let rows = run_db(&state, move |db| Ok(db.get_friends(&user_id)?)).await?;
    let friends: Vec<UserSummary> = rows.into_iter().map(convert::user_summary).collect();
    Ok(Json(friends))
}

pub async fn get_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let rows = run_db(&state, move |db| Ok(db.get_incoming_requests(&user_id)?)).await?;
    let requests: Vec<FriendRequestResponse> = rows
        .into_iter()
        .map(|row| convert::friend_request(row.request, Some(row.sender)))
        .collect();
    Ok(Json(requests))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    ApiPath(friend_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let removed = run_db(&state, move |db| {
        Ok(db.remove_friendship(&user_id, &friend_id.to_string())?)
    })
    .await?;

    if !removed {
        return Err(ApiError::not_found("Not friends with this user"));
    }
    info!("User {} removed friend {}", claims.sub, friend_id);
    Ok(Json(StatusMessage::new("Friend removed")))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::Value;

    use crate::test_support::TestApp;

    async fn send(app: &TestApp, token: &str, receiver: &str) -> (StatusCode, Value) {
        app.request(Method::POST, &format!("/api/friends/request/{}", receiver), Some(token), None)
            .await
    }

    #[tokio::test]
    async fn self_and_duplicate_requests_are_rejected() {
        let app = TestApp::new();
        let (a_id, a) = app.signup("Rahul").await;
        let (b_id, _) = app.signup("Priya").await;

        let (status, body) = send(&app, &a, &a_id).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot send request to yourself");

        let (status, body) = send(&app, &a, &b_id).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "PENDING");
        assert_eq!(body["senderId"], a_id);

        let (status, body) = send(&app, &a, &b_id).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Request already sent");

        let (status, _) = send(&app, &a, &uuid::Uuid::new_v4().to_string()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sends_leave_one_pending_request() {
        let app = TestApp::new();
        let (_, a) = app.signup("Meera").await;
        let (b_id, b) = app.signup("Aarav").await;

        let (r1, r2, r3, r4) = tokio::join!(
            send(&app, &a, &b_id),
            send(&app, &a, &b_id),
            send(&app, &a, &b_id),
            send(&app, &a, &b_id),
        );
        let created = [r1, r2, r3, r4]
            .iter()
            .filter(|(status, _)| *status == StatusCode::CREATED)
            .count();
        assert_eq!(created, 1);

        let (_, pending) = app.request(Method::GET, "/api/friends/requests", Some(&b), None).await;
        assert_eq!(pending.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn accept_creates_a_symmetric_friendship() {
        let app = TestApp::new();
        let (a_id, a) = app.signup("Arjun").await;
        let (b_id, b) = app.signup("Sneha").await;

        let (_, request) = send(&app, &a, &b_id).await;
        let (_, pending) = app.request(Method::GET, "/api/friends/requests", Some(&b), None).await;
        assert_eq!(pending[0]["sender"]["name"], "Arjun");

        let accept = format!("/api/friends/accept/{}", request["id"].as_str().unwrap());

        // Only the receiver may accept.
        let (status, body) = app.request(Method::POST, &accept, Some(&a), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");

        let (status, body) = app.request(Method::POST, &accept, Some(&b), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Friend request accepted");

        let (_, a_friends) = app.request(Method::GET, "/api/friends", Some(&a), None).await;
        let (_, b_friends) = app.request(Method::GET, "/api/friends", Some(&b), None).await;
        assert_eq!(a_friends[0]["id"], b_id);
        assert_eq!(b_friends[0]["id"], a_id);

        let (_, notes) = app.request(Method::GET, "/api/notifications", Some(&a), None).await;
        assert_eq!(notes[0]["type"], "FRIEND_ACCEPTED");
        assert_eq!(notes[0]["referenceId"], b_id);

        let (status, body) = app.request(Method::POST, &accept, Some(&b), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Request already processed");

        let (_, pending) = app.request(Method::GET, "/api/friends/requests", Some(&b), None).await;
        assert_eq!(pending, serde_json::json!([]));

        let (status, body) = send(&app, &b, &a_id).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Already friends");
    }

    #[tokio::test]
    async fn rejected_requests_stay_rejected() {
        let app = TestApp::new();
        let (_, a) = app.signup("Vikram").await;
        let (b_id, b) = app.signup("Ananya").await;

        let (_, request) = send(&app, &a, &b_id).await;
        let id = request["id"].as_str().unwrap();

        let (status, _) = app
            .request(Method::POST, &format!("/api/friends/reject/{}", id), Some(&b), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .request(Method::POST, &format!("/api/friends/accept/{}", id), Some(&b), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Request already processed");

        let (_, friends) = app.request(Method::GET, "/api/friends", Some(&b), None).await;
        assert_eq!(friends, serde_json::json!([]));

        // A fresh request is allowed once the old one is no longer pending.
        let (status, _) = send(&app, &a, &b_id).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn unfriending_removes_both_sides() {
        let app = TestApp::new();
        let (a_id, a) = app.signup("Rohan").await;
        let (b_id, b) = app.signup("Kavya").await;
        let (_, request) = send(&app, &a, &b_id).await;
        app.request(
            Method::POST,
            &format!("/api/friends/accept/{}", request["id"].as_str().unwrap()),
            Some(&b),
            None,
        )
        .await;

        let (status, _) = app.request(Method::DELETE, &format!("/api/friends/{}", a_id), Some(&b), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, friends) = app.request(Method::GET, "/api/friends", Some(&a), None).await;
        assert_eq!(friends, serde_json::json!([]));

        let (status, _) = app.request(Method::DELETE, &format!("/api/friends/{}", a_id), Some(&b), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
