use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use nstconnect_db::{Database, NewNotification};
use nstconnect_types::api::{Claims, NotificationResponse, StatusMessage, UnreadCount, UpdatedCount};
use nstconnect_types::models::NotificationType;

use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::{AppState, convert, run_db};

/// Insert a notification as a side effect of another action. Failure is
/// logged and swallowed: the triggering action has already succeeded.
pub(crate) fn notify_best_effort(db: &Database, notification: &NewNotification<'_>) {
    if let Err(e) = db.create_notification(notification) {
        warn!(
            "Failed to create {} notification for {}: {:#}",
            notification.kind, notification.user_id, e
        );
    }
}

pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();

    let notifications = run_db(&state, move |db| {
        let rows = db.get_notifications(&user_id)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let reference = row.reference_id.clone();
            let Some(mut notification) = convert::notification(row) else {
                continue;
            };
            if notification.kind == NotificationType::FriendRequest {
                if let Some(request_id) = reference {
                    enrich_friend_request(db, &mut notification, &request_id);
                }
            }
            out.push(notification);
        }
        Ok(out)
    })
    .await?;

    Ok(Json(notifications))
}

/// Attach the sender card and request id to a FRIEND_REQUEST notification.
/// Lookup failures leave the notification as it was.
fn enrich_friend_request(db: &Database, notification: &mut NotificationResponse, request_id: &str) {
    let request = match db.get_friend_request(request_id) {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(e) => {
            warn!("Error fetching friend request {}: {:#}", request_id, e);
            return;
        }
    };

    match db.get_user_summary(&request.sender_id) {
        Ok(Some(sender)) => {
            notification.sender = Some(convert::user_summary(sender));
            notification.friend_request_id = Some(convert::parse_id(&request.id));
        }
        Ok(None) => {}
        Err(e) => warn!("Error fetching sender {}: {:#}", request.sender_id, e),
    }
}

pub async fn mark_read(
    State(state): State<AppState>,
    ApiPath(notification_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let updated = run_db(&state, move |db| {
        Ok(db.mark_notification_read(&notification_id.to_string(), &user_id)?)
    })
    .await?;

    if !updated {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(Json(StatusMessage::new("Marked as read")))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let updated = run_db(&state, move |db| Ok(db.mark_all_notifications_read(&user_id)?)).await?;
    Ok(Json(UpdatedCount { updated }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let count = run_db(&state, move |db| Ok(db.count_unread_notifications(&user_id)?)).await?;
    Ok(Json(UnreadCount { count }))
}
