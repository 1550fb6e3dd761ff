use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use nstconnect_db::NewNotification;
use nstconnect_types::api::{
    Claims, CommentRequest, CommentResponse, CreatePostRequest, FeedQuery, LikeResponse,
    PostResponse, StatusMessage,
};
use nstconnect_types::models::NotificationType;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::notifications::notify_best_effort;
use crate::{AppState, convert, run_db};

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 50;

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    let image = req.image.filter(|i| !i.trim().is_empty());
    if content.is_empty() && image.is_none() {
        return Err(ApiError::bad_request("Post needs content or an image"));
    }

    let post_id = Uuid::new_v4().to_string();
    let author_id = claims.sub.to_string();
    let row = run_db(&state, move |db| {
        db.insert_post(&post_id, &author_id, &content, image.as_deref())?;
        db.get_post(&post_id, &author_id)?
            .ok_or_else(|| anyhow::anyhow!("post {} vanished after insert", post_id).into())
    })
    .await?;

    info!("User {} created post {}", claims.sub, row.id);
    Ok((StatusCode::CREATED, Json(convert::post(row))))
}

pub async fn get_feed(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FeedQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    let viewer = claims.sub.to_string();
    let rows = run_db(&state, move |db| Ok(db.get_feed(&viewer, limit, offset)?)).await?;

    let posts: Vec<PostResponse> = rows.into_iter().map(convert::post).collect();
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_db(&state, move |db| {
        db.get_post(&post_id.to_string(), &claims.sub.to_string())?
            .ok_or_else(|| ApiError::not_found("Post not found"))
    })
    .await?;
    Ok(Json(convert::post(row)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.sub.to_string();
    run_db(&state, move |db| {
        let pid = post_id.to_string();
        let author = db
            .get_post_author(&pid)?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;
        if author != caller {
            return Err(ApiError::Forbidden("Only the author can delete this post".into()));
        }
        db.delete_post(&pid)?;
        Ok(())
    })
    .await?;

    info!("User {} deleted post {}", claims.sub, post_id);
    Ok(Json(StatusMessage::new("Post deleted")))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let like_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();

    let liked = run_db(&state, move |db| {
        let pid = post_id.to_string();
        let author = db
            .get_post_author(&pid)?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;

        let liked = db.toggle_like(&like_id, &pid, &user_id)?;

        if liked && author != user_id {
            let message = format!("{} liked your post", actor_name(db, &user_id));
            notify_best_effort(
                db,
                &NewNotification {
                    id: &Uuid::new_v4().to_string(),
                    user_id: &author,
                    kind: NotificationType::Like,
                    reference_id: Some(&pid),
                    message: &message,
                },
            );
        }
        Ok(liked)
    })
    .await?;

    info!("User {} {} post {}", claims.sub, if liked { "liked" } else { "unliked" }, post_id);
    Ok(Json(LikeResponse {
        message: if liked { "Liked" } else { "Unliked" }.to_string(),
        liked,
    }))
}

pub async fn add_comment(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::bad_request("Comment cannot be empty"));
    }

    let comment_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();

    let row = run_db(&state, move |db| {
        let pid = post_id.to_string();
        let author = db
            .get_post_author(&pid)?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;

        let row = db.insert_comment(&comment_id, &pid, &user_id, &content)?;

        if author != user_id {
            let message = format!("{} commented on your post", row.author.name);
            notify_best_effort(
                db,
                &NewNotification {
                    id: &Uuid::new_v4().to_string(),
                    user_id: &author,
                    kind: NotificationType::Comment,
                    reference_id: Some(&pid),
                    message: &message,
                },
            );
        }
        Ok(row)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(convert::comment(row))))
}

pub async fn get_comments(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, move |db| Ok(db.get_comments(&post_id.to_string())?)).await?;
    let comments: Vec<CommentResponse> = rows.into_iter().map(convert::comment).collect();
    Ok(Json(comments))
}

/// Display name for notification text; falls back to "Someone".
fn actor_name(db: &nstconnect_db::Database, user_id: &str) -> String {
    match db.get_user_summary(user_id) {
        Ok(Some(user)) => user.name,
        _ => "Someone".to_string(),
    }
}
