use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use uuid::Uuid;

use nstconnect_db::{Database, ProfileUpdate};
use nstconnect_types::api::{Claims, ProfileCount, SearchQuery, UpdateProfileRequest, UserProfile, UserSummary};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{AppState, convert, run_db};

const SEARCH_LIMIT: u32 = 20;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = run_db(&state, move |db| load_profile(db, &claims.sub.to_string())).await?;
    Ok(Json(profile))
}

pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = run_db(&state, move |db| load_profile(db, &user_id.to_string())).await?;
    Ok(Json(profile))
}

fn load_profile(db: &Database, id: &str) -> Result<UserProfile, ApiError> {
    let user = db
        .get_user_by_id(id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let (friends, posts) = db.count_profile_stats(id)?;
    Ok(convert::user_profile(user, Some(ProfileCount { friends, posts })))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }
    let graduation_year = match &req.graduation_year {
        Some(year) => year
            .resolve()
            .map_err(|raw| ApiError::bad_request(format!("Invalid graduation year '{}'", raw)))?,
        None => None,
    };

    let user_id = claims.sub.to_string();
    let user = run_db(&state, move |db| {
        let update = ProfileUpdate {
            name: req.name.as_deref().map(str::trim),
            department: req.department.as_deref(),
            bio: req.bio.as_deref(),
            headline: req.headline.as_deref(),
            skills: req.skills.as_deref(),
            graduation_year,
            profile_pic: req.profile_pic.as_deref(),
            linkedin_url: req.linkedin_url.as_deref(),
            github_url: req.github_url.as_deref(),
        };
        if !db.update_profile(&user_id, &update)? {
            return Err(ApiError::not_found("User not found"));
        }
        db.get_user_by_id(&user_id)?
            .ok_or_else(|| ApiError::not_found("User not found"))
    })
    .await?;

    Ok(Json(convert::user_profile(user, None)))
}

pub async fn search_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.q.unwrap_or_default().trim().to_string();
    if term.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let rows = run_db(&state, move |db| Ok(db.search_users(&term, SEARCH_LIMIT)?)).await?;
    let users: Vec<UserSummary> = rows.into_iter().map(convert::user_summary).collect();
    Ok(Json(users))
}
