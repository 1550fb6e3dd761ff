use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;
use uuid::Uuid;

use nstconnect_db::NewUser;
use nstconnect_types::api::{AuthResponse, Claims, LoginRequest, SignupRequest};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::{AppState, convert, run_db};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_lowercase();

    // Validate input
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let graduation_year = match &req.graduation_year {
        Some(year) => year
            .resolve()
            .map_err(|raw| ApiError::bad_request(format!("Invalid graduation year '{}'", raw)))?,
        None => None,
    };
    let department = req.department.filter(|d| !d.trim().is_empty());

    let user_id = Uuid::new_v4();
    let password = req.password;

    let user = run_db(&state, move |db| {
        if db.get_user_by_email(&email)?.is_some() {
            return Err(ApiError::bad_request("Email already exists"));
        }

        // Hash password with Argon2id
        let password_hash = hash_password(&password)?;

        db.create_user(&NewUser {
            id: &user_id.to_string(),
            name: &name,
            email: &email,
            password_hash: &password_hash,
            department: department.as_deref(),
            graduation_year,
        })?;

        db.get_user_by_id(&user_id.to_string())?
            .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", user_id).into())
    })
    .await?;

    let token = create_token(&state.jwt_secret, user_id, state.token_ttl_days)?;
    info!("New user {} signed up", user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: convert::user_profile(user, None),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    let password = req.password;

    let user = run_db(&state, move |db| {
        let user = db
            .get_user_by_email(&email)?
            .ok_or_else(invalid_credentials)?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", user.id, e))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| invalid_credentials())?;

        Ok(user)
    })
    .await?;

    let user_id = convert::parse_id(&user.id);
    let token = create_token(&state.jwt_secret, user_id, state.token_ttl_days)?;

    Ok(Json(AuthResponse {
        user: convert::user_profile(user, None),
        token,
    }))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid Credentials".into())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn create_token(secret: &str, user_id: Uuid, ttl_days: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(ttl_days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
