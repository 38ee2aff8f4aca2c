use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;
use uuid::Uuid;

use evently_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use evently_types::models::{Claims, Role};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, run_blocking};

pub const SESSION_COOKIE: &str = "evently_session";

const MIN_PASSWORD_LEN: usize = 8;
const SESSION_DAYS: i64 = 30;

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_string();

    // Validate input
    if name.is_empty() || name.chars().count() > 64 {
        return Err(ApiError::bad_request("name must be 1 to 64 characters"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("invalid email"));
    }
    validate_password(&req.password)?;

    let password_hash = hash_password(&req.password)?;
    let role = match &state.admin_email {
        Some(admin) if admin.eq_ignore_ascii_case(&email) => Role::Admin,
        _ => Role::User,
    };
    let user_id = Uuid::new_v4();

    let inserted_email = email.clone();
    let created = run_blocking(&state, move |s| {
        s.db.create_user(&user_id.to_string(), &name, &inserted_email, &password_hash, role)
    })
    .await?;

    if !created {
        return Err(ApiError::Conflict("email already registered".into()));
    }

    info!("Registered user {} as {}", user_id, role);

    let token = create_token(&state.jwt_secret, user_id, &email, role)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_string();
    let user = run_blocking(&state, move |s| s.db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    verify_password(&req.password, &user.password)?;

    let role = user.role();
    let user = user.into_user()?;
    let token = create_token(&state.jwt_secret, user.id, &user.email, role)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user_id: user.id,
            name: user.name,
            role,
            token,
        }),
    ))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

pub(crate) fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id into a PHC string.
pub(crate) fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored: &str) -> ApiResult<()> {
    let parsed_hash =
        PasswordHash::new(stored).map_err(|e| anyhow::anyhow!("corrupt password hash: {}", e))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validates signature and expiry. `None` for any invalid token.
pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}
