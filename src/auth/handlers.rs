use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicProfile, RefreshRequest, SignupRequest, SignupResponse},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::{Profile, User},
    },
    error::{is_unique_violation, AppError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Creates the identity and its profile together. Never establishes a
/// session: the response is the static verification-pending state and tokens
/// are only ever issued by login.
#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AppError::Validation("Password too short".into()));
    }
    if payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".into()));
    }

    // Best-effort pre-check; the unique constraint on users.email is the
    // authoritative rejection below.
    if Profile::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::DuplicateAccount);
    }

    let hash = hash_password(&payload.password)?;

    let (_user, profile) = match User::create_with_profile(
        &state.db,
        &payload.email,
        &hash,
        payload.full_name.trim(),
        payload.role,
    )
    .await
    {
        Ok(v) => v,
        Err(e) => {
            return Err(match e.downcast_ref::<sqlx::Error>() {
                Some(db_err) if is_unique_violation(db_err) => {
                    warn!(email = %payload.email, "email already registered (constraint)");
                    AppError::DuplicateAccount
                }
                _ => AppError::Unexpected(e),
            })
        }
    };

    info!(user_id = %profile.id, email = %profile.email, role = ?profile.role, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            status: "pending_verification",
            message: "Account created successfully! Please check your email for a verification link.",
            profile: profile.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::Authentication("Invalid credentials"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Authentication("Invalid credentials"));
    }

    let profile = Profile::find(&state.db, user.id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        profile: profile.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| AppError::Authentication("Invalid or expired refresh token"))?;

    let profile = Profile::find(&state.db, claims.sub)
        .await?
        .ok_or(AppError::NotFound("profile"))?;

    let access_token = keys.sign_access(claims.sub)?;
    let refresh_token = keys.sign_refresh(claims.sub)?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        profile: profile.into(),
    }))
}

/// Source of truth for role-aware rendering: clients show owner navigation
/// iff the returned role is `owner`.
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicProfile>, AppError> {
    let profile = Profile::find(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    Ok(Json(profile.into()))
}
