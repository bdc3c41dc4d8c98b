use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use common::Role;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, PaymentRequest, RegisterRequest, UserResponse,
    validate_login_request, validate_payment_request, validate_register_request,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;
use crate::utils::course::find_user;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a student account",
    description = "Self-registration always creates a student. The username is the e-mail address.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let user = create_account(&state.db, &payload, Role::Student).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Insert a new account with the given role. Shared with teacher creation.
pub(crate) async fn create_account<C: ConnectionTrait>(
    db: &C,
    payload: &RegisterRequest,
    role: Role,
) -> Result<user::Model, AppError> {
    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        username: Set(payload.username.trim().to_string()),
        password_hash: Set(hash),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        date_of_birth: Set(payload.date_of_birth),
        role: Set(role),
        has_paid: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    new_user.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Duplicate username caught on insert");
            AppError::UsernameTaken
        }
        _ => AppError::from(e),
    })
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    description = "Returns a session token and also sets it as an HttpOnly session cookie.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let user = authenticate(&state, &payload).await?;
    issue_session(&state, jar, user)
}

#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "Auth",
    operation_id = "adminLogin",
    summary = "Log in to the admin area",
    description = "Same as `login`, but only admin accounts are accepted. Any other account \
        gets INVALID_CREDENTIALS so the admin area does not reveal which usernames exist.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(username = %payload.username))]
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let user = authenticate(&state, &payload).await?;
    if !user.role.is_admin() {
        return Err(AppError::InvalidCredentials);
    }
    issue_session(&state, jar, user)
}

async fn authenticate(state: &AppState, payload: &LoginRequest) -> Result<user::Model, AppError> {
    validate_login_request(payload)?;

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user: user::Model,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let token = jwt::sign(
        user.id,
        &user.username,
        user.role,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let cookie = Cookie::build((state.config.auth.cookie_name.clone(), token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            user: user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Log out",
    description = "Clears the session cookie. Bearer tokens stay valid until they expire.",
    responses((status = 200, description = "Logged out", body = MessageResponse)),
)]
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(Cookie::build(state.config.auth.cookie_name.clone()).path("/"));
    (jar, Json(MessageResponse::new("Logged out")))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/payment",
    tag = "Auth",
    operation_id = "makePayment",
    summary = "Pay the enrollment fee",
    description = "Simulated card payment for students. Card details are checked for presence \
        only and are never stored. Sets `has_paid`, which enrollment requests require.",
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Already paid (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn make_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PaymentRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_role(Role::Student)?;
    validate_payment_request(&payload)?;

    let txn = state.db.begin().await?;

    let user = find_user(&txn, auth_user.user_id).await?;
    if user.has_paid {
        return Err(AppError::Conflict("Payment has already been made".into()));
    }

    let mut active: user::ActiveModel = user.into();
    active.has_paid = Set(true);
    let user = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(user_id = user.id, "Payment recorded");
    Ok(Json(user.into()))
}
