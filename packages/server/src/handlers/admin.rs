use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EnrollmentStatus, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{course, enrollment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::handlers::auth::create_account;
use crate::handlers::enrollment::describe_enrollments;
use crate::handlers::notification::fan_out;
use crate::models::admin::*;
use crate::models::auth::{RegisterRequest, UserResponse, validate_register_request};
use crate::models::notification::{AdminNotifyRequest, Audience, NotifyResponse, validate_admin_notify};
use crate::state::AppState;
use crate::utils::course::find_user;

const DASHBOARD_PENDING_LIMIT: u64 = 10;

#[utoipa::path(
    post,
    path = "/teachers",
    tag = "Admin",
    operation_id = "createTeacher",
    summary = "Create a teacher account",
    description = "Admin only. Same field rules as self-registration.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Teacher created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Username taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username = %payload.username))]
pub async fn create_teacher(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;
    validate_register_request(&payload)?;

    let teacher = create_account(&state.db, &payload, Role::Teacher).await?;

    tracing::info!(user_id = teacher.id, "Teacher account created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(teacher))))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "listUsers",
    summary = "List user accounts",
    description = "Admin only. Newest first, optionally filtered by role.",
    params(UserListQuery),
    responses(
        (status = 200, description = "User list", body = UserListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    auth_user.require_role(Role::Admin)?;

    let mut select = user::Entity::find();
    if let Some(role) = query.role {
        select = select.filter(user::Column::Role.eq(role));
    }

    let data = select
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(UserListResponse { data }))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Admin",
    operation_id = "getAdminDashboard",
    summary = "Get the admin dashboard",
    description = "Admin only. Headline counts and the oldest pending enrollment requests.",
    responses(
        (status = 200, description = "Dashboard", body = AdminDashboardResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn admin_dashboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardResponse>, AppError> {
    auth_user.require_role(Role::Admin)?;

    let total_users = user::Entity::find().count(&state.db).await?;
    let total_courses = course::Entity::find().count(&state.db).await?;
    let approved_enrollments = enrollment::Entity::find()
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Approved))
        .count(&state.db)
        .await?;

    let pending = enrollment::Entity::find()
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Pending))
        .order_by_asc(enrollment::Column::RequestedAt)
        .order_by_asc(enrollment::Column::Id)
        .limit(DASHBOARD_PENDING_LIMIT)
        .all(&state.db)
        .await?;

    Ok(Json(AdminDashboardResponse {
        total_users,
        total_courses,
        approved_enrollments,
        pending_enrollments: describe_enrollments(&state.db, pending).await?,
    }))
}

#[utoipa::path(
    post,
    path = "/notifications",
    tag = "Admin",
    operation_id = "adminNotify",
    summary = "Send a notification",
    description = "Admin only. `recipient` is either `\"all\"` (every student) or the ID of one \
        student.",
    request_body = AdminNotifyRequest,
    responses(
        (status = 201, description = "Notifications created", body = NotifyResponse),
        (status = 400, description = "Validation error or recipient is not a student (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn admin_notify(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdminNotifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;
    let audience = validate_admin_notify(&payload)?;

    let txn = state.db.begin().await?;

    let recipient_ids: Vec<i32> = match audience {
        Audience::AllStudents => user::Entity::find()
            .filter(user::Column::Role.eq(Role::Student))
            .all(&txn)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect(),
        Audience::Student(id) => {
            let student = find_user(&txn, id).await?;
            if !student.role.is_student() {
                return Err(AppError::Validation(
                    "Recipient must be a student".into(),
                ));
            }
            vec![student.id]
        }
    };

    let recipients = fan_out(&txn, &recipient_ids, &payload.title, &payload.message).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(NotifyResponse { recipients })))
}
