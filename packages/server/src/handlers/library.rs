use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::Role;
use common::filename::{
    check_upload_name, inline_mime_type, library_category, timestamped_name,
    validate_flat_filename,
};
use common::storage::UploadArea;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Condition, Func, LikeExpr};
use sea_orm::*;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entity::library_resource;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::handlers::upload::{
    content_disposition_value, discard_upload, field_text, next_field, stream_field_to_store,
};
use crate::models::library::*;
use crate::models::shared::{MessageResponse, Pagination, escape_like, non_blank, validate_title};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Library",
    operation_id = "uploadLibraryResource",
    summary = "Add a resource to the library",
    description = "Admin only. Multipart fields: `title` (required), `description`, `author`, \
        `tags` (comma-separated) and `file`. The category is the upper-cased file extension.",
    request_body(content_type = "multipart/form-data", description = "Resource metadata and `file`"),
    responses(
        (status = 201, description = "Resource stored", body = LibraryResourceResponse),
        (status = 400, description = "Missing title or file, bad extension or too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn upload_resource(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;

    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut author: Option<String> = None;
    let mut tags: Option<String> = None;
    let mut stored: Option<(String, u64)> = None;

    let parsed: Result<(), AppError> = async {
        while let Some(field) = next_field(&mut multipart).await? {
            match field.name() {
                Some("title") => title = Some(field_text(field).await?),
                Some("description") => description = non_blank(Some(field_text(field).await?)),
                Some("author") => author = non_blank(Some(field_text(field).await?)),
                Some("tags") => tags = normalize_tags(&field_text(field).await?),
                Some("file") => {
                    let original = match field.file_name() {
                        Some(n) if !n.trim().is_empty() => n.to_string(),
                        _ => continue,
                    };
                    if stored.is_some() {
                        return Err(AppError::Validation("Only one file may be uploaded".into()));
                    }
                    check_upload_name(&original, &state.config.uploads.allowed_extensions)
                        .map_err(|e| AppError::Validation(e.message().into()))?;
                    let name = timestamped_name(&original, chrono::Utc::now());
                    let size = stream_field_to_store(
                        field,
                        &*state.uploads,
                        UploadArea::Library,
                        &name,
                        state.config.uploads.max_upload_size,
                    )
                    .await?;
                    stored = Some((name, size));
                }
                _ => {}
            }
        }

        let title = title.as_deref().unwrap_or_default();
        validate_title(title)?;
        match &stored {
            Some((_, size)) if *size > 0 => Ok(()),
            _ => Err(AppError::Validation("A non-empty file is required".into())),
        }
    }
    .await;

    if let Err(e) = parsed {
        if let Some((name, _)) = &stored {
            discard_upload(&*state.uploads, UploadArea::Library, name).await;
        }
        return Err(e);
    }

    let Some((file_name, file_size)) = stored else {
        return Err(AppError::Validation("A non-empty file is required".into()));
    };

    let result = library_resource::ActiveModel {
        title: Set(title.unwrap_or_default().trim().to_string()),
        description: Set(description),
        author: Set(author),
        tags: Set(tags),
        category: Set(library_category(&file_name)),
        file_name: Set(file_name.clone()),
        file_size: Set(i64::try_from(file_size).unwrap_or(i64::MAX)),
        uploaded_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await;

    let model = match result {
        Ok(model) => model,
        Err(e) => {
            discard_upload(&*state.uploads, UploadArea::Library, &file_name).await;
            return Err(match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::Conflict("A resource with this file name already exists".into())
                }
                _ => AppError::from(e),
            });
        }
    };

    tracing::info!(resource_id = model.id, file_name = %model.file_name, "Library resource added");
    Ok((StatusCode::CREATED, Json(LibraryResourceResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Library",
    operation_id = "listLibraryResources",
    summary = "Browse the library",
    description = "Any authenticated user. Newest first. `search` matches title, description \
        and tags case-insensitively; `category` is an exact match. The response also lists \
        every category in the catalog.",
    params(LibraryQuery),
    responses(
        (status = 200, description = "Resource list", body = LibraryListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_resources(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LibraryQuery>,
) -> Result<Json<LibraryListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut select = library_resource::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", fold_case(state.db.get_database_backend(), &term));
            let like = |col: library_resource::Column| {
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.clone()).escape('\\'))
            };
            select = select.filter(
                Condition::any()
                    .add(like(library_resource::Column::Title))
                    .add(like(library_resource::Column::Description))
                    .add(like(library_resource::Column::Tags)),
            );
        }
    }

    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        select = select.filter(library_resource::Column::Category.eq(category.to_ascii_uppercase()));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .order_by_desc(library_resource::Column::UploadedAt)
        .order_by_desc(library_resource::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(LibraryResourceResponse::from)
        .collect();

    let categories = library_resource::Entity::find()
        .select_only()
        .column(library_resource::Column::Category)
        .distinct()
        .filter(library_resource::Column::Category.is_not_null())
        .order_by_asc(library_resource::Column::Category)
        .into_tuple::<String>()
        .all(&state.db)
        .await?;

    Ok(Json(LibraryListResponse {
        data,
        categories,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Library",
    operation_id = "getLibraryResource",
    summary = "Get library resource metadata",
    params(("id" = i32, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Resource metadata", body = LibraryResourceResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Resource not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_resource(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LibraryResourceResponse>, AppError> {
    let model = find_resource(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Library",
    operation_id = "deleteLibraryResource",
    summary = "Remove a library resource",
    description = "Admin only. Deletes the catalog entry and the stored file.",
    params(("id" = i32, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Resource deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Resource not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_resource(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_user.require_role(Role::Admin)?;

    let model = find_resource(&state.db, id).await?;
    library_resource::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;

    match state.uploads.delete(UploadArea::Library, &model.file_name).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(file_name = %model.file_name, "Library file was already gone"),
        Err(e) => tracing::warn!(file_name = %model.file_name, error = %e, "Failed to remove library file"),
    }

    tracing::info!(resource_id = id, "Library resource deleted");
    Ok(Json(MessageResponse::new("Resource deleted")))
}

#[utoipa::path(
    get,
    path = "/files/{filename}",
    tag = "Library",
    operation_id = "serveLibraryFile",
    summary = "Open a library file",
    description = "Any authenticated user. Served inline with a restrictive content security \
        policy and caching disabled. Types outside the preview whitelist are sent as \
        `application/octet-stream`.",
    params(("filename" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Invalid file name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(filename))]
pub async fn serve_library_file(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let name = validate_flat_filename(&filename)
        .map_err(|e| AppError::Validation(e.message().into()))?;

    let reader = state.uploads.get_stream(UploadArea::Library, name).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, inline_mime_type(name))
        .header(header::CONTENT_DISPOSITION, content_disposition_value(name))
        .header(
            header::CONTENT_SECURITY_POLICY,
            "default-src 'self'; object-src 'none';",
        )
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(
            header::CACHE_CONTROL,
            "no-store, no-cache, must-revalidate, max-age=0",
        )
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    post,
    path = "/research",
    tag = "Library",
    operation_id = "aiResearch",
    summary = "Ask the research assistant",
    description = "Any authenticated user. Forwards the question to the configured \
        generative-text service.",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Answer", body = ResearchResponse),
        (status = 400, description = "Empty query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Research service failed (UPSTREAM_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload))]
pub async fn ai_research(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResearchRequest>,
) -> Result<Json<ResearchResponse>, AppError> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("Query must not be empty".into()));
    }

    let response = state.research.ask(query).await.map_err(|e| {
        tracing::warn!(error = %e, "Research request failed");
        AppError::Upstream(e.to_string())
    })?;

    Ok(Json(ResearchResponse { response }))
}

/// Lower-case a search term the same way the backend's `lower()` folds columns.
/// SQLite only folds ASCII letters.
fn fold_case(backend: DbBackend, term: &str) -> String {
    match backend {
        DbBackend::Sqlite => term.to_ascii_lowercase(),
        _ => term.to_lowercase(),
    }
}

async fn find_resource<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<library_resource::Model, AppError> {
    library_resource::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found".into()))
}
