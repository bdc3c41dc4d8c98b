use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::Role;
use common::filename::{check_upload_name, extension_of, random_name, validate_flat_filename};
use common::storage::{BoxReader, UploadArea, UploadStore};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::upload::EditorUploadResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Uploads",
    operation_id = "editorUpload",
    summary = "Upload lesson media",
    description = "Teachers only. Takes a multipart `file` field whose extension is in the \
        configured allow-list, stores it under a random name and returns where it is served. \
        The returned `file_name` is what lessons reference.",
    request_body(content_type = "multipart/form-data", description = "Single `file` field"),
    responses(
        (status = 201, description = "File stored", body = EditorUploadResponse),
        (status = 400, description = "Missing file, bad extension or too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a teacher (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn editor_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Teacher)?;

    let mut stored: Option<String> = None;

    let parsed: Result<(), AppError> = async {
        while let Some(field) = next_field(&mut multipart).await? {
            if field.name() != Some("file") {
                continue;
            }
            if stored.is_some() {
                return Err(AppError::Validation("Only one file may be uploaded".into()));
            }
            let original = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
            let name = stored_media_name(&original, &state.config.uploads.allowed_extensions)?;
            stream_field_to_store(
                field,
                &*state.uploads,
                UploadArea::General,
                &name,
                state.config.uploads.max_upload_size,
            )
            .await?;
            stored = Some(name);
        }
        Ok(())
    }
    .await;

    if let Err(e) = parsed {
        if let Some(name) = &stored {
            discard_upload(&*state.uploads, UploadArea::General, name).await;
        }
        return Err(e);
    }

    let file_name = stored.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(EditorUploadResponse {
            location: format!("/api/v1/uploads/{file_name}"),
            file_name,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{filename}",
    tag = "Uploads",
    operation_id = "serveUpload",
    summary = "Download an uploaded file",
    description = "Any authenticated user. The content type is guessed from the extension.",
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
pub async fn serve_upload(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let name = validate_flat_filename(&filename)
        .map_err(|e| AppError::Validation(e.message().into()))?;

    let reader = state.uploads.get_stream(UploadArea::General, name).await?;
    let content_type = mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition_value(name))
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Random stored name for an allowed upload, keeping the original extension.
pub(crate) fn stored_media_name(original: &str, allowed: &[String]) -> Result<String, AppError> {
    let name = check_upload_name(original, allowed)
        .map_err(|e| AppError::Validation(e.message().into()))?;
    let ext = extension_of(name)
        .ok_or_else(|| AppError::Validation("File must have an extension".into()))?;
    Ok(random_name(&ext))
}

pub(crate) async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))
}

pub(crate) async fn field_text(
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))
}

/// Build a safe inline `Content-Disposition` header value.
pub(crate) fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

/// Remove a stored file that no row will reference.
pub(crate) async fn discard_upload(store: &dyn UploadStore, area: UploadArea, name: &str) {
    match store.delete(area, name).await {
        Ok(_) => tracing::debug!(?area, name, "Discarded upload"),
        Err(e) => tracing::warn!(?area, name, error = %e, "Failed to remove discarded upload"),
    }
}

/// Stream a multipart field into the upload store under `name`, via a temp
/// file. Returns the number of bytes stored.
pub(crate) async fn stream_field_to_store(
    mut field: axum::extract::multipart::Field<'_>,
    store: &dyn UploadStore,
    area: UploadArea,
    name: &str,
    max_size: u64,
) -> Result<u64, AppError> {
    let temp_path = std::env::temp_dir().join(format!("lectern-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        Ok(store.put_stream(area, name, reader).await?)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    result
}
