use serde::Serialize;

/// Response shape expected by the rich-text editor.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EditorUploadResponse {
    /// URL the stored file is served from.
    #[schema(example = "/api/v1/uploads/3f2a9c0e5b7d4e1f8a6b2c9d0e1f2a3b.png")]
    pub location: String,
    /// Stored name, for referencing from lessons.
    #[schema(example = "3f2a9c0e5b7d4e1f8a6b2c9d0e1f2a3b.png")]
    pub file_name: String,
}
