use common::filename::validate_flat_filename;
use serde::{Deserialize, Serialize};

use crate::entity::{lesson, module, topic};
use crate::error::AppError;
use crate::models::shared::{double_option, validate_title};

/// Body for creating a module or a topic.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSectionRequest {
    #[schema(example = "Cell Biology")]
    pub title: String,
    pub description: Option<String>,
    /// Display position among siblings. Default: 0.
    pub order: Option<i32>,
}

pub fn validate_create_section(payload: &CreateSectionRequest) -> Result<(), AppError> {
    validate_title(&payload.title)
}

/// PATCH body for a module or a topic.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSectionRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub order: Option<i32>,
}

pub fn validate_update_section(payload: &UpdateSectionRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateLessonRequest {
    #[schema(example = "Mitosis")]
    pub title: String,
    pub description: Option<String>,
    /// Rich text from the editor.
    pub theory_text: Option<String>,
    #[schema(example = "https://www.youtube.com/watch?v=abc")]
    pub video_url: Option<String>,
    /// Stored name returned by the upload endpoint.
    pub video_file: Option<String>,
    /// Stored names returned by the upload endpoint.
    #[serde(default)]
    pub image_files: Vec<String>,
    #[serde(default)]
    pub is_lab_lesson: bool,
    pub order: Option<i32>,
}

pub fn validate_create_lesson(payload: &CreateLessonRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_video_url(payload.video_url.as_deref())?;
    validate_media_names(payload.video_file.as_deref(), &payload.image_files)
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub theory_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub video_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub video_file: Option<Option<String>>,
    /// Replaces the whole list when present.
    pub image_files: Option<Vec<String>>,
    pub is_lab_lesson: Option<bool>,
    pub order: Option<i32>,
}

pub fn validate_update_lesson(payload: &UpdateLessonRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    validate_video_url(payload.video_url.clone().flatten().as_deref())?;
    validate_media_names(
        payload.video_file.clone().flatten().as_deref(),
        payload.image_files.as_deref().unwrap_or_default(),
    )
}

fn validate_video_url(url: Option<&str>) -> Result<(), AppError> {
    if let Some(url) = url {
        let url = url.trim();
        if url.chars().count() > 500 {
            return Err(AppError::Validation(
                "Video URL must be at most 500 characters".into(),
            ));
        }
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Validation(
                "Video URL must start with http:// or https://".into(),
            ));
        }
    }
    Ok(())
}

fn validate_media_names(video: Option<&str>, images: &[String]) -> Result<(), AppError> {
    for name in video.into_iter().chain(images.iter().map(String::as_str)) {
        validate_flat_filename(name).map_err(|e| AppError::Validation(e.message().into()))?;
        if name.contains(',') {
            return Err(AppError::Validation(
                "Invalid filename: commas are not allowed".into(),
            ));
        }
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ModuleResponse {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub order: i32,
}

impl From<module::Model> for ModuleResponse {
    fn from(m: module::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            title: m.title,
            description: m.description,
            order: m.sort_order,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TopicResponse {
    pub id: i32,
    pub module_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub order: i32,
}

impl From<topic::Model> for TopicResponse {
    fn from(m: topic::Model) -> Self {
        Self {
            id: m.id,
            module_id: m.module_id,
            title: m.title,
            description: m.description,
            order: m.sort_order,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LessonResponse {
    pub id: i32,
    pub topic_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub theory_text: Option<String>,
    pub video_url: Option<String>,
    pub video_file: Option<String>,
    pub image_files: Vec<String>,
    pub is_lab_lesson: bool,
    pub order: i32,
}

impl From<lesson::Model> for LessonResponse {
    fn from(m: lesson::Model) -> Self {
        Self {
            id: m.id,
            topic_id: m.topic_id,
            title: m.title,
            description: m.description,
            theory_text: m.theory_text,
            video_url: m.video_url,
            video_file: m.video_file,
            image_files: split_image_files(m.image_files.as_deref()),
            is_lab_lesson: m.is_lab_lesson,
            order: m.sort_order,
        }
    }
}

/// Stored form of the image list.
pub fn join_image_files(names: &[String]) -> Option<String> {
    let joined = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    (!joined.is_empty()).then_some(joined)
}

pub fn split_image_files(stored: Option<&str>) -> Vec<String> {
    stored
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TopicTree {
    #[serde(flatten)]
    pub topic: TopicResponse,
    pub lessons: Vec<LessonResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ModuleTree {
    #[serde(flatten)]
    pub module: ModuleResponse,
    pub topics: Vec<TopicTree>,
}

/// A lesson together with its place in the course.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LessonViewResponse {
    pub lesson: LessonResponse,
    pub course_id: i32,
    pub course_title: String,
    pub outline: Vec<ModuleTree>,
}
