use common::{EnrollmentStatus, Role};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entity::{
    course, discussion, enrollment, essay, lesson, live_class, module, quiz, topic, user,
};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Course visibility predicate.
///
/// A teacher sees only courses they own and a student only courses with an
/// approved enrollment. Admins are not covered here; routes let them through
/// before asking.
pub fn can_access(
    role: Role,
    user_id: i32,
    course_teacher_id: Option<i32>,
    approved_enrollment: bool,
) -> bool {
    match role {
        Role::Teacher => course_teacher_id == Some(user_id),
        Role::Student => approved_enrollment,
        Role::Admin => false,
    }
}

/// True when the student holds an approved enrollment in the course.
pub async fn has_approved_enrollment<C: ConnectionTrait>(
    db: &C,
    student_id: i32,
    course_id: i32,
) -> Result<bool, AppError> {
    let count = enrollment::Entity::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Approved))
        .count(db)
        .await?;
    Ok(count > 0)
}

pub async fn can_access_course<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    course: &course::Model,
) -> Result<bool, AppError> {
    let approved = match auth_user.role {
        Role::Student => has_approved_enrollment(db, auth_user.user_id, course.id).await?,
        _ => false,
    };
    Ok(can_access(
        auth_user.role,
        auth_user.user_id,
        course.teacher_id,
        approved,
    ))
}

/// Admins pass; everyone else needs [`can_access_course`].
pub async fn require_course_access<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    course: &course::Model,
) -> Result<(), AppError> {
    if auth_user.role.is_admin() || can_access_course(db, auth_user, course).await? {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Course-scoped mutations: the caller must be the teacher who owns the course.
pub fn require_course_owner(auth_user: &AuthUser, course: &course::Model) -> Result<(), AppError> {
    if auth_user.role.is_teacher() && course.teacher_id == Some(auth_user.user_id) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Like [`require_course_owner`], but any admin also passes.
pub fn require_course_owner_or_admin(
    auth_user: &AuthUser,
    course: &course::Model,
) -> Result<(), AppError> {
    if auth_user.role.is_admin() {
        return Ok(());
    }
    require_course_owner(auth_user, course)
}

/// Look up a user by ID, returning 404 if not found.
pub async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Look up a course by ID, returning 404 if not found.
pub async fn find_course<C: ConnectionTrait>(db: &C, id: i32) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))
}

pub async fn find_module<C: ConnectionTrait>(db: &C, id: i32) -> Result<module::Model, AppError> {
    module::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Module not found".into()))
}

pub async fn find_topic<C: ConnectionTrait>(db: &C, id: i32) -> Result<topic::Model, AppError> {
    topic::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".into()))
}

pub async fn find_lesson<C: ConnectionTrait>(db: &C, id: i32) -> Result<lesson::Model, AppError> {
    lesson::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lesson not found".into()))
}

pub async fn find_quiz<C: ConnectionTrait>(db: &C, id: i32) -> Result<quiz::Model, AppError> {
    quiz::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".into()))
}

pub async fn find_essay<C: ConnectionTrait>(db: &C, id: i32) -> Result<essay::Model, AppError> {
    essay::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Essay not found".into()))
}

pub async fn find_live_class<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<live_class::Model, AppError> {
    live_class::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Live class not found".into()))
}

pub async fn find_discussion<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<discussion::Model, AppError> {
    discussion::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Discussion not found".into()))
}

/// Resolve the course a topic belongs to by walking topic -> module -> course.
pub async fn course_of_topic<C: ConnectionTrait>(
    db: &C,
    topic: &topic::Model,
) -> Result<course::Model, AppError> {
    let module = find_module(db, topic.module_id).await?;
    find_course(db, module.course_id).await
}

/// Resolve the course a lesson belongs to by walking lesson -> topic -> module -> course.
pub async fn course_of_lesson<C: ConnectionTrait>(
    db: &C,
    lesson: &lesson::Model,
) -> Result<course::Model, AppError> {
    let topic = find_topic(db, lesson.topic_id).await?;
    course_of_topic(db, &topic).await
}

/// Live count of approved enrollments.
pub async fn approved_count<C: ConnectionTrait>(db: &C, course_id: i32) -> Result<u64, AppError> {
    Ok(enrollment::Entity::find()
        .filter(enrollment::Column::CourseId.eq(course_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Approved))
        .count(db)
        .await?)
}
