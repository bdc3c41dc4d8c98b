use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{
    admin, auth, course, curriculum, dashboard, discussion, enrollment, essay, grades, library,
    live_class, notification, quiz, upload,
};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .nest("/dashboard", dashboard_routes())
        .nest("/courses", course_routes())
        .nest("/enrollments", enrollment_routes())
        .nest("/modules", module_routes())
        .nest("/topics", topic_routes())
        .nest("/lessons", lesson_routes())
        .nest("/quizzes", quiz_routes())
        .nest("/essays", essay_routes())
        .nest("/essay-submissions", essay_submission_routes())
        .nest("/grades", grade_routes())
        .nest("/live-classes", live_class_routes())
        .nest("/discussions", discussion_routes())
        .nest("/notifications", notification_routes())
        .nest("/uploads", upload_routes())
        .nest("/library", library_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::admin_login))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::me))
        .routes(routes!(auth::make_payment))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(admin::create_teacher))
        .routes(routes!(admin::list_users))
        .routes(routes!(admin::admin_dashboard))
        .routes(routes!(admin::admin_notify))
}

fn dashboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(dashboard::teacher_dashboard))
        .routes(routes!(dashboard::student_dashboard))
}

/// Course routes plus everything created under a course.
fn course_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(course::list_courses, course::create_course))
        .routes(routes!(
            course::get_course,
            course::update_course,
            course::delete_course
        ))
        .routes(routes!(enrollment::request_enrollment))
        .routes(routes!(enrollment::list_course_enrollments))
        .routes(routes!(curriculum::create_module))
        .routes(routes!(quiz::list_quizzes, quiz::create_quiz))
        .routes(routes!(essay::list_essays, essay::create_essay))
        .routes(routes!(
            live_class::list_live_classes,
            live_class::start_live_class
        ))
        .routes(routes!(
            discussion::list_discussions,
            discussion::create_discussion
        ))
        .routes(routes!(notification::teacher_notify))
}

fn enrollment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(enrollment::approve_enrollment))
        .routes(routes!(enrollment::decline_enrollment))
}

fn module_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(curriculum::update_module, curriculum::delete_module))
        .routes(routes!(curriculum::create_topic))
}

fn topic_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(curriculum::update_topic, curriculum::delete_topic))
        .routes(routes!(curriculum::create_lesson))
}

fn lesson_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        curriculum::view_lesson,
        curriculum::update_lesson,
        curriculum::delete_lesson
    ))
}

fn quiz_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(quiz::get_quiz))
        .routes(routes!(quiz::add_question))
        .routes(routes!(quiz::submit_quiz))
        .routes(routes!(quiz::list_quiz_submissions))
}

fn essay_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(essay::get_essay))
        .routes(routes!(essay::submit_essay))
        .routes(routes!(essay::list_essay_submissions))
}

fn essay_submission_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(essay::grade_essay))
}

fn grade_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(grades::student_grades))
}

fn live_class_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(live_class::end_live_class))
}

fn discussion_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(discussion::get_discussion))
        .routes(routes!(discussion::create_reply))
        .routes(routes!(discussion::set_pinned))
}

fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(notification::list_notifications))
        .routes(routes!(notification::mark_read))
}

fn upload_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(upload::editor_upload))
        .routes(routes!(upload::serve_upload))
}

fn library_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(library::list_resources, library::upload_resource))
        .routes(routes!(library::get_resource, library::delete_resource))
        .routes(routes!(library::serve_library_file))
        .routes(routes!(library::ai_research))
}
