use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use server::entity::{
    course, discussion, enrollment, essay, essay_submission, lesson, live_class, module, quiz,
    quiz_answer, quiz_question, quiz_submission, reply, topic,
};

use crate::common::{TestApp, routes};

mod course_management {
    use super::*;

    #[tokio::test]
    async fn course_requires_an_existing_teacher() {
        let app = TestApp::spawn().await;
        let student = app.create_student("kamal@school.lk", false).await;
        let admin = app.admin().await;

        let res = app
            .post_with_token(
                routes::COURSES,
                &json!({
                    "title": "Biology",
                    "description": "Grade 10",
                    "target_level": "Lower Secondary",
                    "teacher_id": student.id,
                }),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn new_course_defaults_to_fifty_seats() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let admin = app.admin().await;

        let res = app
            .post_with_token(
                routes::COURSES,
                &json!({
                    "title": "Biology",
                    "description": "Grade 10",
                    "target_level": "Lower Secondary",
                    "teacher_id": teacher.id,
                }),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["max_students"], 50);
        assert_eq!(res.body["enrolled_count"], 0);
        assert_eq!(res.body["is_full"], false);
        assert_eq!(res.body["target_level"], "Lower Secondary");
    }

    #[tokio::test]
    async fn teachers_only_list_their_own_courses() {
        let app = TestApp::spawn().await;
        let mine = app.create_teacher("mine@school.lk").await;
        let other = app.create_teacher("other@school.lk").await;
        let own_course = app.create_course(mine.id, 10).await;
        app.create_course(other.id, 10).await;

        let res = app.get_with_token(routes::COURSES, &mine.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], own_course);
    }

    #[tokio::test]
    async fn students_see_every_course_with_their_enrollment_status() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let requested = app.create_course(teacher.id, 10).await;
        app.create_course(teacher.id, 10).await;
        let student = app.create_student("kamal@school.lk", true).await;
        app.request_enrollment(requested, &student).await;

        let res = app.get_with_token(routes::COURSES, &student.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        let item = data.iter().find(|c| c["id"] == requested).unwrap();
        assert_eq!(item["my_enrollment"], "pending");
    }

    #[tokio::test]
    async fn course_detail_is_gated_by_approved_enrollment() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let course_id = app.create_course(teacher.id, 10).await;
        let student = app.create_student("kamal@school.lk", true).await;
        let enrollment_id = app.request_enrollment(course_id, &student).await;

        let pending = app
            .get_with_token(&routes::course(course_id), &student.token)
            .await;
        assert_eq!(pending.status, 403);
        assert_eq!(pending.body["code"], "PERMISSION_DENIED");

        app.post_with_token(&routes::approve(enrollment_id), &json!({}), &teacher.token)
            .await;

        let approved = app
            .get_with_token(&routes::course(course_id), &student.token)
            .await;
        assert_eq!(approved.status, 200, "{}", approved.text);
        assert_eq!(approved.body["course"]["id"], course_id);
        assert!(approved.body["modules"].is_array());
    }

    #[tokio::test]
    async fn other_teachers_cannot_open_the_course() {
        let app = TestApp::spawn().await;
        let owner = app.create_teacher("owner@school.lk").await;
        let other = app.create_teacher("other@school.lk").await;
        let course_id = app.create_course(owner.id, 10).await;

        let res = app
            .get_with_token(&routes::course(course_id), &other.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn null_teacher_unassigns_the_course() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let course_id = app.create_course(teacher.id, 10).await;
        let admin = app.admin().await;

        let res = app
            .patch_with_token(
                &routes::course(course_id),
                &json!({"teacher_id": null, "title": "Renamed"}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["teacher_id"].is_null());
        assert_eq!(res.body["title"], "Renamed");

        let lost = app
            .get_with_token(&routes::course(course_id), &teacher.token)
            .await;
        assert_eq!(lost.status, 403);
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;

        let res = app.get_with_token(&routes::course(9999), &admin.token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod enrollment_flow {
    use super::*;

    #[tokio::test]
    async fn single_seat_course_fills_after_one_approval() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let course_id = app.create_course(teacher.id, 1).await;
        let first = app.create_student("first@school.lk", true).await;
        let second = app.create_student("second@school.lk", true).await;

        let enrollment_id = app.request_enrollment(course_id, &first).await;
        let approved = app
            .post_with_token(&routes::approve(enrollment_id), &json!({}), &teacher.token)
            .await;
        assert_eq!(approved.status, 200, "{}", approved.text);
        assert_eq!(approved.body["status"], "approved");

        let detail = app
            .get_with_token(&routes::course(course_id), &teacher.token)
            .await;
        assert_eq!(detail.body["course"]["enrolled_count"], 1);
        assert_eq!(detail.body["course"]["is_full"], true);

        let res = app
            .post_with_token(&routes::enroll(course_id), &json!({}), &second.token)
            .await;
        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(res.body["code"], "COURSE_FULL");

        let rows = enrollment::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn unpaid_students_cannot_request_enrollment() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let course_id = app.create_course(teacher.id, 10).await;
        let student = app.create_student("kamal@school.lk", false).await;

        let res = app
            .post_with_token(&routes::enroll(course_id), &json!({}), &student.token)
            .await;

        assert_eq!(res.status, 402);
        assert_eq!(res.body["code"], "PAYMENT_REQUIRED");
        assert_eq!(enrollment::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_request_is_a_conflict() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let course_id = app.create_course(teacher.id, 10).await;
        let student = app.create_student("kamal@school.lk", true).await;
        app.request_enrollment(course_id, &student).await;

        let res = app
            .post_with_token(&routes::enroll(course_id), &json!({}), &student.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn teachers_cannot_request_enrollment() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let course_id = app.create_course(teacher.id, 10).await;

        let res = app
            .post_with_token(&routes::enroll(course_id), &json!({}), &teacher.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn resolution_keeps_identity_and_is_terminal() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let course_id = app.create_course(teacher.id, 10).await;
        let student = app.create_student("kamal@school.lk", true).await;
        let enrollment_id = app.request_enrollment(course_id, &student).await;

        let res = app
            .post_with_token(&routes::approve(enrollment_id), &json!({}), &teacher.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], enrollment_id);
        assert_eq!(res.body["student_id"], student.id);
        assert_eq!(res.body["course_id"], course_id);
        assert!(res.body["responded_at"].is_string());

        let again = app
            .post_with_token(&routes::approve(enrollment_id), &json!({}), &teacher.token)
            .await;
        assert_eq!(again.status, 409);
        assert_eq!(again.body["code"], "CONFLICT");

        let decline = app
            .post_with_token(&routes::decline(enrollment_id), &json!({}), &teacher.token)
            .await;
        assert_eq!(decline.status, 409);

        let row = enrollment::Entity::find_by_id(enrollment_id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status.as_str(), "approved");
    }

    #[tokio::test]
    async fn declined_students_cannot_request_again() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let course_id = app.create_course(teacher.id, 10).await;
        let student = app.create_student("kamal@school.lk", true).await;
        let enrollment_id = app.request_enrollment(course_id, &student).await;

        let res = app
            .post_with_token(&routes::decline(enrollment_id), &json!({}), &teacher.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "declined");

        let retry = app
            .post_with_token(&routes::enroll(course_id), &json!({}), &student.token)
            .await;
        assert_eq!(retry.status, 409);
    }

    #[tokio::test]
    async fn only_the_owning_teacher_resolves_requests() {
        let app = TestApp::spawn().await;
        let owner = app.create_teacher("owner@school.lk").await;
        let other = app.create_teacher("other@school.lk").await;
        let course_id = app.create_course(owner.id, 10).await;
        let student = app.create_student("kamal@school.lk", true).await;
        let enrollment_id = app.request_enrollment(course_id, &student).await;

        let res = app
            .post_with_token(&routes::approve(enrollment_id), &json!({}), &other.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn teacher_sees_course_enrollments_with_names() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;

        let res = app
            .get_with_token(&routes::course_enrollments(course_id), &teacher.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["student_id"], student.id);
        assert_eq!(data[0]["student_name"], "Nimal Perera");
    }
}

mod dashboards {
    use super::*;

    #[tokio::test]
    async fn teacher_dashboard_totals_students_and_pending_requests() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, _student) = app.classroom().await;
        let waiting = app.create_student("waiting@school.lk", true).await;
        app.request_enrollment(course_id, &waiting).await;

        let res = app
            .get_with_token(routes::TEACHER_DASHBOARD, &teacher.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["courses"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["total_students"], 1);
        let pending = res.body["pending_requests"].as_array().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["student_id"], waiting.id);
    }

    #[tokio::test]
    async fn student_dashboard_lists_only_approved_courses() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let other_course = app.create_course(teacher.id, 10).await;
        app.request_enrollment(other_course, &student).await;

        let res = app
            .get_with_token(routes::STUDENT_DASHBOARD, &student.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let courses = res.body["courses"].as_array().unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0]["id"], course_id);
        assert_eq!(res.body["unread_count"], 0);
    }

    #[tokio::test]
    async fn dashboards_are_role_specific() {
        let app = TestApp::spawn().await;
        let student = app.create_student("kamal@school.lk", false).await;

        let res = app
            .get_with_token(routes::TEACHER_DASHBOARD, &student.token)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn deleting_a_course_leaves_no_orphans() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;

        // Curriculum.
        let module = app
            .post_with_token(
                &routes::course_modules(course_id),
                &json!({"title": "Cells"}),
                &teacher.token,
            )
            .await;
        assert_eq!(module.status, 201, "{}", module.text);
        let topic = app
            .post_with_token(
                &routes::module_topics(module.id()),
                &json!({"title": "Organelles"}),
                &teacher.token,
            )
            .await;
        assert_eq!(topic.status, 201, "{}", topic.text);
        let lesson = app
            .post_with_token(
                &routes::topic_lessons(topic.id()),
                &json!({"title": "Mitochondria", "theory_text": "Powerhouse"}),
                &teacher.token,
            )
            .await;
        assert_eq!(lesson.status, 201, "{}", lesson.text);

        // Quiz with a submission.
        let quiz = app
            .post_with_token(
                &routes::course_quizzes(course_id),
                &json!({
                    "title": "Cell quiz",
                    "questions": [{
                        "question_text": "Powerhouse of the cell?",
                        "option_a": "Mitochondria",
                        "option_b": "Nucleus",
                        "option_c": "Ribosome",
                        "option_d": "Golgi",
                        "correct_option": "A",
                        "points": 2,
                    }],
                }),
                &teacher.token,
            )
            .await;
        assert_eq!(quiz.status, 201, "{}", quiz.text);
        let quiz_id = quiz.body["quiz"]["id"].as_i64().unwrap() as i32;
        let question_id = quiz.body["questions"][0]["id"].as_i64().unwrap();
        let submitted = app
            .post_with_token(
                &routes::quiz_submit(quiz_id),
                &json!({"answers": {question_id.to_string(): "A"}}),
                &student.token,
            )
            .await;
        assert_eq!(submitted.status, 201, "{}", submitted.text);

        // Essay with a submission.
        let essay = app
            .post_with_token(
                &routes::course_essays(course_id),
                &json!({"title": "Osmosis", "question_text": "Explain osmosis."}),
                &teacher.token,
            )
            .await;
        assert_eq!(essay.status, 201, "{}", essay.text);
        let form = reqwest::multipart::Form::new().text("text_content", "Water moves.");
        let essay_sub = app
            .multipart_with_token(&routes::essay_submit(essay.id()), form, &student.token)
            .await;
        assert_eq!(essay_sub.status, 201, "{}", essay_sub.text);

        // Live class and a discussion with a reply.
        let live = app
            .post_with_token(
                &routes::course_live_classes(course_id),
                &json!({"title": "Revision", "stream_url": "https://meet.example/abc"}),
                &teacher.token,
            )
            .await;
        assert_eq!(live.status, 201, "{}", live.text);
        let thread = app
            .post_with_token(
                &routes::course_discussions(course_id),
                &json!({"title": "Question", "content": "What is ATP?"}),
                &student.token,
            )
            .await;
        assert_eq!(thread.status, 201, "{}", thread.text);
        let answer = app
            .post_with_token(
                &routes::discussion_replies(thread.id()),
                &json!({"content": "Energy currency."}),
                &teacher.token,
            )
            .await;
        assert_eq!(answer.status, 201, "{}", answer.text);

        let admin = app.admin().await;
        let res = app
            .delete_with_token(&routes::course(course_id), &admin.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let db = &app.db;
        assert_eq!(course::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(module::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(topic::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(lesson::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(enrollment::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(quiz::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(quiz_question::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(quiz_submission::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(quiz_answer::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(essay::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(essay_submission::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(live_class::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(discussion::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(reply::Entity::find().count(db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn only_admins_delete_courses() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let course_id = app.create_course(teacher.id, 10).await;

        let res = app
            .delete_with_token(&routes::course(course_id), &teacher.token)
            .await;

        assert_eq!(res.status, 403);
    }
}
