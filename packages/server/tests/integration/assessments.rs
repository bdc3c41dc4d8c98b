use reqwest::multipart::{Form, Part};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};

use server::entity::essay_submission;

use crate::common::{TestApp, TestUser, routes};

fn question(text: &str, correct: &str, points: i32) -> Value {
    json!({
        "question_text": text,
        "option_a": "Mitochondria",
        "option_b": "Nucleus",
        "option_c": "Ribosome",
        "option_d": "Golgi body",
        "correct_option": correct,
        "points": points,
    })
}

/// Two-question quiz worth 5 + 10. Returns the quiz ID and question IDs.
async fn create_quiz(app: &TestApp, teacher: &TestUser, course_id: i32) -> (i32, i32, i32) {
    let res = app
        .post_with_token(
            &routes::course_quizzes(course_id),
            &json!({
                "title": "Cell Structure Quiz",
                "questions": [
                    question("Which organelle produces ATP?", "A", 5),
                    question("Where are proteins assembled?", "c", 10),
                ],
            }),
            &teacher.token,
        )
        .await;
    assert_eq!(res.status, 201, "create_quiz failed: {}", res.text);
    let quiz_id = res.body["quiz"]["id"].as_i64().unwrap() as i32;
    let q1 = res.body["questions"][0]["id"].as_i64().unwrap() as i32;
    let q2 = res.body["questions"][1]["id"].as_i64().unwrap() as i32;
    (quiz_id, q1, q2)
}

async fn create_essay(app: &TestApp, teacher: &TestUser, course_id: i32, files: bool) -> i32 {
    let res = app
        .post_with_token(
            &routes::course_essays(course_id),
            &json!({
                "title": "Photosynthesis",
                "question_text": "Describe the light reactions.",
                "allows_file_upload": files,
                "max_points": 20,
            }),
            &teacher.token,
        )
        .await;
    assert_eq!(res.status, 201, "create_essay failed: {}", res.text);
    res.id()
}

mod quizzes {
    use super::*;

    #[tokio::test]
    async fn submission_is_scored_per_question() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let (quiz_id, q1, q2) = create_quiz(&app, &teacher, course_id).await;

        let res = app
            .post_with_token(
                &routes::quiz_submit(quiz_id),
                &json!({"answers": {q1.to_string(): "a", q2.to_string(): "B"}}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["total_score"], 5);
        assert_eq!(res.body["max_score"], 15);
        assert_eq!(res.body["percentage"], 33.33);
        assert_eq!(res.body["graded"], true);
        let answers = res.body["answers"].as_array().unwrap();
        assert_eq!(answers.len(), 2);
        let first = answers.iter().find(|a| a["question_id"] == q1).unwrap();
        assert_eq!(first["points_earned"], 5);
        assert_eq!(first["selected_option"], "A");
    }

    #[tokio::test]
    async fn unanswered_questions_score_zero() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let (quiz_id, _q1, q2) = create_quiz(&app, &teacher, course_id).await;

        let res = app
            .post_with_token(
                &routes::quiz_submit(quiz_id),
                &json!({"answers": {q2.to_string(): "C"}}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["total_score"], 10);
    }

    #[tokio::test]
    async fn second_submission_is_a_conflict() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let (quiz_id, q1, _q2) = create_quiz(&app, &teacher, course_id).await;
        let body = json!({"answers": {q1.to_string(): "A"}});

        let first = app
            .post_with_token(&routes::quiz_submit(quiz_id), &body, &student.token)
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app
            .post_with_token(&routes::quiz_submit(quiz_id), &body, &student.token)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn questions_are_frozen_after_the_first_submission() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let (quiz_id, q1, _q2) = create_quiz(&app, &teacher, course_id).await;

        let added = app
            .post_with_token(
                &routes::quiz_questions(quiz_id),
                &question("Site of photosynthesis?", "D", 2),
                &teacher.token,
            )
            .await;
        assert_eq!(added.status, 201, "{}", added.text);
        assert_eq!(added.body["quiz"]["total_points"], 17);

        app.post_with_token(
            &routes::quiz_submit(quiz_id),
            &json!({"answers": {q1.to_string(): "A"}}),
            &student.token,
        )
        .await;

        let res = app
            .post_with_token(
                &routes::quiz_questions(quiz_id),
                &question("Too late?", "A", 1),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn students_never_see_the_answer_key() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let (quiz_id, _q1, _q2) = create_quiz(&app, &teacher, course_id).await;

        let as_student = app.get_with_token(&routes::quiz(quiz_id), &student.token).await;
        assert_eq!(as_student.status, 200, "{}", as_student.text);
        for q in as_student.body["questions"].as_array().unwrap() {
            assert!(q.get("correct_option").is_none(), "leaked: {q}");
        }

        let as_teacher = app.get_with_token(&routes::quiz(quiz_id), &teacher.token).await;
        assert_eq!(as_teacher.body["questions"][0]["correct_option"], "A");
        assert_eq!(as_teacher.body["questions"][1]["correct_option"], "C");
    }

    #[tokio::test]
    async fn answers_for_foreign_questions_are_rejected() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let (quiz_id, _q1, _q2) = create_quiz(&app, &teacher, course_id).await;

        let res = app
            .post_with_token(
                &routes::quiz_submit(quiz_id),
                &json!({"answers": {"99999": "A"}}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn invalid_correct_option_is_rejected() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, _student) = app.classroom().await;

        let res = app
            .post_with_token(
                &routes::course_quizzes(course_id),
                &json!({"title": "Broken", "questions": [question("?", "E", 1)]}),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn teacher_lists_submissions_with_student_names() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let (quiz_id, q1, _q2) = create_quiz(&app, &teacher, course_id).await;
        app.post_with_token(
            &routes::quiz_submit(quiz_id),
            &json!({"answers": {q1.to_string(): "A"}}),
            &student.token,
        )
        .await;

        let res = app
            .get_with_token(&routes::quiz_submissions(quiz_id), &teacher.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["student_id"], student.id);
        assert_eq!(data[0]["student_name"], "Nimal Perera");
    }
}

mod essays {
    use super::*;

    #[tokio::test]
    async fn empty_submission_is_rejected_without_a_row() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let essay_id = create_essay(&app, &teacher, course_id, true).await;

        let form = Form::new().text("text_content", "   ");
        let res = app
            .multipart_with_token(&routes::essay_submit(essay_id), form, &student.token)
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let rows = essay_submission::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn file_is_refused_when_the_essay_does_not_allow_it() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let essay_id = create_essay(&app, &teacher, course_id, false).await;

        let res = app
            .multipart_with_token(
                &routes::essay_submit(essay_id),
                TestApp::file_form("answer.pdf", b"%PDF-1.4".to_vec()),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
    }

    #[tokio::test]
    async fn file_only_submission_is_accepted() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let essay_id = create_essay(&app, &teacher, course_id, true).await;

        let res = app
            .multipart_with_token(
                &routes::essay_submit(essay_id),
                TestApp::file_form("answer.pdf", b"%PDF-1.4 essay".to_vec()),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["text_content"].is_null());
        let stored = res.body["uploaded_file"].as_str().unwrap();
        assert!(stored.ends_with("answer.pdf"), "stored as {stored}");
        assert_eq!(res.body["graded"], false);
    }

    #[tokio::test]
    async fn non_ascii_file_name_keeps_its_extension() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let essay_id = create_essay(&app, &teacher, course_id, true).await;

        let res = app
            .multipart_with_token(
                &routes::essay_submit(essay_id),
                TestApp::file_form("生物.pdf", b"%PDF-1.4 essay".to_vec()),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let stored = res.body["uploaded_file"].as_str().unwrap();
        assert!(stored.ends_with("_file.pdf"), "stored as {stored}");
    }

    #[tokio::test]
    async fn rejected_second_file_removes_the_first() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let essay_id = create_essay(&app, &teacher, course_id, true).await;

        for second in ["setup.exe", "appendix.pdf"] {
            let form = TestApp::file_form("answer.pdf", b"%PDF-1.4 essay".to_vec()).part(
                "file",
                Part::bytes(b"second part".to_vec()).file_name(second),
            );
            let res = app
                .multipart_with_token(&routes::essay_submit(essay_id), form, &student.token)
                .await;

            assert_eq!(res.status, 400, "{second}: {}", res.text);
            assert!(app.stored_files("").is_empty(), "{second} left files behind");
        }

        let rows = essay_submission::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn grading_is_bounded_and_happens_once() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let essay_id = create_essay(&app, &teacher, course_id, false).await;
        let form = Form::new().text("text_content", "Light is absorbed by chlorophyll.");
        let submitted = app
            .multipart_with_token(&routes::essay_submit(essay_id), form, &student.token)
            .await;
        assert_eq!(submitted.status, 201, "{}", submitted.text);
        let submission_id = submitted.id();

        let too_high = app
            .post_with_token(
                &routes::grade_essay(submission_id),
                &json!({"score": 21}),
                &teacher.token,
            )
            .await;
        assert_eq!(too_high.status, 400);

        let negative = app
            .post_with_token(
                &routes::grade_essay(submission_id),
                &json!({"score": -1}),
                &teacher.token,
            )
            .await;
        assert_eq!(negative.status, 400);

        let res = app
            .post_with_token(
                &routes::grade_essay(submission_id),
                &json!({"score": 16, "feedback": "Good detail."}),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["score"], 16);
        assert_eq!(res.body["feedback"], "Good detail.");
        assert_eq!(res.body["graded"], true);

        let again = app
            .post_with_token(
                &routes::grade_essay(submission_id),
                &json!({"score": 18}),
                &teacher.token,
            )
            .await;
        assert_eq!(again.status, 409);
    }

    #[tokio::test]
    async fn students_cannot_grade() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let essay_id = create_essay(&app, &teacher, course_id, false).await;
        let submitted = app
            .multipart_with_token(
                &routes::essay_submit(essay_id),
                Form::new().text("text_content", "Answer"),
                &student.token,
            )
            .await;

        let res = app
            .post_with_token(
                &routes::grade_essay(submitted.id()),
                &json!({"score": 20}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn second_essay_submission_is_a_conflict() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let essay_id = create_essay(&app, &teacher, course_id, false).await;

        let first = app
            .multipart_with_token(
                &routes::essay_submit(essay_id),
                Form::new().text("text_content", "Answer"),
                &student.token,
            )
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app
            .multipart_with_token(
                &routes::essay_submit(essay_id),
                Form::new().text("text_content", "Another"),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 409);
    }
}

mod grades {
    use super::*;

    #[tokio::test]
    async fn grade_book_aggregates_quizzes_and_graded_essays() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let (quiz_id, q1, _q2) = create_quiz(&app, &teacher, course_id).await;
        app.post_with_token(
            &routes::quiz_submit(quiz_id),
            &json!({"answers": {q1.to_string(): "A"}}),
            &student.token,
        )
        .await;

        let graded_essay = create_essay(&app, &teacher, course_id, false).await;
        let pending_essay = create_essay(&app, &teacher, course_id, false).await;
        let graded = app
            .multipart_with_token(
                &routes::essay_submit(graded_essay),
                Form::new().text("text_content", "Answer"),
                &student.token,
            )
            .await;
        app.multipart_with_token(
            &routes::essay_submit(pending_essay),
            Form::new().text("text_content", "Answer"),
            &student.token,
        )
        .await;
        app.post_with_token(
            &routes::grade_essay(graded.id()),
            &json!({"score": 15}),
            &teacher.token,
        )
        .await;

        let res = app.get_with_token(routes::GRADES, &student.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["quizzes"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["essays"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["quiz_percentage"], 33.33);
        // Ungraded essays do not count.
        assert_eq!(res.body["essay_percentage"], 75.0);
    }

    #[tokio::test]
    async fn empty_grade_book_is_zero() {
        let app = TestApp::spawn().await;
        let student = app.create_student("kamal@school.lk", false).await;

        let res = app.get_with_token(routes::GRADES, &student.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["quiz_percentage"], 0.0);
        assert_eq!(res.body["essay_percentage"], 0.0);
    }
}
