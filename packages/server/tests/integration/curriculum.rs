use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

/// Module -> topic scaffold; returns the topic ID.
async fn scaffold(app: &TestApp, teacher: &TestUser, course_id: i32) -> i32 {
    let module = app
        .post_with_token(
            &routes::course_modules(course_id),
            &json!({"title": "Cell Biology"}),
            &teacher.token,
        )
        .await;
    assert_eq!(module.status, 201, "module: {}", module.text);
    let topic = app
        .post_with_token(
            &routes::module_topics(module.id()),
            &json!({"title": "Organelles"}),
            &teacher.token,
        )
        .await;
    assert_eq!(topic.status, 201, "topic: {}", topic.text);
    topic.id()
}

mod sections {
    use super::*;

    #[tokio::test]
    async fn outline_is_ordered_by_position_then_id() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, _student) = app.classroom().await;

        for (title, order) in [("Genetics", 2), ("Cells", 1), ("Ecology", 2)] {
            let res = app
                .post_with_token(
                    &routes::course_modules(course_id),
                    &json!({"title": title, "order": order}),
                    &teacher.token,
                )
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app
            .get_with_token(&routes::course(course_id), &teacher.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let titles: Vec<&str> = res.body["modules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["module"]["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Cells", "Genetics", "Ecology"]);
    }

    #[tokio::test]
    async fn module_update_and_delete() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, _student) = app.classroom().await;
        let topic_id = scaffold(&app, &teacher, course_id).await;
        let outline = app
            .get_with_token(&routes::course(course_id), &teacher.token)
            .await;
        let module_id = outline.body["modules"][0]["module"]["id"].as_i64().unwrap() as i32;

        let res = app
            .patch_with_token(
                &format!("/api/v1/modules/{module_id}"),
                &json!({"title": "Cytology", "description": "Intro"}),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Cytology");
        assert_eq!(res.body["description"], "Intro");

        let res = app
            .delete_with_token(&format!("/api/v1/modules/{module_id}"), &teacher.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        // Topics go with their module.
        let res = app
            .post_with_token(
                &routes::topic_lessons(topic_id),
                &json!({"title": "Orphan"}),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn students_cannot_edit_curriculum() {
        let app = TestApp::spawn().await;
        let (_teacher, course_id, student) = app.classroom().await;

        let res = app
            .post_with_token(
                &routes::course_modules(course_id),
                &json!({"title": "Hijack"}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, _student) = app.classroom().await;

        let res = app
            .post_with_token(
                &routes::course_modules(course_id),
                &json!({"title": "   "}),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod lessons {
    use super::*;

    #[tokio::test]
    async fn approved_student_views_lesson_with_outline() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let topic_id = scaffold(&app, &teacher, course_id).await;

        let created = app
            .post_with_token(
                &routes::topic_lessons(topic_id),
                &json!({
                    "title": "Mitochondria",
                    "theory_text": "<p>Powerhouse of the cell</p>",
                    "video_url": "https://www.youtube.com/watch?v=abc",
                    "is_lab_lesson": true,
                }),
                &teacher.token,
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        assert_eq!(created.body["image_files"], json!([]));

        let res = app
            .get_with_token(&routes::lesson(created.id()), &student.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["lesson"]["title"], "Mitochondria");
        assert_eq!(res.body["lesson"]["is_lab_lesson"], true);
        assert_eq!(res.body["course_id"], course_id);
        let outline = res.body["outline"].as_array().unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0]["topics"][0]["lessons"][0]["id"], created.id());
    }

    #[tokio::test]
    async fn pending_student_cannot_view_lessons() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, _student) = app.classroom().await;
        let topic_id = scaffold(&app, &teacher, course_id).await;
        let lesson = app
            .post_with_token(
                &routes::topic_lessons(topic_id),
                &json!({"title": "Mitochondria"}),
                &teacher.token,
            )
            .await;
        let waiting = app.create_student("waiting@school.lk", true).await;
        app.request_enrollment(course_id, &waiting).await;

        let res = app
            .get_with_token(&routes::lesson(lesson.id()), &waiting.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn lesson_media_must_have_been_uploaded() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, _student) = app.classroom().await;
        let topic_id = scaffold(&app, &teacher, course_id).await;

        let missing = app
            .post_with_token(
                &routes::topic_lessons(topic_id),
                &json!({"title": "Lab", "image_files": ["nowhere.png"]}),
                &teacher.token,
            )
            .await;
        assert_eq!(missing.status, 400, "{}", missing.text);
        assert_eq!(missing.body["code"], "VALIDATION_ERROR");

        let upload = app
            .multipart_with_token(
                routes::UPLOADS,
                TestApp::file_form("cell.png", b"\x89PNG fake image".to_vec()),
                &teacher.token,
            )
            .await;
        assert_eq!(upload.status, 201, "{}", upload.text);
        let stored = upload.body["file_name"].as_str().unwrap().to_string();

        let res = app
            .post_with_token(
                &routes::topic_lessons(topic_id),
                &json!({"title": "Lab", "image_files": [stored]}),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["image_files"], json!([stored]));
    }

    #[tokio::test]
    async fn path_like_media_names_are_rejected() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, _student) = app.classroom().await;
        let topic_id = scaffold(&app, &teacher, course_id).await;

        let res = app
            .post_with_token(
                &routes::topic_lessons(topic_id),
                &json!({"title": "Lab", "video_file": "../secret.mp4"}),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn update_clears_fields_with_null_and_delete_removes() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let topic_id = scaffold(&app, &teacher, course_id).await;
        let lesson = app
            .post_with_token(
                &routes::topic_lessons(topic_id),
                &json!({"title": "Mitosis", "theory_text": "Phases"}),
                &teacher.token,
            )
            .await;

        let res = app
            .patch_with_token(
                &routes::lesson(lesson.id()),
                &json!({"theory_text": null, "order": 3}),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["theory_text"].is_null());
        assert_eq!(res.body["order"], 3);
        assert_eq!(res.body["title"], "Mitosis");

        let res = app
            .delete_with_token(&routes::lesson(lesson.id()), &teacher.token)
            .await;
        assert_eq!(res.status, 204);

        let gone = app
            .get_with_token(&routes::lesson(lesson.id()), &student.token)
            .await;
        assert_eq!(gone.status, 404);
    }
}

mod uploads {
    use super::*;

    #[tokio::test]
    async fn editor_upload_returns_servable_location() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;

        let res = app
            .multipart_with_token(
                routes::UPLOADS,
                TestApp::file_form("notes.pdf", b"%PDF-1.4 notes".to_vec()),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let name = res.body["file_name"].as_str().unwrap();
        assert!(name.ends_with(".pdf"));
        assert_eq!(res.body["location"], routes::upload(name));

        let served = app.get_with_token(&routes::upload(name), &teacher.token).await;
        assert_eq!(served.status, 200);
        assert_eq!(served.header("content-type"), "application/pdf");
        assert_eq!(served.text, "%PDF-1.4 notes");
    }

    #[tokio::test]
    async fn repeated_file_fields_are_rejected_without_leftovers() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let form = TestApp::file_form("first.png", b"png one".to_vec()).part(
            "file",
            reqwest::multipart::Part::bytes(b"png two".to_vec()).file_name("second.png"),
        );

        let res = app
            .multipart_with_token(routes::UPLOADS, form, &teacher.token)
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.stored_files("").is_empty());
    }

    #[tokio::test]
    async fn disallowed_extension_is_rejected() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;

        let res = app
            .multipart_with_token(
                routes::UPLOADS,
                TestApp::file_form("setup.exe", b"MZ".to_vec()),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversize_upload_is_rejected() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let big = vec![0u8; crate::common::MAX_UPLOAD_SIZE as usize + 1];

        let res = app
            .multipart_with_token(
                routes::UPLOADS,
                TestApp::file_form("big.png", big),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
    }

    #[tokio::test]
    async fn students_cannot_upload() {
        let app = TestApp::spawn().await;
        let student = app.create_student("kamal@school.lk", false).await;

        let res = app
            .multipart_with_token(
                routes::UPLOADS,
                TestApp::file_form("cell.png", b"png".to_vec()),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn downloads_require_a_session() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::upload("cell.png")).await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn traversal_names_are_not_served() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;

        let res = app
            .get_with_token(&routes::upload("..%2Fsecret.pdf"), &teacher.token)
            .await;

        assert!(res.status == 400 || res.status == 404, "status {}", res.status);
    }
}
