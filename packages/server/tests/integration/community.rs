use sea_orm::{EntityTrait, PaginatorTrait, Set};
use serde_json::json;

use server::entity::{notification, user};

use crate::common::{TestApp, routes};

mod live_classes {
    use super::*;

    #[tokio::test]
    async fn one_active_live_class_per_course() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let body = json!({
            "title": "Revision: Genetics",
            "stream_url": "https://meet.example.com/bio",
        });

        let started = app
            .post_with_token(&routes::course_live_classes(course_id), &body, &teacher.token)
            .await;
        assert_eq!(started.status, 201, "{}", started.text);
        assert_eq!(started.body["is_active"], true);
        assert!(started.body["started_at"].is_string());

        let second = app
            .post_with_token(&routes::course_live_classes(course_id), &body, &teacher.token)
            .await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "CONFLICT");

        let ended = app
            .post_with_token(&routes::end_live_class(started.id()), &json!({}), &teacher.token)
            .await;
        assert_eq!(ended.status, 200, "{}", ended.text);
        assert_eq!(ended.body["is_active"], false);
        assert!(ended.body["ended_at"].is_string());

        let again = app
            .post_with_token(&routes::end_live_class(started.id()), &json!({}), &teacher.token)
            .await;
        assert_eq!(again.status, 409);

        let restarted = app
            .post_with_token(&routes::course_live_classes(course_id), &body, &teacher.token)
            .await;
        assert_eq!(restarted.status, 201, "{}", restarted.text);

        let list = app
            .get_with_token(&routes::course_live_classes(course_id), &student.token)
            .await;
        assert_eq!(list.status, 200, "{}", list.text);
        let data = list.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["id"], restarted.id());
    }

    #[tokio::test]
    async fn students_cannot_start_live_classes() {
        let app = TestApp::spawn().await;
        let (_teacher, course_id, student) = app.classroom().await;

        let res = app
            .post_with_token(
                &routes::course_live_classes(course_id),
                &json!({"title": "Mine", "stream_url": "https://meet.example.com/x"}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod discussions {
    use super::*;

    #[tokio::test]
    async fn students_cannot_pin_their_own_threads() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;

        let res = app
            .post_with_token(
                &routes::course_discussions(course_id),
                &json!({"title": "Osmosis?", "content": "How does it work?", "is_pinned": true}),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["is_pinned"], false);
        assert_eq!(res.body["author_name"], "Nimal Perera");

        let pinned = app
            .put_with_token(
                &routes::discussion_pin(res.id()),
                &json!({"is_pinned": true}),
                &teacher.token,
            )
            .await;
        assert_eq!(pinned.status, 200, "{}", pinned.text);
        assert_eq!(pinned.body["is_pinned"], true);

        let denied = app
            .put_with_token(
                &routes::discussion_pin(res.id()),
                &json!({"is_pinned": false}),
                &student.token,
            )
            .await;
        assert_eq!(denied.status, 403);
    }

    #[tokio::test]
    async fn pinned_threads_come_first_then_newest() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;

        let announcement = app
            .post_with_token(
                &routes::course_discussions(course_id),
                &json!({"title": "Read me", "content": "Rules", "is_pinned": true}),
                &teacher.token,
            )
            .await;
        assert_eq!(announcement.status, 201, "{}", announcement.text);
        assert_eq!(announcement.body["is_pinned"], true);
        let older = app
            .post_with_token(
                &routes::course_discussions(course_id),
                &json!({"title": "First", "content": "a"}),
                &student.token,
            )
            .await;
        let newer = app
            .post_with_token(
                &routes::course_discussions(course_id),
                &json!({"title": "Second", "content": "b"}),
                &student.token,
            )
            .await;

        let res = app
            .get_with_token(&routes::course_discussions(course_id), &student.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let ids: Vec<i64> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["id"].as_i64().unwrap())
            .collect();
        assert_eq!(
            ids,
            [
                announcement.id() as i64,
                newer.id() as i64,
                older.id() as i64
            ]
        );
    }

    #[tokio::test]
    async fn replies_are_listed_oldest_first() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let thread = app
            .post_with_token(
                &routes::course_discussions(course_id),
                &json!({"title": "ATP", "content": "What is it?"}),
                &student.token,
            )
            .await;

        for (content, token) in [
            ("Energy currency.", &teacher.token),
            ("Thanks!", &student.token),
        ] {
            let res = app
                .post_with_token(
                    &routes::discussion_replies(thread.id()),
                    &json!({"content": content}),
                    token,
                )
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app
            .get_with_token(&routes::discussion(thread.id()), &student.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["discussion"]["reply_count"], 2);
        let replies = res.body["replies"].as_array().unwrap();
        assert_eq!(replies[0]["content"], "Energy currency.");
        assert_eq!(replies[0]["author_id"], teacher.id);
        assert_eq!(replies[1]["content"], "Thanks!");
    }

    #[tokio::test]
    async fn outsiders_cannot_read_course_discussions() {
        let app = TestApp::spawn().await;
        let (_teacher, course_id, _student) = app.classroom().await;
        let outsider = app.create_student("outsider@school.lk", true).await;

        let res = app
            .get_with_token(&routes::course_discussions(course_id), &outsider.token)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod notifications {
    use super::*;

    #[tokio::test]
    async fn teacher_notification_reaches_approved_students_only() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        let waiting = app.create_student("waiting@school.lk", true).await;
        app.request_enrollment(course_id, &waiting).await;

        let res = app
            .post_with_token(
                &routes::course_notifications(course_id),
                &json!({"title": "Homework", "message": "Read chapter 3"}),
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["recipients"], 1);

        let inbox = app.get_with_token(routes::NOTIFICATIONS, &student.token).await;
        assert_eq!(inbox.status, 200, "{}", inbox.text);
        assert_eq!(inbox.body["unread_count"], 1);
        assert_eq!(inbox.body["data"][0]["title"], "Homework");
        assert_eq!(inbox.body["data"][0]["is_read"], false);

        let other = app.get_with_token(routes::NOTIFICATIONS, &waiting.token).await;
        assert_eq!(other.body["unread_count"], 0);
        assert_eq!(other.body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn admin_broadcast_to_all_or_one_student() {
        let app = TestApp::spawn().await;
        let first = app.create_student("first@school.lk", false).await;
        let second = app.create_student("second@school.lk", false).await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let admin = app.admin().await;

        let all = app
            .post_with_token(
                routes::ADMIN_NOTIFY,
                &json!({"title": "Holiday", "message": "School closed", "recipient": "all"}),
                &admin.token,
            )
            .await;
        assert_eq!(all.status, 201, "{}", all.text);
        assert_eq!(all.body["recipients"], 2);

        let one = app
            .post_with_token(
                routes::ADMIN_NOTIFY,
                &json!({"title": "Fees", "message": "Please pay", "recipient": second.id}),
                &admin.token,
            )
            .await;
        assert_eq!(one.status, 201, "{}", one.text);
        assert_eq!(one.body["recipients"], 1);

        let inbox = app.get_with_token(routes::NOTIFICATIONS, &second.token).await;
        assert_eq!(inbox.body["unread_count"], 2);
        let inbox = app.get_with_token(routes::NOTIFICATIONS, &first.token).await;
        assert_eq!(inbox.body["unread_count"], 1);

        let to_teacher = app
            .post_with_token(
                routes::ADMIN_NOTIFY,
                &json!({"title": "Hi", "message": "m", "recipient": teacher.id}),
                &admin.token,
            )
            .await;
        assert_eq!(to_teacher.status, 400);

        let missing = app
            .post_with_token(
                routes::ADMIN_NOTIFY,
                &json!({"title": "Hi", "message": "m", "recipient": 99999}),
                &admin.token,
            )
            .await;
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn broadcast_to_a_large_school_reaches_everyone() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        let now = chrono::Utc::now();
        let students = (0..450).map(|i| user::ActiveModel {
            username: Set(format!("student{i}@school.lk")),
            password_hash: Set("unused".to_string()),
            first_name: Set("Student".to_string()),
            last_name: Set(i.to_string()),
            date_of_birth: Set(chrono::NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()),
            role: Set("student".parse().unwrap()),
            has_paid: Set(false),
            created_at: Set(now),
            ..Default::default()
        });
        for chunk in students.collect::<Vec<_>>().chunks(100) {
            user::Entity::insert_many(chunk.to_vec())
                .exec(&app.db)
                .await
                .unwrap();
        }

        let res = app
            .post_with_token(
                routes::ADMIN_NOTIFY,
                &json!({"title": "Holiday", "message": "School closed", "recipient": "all"}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["recipients"], 450);
        let rows = notification::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(rows, 450);
    }

    #[tokio::test]
    async fn mark_read_is_owner_only_and_idempotent() {
        let app = TestApp::spawn().await;
        let owner = app.create_student("owner@school.lk", false).await;
        let other = app.create_student("other@school.lk", false).await;
        let admin = app.admin().await;
        app.post_with_token(
            routes::ADMIN_NOTIFY,
            &json!({"title": "Fees", "message": "Please pay", "recipient": owner.id}),
            &admin.token,
        )
        .await;
        let inbox = app.get_with_token(routes::NOTIFICATIONS, &owner.token).await;
        let id = inbox.body["data"][0]["id"].as_i64().unwrap() as i32;

        let foreign = app
            .post_with_token(&routes::notification_read(id), &json!({}), &other.token)
            .await;
        assert_eq!(foreign.status, 403);

        let read = app
            .post_with_token(&routes::notification_read(id), &json!({}), &owner.token)
            .await;
        assert_eq!(read.status, 200, "{}", read.text);
        assert_eq!(read.body["is_read"], true);
        let read_at = read.body["read_at"].clone();

        let again = app
            .post_with_token(&routes::notification_read(id), &json!({}), &owner.token)
            .await;
        assert_eq!(again.status, 200);
        assert_eq!(again.body["read_at"], read_at);

        let inbox = app.get_with_token(routes::NOTIFICATIONS, &owner.token).await;
        assert_eq!(inbox.body["unread_count"], 0);
    }

    #[tokio::test]
    async fn student_dashboard_shows_unread_count() {
        let app = TestApp::spawn().await;
        let (teacher, course_id, student) = app.classroom().await;
        app.post_with_token(
            &routes::course_notifications(course_id),
            &json!({"title": "Quiz tomorrow", "message": "Revise cells"}),
            &teacher.token,
        )
        .await;

        let res = app
            .get_with_token(routes::STUDENT_DASHBOARD, &student.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["unread_count"], 1);
        assert_eq!(res.body["notifications"][0]["title"], "Quiz tomorrow");
    }
}
