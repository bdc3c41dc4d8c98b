use reqwest::multipart::{Form, Part};
use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

fn resource_form(title: &str, tags: &str, file_name: &str, bytes: &[u8]) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("description", "Past paper with marking scheme")
        .text("author", "Department of Examinations")
        .text("tags", tags.to_string())
        .part(
            "file",
            Part::bytes(bytes.to_vec()).file_name(file_name.to_string()),
        )
}

async fn upload(app: &TestApp, admin: &TestUser, title: &str, tags: &str, file_name: &str) -> i32 {
    let res = app
        .multipart_with_token(
            routes::LIBRARY,
            resource_form(title, tags, file_name, b"library content"),
            &admin.token,
        )
        .await;
    assert_eq!(res.status, 201, "upload failed: {}", res.text);
    res.id()
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn upload_derives_category_and_tags() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;

        let res = app
            .multipart_with_token(
                routes::LIBRARY,
                resource_form("Biology 2019", " biology, past paper ,", "bio-2019.pdf", b"%PDF"),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["category"], "PDF");
        assert_eq!(res.body["tags"], json!(["biology", "past paper"]));
        assert_eq!(res.body["file_size"], 4);
        assert!(
            res.body["file_name"]
                .as_str()
                .unwrap()
                .ends_with("bio-2019.pdf")
        );
    }

    #[tokio::test]
    async fn upload_requires_title_and_file() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;

        let no_file = app
            .multipart_with_token(
                routes::LIBRARY,
                Form::new().text("title", "Lonely title"),
                &admin.token,
            )
            .await;
        assert_eq!(no_file.status, 400, "{}", no_file.text);

        let no_title = app
            .multipart_with_token(
                routes::LIBRARY,
                TestApp::file_form("notes.pdf", b"%PDF".to_vec()),
                &admin.token,
            )
            .await;
        assert_eq!(no_title.status, 400, "{}", no_title.text);
    }

    #[tokio::test]
    async fn only_admins_upload() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;

        let res = app
            .multipart_with_token(
                routes::LIBRARY,
                resource_form("Mine", "", "mine.pdf", b"%PDF"),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn search_and_category_filters() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        let bio = upload(&app, &admin, "Biology 2019", "cells,genetics", "bio.pdf").await;
        upload(&app, &admin, "Chemistry 2020", "organic", "chem.pdf").await;
        let diagram = upload(&app, &admin, "Heart diagram", "anatomy", "heart.png").await;
        let student = app.create_student("kamal@school.lk", false).await;

        let by_tag = app
            .get_with_token(&format!("{}?search=GENETICS", routes::LIBRARY), &student.token)
            .await;
        assert_eq!(by_tag.status, 200, "{}", by_tag.text);
        let data = by_tag.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], bio);
        assert_eq!(by_tag.body["pagination"]["total"], 1);

        let by_category = app
            .get_with_token(&format!("{}?category=png", routes::LIBRARY), &student.token)
            .await;
        let data = by_category.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], diagram);

        // Categories span the whole catalog, not just the filtered page.
        assert_eq!(by_category.body["categories"], json!(["PDF", "PNG"]));
    }

    #[tokio::test]
    async fn non_ascii_titles_and_names_are_searchable() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;

        let res = app
            .multipart_with_token(
                routes::LIBRARY,
                resource_form("Über Zellen", "", "生物.pdf", b"%PDF"),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["category"], "PDF");
        let id = res.id();
        let name = res.body["file_name"].as_str().unwrap().to_string();
        assert!(name.ends_with("_file.pdf"), "stored as {name}");

        for search in ["%C3%9Cber", "zellen"] {
            let found = app
                .get_with_token(&format!("{}?search={search}", routes::LIBRARY), &admin.token)
                .await;
            assert_eq!(found.status, 200, "{}", found.text);
            let data = found.body["data"].as_array().unwrap();
            assert_eq!(data.len(), 1, "search {search}");
            assert_eq!(data[0]["id"], id);
        }

        let file = app
            .get_with_token(&routes::library_file(&name), &admin.token)
            .await;
        assert_eq!(file.status, 200);
        assert_eq!(file.header("content-type"), "application/pdf");
    }

    #[tokio::test]
    async fn wildcards_in_search_are_literal() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        upload(&app, &admin, "Biology 2019", "", "bio.pdf").await;

        let res = app
            .get_with_token(&format!("{}?search=%25", routes::LIBRARY), &admin.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn pagination_reports_totals() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        for i in 0..3 {
            upload(&app, &admin, &format!("Paper {i}"), "", &format!("paper-{i}.pdf")).await;
        }

        let res = app
            .get_with_token(&format!("{}?per_page=2&page=2", routes::LIBRARY), &admin.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
    }
}

mod files {
    use super::*;

    #[tokio::test]
    async fn files_are_served_inline_without_caching() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        let id = upload(&app, &admin, "Biology 2019", "", "bio.pdf").await;
        let meta = app.get_with_token(&routes::library_resource(id), &admin.token).await;
        let name = meta.body["file_name"].as_str().unwrap().to_string();

        let res = app
            .get_with_token(&routes::library_file(&name), &admin.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.text, "library content");
        assert_eq!(res.header("content-type"), "application/pdf");
        assert!(res.header("content-disposition").starts_with("inline"));
        assert_eq!(
            res.header("content-security-policy"),
            "default-src 'self'; object-src 'none';"
        );
        assert_eq!(res.header("x-content-type-options"), "nosniff");
        assert!(res.header("cache-control").contains("no-store"));
        assert_eq!(res.header("pragma"), "no-cache");
        assert_eq!(res.header("expires"), "0");
    }

    #[tokio::test]
    async fn delete_removes_entry_and_file() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        let id = upload(&app, &admin, "Biology 2019", "", "bio.pdf").await;
        let meta = app.get_with_token(&routes::library_resource(id), &admin.token).await;
        let name = meta.body["file_name"].as_str().unwrap().to_string();

        let res = app
            .delete_with_token(&routes::library_resource(id), &admin.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let meta = app.get_with_token(&routes::library_resource(id), &admin.token).await;
        assert_eq!(meta.status, 404);
        let file = app
            .get_with_token(&routes::library_file(&name), &admin.token)
            .await;
        assert_eq!(file.status, 404);
    }

    #[tokio::test]
    async fn library_and_lesson_media_are_separate_areas() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("teacher@school.lk").await;
        let upload = app
            .multipart_with_token(
                routes::UPLOADS,
                TestApp::file_form("cell.png", b"png".to_vec()),
                &teacher.token,
            )
            .await;
        let name = upload.body["file_name"].as_str().unwrap().to_string();

        let res = app
            .get_with_token(&routes::library_file(&name), &teacher.token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod research {
    use super::*;

    #[tokio::test]
    async fn research_returns_the_assistant_answer() {
        let app = TestApp::spawn().await;
        let student = app.create_student("kamal@school.lk", false).await;

        let res = app
            .post_with_token(
                routes::RESEARCH,
                &json!({"query": "  What is osmosis?  "}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["response"], "Stub answer to: What is osmosis?");
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let app = TestApp::spawn().await;
        let student = app.create_student("kamal@school.lk", false).await;

        let res = app
            .post_with_token(routes::RESEARCH, &json!({"query": "  "}), &student.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn assistant_failure_is_a_bad_gateway() {
        let app = TestApp::spawn().await;
        let student = app.create_student("kamal@school.lk", false).await;

        let res = app
            .post_with_token(
                routes::RESEARCH,
                &json!({"query": "please fail"}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "UPSTREAM_UNAVAILABLE");
    }

    #[tokio::test]
    async fn research_requires_a_session() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::RESEARCH, &json!({"query": "osmosis"}))
            .await;

        assert_eq!(res.status, 401);
    }
}
