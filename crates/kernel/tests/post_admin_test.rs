#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Staff-only post management and its authorization rules.

use axum::http::StatusCode;
use folio_kernel::models::CreateComment;
use folio_kernel::store::{BlogStore, PostQuery};

mod common;
use common::TestApp;

async fn staff_app() -> TestApp {
    let app = TestApp::new();
    app.create_user("staff@example.com", true).await;
    app.create_user("reader@example.com", false).await;
    app
}

async fn post_count(app: &TestApp) -> u64 {
    app.store.count_posts(&PostQuery::default()).await.unwrap()
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn anonymous_users_are_sent_to_login() {
    let app = staff_app().await;
    app.create_post("Existing", "existing", true, &[]).await;
    let mut client = app.client();

    for path in ["/create_post/", "/update_post/existing/", "/delete_post/existing/"] {
        let response = client.get(path).await;
        let expected = format!("/login/?next={}", urlencoding::encode(path));
        assert!(
            response.is_redirect_to(&expected),
            "{path} redirected to {:?}",
            response.location()
        );
    }

    let response = client.post_raw("/create_post/", &[("headline", "Sneaky")]).await;
    assert!(response.status.is_redirection());
    assert_eq!(post_count(&app).await, 1);
}

#[tokio::test]
async fn non_staff_users_are_forbidden() {
    let app = staff_app().await;
    app.create_post("Existing", "existing", true, &[]).await;
    let mut client = app.client();
    client.login("reader@example.com").await;

    for path in ["/create_post/", "/update_post/existing/", "/delete_post/existing/"] {
        let response = client.get(path).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{path}");
        assert!(
            response
                .body
                .contains("You are not authorized to view this page")
        );
    }

    let response = client
        .submit("/create_post/", &[("headline", "Sneaky")])
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = client.submit("/delete_post/existing/", &[]).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    assert_eq!(post_count(&app).await, 1);
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn staff_can_open_the_create_form() {
    let app = staff_app().await;
    app.create_tag("rust").await;
    let mut client = app.client();
    client.login("staff@example.com").await;

    let page = client.get("/create_post/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(r#"action="/create_post/""#));
    assert!(page.body.contains("rust"));
}

#[tokio::test]
async fn valid_post_form_creates_exactly_one_post() {
    let app = staff_app().await;
    let tag = app.create_tag("rust").await;
    let tag_id = tag.id.to_string();
    let mut client = app.client();
    client.login("staff@example.com").await;

    let response = client
        .submit(
            "/create_post/",
            &[
                ("headline", "Ownership explained"),
                ("sub_headline", "Borrowing, too"),
                ("body", "<p>Hello</p>"),
                ("active", "on"),
                ("tags", &tag_id),
                ("slug", "ownership"),
            ],
        )
        .await;

    assert!(response.is_redirect_to("/posts/"));
    assert_eq!(post_count(&app).await, 1);

    let post = app
        .store
        .find_post_by_slug("ownership")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(post.headline, "Ownership explained");
    assert!(post.active);
    assert!(!post.featured);
    assert_eq!(post.tags, vec![tag]);
}

#[tokio::test]
async fn blank_slug_is_generated_and_deduplicated() {
    let app = staff_app().await;
    let mut client = app.client();
    client.login("staff@example.com").await;

    for _ in 0..2 {
        let response = client
            .submit("/create_post/", &[("headline", "Hello World"), ("slug", "")])
            .await;
        assert!(response.is_redirect_to("/posts/"));
    }

    assert!(app.store.find_post_by_slug("hello-world").await.unwrap().is_some());
    assert!(app.store.find_post_by_slug("hello-world-2").await.unwrap().is_some());
}

#[tokio::test]
async fn invalid_post_form_is_re_rendered() {
    let app = staff_app().await;
    let mut client = app.client();
    client.login("staff@example.com").await;

    let response = client
        .submit(
            "/create_post/",
            &[("headline", "Kept headline"), ("slug", "not a slug!")],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Enter a valid slug"));
    assert!(response.body.contains("Kept headline"));
    assert_eq!(post_count(&app).await, 0);
}

#[tokio::test]
async fn duplicate_explicit_slug_is_rejected() {
    let app = staff_app().await;
    app.create_post("First", "taken", true, &[]).await;
    let mut client = app.client();
    client.login("staff@example.com").await;

    let response = client
        .submit("/create_post/", &[("headline", "Second"), ("slug", "taken")])
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Post with this Slug already exists."));
    assert_eq!(post_count(&app).await, 1);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn update_form_is_prefilled() {
    let app = staff_app().await;
    app.create_post("Original headline", "original", true, &[]).await;
    let mut client = app.client();
    client.login("staff@example.com").await;

    let page = client.get("/update_post/original/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(r#"value="Original headline""#));
    assert!(page.body.contains(r#"value="original""#));
}

#[tokio::test]
async fn staff_can_update_a_post() {
    let app = staff_app().await;
    let post = app.create_post("Original headline", "original", true, &[]).await;
    let mut client = app.client();
    client.login("staff@example.com").await;

    let response = client
        .submit(
            "/update_post/original/",
            &[
                ("headline", "Changed headline"),
                ("slug", "original"),
                ("featured", "on"),
            ],
        )
        .await;
    assert!(response.is_redirect_to("/posts/"));

    let updated = app
        .store
        .find_post_by_slug("original")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, post.id);
    assert_eq!(updated.headline, "Changed headline");
    assert!(updated.featured);
    // Unticked checkbox means inactive
    assert!(!updated.active);
}

#[tokio::test]
async fn updating_unknown_post_is_404() {
    let app = staff_app().await;
    let mut client = app.client();
    client.login("staff@example.com").await;

    assert_eq!(
        client.get("/update_post/missing/").await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        client.get("/delete_post/missing/").await.status,
        StatusCode::NOT_FOUND
    );
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn delete_asks_for_confirmation() {
    let app = staff_app().await;
    app.create_post("Doomed", "doomed", true, &[]).await;
    let mut client = app.client();
    client.login("staff@example.com").await;

    let page = client.get("/delete_post/doomed/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Are you sure you want to delete"));
    assert_eq!(post_count(&app).await, 1);
}

#[tokio::test]
async fn deleting_a_post_removes_its_comments() {
    let app = staff_app().await;
    let post = app.create_post("Doomed", "doomed", true, &[]).await;
    let reader = app
        .store
        .find_user_by_email("reader@example.com")
        .await
        .unwrap()
        .unwrap();
    let profile = app
        .store
        .find_profile_by_user(reader.id)
        .await
        .unwrap()
        .unwrap();
    app.store
        .create_comment(CreateComment {
            post_id: post.id,
            author_id: profile.id,
            body: "Nice".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(app.comment_count(post.id).await, 1);

    let mut client = app.client();
    client.login("staff@example.com").await;
    let response = client.submit("/delete_post/doomed/", &[]).await;

    assert!(response.is_redirect_to("/posts/"));
    assert!(app.store.find_post_by_slug("doomed").await.unwrap().is_none());
    assert_eq!(app.comment_count(post.id).await, 0);
}
