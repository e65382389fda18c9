mod common;

use article_portal::models::Role;
use common::{create_article, login_token, register, spawn_app};
use uuid::Uuid;

// --- User Endpoints ---

#[tokio::test]
async fn user_listing_requires_admin() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&client, &app, "u@x.com", "pw123456", "U").await;
    let token = login_token(&client, &app, "u@x.com", "pw123456").await;

    let response = client
        .get(format!("{}/api/users", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Admin access required");
}

#[tokio::test]
async fn admin_lists_users_paged_newest_first() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    app.repo
        .seed_user("admin@x.com", "pw123456", "Admin", Role::Admin);
    for i in 0..3 {
        register(&client, &app, &format!("u{i}@x.com"), "pw123456", "U").await;
    }
    let token = login_token(&client, &app, "admin@x.com", "pw123456").await;

    let response = client
        .get(format!("{}/api/users?page=1&limit=2", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 4); // admin + 3 registered
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["limit"], 2);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Newest registration comes first.
    assert_eq!(items[0]["email"], "u2@x.com");
}

#[tokio::test]
async fn user_record_access_is_self_or_admin() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = register(&client, &app, "alice@x.com", "pw123456", "Alice").await;
    let alice_body: serde_json::Value = alice.json().await.unwrap();
    let alice_id = alice_body["data"]["id"].as_str().unwrap().to_string();

    register(&client, &app, "bob@x.com", "pw123456", "Bob").await;
    app.repo
        .seed_user("admin@x.com", "pw123456", "Admin", Role::Admin);

    let alice_token = login_token(&client, &app, "alice@x.com", "pw123456").await;
    let bob_token = login_token(&client, &app, "bob@x.com", "pw123456").await;
    let admin_token = login_token(&client, &app, "admin@x.com", "pw123456").await;

    let url = format!("{}/api/users/{}", app.address, alice_id);

    // Self: allowed.
    let own = client.get(&url).bearer_auth(&alice_token).send().await.unwrap();
    assert_eq!(own.status(), 200);

    // Stranger: denied.
    let stranger = client.get(&url).bearer_auth(&bob_token).send().await.unwrap();
    assert_eq!(stranger.status(), 403);
    let body: serde_json::Value = stranger.json().await.unwrap();
    assert_eq!(body["message"], "Access denied");

    // Admin: allowed.
    let admin = client.get(&url).bearer_auth(&admin_token).send().await.unwrap();
    assert_eq!(admin.status(), 200);
}

#[tokio::test]
async fn user_update_follows_the_same_policy() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = register(&client, &app, "alice@x.com", "pw123456", "Alice").await;
    let alice_body: serde_json::Value = alice.json().await.unwrap();
    let alice_id = alice_body["data"]["id"].as_str().unwrap().to_string();

    register(&client, &app, "bob@x.com", "pw123456", "Bob").await;
    let alice_token = login_token(&client, &app, "alice@x.com", "pw123456").await;
    let bob_token = login_token(&client, &app, "bob@x.com", "pw123456").await;

    let url = format!("{}/api/users/{}", app.address, alice_id);

    let own = client
        .put(&url)
        .bearer_auth(&alice_token)
        .json(&serde_json::json!({ "displayName": "Alice Cooper" }))
        .send()
        .await
        .unwrap();
    assert_eq!(own.status(), 200);
    let body: serde_json::Value = own.json().await.unwrap();
    assert_eq!(body["data"]["displayName"], "Alice Cooper");
    assert_eq!(body["message"], "User updated successfully");

    let stranger = client
        .put(&url)
        .bearer_auth(&bob_token)
        .json(&serde_json::json!({ "displayName": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(stranger.status(), 403);
}

#[tokio::test]
async fn user_deletion_is_admin_only_and_cascades() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let victim = register(&client, &app, "victim@x.com", "pw123456", "Victim").await;
    let victim_body: serde_json::Value = victim.json().await.unwrap();
    let victim_id = victim_body["data"]["id"].as_str().unwrap().to_string();

    let victim_token = login_token(&client, &app, "victim@x.com", "pw123456").await;
    create_article(&client, &app, &victim_token, "Victim's article", true).await;
    assert_eq!(app.repo.article_count(), 1);

    app.repo
        .seed_user("admin@x.com", "pw123456", "Admin", Role::Admin);
    let admin_token = login_token(&client, &app, "admin@x.com", "pw123456").await;

    let url = format!("{}/api/users/{}", app.address, victim_id);

    // Even the user themselves cannot delete their own account.
    let own_attempt = client
        .delete(&url)
        .bearer_auth(&victim_token)
        .send()
        .await
        .unwrap();
    assert_eq!(own_attempt.status(), 403);

    let admin_delete = client
        .delete(&url)
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(admin_delete.status(), 200);
    let body: serde_json::Value = admin_delete.json().await.unwrap();
    assert_eq!(body["message"], "User deleted successfully");

    assert_eq!(app.repo.user_count(), 1); // only the admin remains
    assert_eq!(app.repo.article_count(), 0); // articles went with the user

    // Deleting again: gone.
    let again = client
        .delete(&url)
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn missing_user_is_404_for_an_authorized_caller() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    app.repo
        .seed_user("admin@x.com", "pw123456", "Admin", Role::Admin);
    let token = login_token(&client, &app, "admin@x.com", "pw123456").await;

    let response = client
        .get(format!("{}/api/users/{}", app.address, Uuid::new_v4()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User not found");
}

// --- Article Endpoints ---

#[tokio::test]
async fn article_mutation_is_author_or_admin_only() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&client, &app, "author@x.com", "pw123456", "Author").await;
    register(&client, &app, "other@x.com", "pw123456", "Other").await;
    app.repo
        .seed_user("admin@x.com", "pw123456", "Admin", Role::Admin);

    let author_token = login_token(&client, &app, "author@x.com", "pw123456").await;
    let other_token = login_token(&client, &app, "other@x.com", "pw123456").await;
    let admin_token = login_token(&client, &app, "admin@x.com", "pw123456").await;

    // Visibility has no bearing on write access: test a public article.
    let article = create_article(&client, &app, &author_token, "Original", true).await;
    let url = format!("{}/api/articles/{}", app.address, article["id"].as_str().unwrap());

    // A non-author cannot update, even though the article is public.
    let denied = client
        .put(&url)
        .bearer_auth(&other_token)
        .json(&serde_json::json!({ "title": "Defaced" }))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 403);
    let body: serde_json::Value = denied.json().await.unwrap();
    assert_eq!(body["message"], "Access denied");

    // The author can.
    let updated = client
        .put(&url)
        .bearer_auth(&author_token)
        .json(&serde_json::json!({ "title": "Revised" }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), 200);
    let body: serde_json::Value = updated.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Revised");
    assert_eq!(body["message"], "Article updated successfully");

    // An admin can too.
    let admin_update = client
        .put(&url)
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "isPublic": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(admin_update.status(), 200);

    // Deletion follows the same rule.
    let denied_delete = client.delete(&url).bearer_auth(&other_token).send().await.unwrap();
    assert_eq!(denied_delete.status(), 403);

    let admin_delete = client.delete(&url).bearer_auth(&admin_token).send().await.unwrap();
    assert_eq!(admin_delete.status(), 200);
    assert_eq!(app.repo.article_count(), 0);
}

#[tokio::test]
async fn updating_a_missing_article_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&client, &app, "u@x.com", "pw123456", "U").await;
    let token = login_token(&client, &app, "u@x.com", "pw123456").await;

    let response = client
        .put(format!("{}/api/articles/{}", app.address, Uuid::new_v4()))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "Whatever" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Article not found");
}

#[tokio::test]
async fn partial_update_only_touches_supplied_fields() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&client, &app, "author@x.com", "pw123456", "Author").await;
    let token = login_token(&client, &app, "author@x.com", "pw123456").await;

    let article = create_article(&client, &app, &token, "Keep me", false).await;
    let url = format!("{}/api/articles/{}", app.address, article["id"].as_str().unwrap());

    let response = client
        .put(&url)
        .bearer_auth(&token)
        .json(&serde_json::json!({ "isPublic": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Keep me");
    assert_eq!(body["data"]["content"], "Content of Keep me");
    assert_eq!(body["data"]["isPublic"], true);
}
