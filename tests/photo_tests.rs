mod common;

use axum::http::{Method, StatusCode};
use catalog_admin::{
    MockStorageService,
    storage::{MediaFolder, media_reference},
};
use common::{MultipartForm, TestApp, empty_request, json_request};
use serde_json::{Value, json};

async fn create_gallery(app: &TestApp, token: &str, files: &[&str]) -> Value {
    let form = files
        .iter()
        .fold(MultipartForm::new(), |form, name| form.image("images", name));
    let (status, body) = app
        .send(form.into_request(Method::POST, "/api/photo", Some(token)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

fn images(photo: &Value) -> Vec<String> {
    photo["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_keeps_upload_order() {
    let app = TestApp::new();
    let token = app.login_token().await;

    let photo = create_gallery(&app, &token, &["a.png", "b.png", "c.png"]).await;

    assert_eq!(images(&photo), app.storage.uploaded());
    assert_eq!(images(&photo).len(), 3);
    assert!(
        images(&photo)
            .iter()
            .all(|url| url.starts_with("https://media.mock/photo/"))
    );
}

#[tokio::test]
async fn test_create_requires_an_image() {
    let app = TestApp::new();
    let token = app.login_token().await;

    let (status, body) = app
        .send(MultipartForm::new().into_request(Method::POST, "/api/photo", Some(&token)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "At least one image is required");
}

#[tokio::test]
async fn test_anonymous_create_is_unauthorized() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            MultipartForm::new()
                .image("images", "a.png")
                .into_request(Method::POST, "/api/photo", None),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.storage.uploaded().is_empty());
}

#[tokio::test]
async fn test_remove_middle_image_destroys_exactly_one_asset() {
    let app = TestApp::new();
    let token = app.login_token().await;
    let photo = create_gallery(&app, &token, &["a.png", "b.png", "c.png"]).await;
    let [a, b, c]: [String; 3] = images(&photo).try_into().unwrap();
    let uri = format!("/api/photo/{}/image", photo["id"].as_str().unwrap());

    let (status, body) = app
        .send(json_request(
            Method::DELETE,
            &uri,
            Some(&token),
            json!({ "imageUrl": b }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Image deleted successfully");
    assert_eq!(images(&body["data"]), vec![a, c]);
    assert_eq!(
        app.storage.destroyed(),
        vec![media_reference(&b, MediaFolder::Photo).unwrap()]
    );
}

#[tokio::test]
async fn test_remove_image_unknown_url_is_404_and_missing_url_is_400() {
    let app = TestApp::new();
    let token = app.login_token().await;
    let photo = create_gallery(&app, &token, &["a.png"]).await;
    let uri = format!("/api/photo/{}/image", photo["id"].as_str().unwrap());

    let (status, body) = app
        .send(json_request(
            Method::DELETE,
            &uri,
            Some(&token),
            json!({ "imageUrl": "https://media.mock/photo/elsewhere.png" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Image not found in photo");

    for payload in [json!({}), json!({ "imageUrl": "   " })] {
        let (status, body) = app
            .send(json_request(Method::DELETE, &uri, Some(&token), payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Image URL is required");
    }

    assert!(app.storage.destroyed().is_empty());
}

#[tokio::test]
async fn test_partial_upload_failure_fails_request_and_leaves_orphan() {
    let app = TestApp::with_storage(MockStorageService::failing_after(1));
    let token = app.login_token().await;

    let (status, body) = app
        .send(
            MultipartForm::new()
                .image("images", "first.png")
                .image("images", "second.png")
                .into_request(Method::POST, "/api/photo", Some(&token)),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Server error");
    // The first upload is not rolled back.
    assert_eq!(app.storage.uploaded().len(), 1);
    assert!(app.storage.destroyed().is_empty());
    assert_eq!(app.repo.photo_count(), 0);
}

#[tokio::test]
async fn test_update_replaces_set_and_releases_old_assets() {
    let app = TestApp::new();
    let token = app.login_token().await;
    let photo = create_gallery(&app, &token, &["a.png", "b.png"]).await;
    let old = images(&photo);
    let uri = format!("/api/photo/{}", photo["id"].as_str().unwrap());

    let (status, body) = app
        .send(
            MultipartForm::new()
                .image("images", "c.png")
                .into_request(Method::PUT, &uri, Some(&token)),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let current = images(&body["data"]);
    assert_eq!(current.len(), 1);
    assert!(!old.contains(&current[0]));

    let expected: Vec<String> = old
        .iter()
        .map(|url| media_reference(url, MediaFolder::Photo).unwrap())
        .collect();
    assert_eq!(app.storage.destroyed(), expected);
}

#[tokio::test]
async fn test_delete_releases_every_image() {
    let app = TestApp::new();
    let token = app.login_token().await;
    let photo = create_gallery(&app, &token, &["a.png", "b.png"]).await;
    let uri = format!("/api/photo/{}", photo["id"].as_str().unwrap());

    let (status, body) = app
        .send(empty_request(Method::DELETE, &uri, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Photo deleted");
    assert_eq!(app.storage.destroyed().len(), 2);

    let (status, body) = app.send(empty_request(Method::GET, &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Photo not found");
}

#[tokio::test]
async fn test_list_is_public() {
    let app = TestApp::new();
    let token = app.login_token().await;
    create_gallery(&app, &token, &["a.png"]).await;
    create_gallery(&app, &token, &["b.png", "c.png"]).await;

    let (status, body) = app
        .send(empty_request(Method::GET, "/api/photo", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["images"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_succeeds_when_media_release_fails() {
    let app = TestApp::with_storage(MockStorageService::failing_destroys());
    let token = app.login_token().await;
    let photo = create_gallery(&app, &token, &["a.png", "b.png"]).await;
    let uri = format!("/api/photo/{}", photo["id"].as_str().unwrap());

    let (status, body) = app
        .send(empty_request(Method::DELETE, &uri, Some(&token)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Photo deleted");
    assert_eq!(app.repo.photo_count(), 0);
    assert!(app.storage.destroyed().is_empty());
}

#[tokio::test]
async fn test_malformed_photo_id_is_reported_in_envelope() {
    let app = TestApp::new();
    let token = app.login_token().await;

    let (status, body) = app
        .send(empty_request(Method::GET, "/api/photo/not-a-uuid", None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid id");

    let (status, body) = app
        .send(json_request(
            Method::DELETE,
            "/api/photo/not-a-uuid/image",
            Some(&token),
            json!({ "imageUrl": "https://media.mock/photo/a.png" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid id");
    assert!(app.storage.destroyed().is_empty());
}
