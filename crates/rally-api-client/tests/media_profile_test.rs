use mockito::Matcher;
use rally_api_client::{ApiClient, ApiError, LocalFile, MediaReference, RemoteProfileStore, UploadKind};
use rally_core::{ClientConfig, ProfileMediaStore, StoreError};
use serde_json::json;

fn authed_client(url: String) -> ApiClient {
    ApiClient::new(&ClientConfig::new(url).with_access_token("profile-token")).unwrap()
}

#[tokio::test]
async fn test_upload_media_sends_multipart_form() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/uploads")
        .match_header("authorization", "Bearer profile-token")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="kind""#.to_string()),
            Matcher::Regex("movement-media".to_string()),
            Matcher::Regex(r#"filename="rally.mp4""#.to_string()),
        ]))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "url": "https://cdn.example.com/movements/rally.mp4",
                "object_key": "movements/rally.mp4",
                "bytes": 2048
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = authed_client(server.url());
    let file = LocalFile::new(vec![3u8; 2048], "video/mp4").with_file_name("rally.mp4");
    let response = client
        .upload_media(&file, UploadKind::MovementMedia)
        .await
        .unwrap();

    assert_eq!(response.url, "https://cdn.example.com/movements/rally.mp4");
    assert_eq!(response.object_key.as_deref(), Some("movements/rally.mp4"));
    assert_eq!(response.bytes, Some(2048));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_upload_media_refuses_direct_kinds() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/uploads")
        .expect(0)
        .create_async()
        .await;

    let client = authed_client(server.url());
    let file = LocalFile::new(vec![3u8; 2048], "image/png");

    let err = client
        .upload_media(&file, UploadKind::Avatar)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));

    let empty = LocalFile::new(Vec::<u8>::new(), "video/mp4");
    let err = client
        .upload_media(&empty, UploadKind::MovementMedia)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_upload_media_surfaces_server_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/uploads")
        .with_status(413)
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": "file too large" }).to_string())
        .create_async()
        .await;

    let client = authed_client(server.url());
    let file = LocalFile::new(vec![3u8; 2048], "video/mp4");
    let err = client
        .upload_media(&file, UploadKind::MovementMedia)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(413));
    assert_eq!(err.server_message(), Some("file too large"));
}

#[tokio::test]
async fn test_remote_profile_store_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let get = server
        .mock("GET", "/profiles/me/media")
        .match_header("authorization", "Bearer profile-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "avatar": {
                    "object_key": "avatars/old.png",
                    "url": null,
                    "bucket": "avatars",
                    "updated_at": "2026-01-01T00:00:00Z"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/profiles/me/media")
        .match_body(Matcher::Json(json!({
            "kind": "banner",
            "object_key": "banners/new.png",
            "url": "https://cdn.example.com/banners/new.png",
            "bucket": "banners"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "avatar": {
                    "object_key": "avatars/old.png",
                    "bucket": "avatars"
                },
                "banner": {
                    "object_key": "banners/new.png",
                    "url": "https://cdn.example.com/banners/new.png",
                    "bucket": "banners"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let store = RemoteProfileStore::new(authed_client(server.url()));
    assert_eq!(store.name(), "remote");

    let media = store.get_profile_media().await.unwrap();
    assert_eq!(
        media.avatar.as_ref().map(|r| r.object_key.as_str()),
        Some("avatars/old.png")
    );
    assert!(media.banner.is_none());

    let reference = MediaReference::new(
        "banners/new.png".to_string(),
        Some("https://cdn.example.com/banners/new.png".to_string()),
        "banners".to_string(),
    );
    let updated = store
        .set_profile_media(UploadKind::Banner, reference)
        .await
        .unwrap();
    assert_eq!(
        updated.banner.as_ref().map(|r| r.bucket.as_str()),
        Some("banners")
    );

    get.assert_async().await;
    patch.assert_async().await;
}

#[tokio::test]
async fn test_remote_profile_store_error_mapping() {
    let mut server = mockito::Server::new_async().await;
    let _down = server
        .mock("GET", "/profiles/me/media")
        .with_status(503)
        .create_async()
        .await;
    let _rejected = server
        .mock("PATCH", "/profiles/me/media")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": "object not found" }).to_string())
        .create_async()
        .await;

    let store = RemoteProfileStore::new(authed_client(server.url()));

    let err = store.get_profile_media().await.unwrap_err();
    assert!(err.is_unavailable());

    let reference = MediaReference::new("avatars/x.png".to_string(), None, "avatars".to_string());
    let err = store
        .set_profile_media(UploadKind::Avatar, reference.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Rejected { status: 422, .. }));

    let err = store
        .set_profile_media(UploadKind::MovementMedia, reference)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidKind(_)));
}
