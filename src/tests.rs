//! Integration tests for the scout backend.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::TokenMap;
use crate::db::{init_database, Repository};
use crate::models::Identity;
use crate::storage::{FileStore, LocalFileStore};
use crate::{create_router, AppState};

const TEST_TOKEN: &str = "test-token";
const TEST_USER: &str = "testscout";

/// Test fixture for integration tests.
struct TestFixture {
    /// Client sending the configured API token with every request
    client: Client,
    /// Client without credentials
    anon: Client,
    base_url: String,
    repo: Arc<Repository>,
    identity: Identity,
    media_root: std::path::PathBuf,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let media_root = temp_dir.path().join("media");

        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));
        let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(media_root.clone()));

        let identity = repo
            .ensure_identity(TEST_USER)
            .await
            .expect("Failed to provision identity");
        let tokens = Arc::new(TokenMap::new(vec![(
            TEST_TOKEN.to_string(),
            identity.clone(),
        )]));

        let state = AppState {
            repo: repo.clone(),
            store,
        };

        let app = create_router(state, tokens);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-api-token", TEST_TOKEN.parse().unwrap());
        let client = Client::builder().default_headers(headers).build().unwrap();

        TestFixture {
            client,
            anon: Client::new(),
            base_url,
            repo,
            identity,
            media_root,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a music entry with a web link and return its JSON.
    async fn create_music(&self, title: &str, music_type: &str, body: Value) -> Value {
        let mut payload = body;
        payload["title"] = json!(title);
        payload["type"] = json!(music_type);

        let resp = self
            .client
            .post(self.url("/api/music"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201, "create music failed: {:?}", payload);
        resp.json().await.unwrap()
    }

    async fn create_scout_content(&self, name: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/scout-content"))
            .json(&json!({
                "name": name,
                "type": "KNOT",
                "category": "KNOTS",
                "difficulty": 1,
                "usage": "Securing a rope to a post"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .anon
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_unauthenticated_reads_allowed() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .anon
        .get(fixture.url("/api/music"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthenticated_mutation_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .anon
        .post(fixture.url("/api/music"))
        .json(&json!({
            "title": "Camp Song",
            "type": "SONG",
            "webLink": "https://example.com/song"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .anon
        .get(fixture.url("/api/music"))
        .header("x-api-token", "wrong-token")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_music_crud() {
    let fixture = TestFixture::new().await;

    // Create with only a web link: the content invariant is satisfied
    let created = fixture
        .create_music(
            "Camp Song",
            "SONG",
            json!({
                "webLink": "https://youtube.com/watch?v=camp",
                "category": "CAMPFIRE",
                "difficulty": 2
            }),
        )
        .await;

    let id = created["id"].as_str().unwrap();
    assert_eq!(created["title"], "Camp Song");
    assert_eq!(created["type"], "SONG");
    assert_eq!(created["typeDisplay"], "Song");
    assert_eq!(created["categoryDisplay"], "Campfire");
    assert_eq!(created["difficulty"], 2);
    assert_eq!(created["difficultyDisplay"], "Medium");
    assert_eq!(created["author"], TEST_USER);
    assert!(created["createdAt"].is_string());
    assert!(created["lyrics"].is_null());

    // Retrieve
    let get_resp = fixture
        .anon
        .get(fixture.url(&format!("/api/music/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let fetched: Value = get_resp.json().await.unwrap();
    assert_eq!(fetched["title"], "Camp Song");

    // Full update via PUT
    let put_resp = fixture
        .client
        .put(fixture.url(&format!("/api/music/{}", id)))
        .json(&json!({
            "title": "Camp Song (Revised)",
            "type": "CHANT",
            "lyrics": "Down by the bay"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(put_resp.status(), 200);
    let updated: Value = put_resp.json().await.unwrap();
    assert_eq!(updated["title"], "Camp Song (Revised)");
    assert_eq!(updated["typeDisplay"], "Chant");
    // Fields absent from the payload keep their stored values
    assert_eq!(updated["webLink"], "https://youtube.com/watch?v=camp");

    // List contains the entry
    let list_resp = fixture
        .anon
        .get(fixture.url("/api/music"))
        .send()
        .await
        .unwrap();
    let list: Value = list_resp.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Delete
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/music/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 204);

    // Verify deleted
    let gone = fixture
        .anon
        .get(fixture.url(&format!("/api/music/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
    let body: Value = gone.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_music_requires_some_content() {
    let fixture = TestFixture::new().await;

    // No lyrics, files, or web link: whole-entity validation error
    let resp = fixture
        .client
        .post(fixture.url("/api/music"))
        .json(&json!({
            "title": "Silent Song",
            "type": "SONG",
            "lyrics": "   "
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    // Whole-entity error names no single field
    assert!(body["error"]["fields"].is_null());
}

#[tokio::test]
async fn test_music_timestamps_on_patch() {
    let fixture = TestFixture::new().await;

    let created = fixture
        .create_music("Morning Chant", "CHANT", json!({"lyrics": "Rise and shine"}))
        .await;
    let id = created["id"].as_str().unwrap();
    let created_at = created["createdAt"].as_str().unwrap().to_string();
    let last_updated = created["lastUpdated"].as_str().unwrap().to_string();

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    let patch_resp = fixture
        .client
        .patch(fixture.url(&format!("/api/music/{}", id)))
        .json(&json!({ "title": "Evening Chant" }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch_resp.status(), 200);
    let patched: Value = patch_resp.json().await.unwrap();

    assert_eq!(patched["title"], "Evening Chant");
    // Partial update leaves unmentioned fields alone
    assert_eq!(patched["lyrics"], "Rise and shine");
    assert_eq!(patched["createdAt"].as_str().unwrap(), created_at);
    assert_ne!(patched["lastUpdated"].as_str().unwrap(), last_updated);
}

#[tokio::test]
async fn test_put_requires_required_fields() {
    let fixture = TestFixture::new().await;

    let created = fixture
        .create_music("Echo Clap", "CLAP", json!({"lyrics": "clap clap"}))
        .await;
    let id = created["id"].as_str().unwrap();

    // PUT without `type` fails
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/music/{}", id)))
        .json(&json!({ "title": "Echo Clap II" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["type"].is_string());

    // PATCH with only a title succeeds
    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/music/{}", id)))
        .json(&json!({ "title": "Echo Clap II" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_music_multipart_audio_upload() {
    let fixture = TestFixture::new().await;

    let form = Form::new()
        .text("title", "Camp Song")
        .text("type", "SONG")
        .part(
            "audioFile",
            Part::bytes(b"fake-mp3-bytes".as_slice())
                .file_name("track.mp3")
                .mime_str("audio/mpeg")
                .unwrap(),
        );

    let resp = fixture
        .client
        .post(fixture.url("/api/music"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["audioFile"], "music/songs/audio/Camp Song.mp3");

    let stored = fixture.media_root.join("music/songs/audio/Camp Song.mp3");
    assert_eq!(std::fs::read(&stored).unwrap(), b"fake-mp3-bytes");
}

#[tokio::test]
async fn test_audio_upload_with_video_content_type_fails() {
    let fixture = TestFixture::new().await;

    let form = Form::new()
        .text("title", "Camp Song")
        .text("type", "SONG")
        .part(
            "audioFile",
            Part::bytes(b"not-audio".as_slice())
                .file_name("clip.mp4")
                .mime_str("video/mp4")
                .unwrap(),
        );

    let resp = fixture
        .client
        .post(fixture.url("/api/music"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["audioFile"].is_string());
}

#[tokio::test]
async fn test_music_filters() {
    let fixture = TestFixture::new().await;

    fixture
        .create_music(
            "Fire Circle",
            "CHANT",
            json!({"category": "CAMPFIRE", "lyrics": "hey ho"}),
        )
        .await;
    fixture
        .create_music(
            "Step Lively",
            "SONG",
            json!({"category": "MARCHING", "lyrics": "left right"}),
        )
        .await;
    fixture
        .create_music(
            "Giggle Chant",
            "CHANT",
            json!({"category": "FUN", "lyrics": "ha ha"}),
        )
        .await;

    let resp = fixture
        .anon
        .get(fixture.url("/api/music?type=CHANT&category=CAMPFIRE"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let list: Value = resp.json().await.unwrap();
    let entries = list.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "Fire Circle");

    let resp = fixture
        .anon
        .get(fixture.url("/api/music?type=CHANT"))
        .send()
        .await
        .unwrap();
    let list: Value = resp.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_filter_choice() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .anon
        .get(fixture.url("/api/music?type=BOGUS"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["type"].is_string());
}

#[tokio::test]
async fn test_music_search() {
    let fixture = TestFixture::new().await;

    fixture
        .create_music(
            "Evening Song",
            "SONG",
            json!({"lyrics": "around the roaring campfire we sing"}),
        )
        .await;
    fixture
        .create_music("Campfire Classic", "SONG", json!({"lyrics": "la la la"}))
        .await;
    fixture
        .create_music("March On", "SONG", json!({"lyrics": "one two three four"}))
        .await;

    // Substring match across title and lyrics
    let resp = fixture
        .anon
        .get(fixture.url("/api/music?search=campfire"))
        .send()
        .await
        .unwrap();
    let list: Value = resp.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 2);

    let resp = fixture
        .anon
        .get(fixture.url("/api/music?search=zebra"))
        .send()
        .await
        .unwrap();
    let list: Value = resp.json().await.unwrap();
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_music_ordering() {
    let fixture = TestFixture::new().await;

    fixture
        .create_music("Alpha Song", "SONG", json!({"lyrics": "aaa"}))
        .await;
    tokio::time::sleep(tokio::time::Duration::from_millis(25)).await;
    fixture
        .create_music("Zebra Song", "SONG", json!({"lyrics": "zzz"}))
        .await;

    // Default order: newest first
    let resp = fixture
        .anon
        .get(fixture.url("/api/music"))
        .send()
        .await
        .unwrap();
    let list: Value = resp.json().await.unwrap();
    let entries = list.as_array().unwrap();
    assert_eq!(entries[0]["title"], "Zebra Song");
    assert_eq!(entries[1]["title"], "Alpha Song");

    // Explicit ordering by title ascending
    let resp = fixture
        .anon
        .get(fixture.url("/api/music?ordering=title"))
        .send()
        .await
        .unwrap();
    let list: Value = resp.json().await.unwrap();
    let entries = list.as_array().unwrap();
    assert_eq!(entries[0]["title"], "Alpha Song");
    assert_eq!(entries[1]["title"], "Zebra Song");
}

#[tokio::test]
async fn test_scout_content_crud() {
    let fixture = TestFixture::new().await;

    let created = fixture.create_scout_content("Clove Hitch").await;
    let id = created["id"].as_str().unwrap();

    assert_eq!(created["type"], "KNOT");
    assert_eq!(created["typeDisplay"], "عقدة");
    assert_eq!(created["category"], "KNOTS");
    assert_eq!(created["categoryDisplay"], "عقد");
    assert_eq!(created["difficulty"], 1);
    assert_eq!(created["difficultyDisplay"], "Easy");
    assert_eq!(created["author"], TEST_USER);

    // Partial update
    let patch_resp = fixture
        .client
        .patch(fixture.url(&format!("/api/scout-content/{}", id)))
        .json(&json!({
            "difficulty": 3,
            "youtubeLink": "https://youtube.com/watch?v=knots"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch_resp.status(), 200);
    let patched: Value = patch_resp.json().await.unwrap();
    assert_eq!(patched["difficultyDisplay"], "Hard");
    assert_eq!(patched["youtubeLink"], "https://youtube.com/watch?v=knots");
    assert_eq!(patched["usage"], "Securing a rope to a post");

    // Delete
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/scout-content/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 204);

    let gone = fixture
        .anon
        .get(fixture.url(&format!("/api/scout-content/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn test_scout_content_validation() {
    let fixture = TestFixture::new().await;

    // Missing usage
    let resp = fixture
        .client
        .post(fixture.url("/api/scout-content"))
        .json(&json!({
            "name": "Square Lashing",
            "type": "LASHING_1",
            "category": "PIONEERING",
            "difficulty": 2
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]["fields"]["usage"].is_string());

    // Out-of-range difficulty
    let resp = fixture
        .client
        .post(fixture.url("/api/scout-content"))
        .json(&json!({
            "name": "Square Lashing",
            "type": "LASHING_1",
            "category": "PIONEERING",
            "difficulty": 9,
            "usage": "Joining two spars"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]["fields"]["difficulty"].is_string());
}

#[tokio::test]
async fn test_scout_picture_upload_and_delete_cleanup() {
    let fixture = TestFixture::new().await;

    let form = Form::new()
        .text("name", "Clove Hitch")
        .text("type", "KNOT")
        .text("category", "KNOTS")
        .text("difficulty", "1")
        .text("usage", "Securing a rope to a post")
        .part(
            "picture",
            Part::bytes(b"fake-jpeg-bytes".as_slice())
                .file_name("photo.jpg")
                .mime_str("image/jpeg")
                .unwrap(),
        );

    let resp = fixture
        .client
        .post(fixture.url("/api/scout-content"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_str().unwrap();
    assert_eq!(body["picture"], "scout_content/knots/other/Clove_Hitch.jpg");

    let stored = fixture
        .media_root
        .join("scout_content/knots/other/Clove_Hitch.jpg");
    assert!(stored.exists());

    // Deleting the entity removes the stored file
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/scout-content/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 204);
    assert!(!stored.exists());
}

#[tokio::test]
async fn test_scout_picture_wrong_content_type() {
    let fixture = TestFixture::new().await;

    let form = Form::new()
        .text("name", "Clove Hitch")
        .text("type", "KNOT")
        .text("category", "KNOTS")
        .text("difficulty", "1")
        .text("usage", "Securing a rope to a post")
        .part(
            "picture",
            Part::bytes(b"plain text".as_slice())
                .file_name("notes.txt")
                .mime_str("text/plain")
                .unwrap(),
        );

    let resp = fixture
        .client
        .post(fixture.url("/api/scout-content"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]["fields"]["picture"].is_string());
}

#[tokio::test]
async fn test_author_cleared_on_identity_deletion() {
    let fixture = TestFixture::new().await;

    let created = fixture
        .create_music("Orphan Song", "SONG", json!({"lyrics": "left behind"}))
        .await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["author"], TEST_USER);

    fixture
        .repo
        .delete_identity(&fixture.identity.id)
        .await
        .unwrap();

    let music = fixture.repo.get_music(id).await.unwrap().unwrap();
    assert_eq!(music.author, None);
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .anon
        .get(fixture.url("/api/music/non-existent-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp = fixture
        .client
        .patch(fixture.url("/api/music/non-existent-id"))
        .json(&json!({ "title": "Nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .delete(fixture.url("/api/scout-content/non-existent-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_invalid_web_link_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/music"))
        .json(&json!({
            "title": "Linked Song",
            "type": "SONG",
            "webLink": "not a url"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]["fields"]["webLink"].is_string());
}
