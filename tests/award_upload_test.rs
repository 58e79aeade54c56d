use anyhow::anyhow;
use async_trait::async_trait;
use award_image_uploads::config::UploadConfig;
use award_image_uploads::services::remote::{
    RemoteCapability, RemoteImage, RemoteImageStore, RemoteUploadRequest,
};
use award_image_uploads::utils::auth::create_jwt;
use award_image_uploads::{AppState, create_app};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

/// Remote store that answers `{name: "n", url: "http://x/n"}` and records who asked.
struct StubRemoteStore {
    uids: Mutex<Vec<String>>,
}

impl StubRemoteStore {
    fn new() -> Self {
        Self {
            uids: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RemoteImageStore for StubRemoteStore {
    fn provider_id(&self) -> &'static str {
        "stub"
    }

    async fn upload_image(&self, request: RemoteUploadRequest) -> anyhow::Result<RemoteImage> {
        assert!(request.image.path.exists(), "staged file must exist during upload");
        self.uids.lock().unwrap().push(request.uid);
        Ok(RemoteImage {
            name: "n".to_string(),
            url: "http://x/n".to_string(),
            extra: Map::new(),
        })
    }
}

struct FailingRemoteStore;

#[async_trait]
impl RemoteImageStore for FailingRemoteStore {
    fn provider_id(&self) -> &'static str {
        "failing"
    }

    async fn upload_image(&self, _request: RemoteUploadRequest) -> anyhow::Result<RemoteImage> {
        Err(anyhow!("remote quota exceeded"))
    }
}

struct TestApp {
    app: Router,
    state: AppState,
    token: String,
    _root: TempDir,
}

fn setup() -> TestApp {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("award_image_uploads=debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();

    let root = tempfile::tempdir().unwrap();
    let config = UploadConfig::development(root.path());
    let token = create_jwt("17", &config.jwt_secret).unwrap();
    let state = AppState::new(config, Arc::new(RemoteCapability::new()));

    TestApp {
        app: create_app(state.clone()),
        state,
        token,
        _root: root,
    }
}

fn upload_request(token: &str, entity_id: Option<&str>, filename: &str, content: &str) -> Request<Body> {
    let multipart_body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"award\"; filename=\"{filename}\"\r\n\
        Content-Type: image/png\r\n\r\n\
        {content}\r\n\
        --{boundary}--\r\n",
        boundary = BOUNDARY,
        filename = filename,
        content = content,
    );

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/awards/images")
        .header("Authorization", format!("Bearer {}", token))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(id) = entity_id {
        builder = builder.header("x-award-entity-id", id);
    }
    builder.body(Body::from(multipart_body)).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!("non-JSON body: {}", String::from_utf8_lossy(&body))
        })
    };
    (status, json)
}

fn staging_is_empty(state: &AppState) -> bool {
    std::fs::read_dir(&state.config.staging_dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

#[tokio::test]
async fn test_storage_follows_remote_registration_per_request() {
    let t = setup();

    // 1. No remote store: local
    let (status, json) = send(&t.app, upload_request(&t.token, Some("e1"), "medal.png", "first")).await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["entityId"], "e1");
    assert_eq!(json["storage"], "local");
    assert_eq!(json["file"]["originalName"], "medal.png");
    assert_eq!(json["file"]["extension"], ".png");

    let filename = json["file"]["filename"].as_str().unwrap();
    assert!(filename.starts_with("award-") && filename.ends_with(".png"));
    let local_path = std::path::PathBuf::from(json["file"]["localPath"].as_str().unwrap());
    assert!(local_path.starts_with(t.state.config.permanent_dir()));
    assert_eq!(std::fs::read_to_string(&local_path).unwrap(), "first");
    assert!(staging_is_empty(&t.state));

    // 2. Same upload after registering a remote store: remote
    let store = Arc::new(StubRemoteStore::new());
    t.state.remote.register(store.clone());

    let (status, json) = send(&t.app, upload_request(&t.token, Some("e1"), "medal.png", "second")).await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["storage"], "remote");
    assert_eq!(json["file"]["url"], "http://x/n");
    assert_eq!(json["file"]["name"], "n");
    assert!(json["file"].get("localPath").is_none());
    assert_eq!(store.uids.lock().unwrap().as_slice(), ["17".to_string()]);
    assert!(staging_is_empty(&t.state));

    // 3. Unregister again: back to local
    t.state.remote.unregister();
    let (_, json) = send(&t.app, upload_request(&t.token, Some("e1"), "medal.png", "third")).await;
    assert_eq!(json["storage"], "local");
}

#[tokio::test]
async fn test_upload_requires_entity_id_and_token() {
    let t = setup();

    let (status, json) = send(&t.app, upload_request(&t.token, None, "medal.png", "x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing entity id header");
    assert!(staging_is_empty(&t.state));

    let (status, _) = send(&t.app, upload_request("not-a-token", Some("e1"), "medal.png", "x")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(t.state.registry.is_empty());
}

#[tokio::test]
async fn test_upload_without_award_field_is_rejected() {
    let t = setup();
    let body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"other\"\r\n\r\n\
        hello\r\n\
        --{boundary}--\r\n",
        boundary = BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/awards/images")
        .header("Authorization", format!("Bearer {}", t.token))
        .header("x-award-entity-id", "e1")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, json) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn test_remote_failure_commits_nothing() {
    let t = setup();
    t.state.remote.register(Arc::new(FailingRemoteStore));

    let (status, json) = send(&t.app, upload_request(&t.token, Some("e1"), "medal.png", "x")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("remote quota exceeded"));

    let request = Request::builder()
        .uri("/api/awards/images/e1")
        .header("Authorization", format!("Bearer {}", t.token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(staging_is_empty(&t.state));
}

#[tokio::test]
async fn test_replace_finalizes_pending_upload() {
    let t = setup();

    // Previous image already stored on the award
    let (_, old) = send(&t.app, upload_request(&t.token, Some("old"), "old.png", "old")).await;
    let old_filename = old["file"]["filename"].as_str().unwrap().to_string();
    let old_path = t.state.config.permanent_dir().join(&old_filename);
    assert!(old_path.exists());

    // New upload for e1
    let (_, new) = send(&t.app, upload_request(&t.token, Some("e1"), "new.png", "new")).await;
    let new_filename = new["file"]["filename"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/awards/images/e1")
        .header("Authorization", format!("Bearer {}", t.token))
        .body(Body::empty())
        .unwrap();
    let (status, pending) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["file"]["filename"], new_filename.as_str());
    assert_eq!(pending["storage"], "local");

    let request = Request::builder()
        .method("POST")
        .uri("/api/awards/images/e1/replace")
        .header("Authorization", format!("Bearer {}", t.token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({"previousImage": old_filename}).to_string()))
        .unwrap();
    let (status, replaced) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::OK, "{}", replaced);
    assert_eq!(replaced["destination"], new_filename.as_str());
    assert_eq!(
        replaced["url"],
        format!("/assets/uploads/awards/{}", new_filename)
    );

    assert!(!old_path.exists());
    assert!(t.state.registry.get("e1").is_none());
    assert!(t.state.config.permanent_dir().join(&new_filename).exists());

    // A second replace has nothing to finalize
    let request = Request::builder()
        .method("POST")
        .uri("/api/awards/images/e1/replace")
        .header("Authorization", format!("Bearer {}", t.token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({"previousImage": null}).to_string()))
        .unwrap();
    let (status, _) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replace_rejects_unrecognised_previous_image() {
    let t = setup();

    let outside = t.state.config.upload_path.join("keep.txt");
    std::fs::create_dir_all(&t.state.config.upload_path).unwrap();
    std::fs::write(&outside, "keep").unwrap();

    let (_, new) = send(&t.app, upload_request(&t.token, Some("e1"), "new.png", "new")).await;
    let new_filename = new["file"]["filename"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/api/awards/images/e1/replace")
        .header("Authorization", format!("Bearer {}", t.token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({"previousImage": "../keep.txt"}).to_string()))
        .unwrap();
    let (status, json) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid image reference: ../keep.txt");

    // Nothing was consumed or deleted
    assert!(outside.exists());
    assert!(t.state.config.permanent_dir().join(&new_filename).exists());
    let pending = t.state.registry.get("e1").unwrap();
    assert_eq!(pending.staged.filename, new_filename);
}

#[tokio::test]
async fn test_image_url_and_delete_endpoints() {
    let t = setup();

    let request = Request::builder()
        .uri("/api/awards/images?image=http%3A%2F%2Fa%2Fb")
        .header("Authorization", format!("Bearer {}", t.token))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["url"], "http://a/b");

    let request = Request::builder()
        .uri("/api/awards/images?image=award-1.png")
        .header("Authorization", format!("Bearer {}", t.token))
        .body(Body::empty())
        .unwrap();
    let (_, json) = send(&t.app, request).await;
    assert_eq!(json["url"], "/assets/uploads/awards/award-1.png");

    // Deleting a missing local file or a remote URL is always accepted
    for image in ["award-missing.png", "http%3A%2F%2Fx%2Fn"] {
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/awards/images?image={}", image))
            .header("Authorization", format!("Bearer {}", t.token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&t.app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn test_health_reports_storage_mode() {
    let t = setup();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage"], "local");

    t.state.remote.register(Arc::new(StubRemoteStore::new()));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, json) = send(&t.app, request).await;
    assert_eq!(json["storage"], "remote");
    assert_eq!(json["remote_provider"], "stub");
}
