//! End-to-end tests for the remote drive adapter
//!
//! Boots an in-process mock contents server on an ephemeral port and drives
//! `RemoteDrive` against it over real HTTP. The mock records every request
//! and replays canned responses, so each test controls exactly what the
//! "remote server" answers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use serde_json::{json, Value};

use tether::{
    ChangeEvent, ConnectionSettings, ContentType, CreateOptions, Drive, DriveError,
    FetchOptions, RemoteDrive, SaveModel, ValidationError,
};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: String,
    body: String,
    authorization: Option<String>,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    responses: Arc<Mutex<VecDeque<(u16, String)>>>,
}

async fn capture(State(state): State<MockState>, request: Request) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();

    state.requests.lock().unwrap().push(Recorded {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().unwrap_or("").to_string(),
        body: String::from_utf8_lossy(&bytes).to_string(),
        authorization: parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    });

    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((500, "{\"message\": \"mock has no response queued\"}".into()));

    (
        StatusCode::from_u16(status).expect("valid mock status"),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

struct MockServer {
    base_url: String,
    state: MockState,
}

impl MockServer {
    async fn start() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let state = MockState {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
        };
        let app = Router::new()
            .fallback(capture)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    fn enqueue(&self, status: u16, body: Value) {
        self.state
            .responses
            .lock()
            .unwrap()
            .push_back((status, body.to_string()));
    }

    fn enqueue_no_content(&self) {
        self.state
            .responses
            .lock()
            .unwrap()
            .push_back((204, String::new()));
    }

    fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    fn drive(&self) -> RemoteDrive {
        RemoteDrive::with_settings("remote", ConnectionSettings::new(&self.base_url))
    }
}

fn file_model(name: &str, path: &str) -> Value {
    json!({
        "name": name,
        "path": path,
        "type": "file",
        "created": "2024-05-01T09:00:00Z",
        "last_modified": "2024-05-02T09:00:00Z",
        "mimetype": "text/plain",
        "content": null,
        "format": null,
    })
}

fn record_events(drive: &RemoteDrive) -> Arc<Mutex<Vec<ChangeEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    drive.subscribe(Box::new(move |event| {
        sink.lock().unwrap().push(event.clone());
    }));
    events
}

#[tokio::test]
async fn get_returns_the_servers_model() {
    let server = MockServer::start().await;
    server.enqueue(200, file_model("a b.txt", "dir/a b.txt"));

    let drive = server.drive();
    let model = drive
        .get("dir/a b.txt", FetchOptions::new().with_content(true))
        .await
        .expect("get succeeds");

    assert_eq!(model.name, "a b.txt");
    assert_eq!(model.path, "dir/a b.txt");
    assert_eq!(model.kind, ContentType::File);
    assert_eq!(model.mimetype.as_deref(), Some("text/plain"));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/contents/dir/a%20b.txt");
    assert!(requests[0].query.contains("content=1"));
}

#[tokio::test]
async fn get_serializes_content_flag_as_zero() {
    let server = MockServer::start().await;
    server.enqueue(200, file_model("a.txt", "a.txt"));

    let drive = server.drive();
    drive
        .get("a.txt", FetchOptions::new().with_content(false))
        .await
        .expect("get succeeds");

    assert!(server.requests()[0].query.contains("content=0"));
}

#[tokio::test]
async fn get_drops_format_for_notebooks() {
    let server = MockServer::start().await;
    server.enqueue(
        200,
        json!({
            "name": "nb.ipynb",
            "path": "nb.ipynb",
            "type": "notebook",
            "created": "2024-05-01T09:00:00Z",
            "last_modified": "2024-05-02T09:00:00Z",
            "mimetype": null,
            "content": null,
            "format": null,
        }),
    );

    let drive = server.drive();
    let options = FetchOptions::new()
        .with_kind(ContentType::Notebook)
        .with_format("json");
    drive.get("nb.ipynb", options).await.expect("get succeeds");

    let query = &server.requests()[0].query;
    assert!(query.contains("type=notebook"));
    assert!(!query.contains("format"));
}

#[tokio::test]
async fn get_keeps_format_for_files() {
    let server = MockServer::start().await;
    server.enqueue(200, file_model("a.txt", "a.txt"));

    let drive = server.drive();
    let options = FetchOptions::new()
        .with_kind(ContentType::File)
        .with_format("base64");
    drive.get("a.txt", options).await.expect("get succeeds");

    assert!(server.requests()[0].query.contains("format=base64"));
}

#[tokio::test]
async fn get_surfaces_unexpected_status_with_body() {
    let server = MockServer::start().await;
    server.enqueue(404, json!({"message": "No such file: missing.txt"}));

    let drive = server.drive();
    let err = drive
        .get("missing.txt", FetchOptions::new())
        .await
        .expect_err("get fails");

    assert!(err.is_server_error());
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("No such file"));
}

#[tokio::test]
async fn get_rejects_model_missing_a_field() {
    let server = MockServer::start().await;
    let mut model = file_model("a.txt", "a.txt");
    model.as_object_mut().unwrap().remove("created");
    server.enqueue(200, model);

    let drive = server.drive();
    let err = drive
        .get("a.txt", FetchOptions::new())
        .await
        .expect_err("get fails");

    match err {
        DriveError::Validation(ValidationError::MissingField { field, .. }) => {
            assert_eq!(field, "created");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn new_untitled_normalizes_extension_and_emits_new() {
    let server = MockServer::start().await;
    server.enqueue(201, file_model("untitled.py", "dir/untitled.py"));

    let drive = server.drive();
    let events = record_events(&drive);
    let model = drive
        .new_untitled(CreateOptions::new("dir").with_ext("py"))
        .await
        .expect("create succeeds");

    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/contents/dir");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["ext"], ".py");
    assert_eq!(body["path"], "dir");

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0], ChangeEvent::New { model });
}

#[tokio::test]
async fn new_untitled_keeps_dotted_and_empty_extensions() {
    let server = MockServer::start().await;
    server.enqueue(201, file_model("untitled.py", "untitled.py"));
    server.enqueue(201, file_model("untitled", "untitled"));

    let drive = server.drive();
    drive
        .new_untitled(CreateOptions::new("").with_ext(".py"))
        .await
        .expect("create succeeds");
    drive
        .new_untitled(CreateOptions::new("").with_ext(""))
        .await
        .expect("create succeeds");

    let requests = server.requests();
    let first: Value = serde_json::from_str(&requests[0].body).unwrap();
    let second: Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(first["ext"], ".py");
    assert_eq!(second["ext"], "");
}

#[tokio::test]
async fn new_untitled_malformed_body_emits_nothing() {
    let server = MockServer::start().await;
    server.enqueue(201, json!({"name": "untitled.py"}));

    let drive = server.drive();
    let events = record_events(&drive);
    let err = drive
        .new_untitled(CreateOptions::new("dir").with_ext(".py"))
        .await
        .expect_err("create fails validation");

    assert!(err.is_validation_error());
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn save_emits_save_after_validation() {
    let server = MockServer::start().await;
    server.enqueue(200, file_model("a.txt", "a.txt"));

    let drive = server.drive();
    let events = record_events(&drive);
    let model = drive
        .save("a.txt", &SaveModel::from_text("hello"))
        .await
        .expect("save succeeds");

    let requests = server.requests();
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].path, "/api/contents/a.txt");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["content"], "hello");

    let events = events.lock().unwrap();
    assert_eq!(*events, vec![ChangeEvent::Save { model }]);
}

#[tokio::test]
async fn save_accepts_created_status() {
    let server = MockServer::start().await;
    server.enqueue(201, file_model("new.txt", "new.txt"));

    let drive = server.drive();
    drive
        .save("new.txt", &SaveModel::from_text("fresh"))
        .await
        .expect("201 is a valid save response");
}

#[tokio::test]
async fn delete_emits_delete_with_old_path() {
    let server = MockServer::start().await;
    server.enqueue_no_content();

    let drive = server.drive();
    let events = record_events(&drive);
    drive.delete("dir/a.txt").await.expect("delete succeeds");

    let requests = server.requests();
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/api/contents/dir/a.txt");

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![ChangeEvent::Delete {
            path: "dir/a.txt".to_string(),
        }]
    );
}

#[tokio::test]
async fn delete_with_unexpected_status_emits_nothing() {
    let server = MockServer::start().await;
    server.enqueue(500, json!({"message": "boom"}));

    let drive = server.drive();
    let events = record_events(&drive);
    let err = drive.delete("a.txt").await.expect_err("delete fails");

    assert_eq!(err.status(), Some(500));
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rename_patches_and_emits_rename() {
    let server = MockServer::start().await;
    server.enqueue(200, file_model("new.txt", "dir/new.txt"));

    let drive = server.drive();
    let events = record_events(&drive);
    let model = drive
        .rename("dir/old.txt", "dir/new.txt")
        .await
        .expect("rename succeeds");

    let requests = server.requests();
    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].path, "/api/contents/dir/old.txt");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, json!({"path": "dir/new.txt"}));

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![ChangeEvent::Rename {
            old_path: "dir/old.txt".to_string(),
            model,
        }]
    );
}

#[tokio::test]
async fn copy_posts_copy_from_and_emits_new() {
    let server = MockServer::start().await;
    server.enqueue(201, file_model("a-Copy1.txt", "dest/a-Copy1.txt"));

    let drive = server.drive();
    let events = record_events(&drive);
    let model = drive
        .copy("src/a.txt", "dest")
        .await
        .expect("copy succeeds");

    // The server picks the final name
    assert_eq!(model.name, "a-Copy1.txt");

    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/contents/dest");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, json!({"copy_from": "src/a.txt"}));

    let events = events.lock().unwrap();
    assert_eq!(*events, vec![ChangeEvent::New { model }]);
}

#[tokio::test]
async fn checkpoint_lifecycle_round_trips() {
    let server = MockServer::start().await;
    server.enqueue(201, json!({"id": "ckpt-1", "last_modified": "2024-05-03T08:00:00Z"}));
    server.enqueue(
        200,
        json!([
            {"id": "ckpt-1", "last_modified": "2024-05-03T08:00:00Z"},
            {"id": "ckpt-2", "last_modified": "2024-05-03T09:00:00Z"},
        ]),
    );
    server.enqueue_no_content();
    server.enqueue_no_content();

    let drive = server.drive();
    let events = record_events(&drive);

    let checkpoint = drive
        .create_checkpoint("nb.ipynb")
        .await
        .expect("create checkpoint");
    assert_eq!(checkpoint.id, "ckpt-1");

    let list = drive
        .list_checkpoints("nb.ipynb")
        .await
        .expect("list checkpoints");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, "ckpt-1");
    assert_eq!(list[1].id, "ckpt-2");

    drive
        .restore_checkpoint("nb.ipynb", "ckpt-1")
        .await
        .expect("restore checkpoint");
    drive
        .delete_checkpoint("nb.ipynb", "ckpt-2")
        .await
        .expect("delete checkpoint");

    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/contents/nb.ipynb/checkpoints");
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].path, "/api/contents/nb.ipynb/checkpoints");
    assert_eq!(requests[2].method, "POST");
    assert_eq!(requests[2].path, "/api/contents/nb.ipynb/checkpoints/ckpt-1");
    assert_eq!(requests[3].method, "DELETE");
    assert_eq!(requests[3].path, "/api/contents/nb.ipynb/checkpoints/ckpt-2");

    // Checkpoint operations are not mutations of the contents namespace
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn list_checkpoints_distinguishes_non_array_from_bad_item() {
    let server = MockServer::start().await;
    server.enqueue(200, json!({"id": "ckpt-1"}));
    server.enqueue(200, json!([{"id": 42, "last_modified": "x"}]));

    let drive = server.drive();

    let err = drive
        .list_checkpoints("nb.ipynb")
        .await
        .expect_err("non-array body fails");
    assert!(matches!(
        err,
        DriveError::Validation(ValidationError::NotAnArray)
    ));

    let err = drive
        .list_checkpoints("nb.ipynb")
        .await
        .expect_err("bad item fails");
    assert!(matches!(
        err,
        DriveError::Validation(ValidationError::InvalidField { field: "id", .. })
    ));
}

#[tokio::test]
async fn stored_query_params_ride_on_every_request() {
    let server = MockServer::start().await;
    server.enqueue(200, file_model("a.txt", "a.txt"));
    server.enqueue_no_content();

    let drive = RemoteDrive::with_settings(
        "remote",
        ConnectionSettings::new(&server.base_url).with_query_param("token", "secret"),
    );
    drive.get("a.txt", FetchOptions::new()).await.expect("get");
    drive.delete("a.txt").await.expect("delete");

    for request in server.requests() {
        assert!(request.query.contains("token=secret"));
    }
}

#[tokio::test]
async fn token_is_sent_as_authorization_header() {
    let server = MockServer::start().await;
    server.enqueue(200, file_model("a.txt", "a.txt"));

    let drive = RemoteDrive::with_settings(
        "remote",
        ConnectionSettings::new(&server.base_url).with_token("sekrit"),
    );
    drive.get("a.txt", FetchOptions::new()).await.expect("get");

    assert_eq!(
        server.requests()[0].authorization.as_deref(),
        Some("token sekrit")
    );
}

#[tokio::test]
async fn swapping_base_url_redirects_subsequent_calls() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    first.enqueue(200, file_model("a.txt", "a.txt"));
    second.enqueue(200, file_model("a.txt", "a.txt"));

    let drive = first.drive();
    drive.get("a.txt", FetchOptions::new()).await.expect("get");

    drive.update_settings(|settings| {
        settings.base_url = second.base_url.clone();
    });
    drive.get("a.txt", FetchOptions::new()).await.expect("get");

    assert_eq!(first.requests().len(), 1);
    assert_eq!(second.requests().len(), 1);
}
