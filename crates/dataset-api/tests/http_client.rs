use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use dataset_api::{ApiError, ClientConfig, DatasetApi, HttpDatasetApi, IMAGES_CONTENT_TYPE};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Seen {
    images_request: Arc<Mutex<Option<(String, String)>>>,
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str) -> HttpDatasetApi {
    HttpDatasetApi::new(&ClientConfig::new(base)).unwrap()
}

async fn dataset_info(Path(name): Path<String>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if name != "kanji-v1" {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("Cannot find dataset {name:?}!")})),
        ));
    }
    Ok(Json(json!({
        "name": "kanji-v1",
        "metadata": {
            "source": "kana.txt",
            "content": "あい",
            "labels": ["あ", "い"],
            "invalid_records": ["h1"],
            "invalid_fonts": [],
            "completed_labels": ["い"]
        }
    })))
}

async fn label_info(Path((name, label)): Path<(String, String)>) -> Json<Value> {
    Json(json!({
        "dataset": name,
        "label": label,
        "records": [
            {"hash": "h1", "char": label, "font": "mincho"},
            {"hash": "h2", "char": label, "font": "MS Gothic"}
        ]
    }))
}

async fn images(
    State(seen): State<Seen>,
    Path(_name): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let ct = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    *seen.images_request.lock().unwrap() = Some((ct, body.clone()));

    // only the first requested hash is resolvable
    let hashes: Vec<String> = serde_json::from_str(&body).unwrap();
    Json(json!({"images": [{"hash": hashes[0], "data": "aGVs\nbG8=\n"}]}))
}

fn mark(kind: &str, (state, name, key): (String, String, String)) -> Json<Value> {
    Json(json!({"message": format!("{kind}/{state}/{name}/{key}")}))
}

async fn legacy(Path((_name, hash)): Path<(String, String)>) -> Json<Value> {
    Json(json!({"image": format!("data-of-{hash}")}))
}

fn router(seen: Seen) -> Router {
    Router::new()
        .route("/api/datasets", get(|| async { Json(json!({"datasets": ["kanji-v1", "1690000000-kanji-v1"]})) }))
        .route("/api/datasets/:name", get(dataset_info))
        .route("/api/datasets/:name/:label", get(label_info))
        .route("/api/images/:name", post(images))
        .route(
            "/api/record/:state/:name/:key",
            get(|Path(p): Path<(String, String, String)>| async move { mark("record", p) }),
        )
        .route(
            "/api/font/:state/:name/:key",
            get(|Path(p): Path<(String, String, String)>| async move { mark("font", p) }),
        )
        .route(
            "/api/label/:state/:name/:key",
            get(|Path(p): Path<(String, String, String)>| async move { mark("label", p) }),
        )
        .route("/images/:name/:hash", get(legacy))
        .with_state(seen)
}

#[tokio::test]
async fn test_list_datasets_keeps_server_order() {
    let base = spawn(router(Seen::default())).await;
    let names: Vec<String> = client(&base)
        .list_datasets()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["kanji-v1", "1690000000-kanji-v1"]);
}

#[tokio::test]
async fn test_metadata_roundtrip_and_unknown_dataset() {
    let base = spawn(router(Seen::default())).await;
    let api = client(&base);

    let info = api.get_dataset_metadata("kanji-v1").await.unwrap();
    assert_eq!(info.name, "kanji-v1");
    assert_eq!(info.metadata.labels, vec!["あ", "い"]);
    assert!(info.metadata.is_record_invalid("h1"));
    assert!(info.metadata.is_completed("い"));

    let err = api.get_dataset_metadata("nope").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        ApiError::Server { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("nope"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_label_records_non_ascii_label() {
    let base = spawn(router(Seen::default())).await;
    let set = client(&base).get_label_records("kanji-v1", "あ").await.unwrap();
    assert_eq!(set.dataset, "kanji-v1");
    assert_eq!(set.label, "あ");
    assert_eq!(set.records.len(), 2);
    assert_eq!(set.records[1].font, "MS Gothic");
}

#[tokio::test]
async fn test_images_request_wire_format_and_partial_reply() {
    let seen = Seen::default();
    let base = spawn(router(seen.clone())).await;

    let hashes = vec!["h1".to_string(), "h2".to_string()];
    let images = client(&base).get_images("kanji-v1", &hashes).await.unwrap();

    // fewer entries than requested is a valid reply
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].hash, "h1");

    let (ct, body) = seen.images_request.lock().unwrap().clone().unwrap();
    assert_eq!(ct, IMAGES_CONTENT_TYPE);
    assert_eq!(body, r#"["h1","h2"]"#);
}

#[tokio::test]
async fn test_mutation_routes() {
    let base = spawn(router(Seen::default())).await;
    let api = client(&base);

    let ack = api.set_record_validity("kanji-v1", "h1", false).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("record/invalid/kanji-v1/h1"));

    let ack = api.set_record_validity("kanji-v1", "h1", true).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("record/valid/kanji-v1/h1"));

    let ack = api.set_font_validity("kanji-v1", "MS Gothic", false).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("font/invalid/kanji-v1/MS Gothic"));

    let ack = api.set_label_completion("kanji-v1", "あ", true).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("label/complete/kanji-v1/あ"));
}

#[tokio::test]
async fn test_legacy_single_image() {
    let base = spawn(router(Seen::default())).await;
    let data = client(&base).get_image("kanji-v1", "h9").await.unwrap();
    assert_eq!(data, "data-of-h9");
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let base = spawn(Router::new().route("/api/datasets", get(|| async { "{not json" }))).await;
    let err = client(&base).list_datasets().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn test_non_200_is_server_error() {
    let base = spawn(Router::new().route(
        "/api/datasets",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;
    let err = client(&base).list_datasets().await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 500, ref message } if message == "boom"));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}")).list_datasets().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let base = spawn(Router::new().route(
        "/api/datasets",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"datasets": []}))
        }),
    ))
    .await;

    let cfg = ClientConfig { base_url: base, timeout: Duration::from_millis(100) };
    let err = HttpDatasetApi::new(&cfg).unwrap().list_datasets().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "{err:?}");
}
