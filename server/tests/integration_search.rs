use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use docsearch::persist::{save_all, IndexPaths};
use docsearch::{build_index, Document, IndexStore, QueryEngine, SearchConfig};
use docsearch_server::{router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn docs() -> Vec<Document> {
    vec![
        Document::new("/react#usetransition")
            .with_field("title", "React")
            .with_field("heading", "useTransition Demo")
            .with_field("anchor", "usetransition")
            .with_field("text", "Mark a state update as a non-blocking transition."),
        Document::new("/react#usedeferredvalue")
            .with_field("title", "React")
            .with_field("heading", "useDeferredValue Demo")
            .with_field("anchor", "usedeferredvalue")
            .with_field("text", "Defer re-rendering a non-urgent part of the UI."),
    ]
}

fn build_tiny_index(dir: &Path, docs: Vec<Document>) {
    let index = build_index(docs, &SearchConfig::default()).unwrap();
    save_all(&IndexPaths::new(dir), &index, "2024-01-01T00:00:00Z").unwrap();
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), docs());
    let app = docsearch_server::build_app(dir.path().to_string_lossy().to_string(), None).unwrap();

    let (status, json) = call(app, get("/search?q=transition&k=5")).await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr[0]["id"], "/react#usetransition");
    assert_eq!(arr[0]["heading"], "useTransition Demo");
    assert!(arr[0]["score"].as_f64().unwrap() > 0.0);
    assert!(arr[0]["snippet"].as_str().unwrap().contains("<em>transition</em>"));
}

#[tokio::test]
async fn empty_query_has_no_hits() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), docs());
    let app = docsearch_server::build_app(dir.path().to_string_lossy().to_string(), None).unwrap();

    let (status, json) = call(app, get("/search?q=")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 0);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn doc_endpoint_returns_fields() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), docs());
    let app = docsearch_server::build_app(dir.path().to_string_lossy().to_string(), None).unwrap();

    let (_, json) = call(app.clone(), get("/doc/1")).await;
    assert_eq!(json["id"], "/react#usedeferredvalue");
    assert_eq!(json["fields"]["anchor"], "usedeferredvalue");

    let (_, json) = call(app, get("/doc/99")).await;
    assert_eq!(json["error"], "not found");
}

#[tokio::test]
async fn reload_swaps_in_the_rebuilt_index() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), docs());
    let paths = IndexPaths::new(dir.path());
    let store = Arc::new(IndexStore::new(docsearch::persist::load_index(&paths).unwrap()));
    let state = AppState {
        index_paths_root: dir.path().to_path_buf(),
        store: store.clone(),
        engine: Arc::new(QueryEngine::new(SearchConfig::default()).unwrap()),
        admin_token: Some("secret".into()),
    };
    let app = router(state);

    let mut more = docs();
    more.push(Document::new("/vue").with_field("title", "Vue Transition"));
    build_tiny_index(dir.path(), more);

    let denied = Request::post("/index/reload").body(Body::empty()).unwrap();
    let (status, _) = call(app.clone(), denied).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(store.snapshot().num_docs(), 2);

    let allowed = Request::post("/index/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, json) = call(app.clone(), allowed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 3);

    let (_, json) = call(app, get("/search?q=vue")).await;
    assert_eq!(json["results"][0]["id"], "/vue");
}
