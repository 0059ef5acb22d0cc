use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use docsearch::document::{ANCHOR, HEADING, TEXT, TITLE};
use docsearch::persist::{load_index, load_meta, IndexPaths};
use docsearch::tokenizer::tokenize;
use docsearch::{IndexStore, InvertedIndex, QueryEngine, SearchConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub id: String,
    pub score: f32,
    pub title: Option<String>,
    pub heading: Option<String>,
    pub anchor: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub index_paths_root: PathBuf,
    pub store: Arc<IndexStore>,
    pub engine: Arc<QueryEngine>,
    pub admin_token: Option<String>,
}

/// Load the index under `index_dir` and wire up the routes.
///
/// Without an explicit `config` the engine uses default options with the
/// boosts the index was built with.
pub fn build_app(index_dir: String, config: Option<SearchConfig>) -> Result<Router> {
    let paths = IndexPaths::new(&index_dir);
    let meta = load_meta(&paths)?;
    let index = load_index(&paths)?;
    let config = config.unwrap_or_else(|| SearchConfig { boosts: meta.boosts.clone(), ..SearchConfig::default() });
    if index.is_stale(&config) {
        tracing::warn!(index = %index_dir, "index was built with different boosts than the server config");
    }
    tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, created_at = %meta.created_at, "loaded index");

    let state = AppState {
        index_paths_root: PathBuf::from(&index_dir),
        store: Arc::new(IndexStore::new(index)),
        engine: Arc::new(QueryEngine::new(config)?),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(index_reload))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    // hold one snapshot for the whole request, even if a reload lands meanwhile
    let index = state.store.snapshot();
    let ranked = state.engine.rank(&index, &params.q);
    let total_hits = ranked.len();
    let k = params.k.clamp(1, state.engine.config().result_limit);

    let terms = tokenize(&params.q);
    let results = ranked
        .into_iter()
        .take(k)
        .filter_map(|r| {
            let doc = index.doc(r.doc_id)?;
            let snippet = doc.field(TEXT).map(|text| snippet(text, &terms));
            Some(SearchHit {
                doc_id: r.doc_id,
                id: r.id,
                score: r.score,
                title: doc.field(TITLE).map(str::to_string),
                heading: doc.field(HEADING).map(str::to_string),
                anchor: doc.field(ANCHOR).map(str::to_string),
                snippet,
            })
        })
        .collect();

    Json(SearchResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), total_hits, results })
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Json<serde_json::Value> {
    let index = state.store.snapshot();
    if let Some(doc) = index.doc(doc_id) {
        return Json(serde_json::json!({
            "doc_id": doc_id,
            "id": doc.id,
            "fields": doc.fields,
        }));
    }
    Json(serde_json::json!({ "error": "not found" }))
}

/// Re-read `index.bin` from disk and publish it in place of the current snapshot.
async fn index_reload(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let paths = IndexPaths::new(&state.index_paths_root);
    let index: InvertedIndex = tokio::task::spawn_blocking(move || load_index(&paths))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    if index.is_stale(state.engine.config()) {
        tracing::warn!("reloaded index was built with different boosts than the server config");
    }
    let num_docs = index.num_docs();
    state.store.publish(index);
    Ok(Json(serde_json::json!({ "reloaded": true, "num_docs": num_docs })))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

/// Up to ~200 chars around the first query term, with matches wrapped in `<em>`.
fn snippet(text: &str, terms: &[String]) -> String {
    let pat = term_pattern(terms);
    let chars: Vec<char> = text.chars().collect();
    let (start, end) = match pat.as_ref().and_then(|p| p.find(text)) {
        Some(m) => {
            let idx = text[..m.start()].chars().count();
            let start = idx.saturating_sub(60).min(chars.len());
            (start, (start + 200).min(chars.len()))
        }
        None => (0, 200.min(chars.len())),
    };
    let window: String = chars[start..end].iter().collect();
    match pat {
        Some(p) => highlight_terms(&window, &p),
        None => window,
    }
}

/// One case-insensitive alternation over all terms, longest first.
fn term_pattern(terms: &[String]) -> Option<regex::Regex> {
    let mut terms: Vec<&str> = terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return None;
    }
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    terms.dedup();
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    regex::RegexBuilder::new(&alternation).case_insensitive(true).build().ok()
}

fn highlight_terms(snippet: &str, pat: &regex::Regex) -> String {
    pat.replace_all(snippet, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_centers_on_first_match() {
        let text = format!("{} transition happens here", "filler ".repeat(40));
        let s = snippet(&text, &["transition".to_string()]);
        assert!(s.contains("<em>transition</em>"));
        assert!(s.len() < text.len() + 10);
    }

    #[test]
    fn snippet_without_match_takes_the_head() {
        let s = snippet("Short body.", &["absent".to_string()]);
        assert_eq!(s, "Short body.");
    }

    #[test]
    fn overlapping_terms_are_highlighted_once() {
        let terms = vec!["transition".to_string(), "em".to_string(), "trans".to_string()];
        let s = snippet("a Transition here, them", &terms);
        assert_eq!(s, "a <em>Transition</em> here, th<em>em</em>");
    }

    #[test]
    fn window_follows_match_in_original_text() {
        // lower-casing İ yields two chars, which must not shift the window
        let text = format!("{}{} target", "İ".repeat(100), "x".repeat(10));
        let s = snippet(&text, &["target".to_string()]);
        assert!(s.contains("<em>target</em>"));
        assert!(s.starts_with(&format!("{}x", "İ".repeat(49))));
    }
}
