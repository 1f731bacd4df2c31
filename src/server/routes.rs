use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::backend::{build_graph_response, GraphResponse};
use crate::server::AppState;

const DEFAULT_INDEX: &str = include_str!("../../templates/index.html");

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `GET /` - `index.html` from the static directory, or the built-in page
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page),
        Err(e) => {
            tracing::debug!("No {} ({}), serving built-in page", path.display(), e);
            Html(DEFAULT_INDEX.to_string())
        }
    }
}

/// `GET /api/graph` - up to `query_limit` triples as `{nodes, links}`
pub async fn get_graph(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GraphResponse>, (StatusCode, Json<ErrorResponse>)> {
    let triples = state
        .backend
        .fetch_triples(state.query_limit)
        .await
        .map_err(|e| {
            tracing::error!("Graph query failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() }))
        })?;

    Ok(Json(build_graph_response(triples)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{node, triple, MemoryBackend};
    use std::path::PathBuf;

    fn state(backend: MemoryBackend, limit: usize) -> Arc<AppState> {
        Arc::new(AppState {
            backend: Arc::new(backend),
            query_limit: limit,
            static_dir: PathBuf::from("/nonexistent"),
        })
    }

    #[tokio::test]
    async fn test_empty_database_is_success() {
        let Json(body) = get_graph(State(state(MemoryBackend::new(Vec::new()), 100)))
            .await
            .unwrap();
        assert!(body.nodes.is_empty());
        assert!(body.links.is_empty());
    }

    #[tokio::test]
    async fn test_limit_is_applied() {
        let rows = (0..150).map(|i| triple(node(i, "a"), node(i + 1000, "b"))).collect();
        let Json(body) = get_graph(State(state(MemoryBackend::new(rows), 100))).await.unwrap();
        assert_eq!(body.links.len(), 100);
        assert_eq!(body.nodes.len(), 200);
    }

    #[tokio::test]
    async fn test_backend_error_is_500() {
        let err = get_graph(State(state(MemoryBackend::failing(), 100))).await.unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.1.error.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_index_falls_back_to_builtin_page() {
        let Html(page) = index(State(state(MemoryBackend::new(Vec::new()), 100))).await;
        assert!(page.contains("/api/graph"));
    }

    #[tokio::test]
    async fn test_index_prefers_static_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>custom</h1>").unwrap();
        let state = Arc::new(AppState {
            backend: Arc::new(MemoryBackend::new(Vec::new())),
            query_limit: 100,
            static_dir: dir.path().to_path_buf(),
        });
        let Html(page) = index(State(state)).await;
        assert_eq!(page, "<h1>custom</h1>");
    }
}
