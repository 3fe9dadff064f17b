//! HTTP API over the in-memory catalog

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::{Catalog, CatalogError, Category, Video, VideoForm};

pub type SharedCatalog = Arc<RwLock<Catalog>>;

#[derive(Debug, Default, Deserialize)]
pub struct VideoQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// A video along with its category's display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: Video,
    pub category_name: String,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match self {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::ValidationError(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(catalog: SharedCatalog) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/videos", get(list_videos))
        .route("/api/videos/{id}", get(get_video))
        .route("/api/categories", get(list_categories))
        .route("/api/admin/videos", post(add_video))
        .route("/api/admin/videos/{id}", put(update_video).delete(delete_video))
        .with_state(catalog)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(addr: SocketAddr, catalog: Catalog) -> std::io::Result<()> {
    let app = router(Arc::new(RwLock::new(catalog)));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "catalog server listening");
    axum::serve(listener, app).await
}

async fn health() -> &'static str {
    "ok"
}

async fn list_videos(
    State(catalog): State<SharedCatalog>,
    Query(query): Query<VideoQuery>,
) -> Json<Vec<Video>> {
    let catalog = catalog.read().await;
    let videos = catalog
        .filter(query.search.as_deref(), query.category.as_deref())
        .into_iter()
        .cloned()
        .collect();
    Json(videos)
}

async fn get_video(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
) -> Result<Json<VideoDetail>, CatalogError> {
    let catalog = catalog.read().await;
    let video = catalog
        .get(&id)
        .cloned()
        .ok_or(CatalogError::NotFound(id))?;
    let category_name = catalog.category_name(&video.category);
    Ok(Json(VideoDetail {
        video,
        category_name,
    }))
}

async fn list_categories(State(catalog): State<SharedCatalog>) -> Json<Vec<Category>> {
    Json(catalog.read().await.categories().to_vec())
}

async fn add_video(
    State(catalog): State<SharedCatalog>,
    Json(form): Json<VideoForm>,
) -> Result<(StatusCode, Json<Video>), CatalogError> {
    let mut catalog = catalog.write().await;
    let video = catalog.add(form)?.clone();
    Ok((StatusCode::CREATED, Json(video)))
}

async fn update_video(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
    Json(form): Json<VideoForm>,
) -> Result<Json<Video>, CatalogError> {
    let mut catalog = catalog.write().await;
    let video = catalog.update(&id, form)?.clone();
    Ok(Json(video))
}

async fn delete_video(State(catalog): State<SharedCatalog>, Path(id): Path<String>) -> StatusCode {
    catalog.write().await.delete(&id);
    StatusCode::NO_CONTENT
}
