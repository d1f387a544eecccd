use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use grid_core::render::render_svg;
use grid_core::{
    pack_section, summarize, FloorId, InMemoryBackend, LayoutBackend, LayoutError, LayoutFilter,
    PackedSection, PlacementRequest, Rejection, RemoveOutcome, ReservationFilter, Room, RoomEdit,
    SaveReport, Section, SectionLayoutStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

/// Backing store plus the administrator's unsaved working copy.
#[derive(Clone)]
struct AppState {
    backend: Arc<InMemoryBackend>,
    draft: Arc<Mutex<SectionLayoutStore>>,
}

impl AppState {
    fn new(backend: InMemoryBackend) -> Result<Self, LayoutError> {
        let draft = SectionLayoutStore::load(&backend, &LayoutFilter::default())?;
        Ok(Self {
            backend: Arc::new(backend),
            draft: Arc::new(Mutex::new(draft)),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let seed = config.load_seed()?;
    info!(
        rooms = seed.rooms.len(),
        reservations = seed.reservations.len(),
        "Starting section grid API"
    );

    let state = AppState::new(InMemoryBackend::from_dataset(seed))?;
    let app = router(state);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/layout", get(list_layout))
        .route("/api/layout/draft", get(list_draft))
        .route("/api/layout/draft/place", post(place_room))
        .route(
            "/api/layout/draft/rooms/:id",
            delete(remove_room).patch(edit_room),
        )
        .route("/api/layout/draft/floors", post(create_floor))
        .route("/api/layout/draft/floors/:floor", delete(delete_floor))
        .route("/api/layout/draft/save", post(save_draft))
        .route("/api/layout/draft/reload", post(reload_draft))
        .route("/api/floors/:floor/sections/:section/grid", get(section_grid))
        .route("/api/floors/:floor/summary", get(floor_summary))
        .route("/api/generate/svg", post(generate_svg))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "section-grid-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Stored rooms, filtered by `floorId` and `section`
async fn list_layout(
    State(state): State<AppState>,
    Query(filter): Query<LayoutFilter>,
) -> Result<Json<Vec<Room>>, AppError> {
    Ok(Json(state.backend.list_layout(&filter).map_err(LayoutError::from)?))
}

async fn list_draft(State(state): State<AppState>) -> Json<Vec<Room>> {
    let draft = state.draft.lock().await;
    Json(draft.rooms().cloned().collect())
}

async fn place_room(
    State(state): State<AppState>,
    Json(request): Json<PlacementRequest>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    let mut draft = state.draft.lock().await;
    let room = draft.place(&request)?.clone();
    Ok((StatusCode::CREATED, Json(room)))
}

async fn remove_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut draft = state.draft.lock().await;
    let outcome: RemoveOutcome = draft.remove_room(&id)?;
    Ok(Json(json!({ "id": id, "outcome": outcome })))
}

async fn edit_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<RoomEdit>,
) -> Result<Json<Room>, AppError> {
    let mut draft = state.draft.lock().await;
    let room = draft.edit_room(&id, edit)?.clone();
    Ok(Json(room))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewFloor {
    floor_id: FloorId,
}

async fn create_floor(
    State(state): State<AppState>,
    Json(body): Json<NewFloor>,
) -> Result<StatusCode, AppError> {
    let mut draft = state.draft.lock().await;
    draft.create_floor(body.floor_id)?;
    Ok(StatusCode::CREATED)
}

async fn delete_floor(
    State(state): State<AppState>,
    Path(floor): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let floor_id: FloorId = floor.parse()?;
    let mut draft = state.draft.lock().await;
    let marked = draft.delete_floor(floor_id)?;
    Ok(Json(json!({ "floorId": floor_id, "marked": marked })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    #[serde(flatten)]
    report: SaveReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    reload_error: Option<String>,
}

/// Sends pending changes to the backend and swaps in the reloaded layout
async fn save_draft(State(state): State<AppState>) -> Result<Json<SaveResponse>, AppError> {
    let mut draft = state.draft.lock().await;
    let outcome = draft.save(state.backend.as_ref())?;
    *draft = outcome.store;

    info!(
        applied = outcome.report.applied.len(),
        failed = outcome.report.failures.len(),
        fresh = outcome.reload_error.is_none(),
        "Draft saved"
    );
    Ok(Json(SaveResponse {
        report: outcome.report,
        reload_error: outcome.reload_error.map(|e| e.to_string()),
    }))
}

async fn reload_draft(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let fresh = SectionLayoutStore::load(state.backend.as_ref(), &LayoutFilter::default())?;
    *state.draft.lock().await = fresh;
    Ok(StatusCode::NO_CONTENT)
}

async fn section_grid(
    State(state): State<AppState>,
    Path((floor, section)): Path<(String, String)>,
) -> Result<Json<PackedSection>, AppError> {
    let floor_id: FloorId = floor.parse()?;
    let section: Section = section.parse()?;
    let filter = LayoutFilter {
        floor_id: Some(floor_id),
        section: Some(section),
    };
    let rooms = state.backend.list_layout(&filter).map_err(LayoutError::from)?;
    Ok(Json(pack_section(floor_id, section, &rooms)))
}

async fn floor_summary(
    State(state): State<AppState>,
    Path(floor): Path<String>,
) -> Result<Json<grid_core::FloorSummary>, AppError> {
    let floor_id: FloorId = floor.parse()?;
    let rooms = state
        .backend
        .list_layout(&LayoutFilter::floor(floor_id))
        .map_err(LayoutError::from)?;
    let reservations = state
        .backend
        .list_reservations(&ReservationFilter::default())
        .map_err(LayoutError::from)?;
    Ok(Json(summarize(floor_id, &rooms, &reservations)))
}

/// Generate SVG visualization of a packed section
async fn generate_svg(Json(packed): Json<PackedSection>) -> Result<Response, AppError> {
    info!(floor = %packed.floor_id, section = %packed.section, "Generating SVG");

    let svg = render_svg(&packed).map_err(|e| AppError(anyhow::Error::from(e).into()))?;

    Ok((StatusCode::OK, [("Content-Type", "image/svg+xml")], svg).into_response())
}

/// Application error type
struct AppError(ErrorKind);

enum ErrorKind {
    Layout(LayoutError),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ErrorKind {
    fn from(err: anyhow::Error) -> Self {
        ErrorKind::Internal(err)
    }
}

impl From<LayoutError> for AppError {
    fn from(err: LayoutError) -> Self {
        AppError(ErrorKind::Layout(err))
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ErrorKind::Layout(err) => match err {
                LayoutError::Rejected(Rejection::Overlap { .. })
                | LayoutError::Rejected(Rejection::CapacityExceeded { .. })
                | LayoutError::Rejected(Rejection::InUse { .. })
                | LayoutError::FloorExists(_) => StatusCode::CONFLICT,
                LayoutError::Rejected(_)
                | LayoutError::InvalidFloorId(_)
                | LayoutError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                LayoutError::RoomNotFound(_) | LayoutError::FloorNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                LayoutError::Backend(_) => StatusCode::BAD_GATEWAY,
            },
            ErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            ErrorKind::Layout(err) => err.to_string(),
            ErrorKind::Internal(err) => err.to_string(),
        };
        error!(%status, "Request error: {}", message);

        (
            status,
            Json(json!({
                "error": message,
            })),
        )
            .into_response()
    }
}
