use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::error;

use crate::errors::CrmError;

use super::models::*;
use super::pipeline::PipelineService;
use super::reporting::{ReportOptions, ReportingEngine};
use super::repository::{ContactRepository, DealRepository, SqlRepository, TaskRepository};
use super::settings::SettingsStore;
use super::ws::{WsMessage, broadcast_message};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub repo: SqlRepository,
    pub pipeline: PipelineService,
    pub reports: ReportingEngine,
    pub events: broadcast::Sender<String>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(repo: SqlRepository, options: ReportOptions) -> Self {
        let settings = repo.settings().clone();
        let shared = Arc::new(repo.clone());
        let (events, _rx) = broadcast::channel::<String>(256);
        Self {
            pipeline: PipelineService::new(settings.clone(), shared.clone()),
            reports: ReportingEngine::new(
                shared.clone(),
                shared.clone(),
                shared,
                settings.clone(),
                options,
            ),
            settings,
            repo,
            events,
        }
    }

    fn publish(&self, msg: WsMessage) {
        broadcast_message(&self.events, &msg);
    }

    /// Announce the stage list when settings moved past `version`. A stage
    /// edit whose deal migration failed has still saved the new list.
    fn publish_stages_since(&self, version: u64) {
        if self.settings.version() != version {
            self.publish(WsMessage::StagesChanged {
                stages: self.settings.pipeline_stages(),
            });
        }
    }

    fn publish_settings(&self) {
        self.publish(WsMessage::SettingsChanged {
            version: self.settings.version(),
        });
    }
}

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MoveDealRequest {
    pub stage: String,
}

#[derive(Deserialize)]
pub struct CompleteQuery {
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl From<CrmError> for ApiError {
    fn from(err: CrmError) -> Self {
        match err {
            CrmError::Validation(msg) => ApiError::BadRequest(msg),
            err @ CrmError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            err @ CrmError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            CrmError::Persistence(inner) => {
                error!(error = %format!("{:#}", inner), "Persistence failure");
                ApiError::Internal(format!("Persistence failure: {}", inner))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health_check))
        // Settings
        .route("/api/settings", get(get_settings))
        .route(
            "/api/settings/stages",
            get(list_stages).put(replace_stages).post(add_stage),
        )
        .route(
            "/api/settings/stages/{id}",
            patch(update_stage).delete(delete_stage),
        )
        .route(
            "/api/settings/task-types",
            get(list_task_types)
                .put(replace_task_types)
                .post(add_task_type),
        )
        .route(
            "/api/settings/task-types/{id}",
            axum::routing::delete(delete_task_type),
        )
        .route(
            "/api/settings/contact-fields",
            get(list_contact_fields)
                .put(replace_contact_fields)
                .post(add_contact_field),
        )
        .route(
            "/api/settings/contact-fields/{id}",
            axum::routing::delete(delete_contact_field),
        )
        .route(
            "/api/settings/preferences",
            get(get_preferences).patch(update_preferences),
        )
        // Deals and board
        .route("/api/deals", get(list_deals).post(create_deal))
        .route(
            "/api/deals/{id}",
            get(get_deal).put(update_deal).delete(delete_deal),
        )
        .route("/api/deals/{id}/stage", patch(move_deal))
        .route("/api/board", get(get_board))
        // Tasks
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/complete", post(complete_task))
        // Contacts
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/api/contacts/{id}/deals", get(contact_deals))
        .route("/api/contacts/{id}/tasks", get(contact_tasks))
        // Reports
        .route("/api/reports/dashboard", get(report_dashboard))
        .route("/api/reports/metrics", get(report_metrics))
        .route("/api/reports/pipeline", get(report_pipeline))
        .route("/api/reports/revenue-trend", get(report_revenue_trend))
        .route("/api/reports/top-performers", get(report_top_performers))
        .route("/api/reports/activity", get(report_activity))
        .route("/api/reports/tasks", get(report_tasks))
}

// ── Handlers: settings ────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_settings(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.settings.document())
}

async fn list_stages(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.settings.pipeline_stages())
}

async fn replace_stages(
    State(state): State<SharedState>,
    Json(stages): Json<Vec<PipelineStage>>,
) -> ApiResult<impl IntoResponse> {
    let version = state.settings.version();
    let replacement = state.pipeline.replace_stages(stages).await;
    state.publish_stages_since(version);
    Ok(Json(replacement?))
}

async fn add_stage(
    State(state): State<SharedState>,
    Json(req): Json<NewStage>,
) -> ApiResult<impl IntoResponse> {
    let version = state.settings.version();
    let stage = state.pipeline.add_stage(req).await?;
    state.publish_stages_since(version);
    Ok((StatusCode::CREATED, Json(stage)))
}

async fn update_stage(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(patch): Json<StagePatch>,
) -> ApiResult<impl IntoResponse> {
    let version = state.settings.version();
    let update = state.pipeline.update_stage(id, patch).await;
    state.publish_stages_since(version);
    Ok(Json(update?))
}

async fn delete_stage(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let version = state.settings.version();
    let deletion = state.pipeline.delete_stage(id).await?;
    state.publish_stages_since(version);
    Ok(Json(deletion))
}

async fn list_task_types(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.settings.task_types())
}

async fn replace_task_types(
    State(state): State<SharedState>,
    Json(types): Json<Vec<TaskType>>,
) -> ApiResult<impl IntoResponse> {
    let types = state.settings.update_task_types(types).await?;
    state.publish_settings();
    Ok(Json(types))
}

async fn add_task_type(
    State(state): State<SharedState>,
    Json(req): Json<NewTaskType>,
) -> ApiResult<impl IntoResponse> {
    let task_type = state.settings.add_task_type(req).await?;
    state.publish_settings();
    Ok((StatusCode::CREATED, Json(task_type)))
}

async fn delete_task_type(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state.settings.delete_task_type(id).await?;
    state.publish_settings();
    Ok(StatusCode::NO_CONTENT)
}

async fn list_contact_fields(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.settings.contact_fields())
}

async fn replace_contact_fields(
    State(state): State<SharedState>,
    Json(fields): Json<Vec<ContactField>>,
) -> ApiResult<impl IntoResponse> {
    let fields = state.settings.update_contact_fields(fields).await?;
    state.publish_settings();
    Ok(Json(fields))
}

async fn add_contact_field(
    State(state): State<SharedState>,
    Json(req): Json<NewContactField>,
) -> ApiResult<impl IntoResponse> {
    let field = state.settings.add_contact_field(req).await?;
    state.publish_settings();
    Ok((StatusCode::CREATED, Json(field)))
}

async fn delete_contact_field(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state.settings.delete_contact_field(id).await?;
    state.publish_settings();
    Ok(StatusCode::NO_CONTENT)
}

async fn get_preferences(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.settings.preferences())
}

async fn update_preferences(
    State(state): State<SharedState>,
    Json(patch): Json<PreferencesPatch>,
) -> ApiResult<impl IntoResponse> {
    let prefs = state.settings.update_preferences(patch).await?;
    state.publish_settings();
    Ok(Json(prefs))
}

// ── Handlers: deals ───────────────────────────────────────────────────

async fn list_deals(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(DealRepository::get_all(&state.repo).await?))
}

async fn get_deal(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(DealRepository::get_by_id(&state.repo, id).await?))
}

async fn create_deal(
    State(state): State<SharedState>,
    Json(req): Json<NewDeal>,
) -> ApiResult<impl IntoResponse> {
    let deal = DealRepository::create(&state.repo, req).await?;
    state.publish(WsMessage::DealCreated { deal: deal.clone() });
    Ok((StatusCode::CREATED, Json(deal)))
}

async fn update_deal(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<DealUpdate>,
) -> ApiResult<impl IntoResponse> {
    let deal = DealRepository::update(&state.repo, id, req).await?;
    state.publish(WsMessage::DealUpdated { deal: deal.clone() });
    Ok(Json(deal))
}

async fn move_deal(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveDealRequest>,
) -> ApiResult<impl IntoResponse> {
    let before = DealRepository::get_by_id(&state.repo, id).await?;
    let deal = state.pipeline.move_deal(id, &req.stage).await?;
    if before.stage != deal.stage {
        state.publish(WsMessage::DealStageChanged {
            deal_id: id,
            from_stage: before.stage,
            to_stage: deal.stage.clone(),
        });
    }
    Ok(Json(deal))
}

async fn delete_deal(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    DealRepository::delete(&state.repo, id).await?;
    state.publish(WsMessage::DealDeleted { deal_id: id });
    Ok(StatusCode::NO_CONTENT)
}

async fn get_board(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.pipeline.board().await?))
}

// ── Handlers: tasks ───────────────────────────────────────────────────

async fn list_tasks(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(TaskRepository::get_all(&state.repo).await?))
}

async fn get_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(TaskRepository::get_by_id(&state.repo, id).await?))
}

async fn create_task(
    State(state): State<SharedState>,
    Json(req): Json<NewTask>,
) -> ApiResult<impl IntoResponse> {
    let task = TaskRepository::create(&state.repo, req).await?;
    state.publish(WsMessage::TaskCreated { task: task.clone() });
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<TaskUpdate>,
) -> ApiResult<impl IntoResponse> {
    let task = TaskRepository::update(&state.repo, id, req).await?;
    state.publish(WsMessage::TaskUpdated { task: task.clone() });
    Ok(Json(task))
}

async fn complete_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(query): Query<CompleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let completed = query.completed.unwrap_or(true);
    let task = state.repo.mark_complete(id, completed).await?;
    state.publish(WsMessage::TaskCompleted {
        task_id: id,
        completed,
    });
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    TaskRepository::delete(&state.repo, id).await?;
    state.publish(WsMessage::TaskDeleted { task_id: id });
    Ok(StatusCode::NO_CONTENT)
}

// ── Handlers: contacts ────────────────────────────────────────────────

async fn list_contacts(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let contacts = match query.q {
        Some(q) => state.repo.search(&q).await?,
        None => ContactRepository::get_all(&state.repo).await?,
    };
    Ok(Json(contacts))
}

async fn get_contact(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ContactRepository::get_by_id(&state.repo, id).await?))
}

async fn create_contact(
    State(state): State<SharedState>,
    Json(req): Json<ContactInput>,
) -> ApiResult<impl IntoResponse> {
    let contact = ContactRepository::create(&state.repo, req).await?;
    state.publish(WsMessage::ContactCreated {
        contact: contact.clone(),
    });
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn update_contact(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<ContactInput>,
) -> ApiResult<impl IntoResponse> {
    let contact = ContactRepository::update(&state.repo, id, req).await?;
    state.publish(WsMessage::ContactUpdated {
        contact: contact.clone(),
    });
    Ok(Json(contact))
}

async fn delete_contact(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    ContactRepository::delete(&state.repo, id).await?;
    state.publish(WsMessage::ContactDeleted { contact_id: id });
    Ok(StatusCode::NO_CONTENT)
}

async fn contact_deals(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(DealRepository::get_by_contact_id(&state.repo, id).await?))
}

async fn contact_tasks(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(TaskRepository::get_by_contact_id(&state.repo, id).await?))
}

// ── Handlers: reports ─────────────────────────────────────────────────

async fn report_dashboard(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.reports.dashboard().await?))
}

async fn report_metrics(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.reports.metrics().await?))
}

async fn report_pipeline(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.reports.pipeline().await?))
}

async fn report_revenue_trend(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.reports.revenue_trend().await?))
}

async fn report_top_performers(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.reports.top_performers().await?))
}

async fn report_activity(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.reports.activity().await?))
}

async fn report_tasks(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.reports.task_metrics().await?))
}
