//! Auto Generator HTTP Handlers
//!
//! 任务状态变化同时通过 /ws/events 推送

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    AutoGenLog, AutoGenTask, CreateAutoGenTask, GetAutoGenLogs, GetAutoGenTask, ListAutoGenTasks,
    PauseAutoGenTask, StartAutoGenTask, StopAutoGenTask,
};
use crate::domain::project::ProjectId;
use crate::infrastructure::http::dto::{
    ApiResponse, AutoGenLogsQuery, AutoGenTaskListResponse, CreateAutoGenRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// POST /api/auto-generator/tasks
pub async fn create_auto_gen_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAutoGenRequest>,
) -> Result<Json<ApiResponse<AutoGenTask>>, ApiError> {
    let task = state
        .create_auto_gen_handler
        .handle(CreateAutoGenTask {
            project_id: ProjectId::from_uuid(req.project_id),
            target_chapters: req.target_chapters,
            interval_seconds: req.interval_seconds,
            auto_select_version: req.auto_select_version,
        })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// GET /api/auto-generator/novels/:id/tasks
pub async fn list_auto_gen_tasks(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AutoGenTaskListResponse>>, ApiError> {
    let tasks = state
        .list_auto_gen_handler
        .handle(ListAutoGenTasks {
            project_id: ProjectId::from_uuid(project_id),
        })
        .await?;

    Ok(Json(ApiResponse::success(AutoGenTaskListResponse {
        total: tasks.len(),
        tasks,
    })))
}

/// GET /api/auto-generator/tasks/:id
pub async fn get_auto_gen_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<AutoGenTask>>, ApiError> {
    let task = state
        .get_auto_gen_handler
        .handle(GetAutoGenTask { task_id })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// POST /api/auto-generator/tasks/:id/start
pub async fn start_auto_gen_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<AutoGenTask>>, ApiError> {
    let task = state
        .start_auto_gen_handler
        .handle(StartAutoGenTask { task_id })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// POST /api/auto-generator/tasks/:id/pause
pub async fn pause_auto_gen_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<AutoGenTask>>, ApiError> {
    let task = state
        .pause_auto_gen_handler
        .handle(PauseAutoGenTask { task_id })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// POST /api/auto-generator/tasks/:id/stop
pub async fn stop_auto_gen_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<AutoGenTask>>, ApiError> {
    let task = state
        .stop_auto_gen_handler
        .handle(StopAutoGenTask { task_id })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// GET /api/auto-generator/tasks/:id/logs?limit=
pub async fn auto_gen_logs(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Query(query): Query<AutoGenLogsQuery>,
) -> Result<Json<ApiResponse<Vec<AutoGenLog>>>, ApiError> {
    let logs = state
        .auto_gen_logs_handler
        .handle(GetAutoGenLogs {
            task_id,
            limit: query.limit,
        })
        .await?;

    Ok(Json(ApiResponse::success(logs)))
}
