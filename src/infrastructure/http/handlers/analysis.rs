//! Async Analysis HTTP Handlers
//!
//! 提交后立即返回任务快照，调用方轮询或订阅 /ws/events 获取进度

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::application::{
    AnalysisNotification, AnalysisTask, CancelAnalysisTask, GetAnalysisStatus, GetAnalysisTask,
    GetLatestChapterTask, ListAnalysisTasks, ListNotifications, MarkAllNotificationsRead,
    MarkNotificationRead, RetryAnalysisTask, SubmitAnalysis, TaskStatusSummary,
};
use crate::domain::project::ProjectId;
use crate::infrastructure::http::dto::{
    AnalysisStatusQuery, ApiResponse, ListTasksQuery, MarkAllReadResponse,
    NotificationListResponse, NotificationsQuery, SubmitAnalysisRequest, TaskListResponse,
};
use uuid::Uuid;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// POST /api/async-analysis/tasks
pub async fn submit_analysis(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitAnalysisRequest>,
) -> Result<Json<ApiResponse<AnalysisTask>>, ApiError> {
    // 超出 u8 的取值交给处理器按越界拒绝
    let priority = req.priority.map(|p| u8::try_from(p).unwrap_or(u8::MAX));

    let task = state
        .submit_analysis_handler
        .handle(SubmitAnalysis {
            project_id: ProjectId::from_uuid(req.project_id),
            chapter_number: req.chapter_number,
            priority,
        })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// GET /api/async-analysis/tasks?status=&project_id=
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<ApiResponse<TaskListResponse>>, ApiError> {
    let tasks = state
        .list_tasks_handler
        .handle(ListAnalysisTasks {
            status: query.status,
            project_id: query.project_id.map(ProjectId::from_uuid),
        })
        .await?;

    Ok(Json(ApiResponse::success(TaskListResponse {
        total: tasks.len(),
        tasks,
    })))
}

/// GET /api/async-analysis/tasks/:id
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<AnalysisTask>>, ApiError> {
    let task = state
        .get_task_handler
        .handle(GetAnalysisTask { task_id })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// POST /api/async-analysis/tasks/:id/cancel
pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<AnalysisTask>>, ApiError> {
    let task = state
        .cancel_analysis_handler
        .handle(CancelAnalysisTask { task_id })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// POST /api/async-analysis/tasks/:id/retry
pub async fn retry_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<AnalysisTask>>, ApiError> {
    let task = state
        .retry_analysis_handler
        .handle(RetryAnalysisTask { task_id })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// GET /api/async-analysis/status?project_id=&limit=
pub async fn analysis_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisStatusQuery>,
) -> Result<Json<ApiResponse<TaskStatusSummary>>, ApiError> {
    let summary = state
        .analysis_status_handler
        .handle(GetAnalysisStatus {
            project_id: ProjectId::from_uuid(query.project_id),
            limit: query.limit,
        })
        .await?;

    Ok(Json(ApiResponse::success(summary)))
}

/// GET /api/async-analysis/novels/:id/chapters/:n/latest
///
/// 章节从未分析过时 data 为 null
pub async fn latest_chapter_task(
    State(state): State<Arc<AppState>>,
    Path((project_id, chapter_number)): Path<(Uuid, u32)>,
) -> Result<Json<ApiResponse<Option<AnalysisTask>>>, ApiError> {
    let task = state
        .latest_chapter_task_handler
        .handle(GetLatestChapterTask {
            project_id: ProjectId::from_uuid(project_id),
            chapter_number,
        })
        .await?;

    Ok(Json(ApiResponse::success(task)))
}

/// GET /api/async-analysis/notifications?unread_only=&limit=
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<ApiResponse<NotificationListResponse>>, ApiError> {
    let notifications = state
        .list_notifications_handler
        .handle(ListNotifications {
            unread_only: query.unread_only,
            limit: query.limit,
        })
        .await?;

    Ok(Json(ApiResponse::success(NotificationListResponse {
        total: notifications.len(),
        notifications,
    })))
}

/// POST /api/async-analysis/notifications/:id/read
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<String>,
) -> Result<Json<ApiResponse<AnalysisNotification>>, ApiError> {
    let notification = state
        .mark_notification_read_handler
        .handle(MarkNotificationRead { notification_id })
        .await?;

    Ok(Json(ApiResponse::success(notification)))
}

/// POST /api/async-analysis/notifications/read-all
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<MarkAllReadResponse>>, ApiError> {
    let marked = state
        .mark_all_read_handler
        .handle(MarkAllNotificationsRead)
        .await?;

    Ok(Json(ApiResponse::success(MarkAllReadResponse { marked })))
}
