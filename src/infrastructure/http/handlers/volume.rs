//! Volume HTTP Handlers - 剧情指标与分卷

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    GetSplitConfig, GetStoryMetrics, ListVolumes, TriggerAutoSplit, UpdateSplitConfig,
};
use crate::domain::metrics::{SplitConfig, SplitConfigPatch, StoryMetric, Volume};
use crate::domain::project::ProjectId;
use crate::infrastructure::http::dto::{ApiResponse, AutoSplitRequest, AutoSplitResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// GET /api/novels/:id/story-metrics
pub async fn story_metrics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<StoryMetric>>>, ApiError> {
    let metrics = state
        .story_metrics_handler
        .handle(GetStoryMetrics {
            project_id: ProjectId::from_uuid(id),
        })
        .await?;

    Ok(Json(ApiResponse::success(metrics)))
}

/// POST /api/novels/:id/auto-split
///
/// 请求体可省略；`threshold` 覆盖本次的分数阈值
pub async fn auto_split(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Option<Json<AutoSplitRequest>>,
) -> Result<Json<ApiResponse<AutoSplitResponse>>, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let result = state
        .auto_split_handler
        .handle(TriggerAutoSplit {
            project_id: ProjectId::from_uuid(id),
            threshold: req.threshold,
        })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// GET /api/novels/:id/split-config
pub async fn get_split_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SplitConfig>>, ApiError> {
    let config = state
        .get_split_config_handler
        .handle(GetSplitConfig {
            project_id: ProjectId::from_uuid(id),
        })
        .await?;

    Ok(Json(ApiResponse::success(config)))
}

/// PUT /api/novels/:id/split-config - 只修改提供的字段
pub async fn update_split_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<SplitConfigPatch>,
) -> Result<Json<ApiResponse<SplitConfig>>, ApiError> {
    let config = state
        .update_split_config_handler
        .handle(UpdateSplitConfig {
            project_id: ProjectId::from_uuid(id),
            patch,
        })
        .await?;

    Ok(Json(ApiResponse::success(config)))
}

/// GET /api/novels/:id/volumes
pub async fn list_volumes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Volume>>>, ApiError> {
    let volumes = state
        .list_volumes_handler
        .handle(ListVolumes {
            project_id: ProjectId::from_uuid(id),
        })
        .await?;

    Ok(Json(ApiResponse::success(volumes)))
}
