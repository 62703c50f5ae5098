//! Concept HTTP Handlers - 概念对话与故事蓝图

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{Converse, GenerateBlueprint, SaveBlueprint, UpdateBlueprint};
use crate::domain::project::ProjectId;
use crate::infrastructure::http::dto::{
    ApiResponse, BlueprintDraftResponse, ConverseRequest, ConverseResponse, ProjectResponse,
    SaveBlueprintRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// POST /api/novels/:id/concept/converse
pub async fn converse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ConverseRequest>,
) -> Result<Json<ApiResponse<ConverseResponse>>, ApiError> {
    let result = state
        .converse_handler
        .handle(Converse {
            project_id: ProjectId::from_uuid(id),
            user_input: req.user_input,
            conversation_state: req.conversation_state,
        })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// POST /api/novels/:id/blueprint/generate
///
/// 只返回草稿，确认后再调用 save
pub async fn generate_blueprint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BlueprintDraftResponse>>, ApiError> {
    let draft = state
        .generate_blueprint_handler
        .handle(GenerateBlueprint {
            project_id: ProjectId::from_uuid(id),
        })
        .await?;

    Ok(Json(ApiResponse::success(draft.into())))
}

/// POST /api/novels/:id/blueprint/save
pub async fn save_blueprint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveBlueprintRequest>,
) -> Result<Json<ApiResponse<ProjectResponse>>, ApiError> {
    let project = state
        .save_blueprint_handler
        .handle(SaveBlueprint {
            project_id: ProjectId::from_uuid(id),
            blueprint: req.blueprint,
        })
        .await?;

    Ok(Json(ApiResponse::success(ProjectResponse::from(&project))))
}

/// PATCH /api/novels/:id/blueprint - 按顶层字段整体替换
pub async fn update_blueprint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<Value>,
) -> Result<Json<ApiResponse<ProjectResponse>>, ApiError> {
    let project = state
        .update_blueprint_handler
        .handle(UpdateBlueprint {
            project_id: ProjectId::from_uuid(id),
            patch,
        })
        .await?;

    Ok(Json(ApiResponse::success(ProjectResponse::from(&project))))
}
