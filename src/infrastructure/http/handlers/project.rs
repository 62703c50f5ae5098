//! Project HTTP Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    CreateProject, DeleteProjects, GetChapter, GetProject, ListProjectSummaries,
};
use crate::domain::project::{Chapter, ProjectId, ProjectSummary};
use crate::infrastructure::http::dto::{
    ApiResponse, CreateProjectRequest, DeleteProjectsRequest, ProjectResponse, StatusResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// POST /api/novels - 新建项目
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<ApiResponse<ProjectResponse>>, ApiError> {
    let project = state
        .create_project_handler
        .handle(CreateProject {
            title: req.title,
            initial_prompt: req.initial_prompt,
        })
        .await?;

    Ok(Json(ApiResponse::success(ProjectResponse::from(&project))))
}

/// GET /api/novels - 项目摘要列表（按最近编辑倒序）
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ProjectSummary>>>, ApiError> {
    let summaries = state
        .list_projects_handler
        .handle(ListProjectSummaries)
        .await?;

    Ok(Json(ApiResponse::success(summaries)))
}

/// DELETE /api/novels - 批量删除，返回单一汇总状态
pub async fn delete_projects(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteProjectsRequest>,
) -> Result<Json<ApiResponse<StatusResponse>>, ApiError> {
    let result = state
        .delete_projects_handler
        .handle(DeleteProjects {
            project_ids: req.ids.into_iter().map(ProjectId::from_uuid).collect(),
        })
        .await?;

    Ok(Json(ApiResponse::success(StatusResponse {
        status: result.status,
        message: result.message,
    })))
}

/// GET /api/novels/:id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProjectResponse>>, ApiError> {
    let project = state
        .get_project_handler
        .handle(GetProject {
            project_id: ProjectId::from_uuid(id),
        })
        .await?;

    Ok(Json(ApiResponse::success(ProjectResponse::from(&project))))
}

/// GET /api/novels/:id/chapters/:n
pub async fn get_chapter(
    State(state): State<Arc<AppState>>,
    Path((id, chapter_number)): Path<(Uuid, u32)>,
) -> Result<Json<ApiResponse<Chapter>>, ApiError> {
    let chapter = state
        .get_chapter_handler
        .handle(GetChapter {
            project_id: ProjectId::from_uuid(id),
            chapter_number,
        })
        .await?;

    Ok(Json(ApiResponse::success(chapter)))
}
