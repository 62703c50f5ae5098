//! Writer HTTP Handlers - 章节生产流水线
//!
//! 所有接口返回更新后的完整项目

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    DeleteChapters, EditChapterContent, EvaluateChapter, GenerateChapter, GenerateOutline,
    SelectChapterVersion, UpdateChapterOutline,
};
use crate::domain::project::{Project, ProjectId};
use crate::infrastructure::http::dto::{
    ApiResponse, ChapterNumberRequest, DeleteChaptersRequest, EditChapterRequest,
    GenerateOutlineRequest, ProjectResponse, SelectVersionRequest, UpdateOutlineRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

type ProjectResult = Result<Json<ApiResponse<ProjectResponse>>, ApiError>;

fn respond(project: &Project) -> Json<ApiResponse<ProjectResponse>> {
    Json(ApiResponse::success(ProjectResponse::from(project)))
}

/// POST /api/writer/novels/:id/chapters/generate
pub async fn generate_chapter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChapterNumberRequest>,
) -> ProjectResult {
    let project = state
        .generate_chapter_handler
        .handle(GenerateChapter {
            project_id: ProjectId::from_uuid(id),
            chapter_number: req.chapter_number,
        })
        .await?;
    Ok(respond(&project))
}

/// POST /api/writer/novels/:id/chapters/evaluate
pub async fn evaluate_chapter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChapterNumberRequest>,
) -> ProjectResult {
    let project = state
        .evaluate_chapter_handler
        .handle(EvaluateChapter {
            project_id: ProjectId::from_uuid(id),
            chapter_number: req.chapter_number,
        })
        .await?;
    Ok(respond(&project))
}

/// POST /api/writer/novels/:id/chapters/select
pub async fn select_version(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectVersionRequest>,
) -> ProjectResult {
    let project = state
        .select_version_handler
        .handle(SelectChapterVersion {
            project_id: ProjectId::from_uuid(id),
            chapter_number: req.chapter_number,
            version_index: req.version_index,
        })
        .await?;
    Ok(respond(&project))
}

/// POST /api/writer/novels/:id/chapters/edit
pub async fn edit_chapter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<EditChapterRequest>,
) -> ProjectResult {
    let project = state
        .edit_content_handler
        .handle(EditChapterContent {
            project_id: ProjectId::from_uuid(id),
            chapter_number: req.chapter_number,
            content: req.content,
        })
        .await?;
    Ok(respond(&project))
}

/// POST /api/writer/novels/:id/chapters/update-outline
pub async fn update_outline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOutlineRequest>,
) -> ProjectResult {
    let project = state
        .update_outline_handler
        .handle(UpdateChapterOutline {
            project_id: ProjectId::from_uuid(id),
            chapter_number: req.chapter_number,
            title: req.title,
            summary: req.summary,
        })
        .await?;
    Ok(respond(&project))
}

/// POST /api/writer/novels/:id/chapters/delete
pub async fn delete_chapters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<DeleteChaptersRequest>,
) -> ProjectResult {
    let project = state
        .delete_chapters_handler
        .handle(DeleteChapters {
            project_id: ProjectId::from_uuid(id),
            chapter_numbers: req.chapter_numbers,
        })
        .await?;
    Ok(respond(&project))
}

/// POST /api/writer/novels/:id/chapters/outline - 续写大纲
pub async fn generate_outline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<GenerateOutlineRequest>,
) -> ProjectResult {
    let project = state
        .generate_outline_handler
        .handle(GenerateOutline {
            project_id: ProjectId::from_uuid(id),
            start_chapter: req.start_chapter,
            num_chapters: req.num_chapters,
        })
        .await?;
    Ok(respond(&project))
}
