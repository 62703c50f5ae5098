//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::application::{
    AnalysisNotification, AnalysisTask, AutoGenTask, AutoSplitResponse as AutoSplitResult, ConverseResponse as ConverseResult,
    GenerateBlueprintResponse as BlueprintDraft,
};
use crate::domain::blueprint::Blueprint;
use crate::domain::conversation::{UiControl, UserInput};
use crate::domain::metrics::{SplitConfig, Volume};
use crate::domain::project::{Chapter, ConversationMessage, Project};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 单一状态响应（批量操作只返回一个汇总结果）
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

// ============================================================================
// Project DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    #[serde(default)]
    pub initial_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteProjectsRequest {
    pub ids: Vec<Uuid>,
}

/// 项目详情
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub initial_prompt: String,
    pub blueprint: Option<Blueprint>,
    pub chapters: Vec<Chapter>,
    pub conversation_history: Vec<ConversationMessage>,
    pub split_config: SplitConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Project> for ProjectResponse {
    fn from(project: &Project) -> Self {
        Self {
            id: *project.id().as_uuid(),
            title: project.title().to_string(),
            initial_prompt: project.initial_prompt().to_string(),
            blueprint: project.blueprint().cloned(),
            chapters: project.chapters().to_vec(),
            conversation_history: project.conversation_history().to_vec(),
            split_config: project.split_config().clone(),
            created_at: project.created_at(),
            updated_at: project.updated_at(),
        }
    }
}

// ============================================================================
// Concept / Blueprint DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ConverseRequest {
    #[serde(default)]
    pub user_input: Option<UserInput>,
    #[serde(default)]
    pub conversation_state: Value,
}

#[derive(Debug, Serialize)]
pub struct ConverseResponse {
    pub ai_message: String,
    pub ui_control: Option<UiControl>,
    pub conversation_state: Value,
    pub is_complete: bool,
    pub ready_for_blueprint: bool,
}

impl From<ConverseResult> for ConverseResponse {
    fn from(result: ConverseResult) -> Self {
        Self {
            ai_message: result.ai_message,
            ui_control: result.ui_control,
            conversation_state: result.conversation_state,
            is_complete: result.is_complete,
            ready_for_blueprint: result.ready_for_blueprint,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlueprintDraftResponse {
    pub blueprint: Blueprint,
    pub ai_message: String,
}

impl From<BlueprintDraft> for BlueprintDraftResponse {
    fn from(draft: BlueprintDraft) -> Self {
        Self {
            blueprint: draft.blueprint,
            ai_message: draft.ai_message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveBlueprintRequest {
    pub blueprint: Blueprint,
}

// ============================================================================
// Writer DTOs
// ============================================================================

/// generate / evaluate 共用
#[derive(Debug, Deserialize)]
pub struct ChapterNumberRequest {
    pub chapter_number: u32,
}

#[derive(Debug, Deserialize)]
pub struct SelectVersionRequest {
    pub chapter_number: u32,
    pub version_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct EditChapterRequest {
    pub chapter_number: u32,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOutlineRequest {
    pub chapter_number: u32,
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteChaptersRequest {
    pub chapter_numbers: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateOutlineRequest {
    pub start_chapter: u32,
    pub num_chapters: u32,
}

// ============================================================================
// Volume DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AutoSplitRequest {
    #[serde(default)]
    pub threshold: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AutoSplitResponse {
    pub created: Vec<Volume>,
    pub volumes: Vec<Volume>,
}

impl From<AutoSplitResult> for AutoSplitResponse {
    fn from(result: AutoSplitResult) -> Self {
        Self {
            created: result.created,
            volumes: result.volumes,
        }
    }
}

// ============================================================================
// Analysis DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitAnalysisRequest {
    pub project_id: Uuid,
    pub chapter_number: u32,
    #[serde(default)]
    pub priority: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub total: usize,
    pub tasks: Vec<AnalysisTask>,
}

fn default_recent_limit() -> usize {
    10
}

fn default_notification_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct AnalysisStatusQuery {
    pub project_id: Uuid,
    #[serde(default = "default_recent_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_notification_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub total: usize,
    pub notifications: Vec<AnalysisNotification>,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked: usize,
}

// ============================================================================
// Auto Generator DTOs
// ============================================================================

fn default_log_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct CreateAutoGenRequest {
    pub project_id: Uuid,
    #[serde(default)]
    pub target_chapters: Option<u32>,
    #[serde(default)]
    pub interval_seconds: Option<u64>,
    #[serde(default)]
    pub auto_select_version: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AutoGenLogsQuery {
    #[serde(default = "default_log_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct AutoGenTaskListResponse {
    pub total: usize,
    pub tasks: Vec<AutoGenTask>,
}
