//! Auto Generator Port - 自动连续生成任务
//!
//! 自动生成任务按间隔反复推进章节流水线（缺大纲时先续写大纲），
//! 直到达到目标章数、被停止或错误次数超限。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::project::ProjectId;

/// 单任务保留的日志条数
pub const MAX_AUTO_GEN_LOGS: usize = 200;

#[derive(Debug, Error)]
pub enum AutoGenError {
    #[error("Auto generator task not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("项目已有进行中的自动生成任务: {0}")]
    AlreadyActive(String),
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoGenStatus {
    Pending,
    Running,
    Paused,
    Stopped,
    Completed,
    Error,
}

impl AutoGenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoGenStatus::Pending => "pending",
            AutoGenStatus::Running => "running",
            AutoGenStatus::Paused => "paused",
            AutoGenStatus::Stopped => "stopped",
            AutoGenStatus::Completed => "completed",
            AutoGenStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AutoGenStatus::Stopped | AutoGenStatus::Completed | AutoGenStatus::Error
        )
    }

    pub fn can_start(&self) -> bool {
        matches!(self, AutoGenStatus::Pending | AutoGenStatus::Paused)
    }
}

/// 创建参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoGenSettings {
    /// 目标章数；None 表示不设上限
    pub target_chapters: Option<u32>,
    /// 两轮之间的等待秒数
    pub interval_seconds: u64,
    /// 评估后是否直接采用首个候选版本
    pub auto_select_version: bool,
}

impl Default for AutoGenSettings {
    fn default() -> Self {
        Self {
            target_chapters: None,
            interval_seconds: 60,
            auto_select_version: true,
        }
    }
}

/// 自动生成任务快照
#[derive(Debug, Clone, Serialize)]
pub struct AutoGenTask {
    pub task_id: String,
    pub project_id: ProjectId,
    pub status: AutoGenStatus,
    #[serde(flatten)]
    pub settings: AutoGenSettings,
    pub chapters_generated: u32,
    pub error_count: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_generation_at: Option<DateTime<Utc>>,
}

impl AutoGenTask {
    pub fn new(project_id: ProjectId, settings: AutoGenSettings) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::new_v4().to_string(),
            project_id,
            status: AutoGenStatus::Pending,
            settings,
            chapters_generated: 0,
            error_count: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            last_generation_at: None,
        }
    }

    pub fn target_reached(&self) -> bool {
        self.settings
            .target_chapters
            .is_some_and(|target| self.chapters_generated >= target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoGenLogLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// 任务日志
#[derive(Debug, Clone, Serialize)]
pub struct AutoGenLog {
    pub task_id: String,
    pub chapter_number: Option<u32>,
    pub level: AutoGenLogLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Auto Generator Port
pub trait AutoGeneratorPort: Send + Sync {
    /// 登记新任务；同一项目已有未结束的任务时拒绝
    fn create(&self, project_id: ProjectId, settings: AutoGenSettings) -> Result<AutoGenTask, AutoGenError>;

    /// pending/paused → running
    fn start(&self, task_id: &str) -> Result<AutoGenTask, AutoGenError>;

    /// running → paused
    fn pause(&self, task_id: &str) -> Result<AutoGenTask, AutoGenError>;

    /// 任意状态 → stopped；进行中的一轮结束后循环退出
    fn stop(&self, task_id: &str) -> Result<AutoGenTask, AutoGenError>;

    fn get(&self, task_id: &str) -> Option<AutoGenTask>;

    /// 项目下的任务（创建时间倒序）
    fn list_project(&self, project_id: ProjectId) -> Vec<AutoGenTask>;

    /// 最新的日志在前
    fn logs(&self, task_id: &str, limit: usize) -> Result<Vec<AutoGenLog>, AutoGenError>;

    /// 停止并移除项目下的全部任务，返回移除数量
    fn cleanup_project(&self, project_id: ProjectId) -> usize;
}
