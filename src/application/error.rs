//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{
    AuthError, AutoGenError, GeneratorError, GuardError, RepositoryError, TaskError,
};
use crate::domain::blueprint::BlueprintError;
use crate::domain::metrics::SplitConfigError;
use crate::domain::project::{ChapterError, ProjectError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 调用方未认证
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 参数不合法
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 当前状态不允许该操作
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 并发写冲突
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 生成能力失败或返回不可用的结果
    #[error("Capability failure: {0}")]
    CapabilityFailure(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建参数错误
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建生成能力错误
    pub fn capability(message: impl Into<String>) -> Self {
        Self::CapabilityFailure(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::not_found("Entity", id),
            RepositoryError::Duplicate(msg) => Self::Conflict(msg),
            other => Self::RepositoryError(other.to_string()),
        }
    }
}

impl From<GeneratorError> for ApplicationError {
    fn from(err: GeneratorError) -> Self {
        Self::CapabilityFailure(err.to_string())
    }
}

impl From<TaskError> for ApplicationError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(id) => Self::not_found("Task", id),
            TaskError::NotificationNotFound(id) => Self::not_found("Notification", id),
            TaskError::InvalidStateTransition(msg) => Self::InvalidState(msg),
            TaskError::QueueFull | TaskError::QueueClosed => Self::CapabilityFailure(err.to_string()),
        }
    }
}

impl From<AutoGenError> for ApplicationError {
    fn from(err: AutoGenError) -> Self {
        match err {
            AutoGenError::NotFound(id) => Self::not_found("AutoGeneratorTask", id),
            AutoGenError::InvalidStateTransition(msg) => Self::InvalidState(msg),
            AutoGenError::AlreadyActive(_) => Self::Conflict(err.to_string()),
        }
    }
}

impl From<GuardError> for ApplicationError {
    fn from(err: GuardError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<AuthError> for ApplicationError {
    fn from(err: AuthError) -> Self {
        Self::Unauthenticated(err.to_string())
    }
}

impl From<ChapterError> for ApplicationError {
    fn from(err: ChapterError) -> Self {
        match err {
            ChapterError::VersionOutOfRange { .. } => Self::InvalidArgument(err.to_string()),
            ChapterError::EmptyCandidates => Self::CapabilityFailure(err.to_string()),
            ChapterError::InvalidTransition { .. }
            | ChapterError::OperationNotAllowed { .. }
            | ChapterError::NoVersions(_) => Self::InvalidState(err.to_string()),
        }
    }
}

impl From<ProjectError> for ApplicationError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::ChapterNotFound(n) => Self::not_found("Chapter", n),
            ProjectError::EmptyTitle
            | ProjectError::TitleTooLong
            | ProjectError::InvalidChapterNumber(_) => Self::InvalidArgument(err.to_string()),
            ProjectError::MissingBlueprint => Self::InvalidState(err.to_string()),
            ProjectError::Chapter(inner) => inner.into(),
        }
    }
}

impl From<BlueprintError> for ApplicationError {
    fn from(err: BlueprintError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<SplitConfigError> for ApplicationError {
    fn from(err: SplitConfigError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
