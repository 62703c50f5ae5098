//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、StoryGenerator、AnalysisTaskManager、MutationGuard 等）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use commands::{
    // Project commands
    CreateProject,
    DeleteProjects,
    // Conversation / blueprint commands
    Converse,
    GenerateBlueprint,
    SaveBlueprint,
    UpdateBlueprint,
    // Chapter pipeline commands
    DeleteChapters,
    EditChapterContent,
    EvaluateChapter,
    GenerateChapter,
    GenerateOutline,
    SelectChapterVersion,
    UpdateChapterOutline,
    // Volume commands
    TriggerAutoSplit,
    UpdateSplitConfig,
    // Analysis commands
    CancelAnalysisTask,
    MarkAllNotificationsRead,
    MarkNotificationRead,
    RetryAnalysisTask,
    SubmitAnalysis,
    // Auto generator commands
    CreateAutoGenTask,
    PauseAutoGenTask,
    StartAutoGenTask,
    StopAutoGenTask,
    // Handlers
    handlers::{
        AutoSplitResponse, CancelAnalysisTaskHandler, ConverseHandler, ConverseResponse,
        CreateAutoGenTaskHandler, CreateProjectHandler, DeleteChaptersHandler,
        DeleteProjectsHandler, DeleteProjectsResponse, EditChapterContentHandler,
        EvaluateChapterHandler, GenerateBlueprintHandler, GenerateBlueprintResponse,
        GenerateChapterHandler, GenerateOutlineHandler, MarkAllNotificationsReadHandler,
        MarkNotificationReadHandler, PauseAutoGenTaskHandler, PipelineSettings,
        RetryAnalysisTaskHandler, SaveBlueprintHandler, SelectChapterVersionHandler,
        StartAutoGenTaskHandler, StopAutoGenTaskHandler, SubmitAnalysisHandler,
        TriggerAutoSplitHandler, UpdateBlueprintHandler, UpdateChapterOutlineHandler,
        UpdateSplitConfigHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Analysis tasks
    AnalysisNotification,
    AnalysisTask,
    AnalysisTaskManagerPort,
    AnalysisTaskStatus,
    NotificationKind,
    TaskError,
    TaskFilter,
    TaskLease,
    TaskStatusSummary,
    // Auto generator
    AutoGenError,
    AutoGenLog,
    AutoGenLogLevel,
    AutoGenSettings,
    AutoGenStatus,
    AutoGenTask,
    AutoGeneratorPort,
    // Auth
    AuthError,
    AuthenticatorPort,
    Principal,
    // Mutation guard
    GuardError,
    MutationGuard,
    MutationGuardPort,
    MutationScope,
    // Repositories
    ChapterAnalysisRecord,
    ProjectRepositoryPort,
    RepositoryError,
    // Story generator
    GeneratorError,
    StoryGeneratorPort,
};

pub use queries::{
    // Project queries
    GetChapter,
    GetProject,
    ListProjectSummaries,
    // Volume queries
    GetSplitConfig,
    GetStoryMetrics,
    ListVolumes,
    // Analysis queries
    GetAnalysisStatus,
    GetAnalysisTask,
    GetLatestChapterTask,
    ListAnalysisTasks,
    ListNotifications,
    // Auto generator queries
    GetAutoGenLogs,
    GetAutoGenTask,
    ListAutoGenTasks,
    // Handlers
    handlers::{
        GetAnalysisStatusHandler, GetAnalysisTaskHandler, GetAutoGenLogsHandler,
        GetAutoGenTaskHandler, GetChapterHandler, GetLatestChapterTaskHandler, GetProjectHandler,
        GetSplitConfigHandler, GetStoryMetricsHandler, ListAnalysisTasksHandler,
        ListAutoGenTasksHandler, ListNotificationsHandler, ListProjectSummariesHandler,
        ListVolumesHandler,
    },
};
