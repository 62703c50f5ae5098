//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod analysis_tasks;
mod authenticator;
mod auto_generator;
mod mutation_guard;
mod repositories;
mod story_generator;

pub use analysis_tasks::{
    AnalysisNotification, AnalysisTask, AnalysisTaskManagerPort, AnalysisTaskStatus,
    NotificationKind, TaskError, TaskFilter, TaskLease, TaskStatusSummary, DEFAULT_PRIORITY,
    MAX_PRIORITY, MIN_PRIORITY,
};
pub use authenticator::{AuthError, AuthenticatorPort, Principal};
pub use auto_generator::{
    AutoGenError, AutoGenLog, AutoGenLogLevel, AutoGenSettings, AutoGenStatus, AutoGenTask,
    AutoGeneratorPort, MAX_AUTO_GEN_LOGS,
};
pub use mutation_guard::{GuardError, MutationGuard, MutationGuardPort, MutationScope};
pub use repositories::{ChapterAnalysisRecord, ProjectRepositoryPort, RepositoryError};
pub use story_generator::{
    AnalyzeRequest, BlueprintRequest, ConverseRequest, EvaluateRequest, Evaluation,
    GeneratedBlueprint, GeneratorError, OutlineRequest, PriorChapter, StoryGeneratorPort,
    VolumeNamingRequest, WriteChapterRequest,
};
