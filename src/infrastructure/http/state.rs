//! Application State
//!
//! 持有所有端口实例与 Command/Query Handlers

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CancelAnalysisTaskHandler, ConverseHandler, CreateAutoGenTaskHandler, CreateProjectHandler,
    DeleteChaptersHandler, DeleteProjectsHandler, EditChapterContentHandler,
    EvaluateChapterHandler, GenerateBlueprintHandler, GenerateChapterHandler,
    GenerateOutlineHandler, MarkAllNotificationsReadHandler, MarkNotificationReadHandler,
    PauseAutoGenTaskHandler, PipelineSettings, RetryAnalysisTaskHandler, SaveBlueprintHandler,
    SelectChapterVersionHandler, StartAutoGenTaskHandler, StopAutoGenTaskHandler,
    SubmitAnalysisHandler, TriggerAutoSplitHandler, UpdateBlueprintHandler,
    UpdateChapterOutlineHandler, UpdateSplitConfigHandler,
    // Query handlers
    GetAnalysisStatusHandler, GetAnalysisTaskHandler, GetAutoGenLogsHandler,
    GetAutoGenTaskHandler, GetChapterHandler, GetLatestChapterTaskHandler, GetProjectHandler,
    GetSplitConfigHandler, GetStoryMetricsHandler, ListAnalysisTasksHandler,
    ListAutoGenTasksHandler, ListNotificationsHandler, ListProjectSummariesHandler,
    ListVolumesHandler,
    // Ports
    AnalysisTaskManagerPort, AuthenticatorPort, AutoGeneratorPort, MutationGuardPort,
    ProjectRepositoryPort, StoryGeneratorPort,
};
use crate::infrastructure::events::EventPublisher;
use crate::infrastructure::worker::{AutoGenPipeline, AutoGeneratorConfig, AutoGeneratorSupervisor};

/// 处理器参数
#[derive(Debug, Clone, Copy)]
pub struct HandlerSettings {
    pub pipeline: PipelineSettings,
    /// 概念对话最多轮数
    pub max_turns: u32,
    /// 分析任务自动重试次数
    pub analysis_max_retries: u32,
    pub auto_generator: AutoGeneratorConfig,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            pipeline: PipelineSettings::default(),
            max_turns: 12,
            analysis_max_retries: 2,
            auto_generator: AutoGeneratorConfig::default(),
        }
    }
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub project_repo: Arc<dyn ProjectRepositoryPort>,
    pub task_manager: Arc<dyn AnalysisTaskManagerPort>,
    pub auto_generator: Arc<dyn AutoGeneratorPort>,
    pub authenticator: Arc<dyn AuthenticatorPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub create_project_handler: CreateProjectHandler,
    pub delete_projects_handler: DeleteProjectsHandler,
    pub converse_handler: ConverseHandler,
    pub generate_blueprint_handler: GenerateBlueprintHandler,
    pub save_blueprint_handler: SaveBlueprintHandler,
    pub update_blueprint_handler: UpdateBlueprintHandler,
    pub generate_chapter_handler: GenerateChapterHandler,
    pub evaluate_chapter_handler: EvaluateChapterHandler,
    pub select_version_handler: SelectChapterVersionHandler,
    pub edit_content_handler: EditChapterContentHandler,
    pub update_outline_handler: UpdateChapterOutlineHandler,
    pub delete_chapters_handler: DeleteChaptersHandler,
    pub generate_outline_handler: GenerateOutlineHandler,
    pub auto_split_handler: TriggerAutoSplitHandler,
    pub update_split_config_handler: UpdateSplitConfigHandler,
    pub submit_analysis_handler: SubmitAnalysisHandler,
    pub cancel_analysis_handler: CancelAnalysisTaskHandler,
    pub retry_analysis_handler: RetryAnalysisTaskHandler,
    pub mark_notification_read_handler: MarkNotificationReadHandler,
    pub mark_all_read_handler: MarkAllNotificationsReadHandler,
    pub create_auto_gen_handler: CreateAutoGenTaskHandler,
    pub start_auto_gen_handler: StartAutoGenTaskHandler,
    pub pause_auto_gen_handler: PauseAutoGenTaskHandler,
    pub stop_auto_gen_handler: StopAutoGenTaskHandler,

    // ========== Query Handlers ==========
    pub get_project_handler: GetProjectHandler,
    pub get_chapter_handler: GetChapterHandler,
    pub list_projects_handler: ListProjectSummariesHandler,
    pub story_metrics_handler: GetStoryMetricsHandler,
    pub get_split_config_handler: GetSplitConfigHandler,
    pub list_volumes_handler: ListVolumesHandler,
    pub list_tasks_handler: ListAnalysisTasksHandler,
    pub get_task_handler: GetAnalysisTaskHandler,
    pub analysis_status_handler: GetAnalysisStatusHandler,
    pub latest_chapter_task_handler: GetLatestChapterTaskHandler,
    pub list_notifications_handler: ListNotificationsHandler,
    pub get_auto_gen_handler: GetAutoGenTaskHandler,
    pub list_auto_gen_handler: ListAutoGenTasksHandler,
    pub auto_gen_logs_handler: GetAutoGenLogsHandler,
}

impl AppState {
    /// 创建应用状态
    ///
    /// `generator` 应当已经包好重试装饰器
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        generator: Arc<dyn StoryGeneratorPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
        task_manager: Arc<dyn AnalysisTaskManagerPort>,
        authenticator: Arc<dyn AuthenticatorPort>,
        event_publisher: Arc<EventPublisher>,
        settings: HandlerSettings,
    ) -> Self {
        let auto_generator: Arc<dyn AutoGeneratorPort> = AutoGeneratorSupervisor::new(
            settings.auto_generator,
            AutoGenPipeline {
                project_repo: project_repo.clone(),
                generate: Arc::new(GenerateChapterHandler::new(
                    project_repo.clone(),
                    generator.clone(),
                    mutation_guard.clone(),
                    event_publisher.clone(),
                    settings.pipeline,
                )),
                evaluate: Arc::new(EvaluateChapterHandler::new(
                    project_repo.clone(),
                    generator.clone(),
                    mutation_guard.clone(),
                    event_publisher.clone(),
                    settings.pipeline,
                )),
                select: Arc::new(SelectChapterVersionHandler::new(
                    project_repo.clone(),
                    mutation_guard.clone(),
                    event_publisher.clone(),
                )),
                outline: Arc::new(GenerateOutlineHandler::new(
                    project_repo.clone(),
                    generator.clone(),
                    mutation_guard.clone(),
                )),
            },
            event_publisher.clone(),
        )
        .arc();

        Self {
            // Ports
            project_repo: project_repo.clone(),
            task_manager: task_manager.clone(),
            auto_generator: auto_generator.clone(),
            authenticator,
            event_publisher: event_publisher.clone(),

            // Command handlers
            create_project_handler: CreateProjectHandler::new(project_repo.clone()),
            delete_projects_handler: DeleteProjectsHandler::new(
                project_repo.clone(),
                task_manager.clone(),
                auto_generator.clone(),
                event_publisher.clone(),
            ),
            converse_handler: ConverseHandler::new(
                project_repo.clone(),
                generator.clone(),
                mutation_guard.clone(),
                settings.max_turns,
            ),
            generate_blueprint_handler: GenerateBlueprintHandler::new(
                project_repo.clone(),
                generator.clone(),
            ),
            save_blueprint_handler: SaveBlueprintHandler::new(
                project_repo.clone(),
                mutation_guard.clone(),
            ),
            update_blueprint_handler: UpdateBlueprintHandler::new(
                project_repo.clone(),
                mutation_guard.clone(),
            ),
            generate_chapter_handler: GenerateChapterHandler::new(
                project_repo.clone(),
                generator.clone(),
                mutation_guard.clone(),
                event_publisher.clone(),
                settings.pipeline,
            ),
            evaluate_chapter_handler: EvaluateChapterHandler::new(
                project_repo.clone(),
                generator.clone(),
                mutation_guard.clone(),
                event_publisher.clone(),
                settings.pipeline,
            ),
            select_version_handler: SelectChapterVersionHandler::new(
                project_repo.clone(),
                mutation_guard.clone(),
                event_publisher.clone(),
            ),
            edit_content_handler: EditChapterContentHandler::new(
                project_repo.clone(),
                mutation_guard.clone(),
                event_publisher.clone(),
            ),
            update_outline_handler: UpdateChapterOutlineHandler::new(
                project_repo.clone(),
                mutation_guard.clone(),
            ),
            delete_chapters_handler: DeleteChaptersHandler::new(
                project_repo.clone(),
                mutation_guard.clone(),
            ),
            generate_outline_handler: GenerateOutlineHandler::new(
                project_repo.clone(),
                generator.clone(),
                mutation_guard.clone(),
            ),
            auto_split_handler: TriggerAutoSplitHandler::new(
                project_repo.clone(),
                generator,
                mutation_guard.clone(),
                event_publisher.clone(),
            ),
            update_split_config_handler: UpdateSplitConfigHandler::new(
                project_repo.clone(),
                mutation_guard,
            ),
            submit_analysis_handler: SubmitAnalysisHandler::new(
                project_repo.clone(),
                task_manager.clone(),
                event_publisher.clone(),
                settings.analysis_max_retries,
            ),
            cancel_analysis_handler: CancelAnalysisTaskHandler::new(
                task_manager.clone(),
                event_publisher.clone(),
            ),
            retry_analysis_handler: RetryAnalysisTaskHandler::new(
                task_manager.clone(),
                event_publisher,
            ),
            mark_notification_read_handler: MarkNotificationReadHandler::new(task_manager.clone()),
            mark_all_read_handler: MarkAllNotificationsReadHandler::new(task_manager.clone()),
            create_auto_gen_handler: CreateAutoGenTaskHandler::new(
                project_repo.clone(),
                auto_generator.clone(),
            ),
            start_auto_gen_handler: StartAutoGenTaskHandler::new(auto_generator.clone()),
            pause_auto_gen_handler: PauseAutoGenTaskHandler::new(auto_generator.clone()),
            stop_auto_gen_handler: StopAutoGenTaskHandler::new(auto_generator.clone()),

            // Query handlers
            get_project_handler: GetProjectHandler::new(project_repo.clone()),
            get_chapter_handler: GetChapterHandler::new(project_repo.clone()),
            list_projects_handler: ListProjectSummariesHandler::new(project_repo.clone()),
            story_metrics_handler: GetStoryMetricsHandler::new(project_repo.clone()),
            get_split_config_handler: GetSplitConfigHandler::new(project_repo.clone()),
            list_volumes_handler: ListVolumesHandler::new(project_repo.clone()),
            list_tasks_handler: ListAnalysisTasksHandler::new(task_manager.clone()),
            get_task_handler: GetAnalysisTaskHandler::new(task_manager.clone()),
            analysis_status_handler: GetAnalysisStatusHandler::new(
                project_repo.clone(),
                task_manager.clone(),
            ),
            latest_chapter_task_handler: GetLatestChapterTaskHandler::new(task_manager.clone()),
            list_notifications_handler: ListNotificationsHandler::new(task_manager),
            get_auto_gen_handler: GetAutoGenTaskHandler::new(auto_generator.clone()),
            list_auto_gen_handler: ListAutoGenTasksHandler::new(project_repo, auto_generator.clone()),
            auto_gen_logs_handler: GetAutoGenLogsHandler::new(auto_generator),
        }
    }
}
