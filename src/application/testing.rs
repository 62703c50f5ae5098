//! 处理器测试用的装配

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::commands::handlers::{
    EvaluateChapterHandler, GenerateChapterHandler, GenerateOutlineHandler, PipelineSettings,
    SelectChapterVersionHandler,
};
use crate::application::ports::ProjectRepositoryPort;
use crate::domain::blueprint::{Blueprint, ChapterOutline};
use crate::domain::project::{ConversationMessage, Project};
use crate::infrastructure::adapters::llm::FakeStoryGenerator;
use crate::infrastructure::events::EventPublisher;
use crate::infrastructure::memory::{InMemoryAnalysisTaskManager, InMemoryMutationGuard};
use crate::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteProjectRepository,
};
use crate::infrastructure::worker::{AutoGenPipeline, AutoGeneratorConfig, AutoGeneratorSupervisor};

pub(crate) struct TestContext {
    pub repo: Arc<SqliteProjectRepository>,
    pub generator: Arc<FakeStoryGenerator>,
    pub guard: Arc<InMemoryMutationGuard>,
    pub tasks: Arc<InMemoryAnalysisTaskManager>,
    pub task_rx: mpsc::Receiver<String>,
    pub events: Arc<EventPublisher>,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let (tx, rx) = mpsc::channel(64);

        Self {
            repo: Arc::new(SqliteProjectRepository::new(pool)),
            generator: Arc::new(FakeStoryGenerator::new()),
            guard: Arc::new(InMemoryMutationGuard::new()),
            tasks: Arc::new(InMemoryAnalysisTaskManager::new(tx)),
            task_rx: rx,
            events: Arc::new(EventPublisher::new()),
        }
    }

    /// 新建项目并保存一份 `chapters` 章大纲的蓝图
    pub async fn project_with_chapters(&self, chapters: u32) -> Project {
        let mut project = Project::new("破晓", "一座永夜之城等待第一缕光").unwrap();
        self.repo.create(&project).await.unwrap();

        let blueprint = sample_blueprint(chapters);
        project.apply_blueprint(blueprint);
        self.repo
            .save_blueprint(
                project.id(),
                project.blueprint().unwrap(),
                project.chapters(),
            )
            .await
            .unwrap();

        self.repo.find_by_id(project.id()).await.unwrap().unwrap()
    }

    /// 以默认流水线参数装配的自动生成监督器
    pub fn auto_generator(&self, config: AutoGeneratorConfig) -> Arc<AutoGeneratorSupervisor> {
        let settings = PipelineSettings::default();
        let pipeline = AutoGenPipeline {
            project_repo: self.repo.clone(),
            generate: Arc::new(GenerateChapterHandler::new(
                self.repo.clone(),
                self.generator.clone(),
                self.guard.clone(),
                self.events.clone(),
                settings,
            )),
            evaluate: Arc::new(EvaluateChapterHandler::new(
                self.repo.clone(),
                self.generator.clone(),
                self.guard.clone(),
                self.events.clone(),
                settings,
            )),
            select: Arc::new(SelectChapterVersionHandler::new(
                self.repo.clone(),
                self.guard.clone(),
                self.events.clone(),
            )),
            outline: Arc::new(GenerateOutlineHandler::new(
                self.repo.clone(),
                self.generator.clone(),
                self.guard.clone(),
            )),
        };
        AutoGeneratorSupervisor::new(config, pipeline, self.events.clone()).arc()
    }

    /// 新建项目并写入一条用户消息
    pub async fn project_with_dialogue(&self) -> Project {
        let project = Project::new("破晓", "一座永夜之城等待第一缕光").unwrap();
        self.repo.create(&project).await.unwrap();
        self.repo
            .append_messages(project.id(), &[ConversationMessage::user("奇幻")])
            .await
            .unwrap();
        self.repo.find_by_id(project.id()).await.unwrap().unwrap()
    }
}

pub(crate) fn sample_blueprint(chapters: u32) -> Blueprint {
    Blueprint {
        title: "破晓".into(),
        genre: "奇幻".into(),
        chapter_outline: (1..=chapters)
            .map(|n| ChapterOutline::new(n, format!("第{}章", n), format!("摘要{}", n)))
            .collect(),
        ..Default::default()
    }
}
