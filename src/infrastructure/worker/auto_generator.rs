//! Auto Generator - 自动连续生成任务的监督循环
//!
//! 每个运行中的任务对应一个后台循环。一轮只推进一章：
//! 生成、评估、（可选）采用首个版本。缺大纲时先续写一批大纲。
//! 一轮进行中不响应停止，结束后再检查状态，避免章节停在 generating。

use chrono::Utc;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::commands::handlers::{
    load_project, EvaluateChapterHandler, GenerateChapterHandler, GenerateOutlineHandler,
    SelectChapterVersionHandler,
};
use crate::application::commands::{
    EvaluateChapter, GenerateChapter, GenerateOutline, SelectChapterVersion,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AutoGenError, AutoGenLog, AutoGenLogLevel, AutoGenSettings, AutoGenStatus, AutoGenTask,
    AutoGeneratorPort, ProjectRepositoryPort, MAX_AUTO_GEN_LOGS,
};
use crate::domain::project::{GenerationStatus, Project, ProjectError, ProjectId};
use crate::infrastructure::events::EventPublisher;

/// 监督循环配置
#[derive(Debug, Clone, Copy)]
pub struct AutoGeneratorConfig {
    /// 累计错误达到该值后任务进入 error
    pub max_errors: u32,
    /// 暂停期间检查状态的间隔
    pub pause_poll: Duration,
    /// 缺大纲时一次续写的章数
    pub outline_batch: u32,
}

impl Default for AutoGeneratorConfig {
    fn default() -> Self {
        Self {
            max_errors: 5,
            pause_poll: Duration::from_secs(1),
            outline_batch: 10,
        }
    }
}

/// 一轮生成用到的流水线处理器
pub struct AutoGenPipeline {
    pub project_repo: Arc<dyn ProjectRepositoryPort>,
    pub generate: Arc<GenerateChapterHandler>,
    pub evaluate: Arc<EvaluateChapterHandler>,
    pub select: Arc<SelectChapterVersionHandler>,
    pub outline: Arc<GenerateOutlineHandler>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Generate,
    Evaluate,
    Select,
}

/// 章节当前状态下的下一步
fn follow_up(status: GenerationStatus, auto_select: bool) -> Option<Step> {
    match status {
        GenerationStatus::NotGenerated | GenerationStatus::Failed => Some(Step::Generate),
        GenerationStatus::Evaluating | GenerationStatus::EvaluationFailed => Some(Step::Evaluate),
        GenerationStatus::Selecting | GenerationStatus::WaitingForConfirm if auto_select => {
            Some(Step::Select)
        }
        _ => None,
    }
}

/// 章节号最小的待推进章节
fn next_step(project: &Project, auto_select: bool) -> Option<(u32, Step)> {
    let mut chapters: Vec<_> = project.chapters().iter().collect();
    chapters.sort_by_key(|c| c.chapter_number);
    chapters
        .into_iter()
        .find_map(|c| follow_up(c.generation_status, auto_select).map(|step| (c.chapter_number, step)))
}

struct Entry {
    task: AutoGenTask,
    logs: VecDeque<AutoGenLog>,
    stop_token: CancellationToken,
    loop_active: bool,
}

impl Entry {
    fn log(&mut self, chapter_number: Option<u32>, level: AutoGenLogLevel, message: String) {
        tracing::debug!(
            task_id = %self.task.task_id,
            level = ?level,
            message = %message,
            "Auto generator log"
        );
        self.logs.push_front(AutoGenLog {
            task_id: self.task.task_id.clone(),
            chapter_number,
            level,
            message,
            created_at: Utc::now(),
        });
        self.logs.truncate(MAX_AUTO_GEN_LOGS);
    }

    fn set_status(&mut self, status: AutoGenStatus) {
        let now = Utc::now();
        self.task.status = status;
        self.task.updated_at = now;
        if status.is_terminal() {
            self.task.completed_at = Some(now);
        }
    }
}

struct Inner {
    config: AutoGeneratorConfig,
    pipeline: AutoGenPipeline,
    event_publisher: Arc<EventPublisher>,
    tasks: DashMap<String, Entry>,
    /// 串行化「检查项目已有任务 + 登记」
    create_lock: Mutex<()>,
}

/// 自动生成监督器
pub struct AutoGeneratorSupervisor {
    inner: Arc<Inner>,
}

impl AutoGeneratorSupervisor {
    pub fn new(
        config: AutoGeneratorConfig,
        pipeline: AutoGenPipeline,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                pipeline,
                event_publisher,
                tasks: DashMap::new(),
                create_lock: Mutex::new(()),
            }),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn not_found(task_id: &str) -> AutoGenError {
        AutoGenError::NotFound(task_id.to_string())
    }
}

impl AutoGeneratorPort for AutoGeneratorSupervisor {
    fn create(&self, project_id: ProjectId, settings: AutoGenSettings) -> Result<AutoGenTask, AutoGenError> {
        let _serial = self
            .inner
            .create_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let active = self
            .inner
            .tasks
            .iter()
            .any(|e| e.task.project_id == project_id && !e.task.status.is_terminal());
        if active {
            return Err(AutoGenError::AlreadyActive(project_id.to_string()));
        }

        let task = AutoGenTask::new(project_id, settings);
        let target = task
            .settings
            .target_chapters
            .map_or_else(|| "无限".to_string(), |n| n.to_string());
        let mut entry = Entry {
            task: task.clone(),
            logs: VecDeque::new(),
            stop_token: CancellationToken::new(),
            loop_active: false,
        };
        entry.log(None, AutoGenLogLevel::Info, format!("自动生成任务已创建，目标章节数: {}", target));
        self.inner.tasks.insert(task.task_id.clone(), entry);

        tracing::info!(task_id = %task.task_id, project_id = %project_id, "Auto generator task created");
        Ok(task)
    }

    fn start(&self, task_id: &str) -> Result<AutoGenTask, AutoGenError> {
        let (snapshot, spawn_token) = {
            let mut entry = self
                .inner
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| Self::not_found(task_id))?;

            if !entry.task.status.can_start() {
                return Err(AutoGenError::InvalidStateTransition(format!(
                    "{} -> running",
                    entry.task.status.as_str()
                )));
            }
            entry.set_status(AutoGenStatus::Running);
            entry.task.started_at.get_or_insert_with(Utc::now);
            entry.log(None, AutoGenLogLevel::Info, "自动生成任务已启动".to_string());

            // 从暂停恢复时沿用原循环
            let spawn_token = if entry.loop_active {
                None
            } else {
                entry.loop_active = true;
                Some(entry.stop_token.clone())
            };
            (entry.task.clone(), spawn_token)
        };

        if let Some(token) = spawn_token {
            tokio::spawn(Inner::run(self.inner.clone(), task_id.to_string(), token));
        }
        self.inner.event_publisher.publish_auto_generator(&snapshot);
        tracing::info!(task_id = %task_id, "Auto generator task started");
        Ok(snapshot)
    }

    fn pause(&self, task_id: &str) -> Result<AutoGenTask, AutoGenError> {
        let snapshot = {
            let mut entry = self
                .inner
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| Self::not_found(task_id))?;

            if entry.task.status != AutoGenStatus::Running {
                return Err(AutoGenError::InvalidStateTransition(format!(
                    "{} -> paused",
                    entry.task.status.as_str()
                )));
            }
            entry.set_status(AutoGenStatus::Paused);
            entry.log(None, AutoGenLogLevel::Info, "自动生成任务已暂停".to_string());
            entry.task.clone()
        };

        self.inner.event_publisher.publish_auto_generator(&snapshot);
        tracing::info!(task_id = %task_id, "Auto generator task paused");
        Ok(snapshot)
    }

    fn stop(&self, task_id: &str) -> Result<AutoGenTask, AutoGenError> {
        let snapshot = {
            let mut entry = self
                .inner
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| Self::not_found(task_id))?;

            if entry.task.status.is_terminal() {
                return Ok(entry.task.clone());
            }
            entry.set_status(AutoGenStatus::Stopped);
            entry.stop_token.cancel();
            entry.log(None, AutoGenLogLevel::Info, "自动生成任务已停止".to_string());
            entry.task.clone()
        };

        self.inner.event_publisher.publish_auto_generator(&snapshot);
        tracing::info!(task_id = %task_id, "Auto generator task stopped");
        Ok(snapshot)
    }

    fn get(&self, task_id: &str) -> Option<AutoGenTask> {
        self.inner.tasks.get(task_id).map(|e| e.task.clone())
    }

    fn list_project(&self, project_id: ProjectId) -> Vec<AutoGenTask> {
        let mut tasks: Vec<AutoGenTask> = self
            .inner
            .tasks
            .iter()
            .filter(|e| e.task.project_id == project_id)
            .map(|e| e.task.clone())
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    fn logs(&self, task_id: &str, limit: usize) -> Result<Vec<AutoGenLog>, AutoGenError> {
        let entry = self
            .inner
            .tasks
            .get(task_id)
            .ok_or_else(|| Self::not_found(task_id))?;
        Ok(entry.logs.iter().take(limit).cloned().collect())
    }

    fn cleanup_project(&self, project_id: ProjectId) -> usize {
        let task_ids: Vec<String> = self
            .inner
            .tasks
            .iter()
            .filter(|e| e.task.project_id == project_id)
            .map(|e| e.key().clone())
            .collect();

        let removed = task_ids
            .iter()
            .filter_map(|task_id| self.inner.tasks.remove(task_id))
            .map(|(_, entry)| entry.stop_token.cancel())
            .count();

        tracing::debug!(project_id = %project_id, removed = removed, "Cleaned up auto generator tasks");
        removed
    }
}

impl Inner {
    async fn run(inner: Arc<Inner>, task_id: String, stop_token: CancellationToken) {
        tracing::info!(task_id = %task_id, "Auto generator loop started");

        loop {
            let Some(task) = inner.tasks.get(&task_id).map(|e| e.task.clone()) else {
                break;
            };

            match task.status {
                AutoGenStatus::Running => {}
                AutoGenStatus::Paused => {
                    if Self::wait(&stop_token, inner.config.pause_poll).await {
                        continue;
                    }
                    break;
                }
                _ => break,
            }

            if task.target_reached() {
                inner.update(&task_id, |entry| {
                    entry.set_status(AutoGenStatus::Completed);
                    entry.log(
                        None,
                        AutoGenLogLevel::Success,
                        format!("已完成目标章节数: {}", task.chapters_generated),
                    );
                });
                break;
            }

            match inner.run_round(&task).await {
                Ok(chapter_number) => inner.record_success(&task_id, chapter_number),
                Err(err) => {
                    if inner.record_failure(&task_id, &err) {
                        break;
                    }
                }
            }

            let interval = Duration::from_secs(task.settings.interval_seconds);
            if !Self::wait(&stop_token, interval).await {
                break;
            }
        }

        if let Some(mut entry) = inner.tasks.get_mut(&task_id) {
            entry.loop_active = false;
        }
        tracing::info!(task_id = %task_id, "Auto generator loop finished");
    }

    /// 等待一段时间；被停止时返回 false
    async fn wait(stop_token: &CancellationToken, duration: Duration) -> bool {
        tokio::select! {
            _ = stop_token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    fn update(&self, task_id: &str, f: impl FnOnce(&mut Entry)) {
        let snapshot = match self.tasks.get_mut(task_id) {
            Some(mut entry) => {
                f(entry.value_mut());
                entry.task.clone()
            }
            None => return,
        };
        self.event_publisher.publish_auto_generator(&snapshot);
    }

    fn log(&self, task_id: &str, chapter_number: Option<u32>, level: AutoGenLogLevel, message: String) {
        if let Some(mut entry) = self.tasks.get_mut(task_id) {
            entry.log(chapter_number, level, message);
        }
    }

    fn record_success(&self, task_id: &str, chapter_number: u32) {
        self.update(task_id, |entry| {
            let now = Utc::now();
            entry.task.chapters_generated += 1;
            entry.task.last_generation_at = Some(now);
            entry.task.updated_at = now;
            entry.log(
                Some(chapter_number),
                AutoGenLogLevel::Success,
                format!("第{}章生成完成", chapter_number),
            );
        });
        tracing::info!(task_id = %task_id, chapter_number = chapter_number, "Auto generator produced chapter");
    }

    /// 记录一次失败；错误次数达到上限时返回 true
    fn record_failure(&self, task_id: &str, err: &ApplicationError) -> bool {
        let max_errors = self.config.max_errors;
        let mut exhausted = false;
        self.update(task_id, |entry| {
            entry.task.error_count += 1;
            entry.task.last_error = Some(err.to_string());
            entry.task.updated_at = Utc::now();
            if entry.task.error_count >= max_errors && !entry.task.status.is_terminal() {
                entry.set_status(AutoGenStatus::Error);
                entry.log(
                    None,
                    AutoGenLogLevel::Error,
                    format!("任务因错误次数过多而停止: {}", err),
                );
                exhausted = true;
            } else {
                entry.log(None, AutoGenLogLevel::Warning, format!("本轮生成失败: {}", err));
            }
        });
        tracing::warn!(task_id = %task_id, error = %err, exhausted = exhausted, "Auto generator round failed");
        exhausted
    }

    /// 推进一章，返回章节号
    async fn run_round(&self, task: &AutoGenTask) -> Result<u32, ApplicationError> {
        let project_id = task.project_id;
        let auto_select = task.settings.auto_select_version;
        let project = load_project(self.pipeline.project_repo.as_ref(), project_id).await?;

        let (number, first) = match next_step(&project, auto_select) {
            Some(found) => found,
            None => {
                let start = project
                    .blueprint()
                    .ok_or(ProjectError::MissingBlueprint)?
                    .last_outline_number()
                    .saturating_add(1);
                self.log(
                    &task.task_id,
                    Some(start),
                    AutoGenLogLevel::Info,
                    format!("第{}章大纲不存在，自动续写{}章大纲", start, self.config.outline_batch),
                );
                let project = self
                    .pipeline
                    .outline
                    .handle(GenerateOutline {
                        project_id,
                        start_chapter: start,
                        num_chapters: self.config.outline_batch,
                    })
                    .await?;
                next_step(&project, auto_select).ok_or_else(|| {
                    ApplicationError::capability("自动续写大纲后仍没有可生成的章节")
                })?
            }
        };

        self.log(
            &task.task_id,
            Some(number),
            AutoGenLogLevel::Info,
            format!("开始推进第{}章", number),
        );

        let mut step = Some(first);
        while let Some(current) = step {
            let project = match current {
                Step::Generate => {
                    self.pipeline
                        .generate
                        .handle(GenerateChapter {
                            project_id,
                            chapter_number: number,
                        })
                        .await?
                }
                Step::Evaluate => {
                    self.pipeline
                        .evaluate
                        .handle(EvaluateChapter {
                            project_id,
                            chapter_number: number,
                        })
                        .await?
                }
                Step::Select => {
                    self.pipeline
                        .select
                        .handle(SelectChapterVersion {
                            project_id,
                            chapter_number: number,
                            version_index: 0,
                        })
                        .await?
                }
            };
            let status = project.chapter(number)?.generation_status;
            step = follow_up(status, auto_select).filter(|next| *next != Step::Generate);
        }

        Ok(number)
    }
}
