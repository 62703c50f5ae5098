//! Analysis Worker - Background Chapter Analysis Processor

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::commands::handlers::TriggerAutoSplitHandler;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AnalysisTask, AnalysisTaskManagerPort, AnalyzeRequest, ProjectRepositoryPort,
    StoryGeneratorPort,
};
use crate::domain::project::ProjectId;
use crate::infrastructure::events::EventPublisher;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct AnalysisWorkerConfig {
    /// 最大并发分析数
    pub max_concurrent: usize,
    /// 两次尝试之间的基础退避时间，按尝试次数线性增长
    pub retry_backoff: Duration,
}

impl Default for AnalysisWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// 单次执行结束的原因
enum Outcome {
    Analyzed(serde_json::Value),
    Failed(String),
    Cancelled,
}

/// 分析 Worker
///
/// 后台任务处理器，从队列消费任务并调用生成服务分析章节
pub struct AnalysisWorker {
    config: AnalysisWorkerConfig,
    queue_receiver: mpsc::Receiver<String>,
    task_manager: Arc<dyn AnalysisTaskManagerPort>,
    project_repo: Arc<dyn ProjectRepositoryPort>,
    generator: Arc<dyn StoryGeneratorPort>,
    event_publisher: Arc<EventPublisher>,
    /// 分析完成后的自动分卷评估
    auto_split: Option<Arc<TriggerAutoSplitHandler>>,
}

impl AnalysisWorker {
    pub fn new(
        config: AnalysisWorkerConfig,
        queue_receiver: mpsc::Receiver<String>,
        task_manager: Arc<dyn AnalysisTaskManagerPort>,
        project_repo: Arc<dyn ProjectRepositoryPort>,
        generator: Arc<dyn StoryGeneratorPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            task_manager,
            project_repo,
            generator,
            event_publisher,
            auto_split: None,
        }
    }

    pub fn with_auto_split(mut self, handler: Arc<TriggerAutoSplitHandler>) -> Self {
        self.auto_split = Some(handler);
        self
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "AnalysisWorker started"
        );

        // 使用 semaphore 控制并发
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent));

        while self.queue_receiver.recv().await.is_some() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Failed to acquire semaphore permit");
                    continue;
                }
            };

            // 通道只是唤醒信号，按优先级取任务
            let Some(task_id) = self.task_manager.next_ready() else {
                continue;
            };

            let task_manager = self.task_manager.clone();
            let project_repo = self.project_repo.clone();
            let generator = self.generator.clone();
            let event_publisher = self.event_publisher.clone();
            let auto_split = self.auto_split.clone();
            let retry_backoff = self.config.retry_backoff;

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到任务完成

                let completed = Self::process_task(
                    &task_id,
                    task_manager,
                    project_repo,
                    generator,
                    event_publisher,
                    retry_backoff,
                )
                .await;

                if let (Some(handler), Some(project_id)) = (auto_split, completed) {
                    Self::evaluate_split(&handler, project_id).await;
                }
            });
        }

        tracing::info!("AnalysisWorker stopped");
    }

    /// 处理单个任务；分析结果落库时返回所属项目
    async fn process_task(
        task_id: &str,
        task_manager: Arc<dyn AnalysisTaskManagerPort>,
        project_repo: Arc<dyn ProjectRepositoryPort>,
        generator: Arc<dyn StoryGeneratorPort>,
        event_publisher: Arc<EventPublisher>,
        retry_backoff: Duration,
    ) -> Option<ProjectId> {
        let lease = match task_manager.start(task_id) {
            Ok(Some(lease)) => lease,
            Ok(None) => {
                tracing::debug!(task_id = %task_id, "Task no longer pending, skipping");
                return None;
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "Task not found, skipping");
                return None;
            }
        };
        let task = lease.task;
        event_publisher.publish_task(&task);

        // 读取章节正文
        let request = match Self::build_request(&task, project_repo.as_ref()).await {
            Ok(request) => request,
            Err(message) => {
                Self::finish_failed(task_id, message, &task_manager, &event_publisher);
                return None;
            }
        };

        let outcome = Self::attempt_loop(
            &task,
            request,
            &lease.cancel_token,
            task_manager.as_ref(),
            generator.as_ref(),
            &event_publisher,
            retry_backoff,
        )
        .await;

        match outcome {
            Outcome::Analyzed(result) => {
                // 提交点之前的取消丢弃结果，之后的取消不再生效
                match task_manager.begin_commit(task_id) {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(task_id = %task_id, "Task cancelled after analysis, dropping result");
                        return None;
                    }
                    Err(e) => {
                        tracing::warn!(task_id = %task_id, error = %e, "Task removed after analysis, dropping result");
                        return None;
                    }
                }

                if let Err(e) = project_repo
                    .save_chapter_analysis(task.project_id, task.chapter_number, &result)
                    .await
                {
                    tracing::error!(task_id = %task_id, error = %e, "Failed to save chapter analysis");
                    Self::finish_failed(
                        task_id,
                        format!("Database error: {}", e),
                        &task_manager,
                        &event_publisher,
                    );
                    return None;
                }

                match task_manager.complete(task_id, result) {
                    Ok(done) => {
                        event_publisher.publish_task(&done);
                        tracing::info!(
                            task_id = %task_id,
                            project_id = %task.project_id,
                            chapter_number = task.chapter_number,
                            duration_seconds = ?done.duration_seconds,
                            "Analysis task completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(task_id = %task_id, error = %e, "Failed to update task state");
                    }
                }
                Some(task.project_id)
            }
            Outcome::Failed(message) => {
                Self::finish_failed(task_id, message, &task_manager, &event_publisher);
                None
            }
            Outcome::Cancelled => {
                tracing::info!(task_id = %task_id, "Analysis task cancelled while running");
                None
            }
        }
    }

    /// 自动分卷失败不影响任务结果
    async fn evaluate_split(handler: &TriggerAutoSplitHandler, project_id: ProjectId) {
        match handler.handle_after_analysis(project_id).await {
            Ok(Some(split)) if !split.created.is_empty() => {
                tracing::info!(
                    project_id = %project_id,
                    created = split.created.len(),
                    "Volumes split after analysis"
                );
            }
            Ok(_) => {}
            Err(ApplicationError::Conflict(message)) => {
                tracing::debug!(project_id = %project_id, reason = %message, "Auto split skipped, project busy");
            }
            Err(e) => {
                tracing::warn!(project_id = %project_id, error = %e, "Auto split after analysis failed");
            }
        }
    }

    async fn build_request(
        task: &AnalysisTask,
        project_repo: &dyn ProjectRepositoryPort,
    ) -> Result<AnalyzeRequest, String> {
        let project = project_repo
            .find_by_id(task.project_id)
            .await
            .map_err(|e| format!("Database error: {}", e))?
            .ok_or_else(|| format!("Project not found: {}", task.project_id))?;

        let chapter = project
            .chapter(task.chapter_number)
            .map_err(|e| e.to_string())?;

        let content = chapter
            .content
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| format!("第{}章还没有正文", task.chapter_number))?;

        Ok(AnalyzeRequest {
            chapter_number: chapter.chapter_number,
            title: chapter.title.clone(),
            content,
        })
    }

    /// 逐次尝试分析，直到成功、预算耗尽或被取消
    async fn attempt_loop(
        task: &AnalysisTask,
        request: AnalyzeRequest,
        cancel_token: &CancellationToken,
        task_manager: &dyn AnalysisTaskManagerPort,
        generator: &dyn StoryGeneratorPort,
        event_publisher: &EventPublisher,
        retry_backoff: Duration,
    ) -> Outcome {
        let task_id = task.task_id.as_str();
        let mut attempt: u32 = 0;

        loop {
            if cancel_token.is_cancelled() {
                return Outcome::Cancelled;
            }
            attempt += 1;

            let result = tokio::select! {
                _ = cancel_token.cancelled() => return Outcome::Cancelled,
                result = generator.analyze_chapter(request.clone()) => result,
            };

            let error = match result {
                Ok(value) => return Outcome::Analyzed(value),
                Err(e) => e,
            };

            if !error.is_retryable() {
                tracing::error!(task_id = %task_id, error = %error, "Analysis failed, not retryable");
                return Outcome::Failed(error.to_string());
            }

            let snapshot = match task_manager.record_attempt_failure(task_id, error.to_string()) {
                Ok(snapshot) => snapshot,
                Err(e) => return Outcome::Failed(e.to_string()),
            };
            event_publisher.publish_task(&snapshot);

            if !snapshot.can_retry() {
                tracing::error!(
                    task_id = %task_id,
                    attempts = attempt,
                    error = %error,
                    "Analysis failed, retries exhausted"
                );
                return Outcome::Failed(error.to_string());
            }

            tracing::warn!(
                task_id = %task_id,
                attempt = attempt,
                error = %error,
                "Analysis attempt failed, retrying"
            );

            tokio::select! {
                _ = cancel_token.cancelled() => return Outcome::Cancelled,
                _ = tokio::time::sleep(retry_backoff * attempt) => {}
            }
        }
    }

    fn finish_failed(
        task_id: &str,
        message: String,
        task_manager: &Arc<dyn AnalysisTaskManagerPort>,
        event_publisher: &EventPublisher,
    ) {
        match task_manager.fail(task_id, message) {
            Ok(failed) => event_publisher.publish_task(&failed),
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Failed to update task state");
            }
        }
    }
}
