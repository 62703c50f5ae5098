//! In-Memory Analysis Task Manager Implementation

use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    AnalysisNotification, AnalysisTask, AnalysisTaskManagerPort, AnalysisTaskStatus, TaskError,
    TaskFilter, TaskLease,
};
use crate::domain::project::ProjectId;

/// 就绪队列条目：优先级高者先出，同优先级按入队顺序
#[derive(Debug, PartialEq, Eq)]
struct ReadyEntry {
    priority: u8,
    sequence: Reverse<u64>,
    task_id: String,
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 默认保留的任务数，超出后淘汰最早结束的任务
pub const DEFAULT_RETAINED_TASKS: usize = 1000;

struct TaskEntry {
    task: AnalysisTask,
    cancel_token: CancellationToken,
    /// 已越过提交点，取消不再生效
    committing: bool,
}

impl TaskEntry {
    fn new(task: AnalysisTask) -> Self {
        Self {
            task,
            cancel_token: CancellationToken::new(),
            committing: false,
        }
    }
}

/// 内存分析任务管理器
///
/// 队列通道只负责唤醒 worker，实际执行顺序由就绪堆决定
pub struct InMemoryAnalysisTaskManager {
    /// task_id -> 任务与取消令牌
    tasks: DashMap<String, TaskEntry>,
    /// project_id -> Set<task_id>
    project_tasks: DashMap<ProjectId, HashSet<String>>,
    ready: Mutex<BinaryHeap<ReadyEntry>>,
    sequence: AtomicU64,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<String>,
    /// 最新的通知在队首
    notifications: Mutex<VecDeque<AnalysisNotification>>,
    retained_tasks: usize,
}

impl InMemoryAnalysisTaskManager {
    pub fn new(queue_sender: mpsc::Sender<String>) -> Self {
        Self {
            tasks: DashMap::new(),
            project_tasks: DashMap::new(),
            ready: Mutex::new(BinaryHeap::new()),
            sequence: AtomicU64::new(0),
            queue_sender,
            notifications: Mutex::new(VecDeque::new()),
            retained_tasks: DEFAULT_RETAINED_TASKS,
        }
    }

    /// 设置保留上限；结束的任务与通知都按此上限淘汰
    pub fn with_retention(mut self, retained_tasks: usize) -> Self {
        self.retained_tasks = retained_tasks.max(1);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn with_ready<R>(&self, f: impl FnOnce(&mut BinaryHeap<ReadyEntry>) -> R) -> R {
        let mut heap = self.ready.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut heap)
    }

    fn with_notifications<R>(&self, f: impl FnOnce(&mut VecDeque<AnalysisNotification>) -> R) -> R {
        let mut notifications = self
            .notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut notifications)
    }

    fn notify(&self, task: &AnalysisTask) {
        let Some(notification) = AnalysisNotification::for_task(task) else {
            return;
        };
        let capacity = self.retained_tasks;
        self.with_notifications(|queue| {
            queue.push_front(notification);
            queue.truncate(capacity);
        });
    }

    fn forget(&self, task_id: &str, project_id: ProjectId) {
        self.tasks.remove(task_id);
        if let Some(mut ids) = self.project_tasks.get_mut(&project_id) {
            ids.remove(task_id);
        }
        self.project_tasks.remove_if(&project_id, |_, ids| ids.is_empty());
    }

    /// 超出保留上限时淘汰最早结束的任务，未结束的任务不受影响
    fn evict_finished(&self) -> usize {
        let excess = self.tasks.len().saturating_sub(self.retained_tasks);
        if excess == 0 {
            return 0;
        }

        let mut finished: Vec<(chrono::DateTime<Utc>, String, ProjectId)> = self
            .tasks
            .iter()
            .filter(|entry| entry.task.status.is_terminal())
            .map(|entry| {
                let finished_at = entry.task.completed_at.unwrap_or(entry.task.created_at);
                (finished_at, entry.task.task_id.clone(), entry.task.project_id)
            })
            .collect();
        finished.sort_by(|a, b| a.0.cmp(&b.0));

        let evicted = finished.len().min(excess);
        for (_, task_id, project_id) in finished.into_iter().take(evicted) {
            self.forget(&task_id, project_id);
        }
        if evicted > 0 {
            tracing::debug!(evicted = evicted, "Evicted finished analysis tasks");
        }
        evicted
    }

    fn enqueue(&self, task_id: &str, priority: u8) -> Result<(), TaskError> {
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::Relaxed);
        self.with_ready(|heap| {
            heap.push(ReadyEntry {
                priority,
                sequence: Reverse(sequence),
                task_id: task_id.to_string(),
            })
        });

        if let Err(e) = self.queue_sender.try_send(task_id.to_string()) {
            self.with_ready(|heap| heap.retain(|entry| entry.sequence != Reverse(sequence)));
            tracing::warn!(task_id = %task_id, error = %e, "Failed to enqueue analysis task");
            return Err(match e {
                TrySendError::Full(_) => TaskError::QueueFull,
                TrySendError::Closed(_) => TaskError::QueueClosed,
            });
        }
        Ok(())
    }

    /// 写入结束状态与耗时
    fn finish(task: &mut AnalysisTask, status: AnalysisTaskStatus) {
        let now = Utc::now();
        task.status = status;
        task.completed_at = Some(now);
        task.duration_seconds = task
            .started_at
            .map(|started| (now - started).num_milliseconds() as f64 / 1000.0);
    }

    fn cancel_entry(entry: &mut TaskEntry) -> bool {
        if entry.task.status.is_terminal() || entry.committing {
            return false;
        }
        Self::finish(&mut entry.task, AnalysisTaskStatus::Cancelled);
        entry.cancel_token.cancel();
        true
    }
}

impl AnalysisTaskManagerPort for InMemoryAnalysisTaskManager {
    fn submit(&self, task: AnalysisTask) -> Result<AnalysisTask, TaskError> {
        let task_id = task.task_id.clone();
        let project_id = task.project_id;
        let priority = task.priority;
        let snapshot = task.clone();

        self.tasks.insert(task_id.clone(), TaskEntry::new(task));

        if let Err(e) = self.enqueue(&task_id, priority) {
            self.tasks.remove(&task_id);
            return Err(e);
        }

        self.project_tasks
            .entry(project_id)
            .or_insert_with(HashSet::new)
            .insert(task_id.clone());
        self.evict_finished();

        tracing::debug!(
            task_id = %task_id,
            project_id = %project_id,
            chapter_number = snapshot.chapter_number,
            priority = priority,
            "Analysis task submitted"
        );
        Ok(snapshot)
    }

    fn get(&self, task_id: &str) -> Option<AnalysisTask> {
        self.tasks.get(task_id).map(|entry| entry.task.clone())
    }

    fn list(&self, filter: &TaskFilter) -> Vec<AnalysisTask> {
        let mut tasks: Vec<AnalysisTask> = self
            .tasks
            .iter()
            .map(|entry| entry.task.clone())
            .filter(|task| filter.status.map_or(true, |s| task.status == s))
            .filter(|task| filter.project_id.map_or(true, |p| task.project_id == p))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    fn cancel(&self, task_id: &str) -> Result<AnalysisTask, TaskError> {
        let mut entry = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        if Self::cancel_entry(&mut entry) {
            tracing::debug!(task_id = %task_id, "Analysis task cancelled");
        }
        Ok(entry.task.clone())
    }

    fn cleanup_project(&self, project_id: ProjectId) -> usize {
        let task_ids = self
            .project_tasks
            .remove(&project_id)
            .map(|(_, ids)| ids)
            .unwrap_or_default();

        let mut cancelled = 0;
        let mut removed = 0;
        for task_id in &task_ids {
            if let Some((_, mut entry)) = self.tasks.remove(task_id) {
                if Self::cancel_entry(&mut entry) {
                    cancelled += 1;
                }
                // 提交中的任务也要停止后续写入
                entry.cancel_token.cancel();
                removed += 1;
            }
        }
        self.with_notifications(|queue| queue.retain(|n| n.project_id != project_id));

        tracing::debug!(
            project_id = %project_id,
            cancelled = cancelled,
            removed = removed,
            "Cleaned up project analysis tasks"
        );
        removed
    }

    fn retry(&self, task_id: &str) -> Result<AnalysisTask, TaskError> {
        let (snapshot, priority) = {
            let mut entry = self
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

            if entry.task.status != AnalysisTaskStatus::Failed {
                return Err(TaskError::InvalidStateTransition(format!(
                    "{} -> pending",
                    entry.task.status.as_str()
                )));
            }

            let task = &mut entry.task;
            task.status = AnalysisTaskStatus::Pending;
            task.retry_count = 0;
            task.started_at = None;
            task.completed_at = None;
            task.duration_seconds = None;
            task.error_message = None;
            task.result = None;
            entry.cancel_token = CancellationToken::new();
            entry.committing = false;
            (entry.task.clone(), entry.task.priority)
        };

        if let Err(e) = self.enqueue(task_id, priority) {
            if let Some(mut entry) = self.tasks.get_mut(task_id) {
                Self::finish(&mut entry.task, AnalysisTaskStatus::Failed);
                entry.task.error_message = Some(e.to_string());
            }
            return Err(e);
        }

        tracing::debug!(task_id = %task_id, "Analysis task re-queued");
        Ok(snapshot)
    }

    fn next_ready(&self) -> Option<String> {
        self.with_ready(|heap| {
            while let Some(entry) = heap.pop() {
                let pending = self
                    .tasks
                    .get(&entry.task_id)
                    .map_or(false, |t| t.task.status == AnalysisTaskStatus::Pending);
                if pending {
                    return Some(entry.task_id);
                }
            }
            None
        })
    }

    fn start(&self, task_id: &str) -> Result<Option<TaskLease>, TaskError> {
        let mut entry = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        if entry.task.status != AnalysisTaskStatus::Pending {
            return Ok(None);
        }

        entry.task.status = AnalysisTaskStatus::Running;
        entry.task.started_at = Some(Utc::now());

        Ok(Some(TaskLease {
            task: entry.task.clone(),
            cancel_token: entry.cancel_token.clone(),
        }))
    }

    fn record_attempt_failure(&self, task_id: &str, error: String) -> Result<AnalysisTask, TaskError> {
        let mut entry = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        entry.task.retry_count += 1;
        entry.task.error_message = Some(error);
        Ok(entry.task.clone())
    }

    fn begin_commit(&self, task_id: &str) -> Result<bool, TaskError> {
        let mut entry = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        if entry.task.status != AnalysisTaskStatus::Running || entry.cancel_token.is_cancelled() {
            return Ok(false);
        }
        entry.committing = true;
        Ok(true)
    }

    fn complete(&self, task_id: &str, result: Value) -> Result<AnalysisTask, TaskError> {
        let (snapshot, finished) = {
            let mut entry = self
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

            let finished = entry.task.status == AnalysisTaskStatus::Running;
            if finished {
                Self::finish(&mut entry.task, AnalysisTaskStatus::Done);
                entry.task.error_message = None;
                entry.task.result = Some(result);
            }
            entry.committing = false;
            (entry.task.clone(), finished)
        };

        if finished {
            self.notify(&snapshot);
        }
        Ok(snapshot)
    }

    fn fail(&self, task_id: &str, error: String) -> Result<AnalysisTask, TaskError> {
        let (snapshot, finished) = {
            let mut entry = self
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

            let finished = matches!(
                entry.task.status,
                AnalysisTaskStatus::Running | AnalysisTaskStatus::Pending
            );
            if finished {
                Self::finish(&mut entry.task, AnalysisTaskStatus::Failed);
                entry.task.error_message = Some(error);
            }
            entry.committing = false;
            (entry.task.clone(), finished)
        };

        if finished {
            self.notify(&snapshot);
        }
        Ok(snapshot)
    }

    fn notifications(&self, unread_only: bool, limit: usize) -> Vec<AnalysisNotification> {
        self.with_notifications(|queue| {
            queue
                .iter()
                .filter(|n| !unread_only || !n.is_read)
                .take(limit)
                .cloned()
                .collect()
        })
    }

    fn mark_notification_read(&self, notification_id: &str) -> Result<AnalysisNotification, TaskError> {
        self.with_notifications(|queue| {
            let notification = queue
                .iter_mut()
                .find(|n| n.id == notification_id)
                .ok_or_else(|| TaskError::NotificationNotFound(notification_id.to_string()))?;
            notification.is_read = true;
            Ok(notification.clone())
        })
    }

    fn mark_all_notifications_read(&self) -> usize {
        self.with_notifications(|queue| {
            queue
                .iter_mut()
                .filter(|n| !n.is_read)
                .map(|n| n.is_read = true)
                .count()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager(capacity: usize) -> (InMemoryAnalysisTaskManager, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (InMemoryAnalysisTaskManager::new(tx), rx)
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let (manager, mut rx) = manager(8);
        let task = manager
            .submit(AnalysisTask::new(ProjectId::new(), 1, 5, 3))
            .unwrap();

        assert_eq!(rx.recv().await, Some(task.task_id.clone()));
        assert_eq!(manager.next_ready(), Some(task.task_id.clone()));

        let lease = manager.start(&task.task_id).unwrap().unwrap();
        assert_eq!(lease.task.status, AnalysisTaskStatus::Running);
        assert!(manager.start(&task.task_id).unwrap().is_none());

        let done = manager
            .complete(&task.task_id, json!({ "key_events": [] }))
            .unwrap();
        assert_eq!(done.status, AnalysisTaskStatus::Done);
        assert!(done.duration_seconds.is_some());
        assert!(done.result.is_some());
    }

    #[tokio::test]
    async fn test_higher_priority_runs_first() {
        let (manager, _rx) = manager(8);
        let project = ProjectId::new();
        let low = manager.submit(AnalysisTask::new(project, 1, 2, 3)).unwrap();
        let high = manager.submit(AnalysisTask::new(project, 2, 9, 3)).unwrap();
        let low_again = manager.submit(AnalysisTask::new(project, 3, 2, 3)).unwrap();

        assert_eq!(manager.next_ready(), Some(high.task_id));
        assert_eq!(manager.next_ready(), Some(low.task_id));
        assert_eq!(manager.next_ready(), Some(low_again.task_id));
        assert_eq!(manager.next_ready(), None);
    }

    #[tokio::test]
    async fn test_cancel_fires_token_and_skips_queue() {
        let (manager, _rx) = manager(8);
        let task = manager
            .submit(AnalysisTask::new(ProjectId::new(), 1, 5, 3))
            .unwrap();
        let lease = manager.start(&task.task_id).unwrap().unwrap();

        let cancelled = manager.cancel(&task.task_id).unwrap();
        assert_eq!(cancelled.status, AnalysisTaskStatus::Cancelled);
        assert!(lease.cancel_token.is_cancelled());

        // 取消后完成不改变状态
        let after = manager.complete(&task.task_id, json!({})).unwrap();
        assert_eq!(after.status, AnalysisTaskStatus::Cancelled);

        // 已结束的任务再次取消原样返回
        let again = manager.cancel(&task.task_id).unwrap();
        assert_eq!(again.completed_at, cancelled.completed_at);
        assert_eq!(manager.next_ready(), None);
    }

    #[tokio::test]
    async fn test_cleanup_project_removes_its_tasks() {
        let (manager, _rx) = manager(8);
        let project = ProjectId::new();
        let other = ProjectId::new();
        let first = manager.submit(AnalysisTask::new(project, 1, 5, 3)).unwrap();
        let second = manager.submit(AnalysisTask::new(project, 2, 5, 3)).unwrap();
        let kept = manager.submit(AnalysisTask::new(other, 1, 5, 3)).unwrap();

        manager.start(&first.task_id).unwrap();
        manager.fail(&first.task_id, "boom".into()).unwrap();
        let lease = manager.start(&second.task_id).unwrap().unwrap();

        assert_eq!(manager.cleanup_project(project), 2);
        assert!(lease.cancel_token.is_cancelled());
        assert!(manager.get(&first.task_id).is_none());
        assert!(manager.get(&second.task_id).is_none());
        assert!(manager.project_tasks.get(&project).is_none());
        assert!(manager.notifications(false, 10).is_empty());

        let remaining: Vec<_> = manager
            .list(&TaskFilter::default())
            .into_iter()
            .map(|t| t.task_id)
            .collect();
        assert_eq!(remaining, vec![kept.task_id]);
        assert_eq!(manager.cleanup_project(project), 0);
    }

    #[tokio::test]
    async fn test_retention_evicts_oldest_finished_tasks() {
        let (tx, _rx) = mpsc::channel(16);
        let manager = InMemoryAnalysisTaskManager::new(tx).with_retention(2);
        let project = ProjectId::new();

        let old = manager.submit(AnalysisTask::new(project, 1, 5, 3)).unwrap();
        manager.start(&old.task_id).unwrap();
        manager.complete(&old.task_id, json!({})).unwrap();
        let open = manager.submit(AnalysisTask::new(project, 2, 5, 3)).unwrap();
        let newest = manager.submit(AnalysisTask::new(project, 3, 5, 3)).unwrap();

        assert!(manager.get(&old.task_id).is_none());
        assert!(manager.get(&open.task_id).is_some());
        assert!(manager.get(&newest.task_id).is_some());
        assert_eq!(manager.project_tasks.get(&project).unwrap().len(), 2);

        // 未结束的任务不会被淘汰
        manager.submit(AnalysisTask::new(project, 4, 5, 3)).unwrap();
        assert_eq!(manager.list(&TaskFilter::default()).len(), 3);
    }

    #[tokio::test]
    async fn test_cancel_after_commit_point_is_ignored() {
        let (manager, _rx) = manager(8);
        let task = manager
            .submit(AnalysisTask::new(ProjectId::new(), 1, 5, 3))
            .unwrap();
        let lease = manager.start(&task.task_id).unwrap().unwrap();

        assert!(manager.begin_commit(&task.task_id).unwrap());
        let still_running = manager.cancel(&task.task_id).unwrap();
        assert_eq!(still_running.status, AnalysisTaskStatus::Running);
        assert!(!lease.cancel_token.is_cancelled());

        let done = manager.complete(&task.task_id, json!({})).unwrap();
        assert_eq!(done.status, AnalysisTaskStatus::Done);
    }

    #[tokio::test]
    async fn test_commit_refused_after_cancel() {
        let (manager, _rx) = manager(8);
        let task = manager
            .submit(AnalysisTask::new(ProjectId::new(), 1, 5, 3))
            .unwrap();
        assert!(!manager.begin_commit(&task.task_id).unwrap());

        manager.start(&task.task_id).unwrap();
        manager.cancel(&task.task_id).unwrap();
        assert!(!manager.begin_commit(&task.task_id).unwrap());
        assert!(matches!(
            manager.begin_commit("missing"),
            Err(TaskError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_notifications_follow_finished_tasks() {
        let (manager, _rx) = manager(8);
        let project = ProjectId::new();
        let ok = manager.submit(AnalysisTask::new(project, 1, 5, 3)).unwrap();
        let bad = manager.submit(AnalysisTask::new(project, 2, 5, 3)).unwrap();
        let dropped = manager.submit(AnalysisTask::new(project, 3, 5, 3)).unwrap();

        manager.start(&ok.task_id).unwrap();
        manager.complete(&ok.task_id, json!({})).unwrap();
        manager.fail(&bad.task_id, "timeout".into()).unwrap();
        manager.cancel(&dropped.task_id).unwrap();

        let all = manager.notifications(false, 10);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].task_id, bad.task_id);
        assert_eq!(all[0].message.as_deref(), Some("timeout"));
        assert_eq!(manager.notifications(false, 1).len(), 1);

        let read = manager.mark_notification_read(&all[1].id).unwrap();
        assert!(read.is_read);
        assert_eq!(manager.notifications(true, 10).len(), 1);
        assert!(matches!(
            manager.mark_notification_read("nope"),
            Err(TaskError::NotificationNotFound(_))
        ));

        assert_eq!(manager.mark_all_notifications_read(), 1);
        assert!(manager.notifications(true, 10).is_empty());
        assert_eq!(manager.mark_all_notifications_read(), 0);
    }

    #[tokio::test]
    async fn test_summary_and_latest_for_chapter() {
        let (manager, _rx) = manager(8);
        let project = ProjectId::new();
        let first = manager.submit(AnalysisTask::new(project, 1, 5, 3)).unwrap();
        manager.start(&first.task_id).unwrap();
        manager.fail(&first.task_id, "boom".into()).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = manager.submit(AnalysisTask::new(project, 1, 5, 3)).unwrap();
        manager.submit(AnalysisTask::new(ProjectId::new(), 1, 5, 3)).unwrap();

        let summary = manager.status_summary(project, 10);
        assert_eq!(summary.total, 2);
        assert_eq!((summary.pending, summary.failed), (1, 1));
        assert_eq!(summary.recent_tasks[0].task_id, second.task_id);

        let latest = manager.latest_for_chapter(project, 1).unwrap();
        assert_eq!(latest.task_id, second.task_id);
        assert!(manager.latest_for_chapter(project, 2).is_none());
    }

    #[tokio::test]
    async fn test_retry_resets_budget() {
        let (manager, _rx) = manager(8);
        let task = manager
            .submit(AnalysisTask::new(ProjectId::new(), 1, 5, 2))
            .unwrap();

        assert!(matches!(
            manager.retry(&task.task_id),
            Err(TaskError::InvalidStateTransition(_))
        ));

        manager.start(&task.task_id).unwrap();
        manager
            .record_attempt_failure(&task.task_id, "timeout".into())
            .unwrap();
        let failed = manager.fail(&task.task_id, "timeout".into()).unwrap();
        assert_eq!(failed.retry_count, 1);

        let retried = manager.retry(&task.task_id).unwrap();
        assert_eq!(retried.status, AnalysisTaskStatus::Pending);
        assert_eq!(retried.retry_count, 0);
        assert!(retried.error_message.is_none());
        assert!(manager.start(&task.task_id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_full_queue_rejects_submit() {
        let (manager, _rx) = manager(1);
        let project = ProjectId::new();
        manager.submit(AnalysisTask::new(project, 1, 5, 3)).unwrap();

        let rejected = manager.submit(AnalysisTask::new(project, 2, 5, 3));
        assert!(matches!(rejected, Err(TaskError::QueueFull)));
        assert_eq!(manager.list(&TaskFilter::default()).len(), 1);
    }
}
