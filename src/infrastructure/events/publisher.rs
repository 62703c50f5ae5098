//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现：章节状态与分析任务状态的全局广播

use crate::application::ports::{AnalysisTask, AutoGenTask};
use crate::domain::project::{GenerationStatus, ProjectId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 章节生产状态变更
    ChapterStatusChanged {
        project_id: ProjectId,
        chapter_number: u32,
        status: GenerationStatus,
    },
    /// 分析任务状态变更
    AnalysisTaskChanged {
        project_id: ProjectId,
        task_id: String,
        chapter_number: u32,
        status: String,
        retry_count: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_seconds: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 新卷已写入
    VolumesCreated {
        project_id: ProjectId,
        volume_numbers: Vec<u32>,
    },
    /// 自动生成任务状态变更
    AutoGeneratorChanged {
        project_id: ProjectId,
        task_id: String,
        status: String,
        chapters_generated: u32,
        error_count: u32,
    },
    /// 项目已删除
    ProjectDeleted { project_id: ProjectId },
}

impl WsEvent {
    /// 事件所属项目
    pub fn project_id(&self) -> ProjectId {
        match self {
            WsEvent::ChapterStatusChanged { project_id, .. }
            | WsEvent::AnalysisTaskChanged { project_id, .. }
            | WsEvent::VolumesCreated { project_id, .. }
            | WsEvent::AutoGeneratorChanged { project_id, .. }
            | WsEvent::ProjectDeleted { project_id } => *project_id,
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全部事件
    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 发布章节状态变更
    pub fn publish_chapter_status(
        &self,
        project_id: ProjectId,
        chapter_number: u32,
        status: GenerationStatus,
    ) {
        self.publish(WsEvent::ChapterStatusChanged {
            project_id,
            chapter_number,
            status,
        });
    }

    /// 发布分析任务快照
    pub fn publish_task(&self, task: &AnalysisTask) {
        self.publish(WsEvent::AnalysisTaskChanged {
            project_id: task.project_id,
            task_id: task.task_id.clone(),
            chapter_number: task.chapter_number,
            status: task.status.as_str().to_string(),
            retry_count: task.retry_count,
            duration_seconds: task.duration_seconds,
            error: task.error_message.clone(),
        });
    }

    /// 发布新卷
    pub fn publish_volumes_created(&self, project_id: ProjectId, volume_numbers: Vec<u32>) {
        self.publish(WsEvent::VolumesCreated {
            project_id,
            volume_numbers,
        });
    }

    /// 发布自动生成任务快照
    pub fn publish_auto_generator(&self, task: &AutoGenTask) {
        self.publish(WsEvent::AutoGeneratorChanged {
            project_id: task.project_id,
            task_id: task.task_id.clone(),
            status: task.status.as_str().to_string(),
            chapters_generated: task.chapters_generated,
            error_count: task.error_count,
        });
    }

    /// 发布项目删除
    pub fn publish_project_deleted(&self, project_id: ProjectId) {
        self.publish(WsEvent::ProjectDeleted { project_id });
    }

    fn publish(&self, event: WsEvent) {
        let project_id = event.project_id();
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                project_id = %project_id,
                error = %e,
                "Failed to publish event (no receivers)"
            );
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_chapter_event() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();
        let project_id = ProjectId::new();

        publisher.publish_chapter_status(project_id, 3, GenerationStatus::Generating);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.project_id(), project_id);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "ChapterStatusChanged");
        assert_eq!(value["data"]["chapter_number"], 3);
        assert_eq!(value["data"]["status"], "generating");
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let publisher = EventPublisher::new();
        publisher.publish_project_deleted(ProjectId::new());
    }
}
