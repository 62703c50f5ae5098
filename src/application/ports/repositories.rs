//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::domain::blueprint::Blueprint;
use crate::domain::metrics::{SplitConfig, Volume};
use crate::domain::project::{Chapter, ConversationMessage, Project, ProjectId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 章节分析结果记录
#[derive(Debug, Clone)]
pub struct ChapterAnalysisRecord {
    pub chapter_number: u32,
    pub result: Value,
    pub analyzed_at: DateTime<Utc>,
}

/// Project Repository Port
///
/// 写操作按列族划分：大纲物化只写标题与摘要，生产流水线只写正文、版本、
/// 评估、状态与字数，二者可以并发而互不覆盖。
#[async_trait]
pub trait ProjectRepositoryPort: Send + Sync {
    /// 保存新项目
    async fn create(&self, project: &Project) -> Result<(), RepositoryError>;

    /// 加载完整聚合
    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError>;

    /// 加载全部项目（按最后编辑时间倒序）
    async fn find_all(&self) -> Result<Vec<Project>, RepositoryError>;

    /// 批量删除；任一项目不存在时整体回滚并返回 NotFound
    async fn delete_many(&self, ids: &[ProjectId]) -> Result<(), RepositoryError>;

    /// 追加对话消息
    async fn append_messages(
        &self,
        id: ProjectId,
        messages: &[ConversationMessage],
    ) -> Result<(), RepositoryError>;

    /// 保存蓝图并物化大纲章节：缺失的章节插入，已有章节只更新标题与摘要
    async fn save_blueprint(
        &self,
        id: ProjectId,
        blueprint: &Blueprint,
        chapters: &[Chapter],
    ) -> Result<(), RepositoryError>;

    /// 保存章节生产状态（正文、版本、评估、状态、字数）
    async fn save_chapter_progress(
        &self,
        id: ProjectId,
        chapter: &Chapter,
    ) -> Result<(), RepositoryError>;

    /// 删除章节及其分析记录，同时写回删减后的蓝图
    async fn delete_chapters(
        &self,
        id: ProjectId,
        numbers: &[u32],
        blueprint: Option<&Blueprint>,
    ) -> Result<(), RepositoryError>;

    /// 保存分卷配置
    async fn save_split_config(
        &self,
        id: ProjectId,
        config: &SplitConfig,
    ) -> Result<(), RepositoryError>;

    /// 已有分卷（按卷号升序）
    async fn find_volumes(&self, id: ProjectId) -> Result<Vec<Volume>, RepositoryError>;

    /// 追加新卷
    async fn append_volumes(
        &self,
        id: ProjectId,
        volumes: &[Volume],
    ) -> Result<(), RepositoryError>;

    /// 保存章节分析结果（覆盖旧结果）
    async fn save_chapter_analysis(
        &self,
        id: ProjectId,
        chapter_number: u32,
        result: &Value,
    ) -> Result<(), RepositoryError>;

    /// 项目下全部章节分析结果（按章节号升序）
    async fn find_chapter_analyses(
        &self,
        id: ProjectId,
    ) -> Result<Vec<ChapterAnalysisRecord>, RepositoryError>;

    /// 启动时把中断在 generating 的章节落到 failed，返回修复数量
    async fn recover_interrupted_chapters(&self) -> Result<u64, RepositoryError>;
}
