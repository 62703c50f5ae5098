//! Volume Query Handlers

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::commands::handlers::load_project;
use crate::application::error::ApplicationError;
use crate::application::ports::{ChapterAnalysisRecord, ProjectRepositoryPort};
use crate::application::queries::{GetSplitConfig, GetStoryMetrics, ListVolumes};
use crate::domain::metrics::{SplitConfig, StoryMetric, Volume};
use crate::domain::project::Project;

/// 按章节号升序计算已有正文章节的剧情指标；每章取最近一次分析结果
pub fn project_metrics(project: &Project, analyses: &[ChapterAnalysisRecord]) -> Vec<StoryMetric> {
    let mut latest: HashMap<u32, &ChapterAnalysisRecord> = HashMap::new();
    for record in analyses {
        let newer = latest
            .get(&record.chapter_number)
            .map_or(true, |current| record.analyzed_at >= current.analyzed_at);
        if newer {
            latest.insert(record.chapter_number, record);
        }
    }

    project
        .chapters()
        .iter()
        .filter(|c| c.has_content())
        .filter_map(|c| {
            let content = c.content.as_deref()?;
            let analysis = latest.get(&c.chapter_number).map(|r| &r.result);
            Some(StoryMetric::compute(c.chapter_number, content, analysis))
        })
        .collect()
}

/// GetStoryMetrics Handler - 每次按需重算
pub struct GetStoryMetricsHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
}

impl GetStoryMetricsHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepositoryPort>) -> Self {
        Self { project_repo }
    }

    pub async fn handle(&self, query: GetStoryMetrics) -> Result<Vec<StoryMetric>, ApplicationError> {
        let project = load_project(self.project_repo.as_ref(), query.project_id).await?;
        let analyses = self
            .project_repo
            .find_chapter_analyses(query.project_id)
            .await?;
        Ok(project_metrics(&project, &analyses))
    }
}

/// GetSplitConfig Handler
pub struct GetSplitConfigHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
}

impl GetSplitConfigHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepositoryPort>) -> Self {
        Self { project_repo }
    }

    pub async fn handle(&self, query: GetSplitConfig) -> Result<SplitConfig, ApplicationError> {
        let project = load_project(self.project_repo.as_ref(), query.project_id).await?;
        Ok(project.split_config().clone())
    }
}

/// ListVolumes Handler
pub struct ListVolumesHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
}

impl ListVolumesHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepositoryPort>) -> Self {
        Self { project_repo }
    }

    pub async fn handle(&self, query: ListVolumes) -> Result<Vec<Volume>, ApplicationError> {
        load_project(self.project_repo.as_ref(), query.project_id).await?;
        Ok(self.project_repo.find_volumes(query.project_id).await?)
    }
}
