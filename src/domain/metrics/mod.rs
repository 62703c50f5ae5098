//! Metrics Context - 剧情指标与分卷
//!
//! 职责:
//! - 从章节正文与分析结果派生剧情指标（按需计算，不缓存）
//! - 分卷配置与分卷点检测规则

mod story_metrics;
mod volume_split;

pub use story_metrics::{MetricWeights, StoryMetric, CLIMAX_SCORE_THRESHOLD};
pub use volume_split::{
    normalize_volume_title, plan_volumes, to_chinese_number, ProposedVolume, SplitConfig,
    SplitConfigError, SplitConfigPatch, SplitReason, Volume, PEAK_STAGE_SCORE,
};
