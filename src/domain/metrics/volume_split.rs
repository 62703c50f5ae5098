//! 自动分卷规则
//!
//! 从上一卷结束之后开始扫描已生成章节的指标，满足以下任一条件即在当前章收卷:
//! 1. 当前章是手动分卷点
//! 2. 未收卷的章节数达到 `max_chapters`
//! 3. 章节数达到 `min_chapters` 且过了冷却期，并且最近 `window_size` 章
//!    平均阶段分达到阈值、出现重大事件、或单章阶段分达到 80

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::StoryMetric;

/// 单章强信号阈值
pub const PEAK_STAGE_SCORE: u32 = 80;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitConfigError {
    #[error("min_chapters ({min}) 不能大于 max_chapters ({max})")]
    MinExceedsMax { min: u32, max: u32 },

    #[error("{0} 必须大于 0")]
    MustBePositive(&'static str),

    #[error("score_threshold 必须在 0-100 之间: {0}")]
    ThresholdOutOfRange(u32),

    #[error("手动分卷点必须从 1 开始")]
    InvalidManualBoundary,
}

/// 分卷配置（项目级）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub enabled: bool,
    pub min_chapters: u32,
    pub max_chapters: u32,
    pub window_size: u32,
    pub score_threshold: u32,
    pub cooldown_chapters: u32,
    pub use_ai_naming: bool,
    pub manual_boundaries: Vec<u32>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_chapters: 15,
            max_chapters: 30,
            window_size: 5,
            score_threshold: 60,
            cooldown_chapters: 3,
            use_ai_naming: true,
            manual_boundaries: Vec::new(),
        }
    }
}

/// 分卷配置的部分更新
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SplitConfigPatch {
    pub enabled: Option<bool>,
    pub min_chapters: Option<u32>,
    pub max_chapters: Option<u32>,
    pub window_size: Option<u32>,
    pub score_threshold: Option<u32>,
    pub cooldown_chapters: Option<u32>,
    pub use_ai_naming: Option<bool>,
    pub manual_boundaries: Option<Vec<u32>>,
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), SplitConfigError> {
        if self.min_chapters == 0 {
            return Err(SplitConfigError::MustBePositive("min_chapters"));
        }
        if self.window_size == 0 {
            return Err(SplitConfigError::MustBePositive("window_size"));
        }
        if self.min_chapters > self.max_chapters {
            return Err(SplitConfigError::MinExceedsMax {
                min: self.min_chapters,
                max: self.max_chapters,
            });
        }
        if self.score_threshold > 100 {
            return Err(SplitConfigError::ThresholdOutOfRange(self.score_threshold));
        }
        if self.manual_boundaries.contains(&0) {
            return Err(SplitConfigError::InvalidManualBoundary);
        }
        Ok(())
    }

    pub fn apply(&self, patch: SplitConfigPatch) -> Result<SplitConfig, SplitConfigError> {
        let mut next = self.clone();
        if let Some(v) = patch.enabled {
            next.enabled = v;
        }
        if let Some(v) = patch.min_chapters {
            next.min_chapters = v;
        }
        if let Some(v) = patch.max_chapters {
            next.max_chapters = v;
        }
        if let Some(v) = patch.window_size {
            next.window_size = v;
        }
        if let Some(v) = patch.score_threshold {
            next.score_threshold = v;
        }
        if let Some(v) = patch.cooldown_chapters {
            next.cooldown_chapters = v;
        }
        if let Some(v) = patch.use_ai_naming {
            next.use_ai_naming = v;
        }
        if let Some(mut v) = patch.manual_boundaries {
            v.sort_unstable();
            v.dedup();
            next.manual_boundaries = v;
        }
        next.validate()?;
        Ok(next)
    }
}

/// 卷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub volume_number: u32,
    pub title: String,
    pub description: String,
    pub start_chapter: u32,
    pub end_chapter: u32,
}

/// 收卷原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitReason {
    ManualBoundary,
    MaxChapters,
    ScoreThreshold,
    MajorEvent,
    PeakScore,
}

impl SplitReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SplitReason::ManualBoundary => "手动分卷点",
            SplitReason::MaxChapters => "达到最大章节数",
            SplitReason::ScoreThreshold => "平均评分达到阈值",
            SplitReason::MajorEvent => "出现重大事件",
            SplitReason::PeakScore => "单章评分极高",
        }
    }
}

/// 分卷提案（尚未命名）
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedVolume {
    pub volume_number: u32,
    pub start_chapter: u32,
    pub end_chapter: u32,
    pub reason: SplitReason,
    /// 触发收卷的指标窗口
    pub window: Vec<StoryMetric>,
}

impl ProposedVolume {
    pub fn fallback_title(&self) -> String {
        format!(
            "卷{}·第{}-{}章",
            to_chinese_number(self.volume_number),
            self.start_chapter,
            self.end_chapter
        )
    }

    pub fn description(&self) -> String {
        format!("自动分卷：{}", self.reason.describe())
    }

    pub fn into_volume(self, title: String) -> Volume {
        let description = self.description();
        Volume {
            volume_number: self.volume_number,
            title,
            description,
            start_chapter: self.start_chapter,
            end_chapter: self.end_chapter,
        }
    }
}

/// 计算新的分卷点
///
/// `metrics` 需按章节号升序；已有卷之前的章节不会再被扫描，
/// 因此在内容不变时重复执行不会产生新卷。
pub fn plan_volumes(
    metrics: &[StoryMetric],
    existing: &[Volume],
    config: &SplitConfig,
    threshold: u32,
) -> Vec<ProposedVolume> {
    if !config.enabled {
        return Vec::new();
    }

    let last_end = existing.iter().map(|v| v.end_chapter).max().unwrap_or(0);
    let mut next_number = existing.iter().map(|v| v.volume_number).max().unwrap_or(0) + 1;
    let mut segment_start = last_end + 1;
    let mut has_previous = last_end > 0;
    let mut proposals = Vec::new();

    let candidates: Vec<&StoryMetric> = metrics
        .iter()
        .filter(|m| m.chapter_number > last_end)
        .collect();

    for (position, metric) in candidates.iter().enumerate() {
        let chapter = metric.chapter_number;
        let length = chapter - segment_start + 1;

        let mut window: Vec<StoryMetric> = candidates[..=position]
            .iter()
            .rev()
            .take_while(|m| m.chapter_number >= segment_start)
            .take(config.window_size as usize)
            .map(|m| (*m).clone())
            .collect();
        window.reverse();

        let reason = if config.manual_boundaries.contains(&chapter) {
            Some(SplitReason::ManualBoundary)
        } else if length >= config.max_chapters {
            Some(SplitReason::MaxChapters)
        } else if length >= config.min_chapters
            && (!has_previous || length >= config.cooldown_chapters)
        {
            score_reason(&window, threshold)
        } else {
            None
        };

        if let Some(reason) = reason {
            tracing::debug!(
                volume_number = next_number,
                start_chapter = segment_start,
                end_chapter = chapter,
                reason = ?reason,
                "Volume boundary detected"
            );
            proposals.push(ProposedVolume {
                volume_number: next_number,
                start_chapter: segment_start,
                end_chapter: chapter,
                reason,
                window,
            });
            next_number += 1;
            segment_start = chapter + 1;
            has_previous = true;
        }
    }

    proposals
}

fn score_reason(window: &[StoryMetric], threshold: u32) -> Option<SplitReason> {
    if window.is_empty() {
        return None;
    }
    let average =
        window.iter().map(|m| m.stage_score as f64).sum::<f64>() / window.len() as f64;
    if average >= threshold as f64 {
        Some(SplitReason::ScoreThreshold)
    } else if window.iter().any(|m| m.major_event_flag) {
        Some(SplitReason::MajorEvent)
    } else if window.iter().any(|m| m.stage_score >= PEAK_STAGE_SCORE) {
        Some(SplitReason::PeakScore)
    } else {
        None
    }
}

/// 卷号转中文数字（1-99，其余保留阿拉伯数字）
pub fn to_chinese_number(num: u32) -> String {
    const DIGITS: [&str; 10] = ["零", "一", "二", "三", "四", "五", "六", "七", "八", "九"];
    match num {
        0..=9 => DIGITS[num as usize].to_string(),
        10 => "十".to_string(),
        11..=19 => format!("十{}", DIGITS[(num - 10) as usize]),
        20..=99 => {
            let ones = num % 10;
            let ones = if ones == 0 { "" } else { DIGITS[ones as usize] };
            format!("{}十{}", DIGITS[(num / 10) as usize], ones)
        }
        _ => num.to_string(),
    }
}

/// 规整 AI 返回的卷名，缺少 `卷X·` 前缀时补齐
pub fn normalize_volume_title(raw: &str, volume_number: u32) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let cleaned = line
        .trim_start_matches("卷名：")
        .trim_start_matches("卷名:")
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’' | '《' | '》'))
        .trim();
    if cleaned.is_empty() {
        return None;
    }

    let prefix = format!("卷{}·", to_chinese_number(volume_number));
    if cleaned.starts_with(&prefix) {
        return Some(cleaned.to_string());
    }
    let subtitle = cleaned.rsplit('·').next().unwrap_or(cleaned).trim();
    if subtitle.is_empty() {
        return None;
    }
    Some(format!("{prefix}{subtitle}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(chapter_number: u32, stage_score: u32, major: bool) -> StoryMetric {
        StoryMetric {
            chapter_number,
            word_count: 3000,
            tension: 0,
            pacing: 0,
            key_event_count: 0,
            major_event_flag: major,
            foreshadow_count: 0,
            foreshadow_max_conf: 0.0,
            character_breakthrough_flag: false,
            world_shock_flag: false,
            climax_score: 0,
            stage_score,
            analyzed: true,
        }
    }

    fn flat(range: std::ops::RangeInclusive<u32>, score: u32) -> Vec<StoryMetric> {
        range.map(|n| metric(n, score, false)).collect()
    }

    #[test]
    fn test_chinese_numbers() {
        assert_eq!(to_chinese_number(1), "一");
        assert_eq!(to_chinese_number(10), "十");
        assert_eq!(to_chinese_number(12), "十二");
        assert_eq!(to_chinese_number(20), "二十");
        assert_eq!(to_chinese_number(35), "三十五");
        assert_eq!(to_chinese_number(120), "120");
    }

    #[test]
    fn test_forced_split_at_max_chapters() {
        let config = SplitConfig::default();
        let proposals = plan_volumes(&flat(1..=31, 10), &[], &config, 60);

        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].start_chapter, 1);
        assert_eq!(proposals[0].end_chapter, 30);
        assert_eq!(proposals[0].reason, SplitReason::MaxChapters);
        assert_eq!(proposals[0].fallback_title(), "卷一·第1-30章");
    }

    #[test]
    fn test_no_split_before_min_chapters() {
        let config = SplitConfig::default();
        let proposals = plan_volumes(&flat(1..=14, 95), &[], &config, 60);
        assert!(proposals.is_empty());
    }

    #[test]
    fn test_score_threshold_split() {
        let config = SplitConfig::default();
        let mut metrics = flat(1..=12, 10);
        metrics.extend(flat(13..=16, 70));

        let proposals = plan_volumes(&metrics, &[], &config, 40);
        assert_eq!(proposals.len(), 1);
        // 第 15 章：窗口 11-15 平均 (10*2 + 70*3)/5 = 46 >= 40
        assert_eq!(proposals[0].end_chapter, 15);
        assert_eq!(proposals[0].reason, SplitReason::ScoreThreshold);
        assert_eq!(proposals[0].window.len(), 5);
    }

    #[test]
    fn test_major_event_split() {
        let config = SplitConfig::default();
        let mut metrics = flat(1..=15, 0);
        metrics[14].major_event_flag = true;

        let proposals = plan_volumes(&metrics, &[], &config, 60);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].reason, SplitReason::MajorEvent);
    }

    #[test]
    fn test_manual_boundary_overrides_minimum() {
        let config = SplitConfig {
            manual_boundaries: vec![5],
            ..SplitConfig::default()
        };
        let proposals = plan_volumes(&flat(1..=8, 0), &[], &config, 60);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].end_chapter, 5);
        assert_eq!(proposals[0].reason, SplitReason::ManualBoundary);
    }

    #[test]
    fn test_rerun_after_applying_is_idempotent() {
        let config = SplitConfig::default();
        let metrics = flat(1..=40, 10);

        let first = plan_volumes(&metrics, &[], &config, 60);
        assert_eq!(first.len(), 1);
        let applied: Vec<Volume> = first
            .into_iter()
            .map(|p| {
                let title = p.fallback_title();
                p.into_volume(title)
            })
            .collect();

        let second = plan_volumes(&metrics, &applied, &config, 60);
        assert!(second.is_empty());
    }

    #[test]
    fn test_disabled_config_never_splits() {
        let config = SplitConfig {
            enabled: false,
            ..SplitConfig::default()
        };
        assert!(plan_volumes(&flat(1..=60, 100), &[], &config, 60).is_empty());
    }

    #[test]
    fn test_config_patch_validation() {
        let config = SplitConfig::default();
        let updated = config
            .apply(SplitConfigPatch {
                score_threshold: Some(75),
                manual_boundaries: Some(vec![10, 5, 10]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.score_threshold, 75);
        assert_eq!(updated.manual_boundaries, vec![5, 10]);
        assert_eq!(updated.max_chapters, 30);

        let err = config
            .apply(SplitConfigPatch {
                min_chapters: Some(40),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, SplitConfigError::MinExceedsMax { min: 40, max: 30 });

        let err = config
            .apply(SplitConfigPatch {
                window_size: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, SplitConfigError::MustBePositive("window_size"));
    }

    #[test]
    fn test_normalize_volume_title() {
        assert_eq!(normalize_volume_title("卷二·星陨之夜", 2).as_deref(), Some("卷二·星陨之夜"));
        assert_eq!(normalize_volume_title("“星陨之夜”", 2).as_deref(), Some("卷二·星陨之夜"));
        assert_eq!(normalize_volume_title("第二卷·星陨之夜\n解释", 2).as_deref(), Some("卷二·星陨之夜"));
        assert_eq!(normalize_volume_title("  \n ", 2), None);
    }
}
