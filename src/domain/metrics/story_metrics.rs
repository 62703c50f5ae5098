//! 剧情指标提取
//!
//! 正文本身给出字数、紧张度、节奏；章节分析结果（若有）给出事件、伏笔、
//! 角色成长、世界观扩展，并据此计算高潮分与阶段分。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::project::count_words;

/// 阶段分权重
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricWeights {
    pub key_event: f64,
    pub foreshadow: f64,
    pub foreshadow_conf: f64,
    pub character_breakthrough: f64,
    pub world_shock: f64,
    pub major_event: f64,
    pub climax_multiplier: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            key_event: 8.0,
            foreshadow: 5.0,
            foreshadow_conf: 10.0,
            character_breakthrough: 20.0,
            world_shock: 15.0,
            major_event: 25.0,
            climax_multiplier: 1.2,
        }
    }
}

/// 高潮章节阈值（climax_score 达到后阶段分乘以 climax_multiplier）
pub const CLIMAX_SCORE_THRESHOLD: u32 = 70;

const CLIMAX_TYPES: [&str; 3] = ["climax", "catastrophe", "turning_point"];

/// 单章剧情指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryMetric {
    pub chapter_number: u32,
    pub word_count: u32,
    /// 0-100，每千字感叹/疑问标点密度
    pub tension: u32,
    /// 0-100，对白字符占比
    pub pacing: u32,
    pub key_event_count: u32,
    pub major_event_flag: bool,
    pub foreshadow_count: u32,
    pub foreshadow_max_conf: f64,
    pub character_breakthrough_flag: bool,
    pub world_shock_flag: bool,
    pub climax_score: u32,
    pub stage_score: u32,
    /// 是否来自章节分析结果
    pub analyzed: bool,
}

impl StoryMetric {
    pub fn compute(chapter_number: u32, content: &str, analysis: Option<&Value>) -> Self {
        Self::compute_with_weights(chapter_number, content, analysis, &MetricWeights::default())
    }

    pub fn compute_with_weights(
        chapter_number: u32,
        content: &str,
        analysis: Option<&Value>,
        weights: &MetricWeights,
    ) -> Self {
        let signals = analysis.map(AnalysisSignals::from_value).unwrap_or_default();

        let mut metric = Self {
            chapter_number,
            word_count: count_words(content),
            tension: tension(content),
            pacing: pacing(content),
            key_event_count: signals.key_events,
            major_event_flag: signals.major_event(),
            foreshadow_count: signals.foreshadow_types.len() as u32,
            foreshadow_max_conf: signals.foreshadow_max_conf,
            character_breakthrough_flag: signals.breakthrough,
            world_shock_flag: signals.world_shock,
            climax_score: signals.climax_score(),
            stage_score: 0,
            analyzed: analysis.is_some(),
        };
        metric.stage_score = metric.stage_score_with(weights);
        metric
    }

    fn stage_score_with(&self, weights: &MetricWeights) -> u32 {
        let mut score = self.key_event_count as f64 * weights.key_event
            + self.foreshadow_count as f64 * weights.foreshadow
            + self.foreshadow_max_conf * weights.foreshadow_conf;
        if self.character_breakthrough_flag {
            score += weights.character_breakthrough;
        }
        if self.world_shock_flag {
            score += weights.world_shock;
        }
        if self.major_event_flag {
            score += weights.major_event;
        }
        if self.climax_score >= CLIMAX_SCORE_THRESHOLD {
            score *= weights.climax_multiplier;
        }
        (score.max(0.0) as u32).min(100)
    }
}

// ============================================================================
// 分析结果信号
// ============================================================================

/// 从分析结果 JSON 中防御性提取的信号
#[derive(Debug, Default)]
struct AnalysisSignals {
    key_events: u32,
    foreshadow_types: Vec<String>,
    foreshadow_max_conf: f64,
    growth_levels: Vec<i64>,
    breakthrough: bool,
    world_shock: bool,
}

impl AnalysisSignals {
    fn from_value(value: &Value) -> Self {
        let list = |key: &str| -> &[Value] {
            value
                .get(key)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[])
        };

        let foreshadowings = list("foreshadowings");
        let foreshadow_types = foreshadowings
            .iter()
            .filter(|f| f.is_object())
            .map(|f| f.get("type").and_then(Value::as_str).unwrap_or("").to_string())
            .collect();
        let foreshadow_max_conf = foreshadowings
            .iter()
            .filter_map(|f| f.get("confidence"))
            .map(number_of)
            .fold(0.0, f64::max);

        let mut growth_levels = Vec::new();
        let mut breakthrough = false;
        for change in list("character_changes").iter().filter(|c| c.is_object()) {
            let level = change.get("growth_level").map(number_of).unwrap_or(0.0) as i64;
            let text = change
                .get("changes")
                .map(|c| match c {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            breakthrough |= level >= 5 || text.contains("突破") || text.contains("境界");
            growth_levels.push(level);
        }

        let world_shock = value
            .get("world_extensions")
            .and_then(Value::as_object)
            .is_some_and(|ext| {
                ext.values()
                    .any(|v| v.as_array().is_some_and(|items| !items.is_empty()))
            });

        Self {
            key_events: list("key_events").len() as u32,
            foreshadow_types,
            foreshadow_max_conf,
            growth_levels,
            breakthrough,
            world_shock,
        }
    }

    fn major_event(&self) -> bool {
        self.breakthrough
            || self
                .foreshadow_types
                .iter()
                .any(|t| CLIMAX_TYPES.contains(&t.as_str()))
            || self.key_events >= 4
    }

    fn climax_score(&self) -> u32 {
        let mut score = (self.key_events * 10).min(40);
        for kind in &self.foreshadow_types {
            score += match kind.as_str() {
                "climax" => 15,
                "catastrophe" => 12,
                "turning_point" => 10,
                _ => 3,
            };
        }
        for level in &self.growth_levels {
            score += (level.max(&0) * 3).min(15) as u32;
        }
        score.min(100)
    }
}

fn number_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

// ============================================================================
// 正文信号
// ============================================================================

fn tension(content: &str) -> u32 {
    let total = content.chars().count();
    if total == 0 {
        return 0;
    }
    let marks = content
        .chars()
        .filter(|c| matches!(c, '!' | '！' | '?' | '？'))
        .count();
    let per_thousand = marks as f64 * 1000.0 / total as f64;
    ((per_thousand * 10.0) as u32).min(100)
}

fn pacing(content: &str) -> u32 {
    let mut in_dialogue = false;
    let mut dialogue = 0usize;
    let mut total = 0usize;

    for c in content.chars() {
        match c {
            '“' | '「' => in_dialogue = true,
            '”' | '」' => in_dialogue = false,
            '"' => in_dialogue = !in_dialogue,
            c if c.is_whitespace() => {}
            _ => {
                total += 1;
                if in_dialogue {
                    dialogue += 1;
                }
            }
        }
    }

    if total == 0 {
        0
    } else {
        (dialogue * 100 / total) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metrics_without_analysis() {
        let metric = StoryMetric::compute(3, "他说：“走！”然后离开。", None);
        assert_eq!(metric.chapter_number, 3);
        assert_eq!(metric.word_count, 12);
        assert_eq!(metric.stage_score, 0);
        assert!(!metric.analyzed);
        assert!(metric.tension > 0);
        assert_eq!(metric.pacing, 20);
    }

    #[test]
    fn test_stage_score_weights() {
        let analysis = json!({
            "key_events": ["遇袭", "逃亡"],
            "foreshadowings": [{ "type": "hint", "confidence": 0.5 }],
            "character_changes": [{ "name": "林夜", "growth_level": 2, "changes": "更坚定" }],
            "world_extensions": { "locations": [] }
        });
        let metric = StoryMetric::compute(1, "正文", Some(&analysis));

        // 2*8 + 1*5 + 0.5*10 = 26
        assert_eq!(metric.stage_score, 26);
        assert!(!metric.major_event_flag);
        // 20 + 3 + 6
        assert_eq!(metric.climax_score, 29);
    }

    #[test]
    fn test_major_event_and_climax_multiplier() {
        let analysis = json!({
            "key_events": ["a", "b", "c", "d"],
            "foreshadowings": [
                { "type": "climax", "confidence": "0.9" },
                { "type": "catastrophe", "confidence": 0.8 }
            ],
            "character_changes": [{ "growth_level": 6, "changes": "突破境界" }],
            "world_extensions": { "factions": ["灯火会"] }
        });
        let metric = StoryMetric::compute(9, "正文", Some(&analysis));

        assert!(metric.major_event_flag);
        assert!(metric.character_breakthrough_flag);
        assert!(metric.world_shock_flag);
        assert!(metric.climax_score >= CLIMAX_SCORE_THRESHOLD);
        assert_eq!(metric.stage_score, 100);
        assert!((metric.foreshadow_max_conf - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_analysis_is_ignored() {
        let analysis = json!({ "key_events": "many", "foreshadowings": [1, 2], "world_extensions": [] });
        let metric = StoryMetric::compute(1, "正文", Some(&analysis));
        assert_eq!(metric.key_event_count, 0);
        assert_eq!(metric.foreshadow_count, 0);
        assert_eq!(metric.stage_score, 0);
        assert!(metric.analyzed);
    }
}
