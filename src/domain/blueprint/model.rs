//! Blueprint Context - 蓝图模型
//!
//! 蓝图由 AI 协作生成，字段经常缺失或类型漂移：
//! 已知字段显式建模，其余键进入 `extra` 侧表原样保留。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::BlueprintError;

/// 额外属性侧表
pub type ExtraFields = BTreeMap<String, Value>;

/// 故事蓝图
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub target_audience: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub genre: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub style: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub one_sentence_summary: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_synopsis: String,
    #[serde(default)]
    pub world_setting: WorldSetting,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub chapter_outline: Vec<ChapterOutline>,
}

/// 大纲章节号上限
pub const MAX_CHAPTER_NUMBER: u32 = 10_000;

impl Blueprint {
    /// 允许通过 PATCH 替换的顶层字段
    pub const FIELDS: [&'static str; 11] = [
        "title",
        "target_audience",
        "genre",
        "style",
        "tone",
        "one_sentence_summary",
        "full_synopsis",
        "world_setting",
        "characters",
        "relationships",
        "chapter_outline",
    ];

    /// 校验大纲：章节号落在 1..=MAX_CHAPTER_NUMBER 且唯一
    pub fn validate(&self) -> Result<(), BlueprintError> {
        let mut seen = BTreeSet::new();
        for entry in &self.chapter_outline {
            if !(1..=MAX_CHAPTER_NUMBER).contains(&entry.chapter_number) {
                return Err(BlueprintError::InvalidChapterNumber(entry.chapter_number));
            }
            if !seen.insert(entry.chapter_number) {
                return Err(BlueprintError::DuplicateChapterNumber(entry.chapter_number));
            }
        }
        Ok(())
    }

    /// 大纲按章节号排序
    pub fn sort_outline(&mut self) {
        self.chapter_outline.sort_by_key(|entry| entry.chapter_number);
    }

    pub fn outline_entry(&self, chapter_number: u32) -> Option<&ChapterOutline> {
        self.chapter_outline
            .iter()
            .find(|entry| entry.chapter_number == chapter_number)
    }

    /// 新增或更新单个大纲条目
    pub fn upsert_outline(&mut self, entry: ChapterOutline) {
        match self
            .chapter_outline
            .iter_mut()
            .find(|existing| existing.chapter_number == entry.chapter_number)
        {
            Some(existing) => *existing = entry,
            None => {
                self.chapter_outline.push(entry);
                self.sort_outline();
            }
        }
    }

    pub fn remove_outline(&mut self, numbers: &[u32]) {
        self.chapter_outline
            .retain(|entry| !numbers.contains(&entry.chapter_number));
    }

    pub fn last_outline_number(&self) -> u32 {
        self.chapter_outline
            .iter()
            .map(|entry| entry.chapter_number)
            .max()
            .unwrap_or(0)
    }
}

/// 世界观设定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSetting {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub core_rules: Option<String>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Vec::is_empty")]
    pub key_locations: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Vec::is_empty")]
    pub factions: Vec<Value>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// 角色
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub abilities: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub relationship_to_protagonist: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// 角色关系（from → to）
///
/// 输入接受 `from_character`/`character_from`/`source` 与对应的 to 字段，
/// 反序列化时归一为 `from_character`/`to_character`，序列化只输出规范字段。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRelationship")]
pub struct Relationship {
    pub from_character: String,
    pub to_character: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Deserialize)]
struct RawRelationship {
    #[serde(default)]
    from_character: Option<String>,
    #[serde(default)]
    character_from: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    to_character: Option<String>,
    #[serde(default)]
    character_to: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    relationship_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    description: Option<String>,
    #[serde(flatten)]
    extra: ExtraFields,
}

impl TryFrom<RawRelationship> for Relationship {
    type Error = String;

    fn try_from(raw: RawRelationship) -> Result<Self, Self::Error> {
        let pick = |candidates: [Option<String>; 3]| {
            candidates
                .into_iter()
                .flatten()
                .map(|name| name.trim().to_string())
                .find(|name| !name.is_empty())
        };
        let from_character = pick([raw.from_character, raw.character_from, raw.source])
            .ok_or_else(|| "relationship is missing from_character".to_string())?;
        let to_character = pick([raw.to_character, raw.character_to, raw.target])
            .ok_or_else(|| "relationship is missing to_character".to_string())?;

        Ok(Self {
            from_character,
            to_character,
            relationship_type: raw.relationship_type,
            description: raw.description,
            extra: raw.extra,
        })
    }
}

/// 章节大纲条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterOutline {
    pub chapter_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

impl ChapterOutline {
    pub fn new(chapter_number: u32, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            chapter_number,
            title: title.into(),
            summary: summary.into(),
        }
    }
}

// ============================================================================
// 宽松反序列化
// ============================================================================

/// 把任意 JSON 值压成文本：列表按行拼接，对象按 `key: value` 拼接
fn flatten_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let lines: Vec<String> = items.into_iter().filter_map(flatten_text).collect();
            Some(lines.join("\n"))
        }
        Value::Object(map) => {
            let lines: Vec<String> = map
                .into_iter()
                .filter_map(|(key, value)| flatten_text(value).map(|text| format!("{key}: {text}")))
                .collect();
            Some(lines.join("\n"))
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flatten_text(value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    })
}
