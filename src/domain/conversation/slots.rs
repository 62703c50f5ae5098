//! 蓝图槽位定义
//!
//! 每个槽位对应蓝图的一项故事参数。选择题槽位比文本槽位更便宜，
//! 必填比选填优先，[`SLOTS`] 已按提问顺序排列。

use serde::{Deserialize, Serialize};

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

/// 跳过选填槽位的选项 id
pub const SKIP_OPTION_ID: &str = "skip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Choice(&'static [(&'static str, &'static str)]),
    Text { placeholder: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub key: &'static str,
    pub question: &'static str,
    pub kind: SlotKind,
    pub required: bool,
}

impl SlotSpec {
    pub fn is_choice(&self) -> bool {
        matches!(self.kind, SlotKind::Choice(_))
    }

    /// 选项列表；选填题追加“跳过”
    pub fn options(&self) -> Vec<ChoiceOption> {
        let SlotKind::Choice(choices) = self.kind else {
            return Vec::new();
        };
        let mut options: Vec<ChoiceOption> = choices
            .iter()
            .map(|(id, label)| ChoiceOption {
                id: id.to_string(),
                label: label.to_string(),
            })
            .collect();
        if !self.required {
            options.push(ChoiceOption {
                id: SKIP_OPTION_ID.to_string(),
                label: "跳过".to_string(),
            });
        }
        options
    }
}

const GENRES: &[(&str, &str)] = &[
    ("fantasy", "奇幻"),
    ("xianxia", "仙侠"),
    ("urban", "都市"),
    ("scifi", "科幻"),
    ("mystery", "悬疑"),
    ("romance", "言情"),
    ("history", "历史"),
];

const AUDIENCES: &[(&str, &str)] = &[
    ("male", "男频读者"),
    ("female", "女频读者"),
    ("young_adult", "青少年"),
    ("general", "大众读者"),
];

const TONES: &[(&str, &str)] = &[
    ("dark", "黑暗压抑"),
    ("epic", "热血史诗"),
    ("light", "轻松幽默"),
    ("warm", "温情治愈"),
];

const LENGTHS: &[(&str, &str)] = &[
    ("short", "短篇（30章以内）"),
    ("medium", "中篇（30-100章）"),
    ("long", "长篇（100章以上）"),
];

pub const SLOTS: &[SlotSpec] = &[
    SlotSpec {
        key: "genre",
        question: "这个故事属于什么类型？",
        kind: SlotKind::Choice(GENRES),
        required: true,
    },
    SlotSpec {
        key: "target_audience",
        question: "主要写给哪类读者？",
        kind: SlotKind::Choice(AUDIENCES),
        required: false,
    },
    SlotSpec {
        key: "tone",
        question: "整体基调更接近哪一种？",
        kind: SlotKind::Choice(TONES),
        required: false,
    },
    SlotSpec {
        key: "length",
        question: "计划写多长？",
        kind: SlotKind::Choice(LENGTHS),
        required: false,
    },
    SlotSpec {
        key: "protagonist",
        question: "介绍一下主角：身份、性格、想要什么？",
        kind: SlotKind::Text {
            placeholder: "例如：被逐出师门的少年剑客，沉默寡言，想查清师父之死",
        },
        required: true,
    },
    SlotSpec {
        key: "conflict",
        question: "故事的核心冲突是什么？",
        kind: SlotKind::Text {
            placeholder: "例如：灯火会垄断光源，主角必须在黑暗中找到第二个太阳",
        },
        required: true,
    },
    SlotSpec {
        key: "world",
        question: "还有想补充的世界观设定吗？（可留空跳过）",
        kind: SlotKind::Text {
            placeholder: "例如：城市永远停留在黄昏，时间靠钟楼维持",
        },
        required: false,
    },
];

pub fn find_slot(key: &str) -> Option<&'static SlotSpec> {
    SLOTS.iter().find(|slot| slot.key == key)
}
