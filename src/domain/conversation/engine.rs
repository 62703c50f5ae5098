//! 对话引擎
//!
//! 纯状态推进：绑定用户回答、挑选下一个最便宜的未填槽位、判断结束条件。
//! 助手的措辞由生成能力负责，这里只给出问题与输入方式。

use serde::{Deserialize, Serialize};

use super::slots::{ChoiceOption, SlotKind, SlotSpec, SKIP_OPTION_ID, SLOTS};
use super::state::ConversationState;

/// 用户输入
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub value: String,
}

/// 下一轮的输入方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiControl {
    SingleChoice { options: Vec<ChoiceOption> },
    TextInput { placeholder: String },
}

impl UiControl {
    fn for_slot(slot: &SlotSpec) -> Self {
        match slot.kind {
            SlotKind::Choice(_) => UiControl::SingleChoice {
                options: slot.options(),
            },
            SlotKind::Text { placeholder } => UiControl::TextInput {
                placeholder: placeholder.to_string(),
            },
        }
    }
}

/// 本轮绑定的槽位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredSlot {
    pub key: &'static str,
    /// None 表示跳过
    pub value: Option<String>,
}

/// 一轮对话的推进结果
#[derive(Debug, Clone)]
pub struct TurnPlan {
    pub state: ConversationState,
    /// 要写入对话历史的用户消息
    pub user_message: Option<String>,
    pub answered: Option<AnsweredSlot>,
    pub next_question: Option<&'static str>,
    pub ui_control: Option<UiControl>,
    pub is_complete: bool,
    pub ready_for_blueprint: bool,
    pub missing_required: Vec<&'static str>,
}

pub struct ConversationEngine {
    max_turns: u32,
}

impl ConversationEngine {
    pub fn new(max_turns: u32) -> Self {
        Self { max_turns }
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn plan_turn(&self, mut state: ConversationState, input: Option<&UserInput>) -> TurnPlan {
        let mut user_message = None;
        let mut answered = None;

        if let Some(input) = input {
            state.set_turn(state.turn().saturating_add(1));
            let pending = state.pending_slot().and_then(|key| SLOTS.iter().find(|s| s.key == key));
            let text = display_text(pending, input);
            if !text.is_empty() {
                user_message = Some(text);
            }

            if let Some(slot) = pending {
                match bind_answer(slot, input) {
                    Some(value) => {
                        state.set_slot(slot.key, value.clone());
                        answered = Some(AnsweredSlot { key: slot.key, value });
                    }
                    None => {
                        tracing::debug!(slot = slot.key, "Answer could not be bound, asking again");
                    }
                }
            }
        }

        let missing_required: Vec<&'static str> = SLOTS
            .iter()
            .filter(|s| s.required && !state.is_answered(s.key))
            .map(|s| s.key)
            .collect();
        let ready_for_blueprint = missing_required.is_empty();
        let next = SLOTS.iter().find(|s| !state.is_answered(s.key));

        let (is_complete, next) = match next {
            None => (true, None),
            Some(_) if state.turn() >= self.max_turns => (true, None),
            Some(slot) => (false, Some(slot)),
        };

        state.set_pending_slot(next.map(|s| s.key));

        TurnPlan {
            state,
            user_message,
            answered,
            next_question: next.map(|s| s.question),
            ui_control: next.map(UiControl::for_slot),
            is_complete,
            ready_for_blueprint,
            missing_required,
        }
    }
}

fn display_text(slot: Option<&SlotSpec>, input: &UserInput) -> String {
    if let Some(slot) = slot {
        if let Some(option) = slot.options().into_iter().find(|o| o.id == input.id) {
            return option.label;
        }
    }
    input.value.trim().to_string()
}

/// Some(None) 表示跳过；None 表示无法绑定
fn bind_answer(slot: &SlotSpec, input: &UserInput) -> Option<Option<String>> {
    let value = input.value.trim();
    match slot.kind {
        SlotKind::Choice(_) => {
            if input.id == SKIP_OPTION_ID && !slot.required {
                return Some(None);
            }
            if let Some(option) = slot.options().into_iter().find(|o| o.id == input.id) {
                return Some(Some(option.label));
            }
            if value.is_empty() {
                None
            } else {
                Some(Some(value.to_string()))
            }
        }
        SlotKind::Text { .. } => {
            if !value.is_empty() {
                Some(Some(value.to_string()))
            } else if slot.required {
                None
            } else {
                Some(None)
            }
        }
    }
}
