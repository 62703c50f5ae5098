//! Conversation Context - 概念对话
//!
//! 通过多轮问答收集蓝图所需的故事参数。服务端不保存对话状态，
//! 状态随每轮请求由调用方回传。

mod engine;
mod slots;
mod state;

pub use engine::{AnsweredSlot, ConversationEngine, TurnPlan, UiControl, UserInput};
pub use slots::{find_slot, ChoiceOption, SlotKind, SlotSpec, SKIP_OPTION_ID, SLOTS};
pub use state::ConversationState;
