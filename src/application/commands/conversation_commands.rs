//! Conversation Commands

use serde_json::Value;

use crate::domain::conversation::UserInput;
use crate::domain::project::ProjectId;

/// 概念对话一轮
#[derive(Debug, Clone)]
pub struct Converse {
    pub project_id: ProjectId,
    /// 首轮为 None，由系统开场
    pub user_input: Option<UserInput>,
    /// 调用方回传的对话状态
    pub conversation_state: Value,
}
