//! 对话状态
//!
//! 状态由调用方原样回传。引擎只读写 `slots`、`pending_slot`、`turn` 三个键，
//! 其它键原样保留；缺失或类型不对的键视为不存在。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::slots::find_slot;

const SLOTS_KEY: &str = "slots";
const PENDING_KEY: &str = "pending_slot";
const TURN_KEY: &str = "turn";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationState(Map<String, Value>);

impl ConversationState {
    /// 非对象输入按空状态处理
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// 已回答的槽位；值为 None 表示已跳过
    pub fn slots(&self) -> BTreeMap<String, Option<String>> {
        self.0
            .get(SLOTS_KEY)
            .and_then(Value::as_object)
            .map(|slots| {
                slots
                    .iter()
                    .filter(|(key, _)| find_slot(key).is_some())
                    .filter_map(|(key, value)| match value {
                        Value::String(s) => Some((key.clone(), Some(s.clone()))),
                        Value::Null => Some((key.clone(), None)),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_answered(&self, key: &str) -> bool {
        self.slots().contains_key(key)
    }

    pub fn slot_value(&self, key: &str) -> Option<String> {
        self.slots().get(key).cloned().flatten()
    }

    pub fn set_slot(&mut self, key: &str, value: Option<String>) {
        let entry = self
            .0
            .entry(SLOTS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(slots) = entry {
            slots.insert(key.to_string(), value.map(Value::String).unwrap_or(Value::Null));
        }
    }

    /// 等待回答的槽位，未知槽位名视为不存在
    pub fn pending_slot(&self) -> Option<&'static str> {
        self.0
            .get(PENDING_KEY)
            .and_then(Value::as_str)
            .and_then(find_slot)
            .map(|slot| slot.key)
    }

    pub fn set_pending_slot(&mut self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.0.insert(PENDING_KEY.to_string(), Value::String(key.to_string()));
            }
            None => {
                self.0.insert(PENDING_KEY.to_string(), Value::Null);
            }
        }
    }

    pub fn turn(&self) -> u32 {
        self.0
            .get(TURN_KEY)
            .and_then(Value::as_u64)
            .map(|t| t.min(u32::MAX as u64) as u32)
            .unwrap_or(0)
    }

    pub fn set_turn(&mut self, turn: u32) {
        self.0.insert(TURN_KEY.to_string(), Value::from(turn));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_garbage_state_is_empty() {
        for raw in [json!(null), json!("x"), json!([1, 2])] {
            let state = ConversationState::from_value(raw);
            assert!(state.slots().is_empty());
            assert_eq!(state.pending_slot(), None);
            assert_eq!(state.turn(), 0);
        }
    }

    #[test]
    fn test_wrong_types_are_ignored() {
        let state = ConversationState::from_value(json!({
            "slots": { "genre": 3, "tone": null, "mood": "x", "protagonist": "林夜" },
            "pending_slot": "unknown",
            "turn": "five"
        }));
        let slots = state.slots();
        assert!(!slots.contains_key("genre"));
        assert_eq!(slots.get("tone"), Some(&None));
        assert!(!slots.contains_key("mood"));
        assert_eq!(state.slot_value("protagonist").as_deref(), Some("林夜"));
        assert_eq!(state.pending_slot(), None);
        assert_eq!(state.turn(), 0);
    }

    #[test]
    fn test_unknown_keys_survive_updates() {
        let mut state = ConversationState::from_value(json!({
            "client_cache": { "scroll": 120 },
            "slots": "corrupted"
        }));
        state.set_slot("genre", Some("奇幻".into()));
        state.set_turn(2);

        let value = state.into_value();
        assert_eq!(value["client_cache"]["scroll"], 120);
        assert_eq!(value["slots"]["genre"], "奇幻");
        assert_eq!(value["turn"], 2);
    }
}
