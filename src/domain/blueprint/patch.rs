//! Blueprint Context - 部分更新
//!
//! 只替换补丁中出现的顶层键；嵌套对象按键整体替换，不做深合并。

use serde_json::{Map, Value};

use super::{Blueprint, BlueprintError};

impl Blueprint {
    /// 应用 PATCH，返回新的蓝图，自身不变
    pub fn apply_patch(&self, patch: &Value) -> Result<Blueprint, BlueprintError> {
        let patch = patch.as_object().ok_or(BlueprintError::PatchNotObject)?;

        if let Some(unknown) = patch.keys().find(|key| !Self::FIELDS.contains(&key.as_str())) {
            return Err(BlueprintError::UnknownField(unknown.clone()));
        }

        let mut merged: Map<String, Value> = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(BlueprintError::InvalidValue(e.to_string())),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }

        let mut updated: Blueprint = serde_json::from_value(Value::Object(merged))
            .map_err(|e| BlueprintError::InvalidValue(e.to_string()))?;
        updated.validate()?;
        updated.sort_outline();
        Ok(updated)
    }
}
