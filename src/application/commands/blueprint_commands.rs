//! Blueprint Commands

use serde_json::Value;

use crate::domain::blueprint::Blueprint;
use crate::domain::project::ProjectId;

/// 根据对话生成蓝图草稿（不落库）
#[derive(Debug, Clone)]
pub struct GenerateBlueprint {
    pub project_id: ProjectId,
}

/// 整体保存蓝图
#[derive(Debug, Clone)]
pub struct SaveBlueprint {
    pub project_id: ProjectId,
    pub blueprint: Blueprint,
}

/// 按顶层键部分更新蓝图
#[derive(Debug, Clone)]
pub struct UpdateBlueprint {
    pub project_id: ProjectId,
    pub patch: Value,
}
