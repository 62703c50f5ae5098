//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod analysis_handlers;
mod auto_generator_handlers;
mod blueprint_handlers;
mod chapter_handlers;
mod conversation_handlers;
mod project_handlers;
mod volume_handlers;

pub use analysis_handlers::*;
pub use auto_generator_handlers::*;
pub use blueprint_handlers::*;
pub use chapter_handlers::*;
pub use conversation_handlers::*;
pub use project_handlers::*;
pub use volume_handlers::*;

use crate::application::error::ApplicationError;
use crate::application::ports::ProjectRepositoryPort;
use crate::domain::project::{Project, ProjectId};

/// 加载项目，不存在时返回 NotFound
pub(crate) async fn load_project(
    repo: &dyn ProjectRepositoryPort,
    project_id: ProjectId,
) -> Result<Project, ApplicationError> {
    repo.find_by_id(project_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Project", project_id))
}
