//! Conversation Command Handlers

use serde_json::Value;
use std::sync::Arc;

use super::load_project;
use crate::application::commands::Converse;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ConverseRequest, MutationGuardPort, MutationScope, ProjectRepositoryPort, StoryGeneratorPort,
};
use crate::domain::conversation::{ConversationEngine, ConversationState, UiControl};
use crate::domain::project::ConversationMessage;

/// 对话一轮的响应
#[derive(Debug, Clone)]
pub struct ConverseResponse {
    pub ai_message: String,
    pub ui_control: Option<UiControl>,
    pub conversation_state: Value,
    pub is_complete: bool,
    pub ready_for_blueprint: bool,
}

/// Converse Handler
pub struct ConverseHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    generator: Arc<dyn StoryGeneratorPort>,
    mutation_guard: Arc<dyn MutationGuardPort>,
    engine: ConversationEngine,
}

impl ConverseHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        generator: Arc<dyn StoryGeneratorPort>,
        mutation_guard: Arc<dyn MutationGuardPort>,
        max_turns: u32,
    ) -> Self {
        Self {
            project_repo,
            generator,
            mutation_guard,
            engine: ConversationEngine::new(max_turns),
        }
    }

    pub async fn handle(&self, command: Converse) -> Result<ConverseResponse, ApplicationError> {
        let _guard = self
            .mutation_guard
            .try_acquire(command.project_id, MutationScope::Project)?;
        let project = load_project(self.project_repo.as_ref(), command.project_id).await?;

        let state = ConversationState::from_value(command.conversation_state);
        let plan = self.engine.plan_turn(state, command.user_input.as_ref());

        let mut history = project.conversation_history().to_vec();
        let user_message = plan.user_message.clone().map(ConversationMessage::user);
        history.extend(user_message.clone());

        let request = ConverseRequest {
            project_title: project.title().to_string(),
            initial_prompt: project.initial_prompt().to_string(),
            history,
            answered: plan
                .answered
                .as_ref()
                .map(|a| (a.key.to_string(), a.value.clone())),
            next_question: plan.next_question.map(str::to_string),
            is_complete: plan.is_complete,
            ready_for_blueprint: plan.ready_for_blueprint,
        };

        let ai_message = self.generator.converse(request).await.map_err(|e| {
            tracing::warn!(
                project_id = %command.project_id,
                error = %e,
                "Conversation turn failed"
            );
            ApplicationError::capability(format!("对话生成失败: {}", e))
        })?;

        let mut messages: Vec<ConversationMessage> = user_message.into_iter().collect();
        messages.push(ConversationMessage::assistant(ai_message.clone()));
        self.project_repo
            .append_messages(command.project_id, &messages)
            .await?;

        tracing::debug!(
            project_id = %command.project_id,
            turn = plan.state.turn(),
            is_complete = plan.is_complete,
            ready_for_blueprint = plan.ready_for_blueprint,
            "Conversation turn completed"
        );

        Ok(ConverseResponse {
            ai_message,
            ui_control: plan.ui_control,
            conversation_state: plan.state.into_value(),
            is_complete: plan.is_complete,
            ready_for_blueprint: plan.ready_for_blueprint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::TestContext;
    use crate::domain::conversation::UserInput;
    use crate::domain::project::Project;
    use serde_json::json;

    fn handler(ctx: &TestContext) -> ConverseHandler {
        ConverseHandler::new(
            ctx.repo.clone(),
            ctx.generator.clone(),
            ctx.guard.clone(),
            12,
        )
    }

    async fn new_project(ctx: &TestContext) -> Project {
        let project = Project::new("破晓", "永夜之城").unwrap();
        ctx.repo.create(&project).await.unwrap();
        project
    }

    #[tokio::test]
    async fn test_opening_turn_offers_choices() {
        let ctx = TestContext::new().await;
        let project = new_project(&ctx).await;

        let response = handler(&ctx)
            .handle(Converse {
                project_id: project.id(),
                user_input: None,
                conversation_state: json!({}),
            })
            .await
            .unwrap();

        assert!(!response.ai_message.is_empty());
        assert!(!response.is_complete);
        match response.ui_control {
            Some(UiControl::SingleChoice { options }) => assert!(!options.is_empty()),
            other => panic!("expected single choice, got {:?}", other),
        }

        let stored = ctx.repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert_eq!(stored.conversation_history().len(), 1);
    }

    #[tokio::test]
    async fn test_answer_appends_both_messages_and_keeps_unknown_state() {
        let ctx = TestContext::new().await;
        let project = new_project(&ctx).await;
        let handler = handler(&ctx);

        let first = handler
            .handle(Converse {
                project_id: project.id(),
                user_input: None,
                conversation_state: json!({ "client": "web" }),
            })
            .await
            .unwrap();
        let second = handler
            .handle(Converse {
                project_id: project.id(),
                user_input: Some(UserInput {
                    id: "fantasy".into(),
                    value: String::new(),
                }),
                conversation_state: first.conversation_state,
            })
            .await
            .unwrap();

        assert_eq!(second.conversation_state["client"], "web");
        assert_eq!(second.conversation_state["slots"]["genre"], "奇幻");
        let stored = ctx.repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert_eq!(stored.conversation_history().len(), 3);
    }

    #[tokio::test]
    async fn test_generator_failure_appends_nothing() {
        let ctx = TestContext::new().await;
        let project = new_project(&ctx).await;
        ctx.generator.set_failing(true);

        let result = handler(&ctx)
            .handle(Converse {
                project_id: project.id(),
                user_input: Some(UserInput {
                    id: "text".into(),
                    value: "你好".into(),
                }),
                conversation_state: json!({}),
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::CapabilityFailure(_))));
        let stored = ctx.repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert!(stored.conversation_history().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let ctx = TestContext::new().await;
        let result = handler(&ctx)
            .handle(Converse {
                project_id: crate::domain::project::ProjectId::new(),
                user_input: None,
                conversation_state: json!({}),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }
}
