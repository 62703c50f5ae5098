//! Fake Story Generator - 用于测试和离线运行的生成器
//!
//! 不调用任何外部服务，输出由请求内容确定性地构造

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;

use crate::application::ports::{
    AnalyzeRequest, BlueprintRequest, ConverseRequest, EvaluateRequest, Evaluation,
    GeneratedBlueprint, GeneratorError, OutlineRequest, StoryGeneratorPort, VolumeNamingRequest,
    WriteChapterRequest,
};
use crate::domain::blueprint::{Blueprint, ChapterOutline, Character};
use crate::domain::project::MessageRole;

const DEFAULT_OUTLINE_LEN: u32 = 5;

/// Fake Story Generator
///
/// 可在测试中切换为失败模式，或调整蓝图大纲长度与评估推荐
pub struct FakeStoryGenerator {
    failing: AtomicBool,
    outline_len: AtomicU32,
    recommendation: RwLock<Option<usize>>,
}

impl FakeStoryGenerator {
    pub fn new() -> Self {
        Self {
            failing: AtomicBool::new(false),
            outline_len: AtomicU32::new(DEFAULT_OUTLINE_LEN),
            recommendation: RwLock::new(Some(0)),
        }
    }

    /// 失败模式下所有调用返回 503
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_outline_len(&self, len: u32) {
        self.outline_len.store(len, Ordering::SeqCst);
    }

    pub fn set_recommendation(&self, recommended: Option<usize>) {
        let mut slot = self
            .recommendation
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = recommended;
    }

    fn check(&self) -> Result<(), GeneratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GeneratorError::ServiceError {
                status: 503,
                message: "fake generator unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for FakeStoryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoryGeneratorPort for FakeStoryGenerator {
    async fn converse(&self, request: ConverseRequest) -> Result<String, GeneratorError> {
        self.check()?;

        let mut reply = match &request.answered {
            Some((slot, Some(value))) => format!("好的，{}就定为「{}」。", slot, value),
            Some((slot, None)) => format!("没关系，{}先放一放。", slot),
            None => format!("我们来聊聊《{}》吧。", request.project_title),
        };
        if request.is_complete || request.ready_for_blueprint {
            reply.push_str("设定已经足够，可以生成故事蓝图了。");
        } else if let Some(question) = &request.next_question {
            reply.push_str(question);
        }
        Ok(reply)
    }

    async fn generate_blueprint(
        &self,
        request: BlueprintRequest,
    ) -> Result<GeneratedBlueprint, GeneratorError> {
        self.check()?;

        let idea = request
            .history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_else(|| request.initial_prompt.clone());

        let mut blueprint = Blueprint {
            title: request.project_title.clone(),
            genre: "奇幻".to_string(),
            style: "第三人称".to_string(),
            tone: "热血".to_string(),
            one_sentence_summary: idea,
            full_synopsis: request.initial_prompt.clone(),
            ..Blueprint::default()
        };
        blueprint.characters.push(Character {
            name: "林晓".to_string(),
            identity: Some("主角".to_string()),
            ..Character::default()
        });
        for n in 1..=self.outline_len.load(Ordering::SeqCst) {
            blueprint.upsert_outline(ChapterOutline::new(
                n,
                format!("第{}章", n),
                format!("{}的第{}段旅程", request.project_title, n),
            ));
        }

        Ok(GeneratedBlueprint {
            blueprint,
            ai_message: "故事蓝图已生成，请确认或修改。".to_string(),
        })
    }

    async fn write_chapter(
        &self,
        request: WriteChapterRequest,
    ) -> Result<Vec<String>, GeneratorError> {
        self.check()?;

        Ok((1..=request.version_count.max(1))
            .map(|variant| {
                format!(
                    "{}\n\n“出发吧。”她说。{}（第{}章·版本{}）",
                    request.title, request.summary, request.chapter_number, variant
                )
            })
            .collect())
    }

    async fn evaluate(&self, request: EvaluateRequest) -> Result<Evaluation, GeneratorError> {
        self.check()?;

        let recommended = *self
            .recommendation
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(Evaluation {
            rationale: format!("比较了第{}章的{}个版本。", request.chapter_number, request.versions.len()),
            recommended: recommended.filter(|idx| *idx < request.versions.len()),
        })
    }

    async fn generate_outline(
        &self,
        request: OutlineRequest,
    ) -> Result<Vec<ChapterOutline>, GeneratorError> {
        self.check()?;

        Ok((request.start_chapter..request.start_chapter + request.num_chapters)
            .map(|n| ChapterOutline::new(n, format!("第{}章", n), format!("续写的第{}章", n)))
            .collect())
    }

    async fn analyze_chapter(&self, request: AnalyzeRequest) -> Result<Value, GeneratorError> {
        self.check()?;

        Ok(json!({
            "key_events": [{
                "type": "turning_point",
                "description": format!("{}中的转折", request.title),
                "importance": 6
            }],
            "foreshadowings": [],
            "character_changes": [],
            "world_extensions": {}
        }))
    }

    async fn name_volume(&self, request: VolumeNamingRequest) -> Result<String, GeneratorError> {
        self.check()?;
        Ok(format!("启程之{}", request.volume_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_request(version_count: u32) -> WriteChapterRequest {
        WriteChapterRequest {
            blueprint: Blueprint::default(),
            chapter_number: 1,
            title: "启程".into(),
            summary: "离开故乡".into(),
            prior_chapters: vec![],
            previous_excerpt: None,
            version_count,
        }
    }

    #[tokio::test]
    async fn test_versions_match_requested_count() {
        let generator = FakeStoryGenerator::new();
        let versions = generator.write_chapter(write_request(3)).await.unwrap();
        assert_eq!(versions.len(), 3);
        assert!(versions.iter().all(|v| !v.is_empty()));
    }

    #[tokio::test]
    async fn test_failing_mode_is_retryable() {
        let generator = FakeStoryGenerator::new();
        generator.set_failing(true);
        let err = generator.write_chapter(write_request(1)).await.unwrap_err();
        assert!(err.is_retryable());

        generator.set_failing(false);
        assert!(generator.write_chapter(write_request(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_recommendation_is_bounded() {
        let generator = FakeStoryGenerator::new();
        generator.set_recommendation(Some(4));
        let evaluation = generator
            .evaluate(EvaluateRequest {
                blueprint: Blueprint::default(),
                chapter_number: 1,
                title: "启程".into(),
                summary: String::new(),
                versions: vec!["a".into(), "b".into()],
            })
            .await
            .unwrap();
        assert_eq!(evaluation.recommended, None);
    }
}
