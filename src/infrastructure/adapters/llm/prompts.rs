//! 提示词构造与模型输出解析
//!
//! 模型输出经常带 markdown 代码块或前后缀说明，解析时先截取 JSON 主体再反序列化。

use serde::Serialize;
use serde_json::Value;

use crate::application::ports::{
    AnalyzeRequest, BlueprintRequest, ConverseRequest, EvaluateRequest, Evaluation,
    GeneratorError, OutlineRequest, VolumeNamingRequest, WriteChapterRequest,
};
use crate::domain::blueprint::{Blueprint, ChapterOutline};
use crate::domain::project::ConversationMessage;

/// chat completions 的消息
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

impl From<&ConversationMessage> for ChatMessage {
    fn from(message: &ConversationMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
        }
    }
}

fn blueprint_brief(blueprint: &Blueprint) -> String {
    let mut brief = format!(
        "书名：{}\n类型：{}\n风格：{}\n基调：{}\n一句话简介：{}\n",
        blueprint.title, blueprint.genre, blueprint.style, blueprint.tone,
        blueprint.one_sentence_summary
    );
    if !blueprint.full_synopsis.is_empty() {
        brief.push_str(&format!("故事梗概：{}\n", blueprint.full_synopsis));
    }
    if !blueprint.characters.is_empty() {
        let names: Vec<&str> = blueprint.characters.iter().map(|c| c.name.as_str()).collect();
        brief.push_str(&format!("主要角色：{}\n", names.join("、")));
    }
    brief
}

// ============================================================================
// 提示词
// ============================================================================

pub fn converse_messages(request: &ConverseRequest) -> Vec<ChatMessage> {
    let mut guidance = format!(
        "你是一位小说策划编辑，正在和作者讨论新书《{}》的构思。作者最初的想法：{}\n\
         用简短、友好的中文回复，每次只推进一个话题。",
        request.project_title, request.initial_prompt
    );
    if let Some((slot, value)) = &request.answered {
        match value {
            Some(v) => guidance.push_str(&format!("\n作者刚刚确定了「{}」：{}，先简单回应。", slot, v)),
            None => guidance.push_str(&format!("\n作者跳过了「{}」，不要追问。", slot)),
        }
    }
    if request.is_complete || request.ready_for_blueprint {
        guidance.push_str("\n设定已经足够，告诉作者可以生成故事蓝图了，不要再提问。");
    } else if let Some(question) = &request.next_question {
        guidance.push_str(&format!("\n接下来请向作者询问：{}", question));
    }

    let mut messages = vec![ChatMessage::system(guidance)];
    messages.extend(request.history.iter().map(ChatMessage::from));
    messages
}

pub fn blueprint_messages(request: &BlueprintRequest) -> Vec<ChatMessage> {
    let dialogue: Vec<String> = request
        .history
        .iter()
        .map(|m| format!("{}：{}", m.role.as_str(), m.content))
        .collect();

    vec![
        ChatMessage::system(
            "你是小说架构师。根据构思对话输出故事蓝图，只输出一个 JSON 对象，字段：\
             title, target_audience, genre, style, tone, one_sentence_summary, full_synopsis, \
             world_setting{core_rules, key_locations, factions}, characters[{name, identity, personality, goals, abilities, relationship_to_protagonist}], \
             relationships[{character_from, character_to, description}], \
             chapter_outline[{chapter_number, title, summary}], ai_message。\
             chapter_number 从 1 开始连续编号，ai_message 是给作者的一句话说明。",
        ),
        ChatMessage::user(format!(
            "书名：{}\n最初想法：{}\n构思对话：\n{}",
            request.project_title,
            request.initial_prompt,
            dialogue.join("\n")
        )),
    ]
}

pub fn chapter_messages(request: &WriteChapterRequest, variant: u32) -> Vec<ChatMessage> {
    let mut context = blueprint_brief(&request.blueprint);
    if !request.prior_chapters.is_empty() {
        context.push_str("前文概要：\n");
        for prior in &request.prior_chapters {
            context.push_str(&format!(
                "第{}章 {}：{}\n",
                prior.chapter_number, prior.title, prior.summary
            ));
        }
    }
    if let Some(excerpt) = &request.previous_excerpt {
        context.push_str(&format!("上一章结尾：\n{}\n", excerpt));
    }

    vec![
        ChatMessage::system(format!(
            "你是职业小说作者。根据蓝图写作指定章节的完整正文，只输出正文。\
             这是第 {} 个候选版本，尝试与其它版本不同的写法。",
            variant + 1
        )),
        ChatMessage::user(format!(
            "{}\n现在写第{}章《{}》。\n本章大纲：{}",
            context, request.chapter_number, request.title, request.summary
        )),
    ]
}

pub fn evaluate_messages(request: &EvaluateRequest) -> Vec<ChatMessage> {
    let versions: Vec<String> = request
        .versions
        .iter()
        .enumerate()
        .map(|(i, v)| format!("【版本{}】\n{}", i + 1, v))
        .collect();

    vec![
        ChatMessage::system(
            "你是资深小说编辑。比较同一章节的多个候选版本，只输出 JSON：\
             {\"recommended_version\": 版本号(从1开始), \"rationale\": \"评价与理由\"}",
        ),
        ChatMessage::user(format!(
            "{}\n第{}章《{}》大纲：{}\n\n{}",
            blueprint_brief(&request.blueprint),
            request.chapter_number,
            request.title,
            request.summary,
            versions.join("\n\n")
        )),
    ]
}

pub fn outline_messages(request: &OutlineRequest) -> Vec<ChatMessage> {
    let existing: Vec<String> = request
        .blueprint
        .chapter_outline
        .iter()
        .map(|o| format!("第{}章 {}：{}", o.chapter_number, o.title, o.summary))
        .collect();
    let end = request.start_chapter + request.num_chapters - 1;

    vec![
        ChatMessage::system(
            "你是小说大纲策划。续写章节大纲，只输出 JSON：\
             {\"chapters\": [{\"chapter_number\": 章节号, \"title\": \"标题\", \"summary\": \"摘要\"}]}",
        ),
        ChatMessage::user(format!(
            "{}\n已有大纲：\n{}\n请写第{}章到第{}章的大纲。",
            blueprint_brief(&request.blueprint),
            existing.join("\n"),
            request.start_chapter,
            end
        )),
    ]
}

pub fn analyze_messages(request: &AnalyzeRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "你是小说分析师。分析章节内容，只输出 JSON 对象，字段：\
             key_events[{type, description, importance(1-10)}], \
             foreshadowings[{type, description, confidence(0-1)}], \
             character_changes[{name, changes, growth_level(0-10)}], \
             world_extensions{locations[], factions[], rules[]}。\
             type 取值如 climax、catastrophe、turning_point、revelation、setup。",
        ),
        ChatMessage::user(format!(
            "第{}章《{}》\n\n{}",
            request.chapter_number, request.title, request.content
        )),
    ]
}

pub fn volume_name_messages(request: &VolumeNamingRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("你是小说编辑。为一卷内容起一个二到八个字的卷名，只输出卷名本身。"),
        ChatMessage::user(format!(
            "第{}卷，包含第{}章到第{}章：\n{}",
            request.volume_number,
            request.start_chapter,
            request.end_chapter,
            request.chapter_notes.join("\n")
        )),
    ]
}

// ============================================================================
// 输出解析
// ============================================================================

/// 截取模型输出中的 JSON 主体（去掉代码块与前后说明）
pub fn extract_json(raw: &str) -> Result<Value, GeneratorError> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&trimmed[start..=end])
            .map_err(|e| GeneratorError::InvalidResponse(format!("malformed JSON: {}", e))),
        _ => Err(GeneratorError::InvalidResponse(
            "response contains no JSON".to_string(),
        )),
    }
}

/// 解析蓝图；兼容 `{"blueprint": {...}, "ai_message": ...}` 包装
pub fn parse_blueprint(raw: &str) -> Result<(Blueprint, Option<String>), GeneratorError> {
    let value = extract_json(raw)?;
    let ai_message = value
        .get("ai_message")
        .and_then(Value::as_str)
        .map(str::to_string);
    let body = value.get("blueprint").cloned().unwrap_or(value);

    let blueprint: Blueprint = serde_json::from_value(body)
        .map_err(|e| GeneratorError::InvalidResponse(format!("invalid blueprint: {}", e)))?;
    Ok((blueprint, ai_message))
}

/// 解析评估结果；推荐版本号从 1 开始，超出范围时视为没有推荐
pub fn parse_evaluation(raw: &str, version_count: usize) -> Evaluation {
    let Ok(value) = extract_json(raw) else {
        return Evaluation {
            rationale: raw.trim().to_string(),
            recommended: None,
        };
    };

    let recommended = ["recommended_version", "best_version", "best_choice"]
        .iter()
        .find_map(|key| value.get(*key))
        .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
        .and_then(|n| (n as usize).checked_sub(1))
        .filter(|idx| *idx < version_count);

    let rationale = ["rationale", "evaluation", "reason"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());

    Evaluation {
        rationale,
        recommended,
    }
}

/// 解析续写的大纲；兼容 `{"chapters": [...]}` 与裸数组
pub fn parse_outline(raw: &str) -> Result<Vec<ChapterOutline>, GeneratorError> {
    let value = extract_json(raw)?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("chapters")
            .or_else(|| map.remove("chapter_outline"))
            .ok_or_else(|| GeneratorError::InvalidResponse("outline list missing".to_string()))?,
        _ => {
            return Err(GeneratorError::InvalidResponse(
                "outline must be a list".to_string(),
            ))
        }
    };

    serde_json::from_value(list)
        .map_err(|e| GeneratorError::InvalidResponse(format!("invalid outline: {}", e)))
}

/// 分析结果必须是 JSON 对象
pub fn parse_analysis(raw: &str) -> Result<Value, GeneratorError> {
    match extract_json(raw)? {
        value @ Value::Object(_) => Ok(value),
        _ => Err(GeneratorError::InvalidResponse(
            "analysis must be a JSON object".to_string(),
        )),
    }
}
