//! 内容服务 - 业务能力层
//!
//! 只负责"按条件生成候选题目"，不关心题池和流程。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（自定义端点和模型）
//! - 返回内容按 JSON 宽松解析

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::future::Future;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ProviderError;
use crate::models::filter::FilterCriteria;
use crate::models::question::{
    Difficulty, MatchingPair, QuestionDraft, QuestionId, QuestionPayload, QuestionType, SubPart,
};
use crate::utils::truncate_text;

/// 生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRequest {
    pub criteria: FilterCriteria,
    pub desired_count: usize,
    /// 已存在的题目 ID（提示服务避免重复）
    pub existing_ids: Vec<QuestionId>,
}

/// 生成结果：有序的候选题目，外加可选的建议标题
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentResponse {
    pub drafts: Vec<QuestionDraft>,
    pub suggested_title: Option<String>,
}

/// 内容服务接口
///
/// 返回的 future 必须是 `Send`，补题任务会被 spawn 到运行时上。
pub trait ContentProvider: Send + Sync + 'static {
    fn generate(
        &self,
        request: ContentRequest,
    ) -> impl Future<Output = Result<ContentResponse, ProviderError>> + Send;
}

/// 基于 LLM 的内容服务
pub struct LlmContentProvider {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmContentProvider {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用
    async fn send_to_llm(&self, user_message: &str, system_message: &str) -> Result<String, ProviderError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(build_err)?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(build_err)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.7)
            .max_tokens(2048u32)
            .build()
            .map_err(build_err)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            ProviderError::ApiCallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            }
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        debug!("LLM 返回: {}", truncate_text(&content, 80));
        Ok(content.trim().to_string())
    }
}

impl ContentProvider for LlmContentProvider {
    fn generate(
        &self,
        request: ContentRequest,
    ) -> impl Future<Output = Result<ContentResponse, ProviderError>> + Send {
        async move {
            let (user_message, system_message) = build_messages(&request);
            let response = self.send_to_llm(&user_message, &system_message).await?;
            parse_response(&response, &request.criteria)
        }
    }
}

fn build_err(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::RequestBuild(e.to_string())
}

/// 构建提示词，返回 (user_message, system_message)
fn build_messages(request: &ContentRequest) -> (String, String) {
    let system_message = "你是一名经验丰富的命题老师。只输出 JSON，不要输出任何解释。".to_string();

    let type_hint = request
        .criteria
        .question_type
        .and_then(|t| serde_json::to_value(t).ok())
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_else(|| "任意题型".to_string());
    let existing: Vec<&str> = request.existing_ids.iter().map(|id| id.as_str()).collect();

    let user_message = format!(
        r#"请生成 {count} 道题目。

条件：{criteria}
题型：{type_hint}
已有题目 ID（不要重复这些题目的内容）：{existing:?}

返回格式：
{{"title": "建议的试卷标题", "questions": [
  {{"body": "题干（可含 HTML）", "marks": 2, "difficulty": "easy|medium|hard", "topic": "知识点",
    "question_type": "multiple_choice|true_false|matching|fill_in_blank|numeric|short_answer|essay|structured|practical_oral",
    "options": ["选项"], "pairs": [{{"left": "", "right": ""}}], "sub_parts": [{{"body": "", "marks": 1}}],
    "unit": "单位", "answer_lines": 10}}
]}}
不需要的字段可以省略。"#,
        count = request.desired_count,
        criteria = request.criteria.describe(),
        type_hint = type_hint,
        existing = existing,
    );

    (user_message, system_message)
}

/// LLM 返回的单个题目（字段都可缺省）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQuestion {
    #[serde(alias = "stem", alias = "question")]
    body: String,
    #[serde(alias = "score")]
    marks: Option<JsonValue>,
    difficulty: Option<String>,
    topic: Option<String>,
    #[serde(alias = "type")]
    question_type: Option<String>,
    options: Vec<String>,
    pairs: Vec<MatchingPair>,
    sub_parts: Vec<RawSubPart>,
    unit: Option<String>,
    answer_lines: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSubPart {
    body: String,
    marks: Option<JsonValue>,
}

/// 分值可能是数字或字符串，0 或无法解析时取 1
fn lenient_marks(value: Option<&JsonValue>) -> u32 {
    let marks = match value {
        Some(JsonValue::Number(n)) => n.as_f64().map(|f| f.round().max(0.0) as u32),
        Some(JsonValue::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    marks.unwrap_or(1).max(1)
}

fn parse_difficulty(raw: Option<&str>) -> Difficulty {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("easy") | Some("简单") => Difficulty::Easy,
        Some("hard") | Some("困难") => Difficulty::Hard,
        _ => Difficulty::Medium,
    }
}

impl RawQuestion {
    fn into_draft(self, criteria: &FilterCriteria) -> Option<QuestionDraft> {
        if self.body.trim().is_empty() {
            return None;
        }
        let question_type = self
            .question_type
            .as_deref()
            .and_then(QuestionType::parse)
            .or(criteria.question_type)
            .unwrap_or(QuestionType::ShortAnswer);

        let payload = if !self.sub_parts.is_empty() {
            Some(QuestionPayload::SubParts {
                parts: self
                    .sub_parts
                    .into_iter()
                    .filter(|p| !p.body.trim().is_empty())
                    .map(|p| SubPart {
                        marks: lenient_marks(p.marks.as_ref()),
                        body: p.body,
                    })
                    .collect(),
            })
        } else if !self.pairs.is_empty() {
            Some(QuestionPayload::Matching { pairs: self.pairs })
        } else if !self.options.is_empty() {
            Some(QuestionPayload::Options { options: self.options })
        } else {
            None
        };

        Some(QuestionDraft {
            body: self.body,
            marks: lenient_marks(self.marks.as_ref()),
            difficulty: parse_difficulty(self.difficulty.as_deref()),
            topic: self
                .topic
                .or_else(|| criteria.topic.clone())
                .unwrap_or_default(),
            question_type,
            payload,
            answer_lines: self.answer_lines,
            unit: self.unit,
        })
    }
}

/// 去掉 markdown 代码块，截取第一个 JSON 数组或对象
fn extract_json(response: &str) -> Option<&str> {
    let start = response.find(|c| c == '[' || c == '{')?;
    let closing = if response[start..].starts_with('[') { ']' } else { '}' };
    let end = response.rfind(closing)?;
    (end > start).then(|| &response[start..=end])
}

/// 宽松解析 LLM 的返回
pub fn parse_response(response: &str, criteria: &FilterCriteria) -> Result<ContentResponse, ProviderError> {
    let json = extract_json(response).ok_or_else(|| ProviderError::MalformedResponse {
        reason: format!("未找到 JSON: {}", truncate_text(response, 60)),
    })?;
    let value: JsonValue = serde_json::from_str(json).map_err(|e| ProviderError::MalformedResponse {
        reason: e.to_string(),
    })?;

    let (items, suggested_title) = match value {
        JsonValue::Array(items) => (items, None),
        JsonValue::Object(mut map) => {
            let title = map
                .get("title")
                .or_else(|| map.get("suggested_title"))
                .and_then(|t| t.as_str())
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
            match map.remove("questions") {
                Some(JsonValue::Array(items)) => (items, title),
                _ => (vec![JsonValue::Object(map)], title),
            }
        }
        _ => {
            return Err(ProviderError::MalformedResponse {
                reason: "返回的不是数组或对象".to_string(),
            })
        }
    };

    let total = items.len();
    let drafts: Vec<QuestionDraft> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawQuestion>(item).ok())
        .filter_map(|raw| raw.into_draft(criteria))
        .collect();
    if drafts.len() < total {
        debug!("丢弃 {} 个无效题目", total - drafts.len());
    }

    Ok(ContentResponse {
        drafts,
        suggested_title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_object_with_title() {
        let response = r#"好的，以下是题目：
```json
{"title": "函数单元测验", "questions": [
  {"body": "求 f(x)=x^2 的最小值", "marks": 3, "difficulty": "easy", "question_type": "numeric", "unit": "无"},
  {"body": "   ", "marks": 2},
  {"stem": "判断：奇函数的图像关于原点对称", "type": "判断题", "marks": 0}
]}
```"#;
        let parsed = parse_response(response, &FilterCriteria::default()).unwrap();
        assert_eq!(parsed.suggested_title.as_deref(), Some("函数单元测验"));
        assert_eq!(parsed.drafts.len(), 2);
        assert_eq!(parsed.drafts[0].question_type, QuestionType::Numeric);
        assert_eq!(parsed.drafts[0].difficulty, Difficulty::Easy);
        assert_eq!(parsed.drafts[1].question_type, QuestionType::TrueFalse);
        assert_eq!(parsed.drafts[1].marks, 1);
    }

    #[test]
    fn test_parse_bare_array_falls_back_to_criteria() {
        let criteria = FilterCriteria {
            topic: Some("三角函数".into()),
            question_type: Some(QuestionType::MultipleChoice),
            ..Default::default()
        };
        let response = r#"[{"body": "sin 30° = ?", "marks": "2", "options": ["1/2", "1", "0"]}]"#;
        let parsed = parse_response(response, &criteria).unwrap();
        let draft = &parsed.drafts[0];
        assert_eq!(draft.question_type, QuestionType::MultipleChoice);
        assert_eq!(draft.topic, "三角函数");
        assert_eq!(draft.marks, 2);
        assert!(matches!(draft.payload, Some(QuestionPayload::Options { ref options }) if options.len() == 3));
    }

    #[test]
    fn test_sub_parts_drive_payload() {
        let response = r#"{"body": "阅读材料", "question_type": "structured",
            "sub_parts": [{"body": "概括", "marks": 2}, {"body": "分析", "marks": 4}]}"#;
        let parsed = parse_response(response, &FilterCriteria::default()).unwrap();
        let entity = parsed.drafts[0].clone().into_entity(QuestionId::new("q-000001"));
        assert_eq!(entity.marks, 6);
    }

    #[test]
    fn test_unparsable_response_is_an_error() {
        let err = parse_response("抱歉，我无法完成", &FilterCriteria::default()).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    /// 需要真实的 API Key
    #[tokio::test]
    #[ignore]
    async fn test_generate_against_live_endpoint() {
        let _ = tracing_subscriber::fmt::try_init();
        let provider = LlmContentProvider::new(&Config::from_env());
        let response = provider
            .generate(ContentRequest {
                criteria: FilterCriteria {
                    subject: Some("数学".into()),
                    topic: Some("二次函数".into()),
                    ..Default::default()
                },
                desired_count: 2,
                existing_ids: Vec::new(),
            })
            .await
            .unwrap();
        assert!(!response.drafts.is_empty());
    }
}
