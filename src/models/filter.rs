use serde::{Deserialize, Serialize};

use super::question::{Difficulty, QuestionEntity, QuestionType};

/// 题库筛选条件
///
/// curriculum / subject 只用于向内容服务描述需求；
/// topic / difficulty / question_type 同时用于本地筛选。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub curriculum: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub question_type: Option<QuestionType>,
}

impl FilterCriteria {
    pub fn matches(&self, question: &QuestionEntity) -> bool {
        if let Some(topic) = &self.topic {
            if !topic_matches(topic, &question.topic) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if question.difficulty != difficulty {
                return false;
            }
        }
        if let Some(question_type) = self.question_type {
            if question.question_type != question_type {
                return false;
            }
        }
        true
    }

    /// 用于日志 / 提示词的简短描述
    pub fn describe(&self) -> String {
        let parts: Vec<String> = [
            self.curriculum.clone(),
            self.subject.clone(),
            self.topic.clone(),
            self.difficulty.map(|d| d.name().to_string()),
            self.question_type.map(|t| t.name().to_string()),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect();

        if parts.is_empty() {
            "不限".to_string()
        } else {
            parts.join(" / ")
        }
    }
}

/// 自由文本知识点匹配：忽略大小写，筛选词的每个词元都需出现在知识点中
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let topic = topic.trim().to_lowercase();
    filter
        .split_whitespace()
        .all(|token| topic.contains(&token.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionId;

    #[test]
    fn test_topic_tokens_must_all_appear() {
        assert!(topic_matches("quadratic roots", "Quadratic equations: roots"));
        assert!(!topic_matches("quadratic graphs", "Quadratic equations: roots"));
        assert!(topic_matches("", "anything"));
    }

    #[test]
    fn test_filter_matches_type_and_difficulty() {
        let q = QuestionEntity::new(QuestionId::new("q-1"), "x", 2, QuestionType::Essay)
            .with_topic("World War I")
            .with_difficulty(Difficulty::Hard);
        let mut filter = FilterCriteria {
            topic: Some("war".into()),
            ..Default::default()
        };
        assert!(filter.matches(&q));
        filter.question_type = Some(QuestionType::Numeric);
        assert!(!filter.matches(&q));
    }
}
