use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::FilterCriteria;
use super::paper::PaperMetadata;
use super::question::QuestionEntity;

/// 持久化快照：`{metadata, finalQuestionList, timestamp}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperSnapshot {
    pub metadata: PaperMetadata,
    pub final_question_list: Vec<QuestionEntity>,
    pub timestamp: DateTime<Utc>,
}

impl PaperSnapshot {
    pub fn new(metadata: PaperMetadata, final_question_list: Vec<QuestionEntity>) -> Self {
        Self {
            metadata,
            final_question_list,
            timestamp: Utc::now(),
        }
    }
}

/// 偏好设置：上次使用的课程体系 / 科目 / 知识点
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub last_curriculum: Option<String>,
    #[serde(default)]
    pub last_subject: Option<String>,
    #[serde(default)]
    pub last_topic: Option<String>,
}

impl Preferences {
    /// 作为默认筛选条件
    pub fn to_filter(&self) -> FilterCriteria {
        FilterCriteria {
            curriculum: self.last_curriculum.clone(),
            subject: self.last_subject.clone(),
            topic: self.last_topic.clone(),
            ..Default::default()
        }
    }

    pub fn from_filter(filter: &FilterCriteria) -> Self {
        Self {
            last_curriculum: filter.curriculum.clone(),
            last_subject: filter.subject.clone(),
            last_topic: filter.topic.clone(),
        }
    }
}
