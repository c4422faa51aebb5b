use serde::{Deserialize, Serialize};

use super::question::{QuestionEntity, QuestionId, QuestionType};

/// 组卷模板中的一个大题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub label: String,
    pub question_type: QuestionType,
    pub required_count: usize,
    pub marks_per_question: u32,
    #[serde(default)]
    pub topic_filter: Option<String>,
}

/// 命名组卷模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamTemplate {
    pub name: String,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}

impl ExamTemplate {
    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|s| s.required_count).sum()
    }
}

/// 一个大题的分配结果
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedSection {
    pub label: String,
    pub question_type: QuestionType,
    pub questions: Vec<QuestionEntity>,
}

impl AllocatedSection {
    pub fn total_marks(&self) -> u32 {
        self.questions.iter().map(|q| q.marks).sum()
    }

    pub fn contains(&self, id: &QuestionId) -> bool {
        self.questions.iter().any(|q| &q.id == id)
    }
}

/// 按模板分配的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionAllocation {
    pub sections: Vec<AllocatedSection>,
    /// 每个大题都凑够了题目
    pub complete: bool,
    /// 缺题提示，格式 `"<label>: need N, found M"`
    pub warnings: Vec<String>,
}

impl SectionAllocation {
    /// 按大题顺序展开的全部题目
    pub fn questions(&self) -> Vec<QuestionEntity> {
        self.sections
            .iter()
            .flat_map(|s| s.questions.iter().cloned())
            .collect()
    }

    /// 题目所属大题的下标
    pub fn section_of(&self, id: &QuestionId) -> Option<usize> {
        self.sections.iter().position(|s| s.contains(id))
    }
}
