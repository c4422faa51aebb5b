//! 按模板组卷 - 业务能力层
//!
//! 确定性策略：
//! 1. 按模板顺序逐个大题分配，每道题最多用一次
//! 2. 题型一致且知识点匹配才算候选
//! 3. 分值完全一致优先，其次分值差越小越好，最后保持原顺序
//!
//! 不做随机打乱，同样的输入永远得到同样的结果。

use tracing::{info, warn};

use crate::models::filter::topic_matches;
use crate::models::question::QuestionEntity;
use crate::models::template::{AllocatedSection, ExamTemplate, SectionAllocation, SectionSpec};

pub struct SectionAllocator;

impl SectionAllocator {
    fn eligible(spec: &SectionSpec, question: &QuestionEntity) -> bool {
        if question.question_type != spec.question_type {
            return false;
        }
        match spec.topic_filter.as_deref().map(str::trim) {
            Some(filter) if !filter.is_empty() => topic_matches(filter, &question.topic),
            _ => true,
        }
    }

    pub fn allocate(template: &ExamTemplate, pool: &[QuestionEntity]) -> SectionAllocation {
        info!(
            "📐 按模板组卷: {} ({} 个大题, 共需 {} 道题)",
            template.name,
            template.sections.len(),
            template.total_questions()
        );

        let mut used = vec![false; pool.len()];
        let mut sections = Vec::with_capacity(template.sections.len());
        let mut warnings = Vec::new();

        for spec in &template.sections {
            let mut candidates: Vec<usize> = (0..pool.len())
                .filter(|&i| !used[i] && Self::eligible(spec, &pool[i]))
                .collect();
            // 稳定排序，分值差相同时保持原顺序
            candidates.sort_by_key(|&i| {
                let diff = pool[i].marks.abs_diff(spec.marks_per_question);
                (diff != 0, diff)
            });
            candidates.truncate(spec.required_count);

            for &i in &candidates {
                used[i] = true;
            }
            if candidates.len() < spec.required_count {
                let warning = format!(
                    "{}: need {}, found {}",
                    spec.label,
                    spec.required_count,
                    candidates.len()
                );
                warn!("⚠️ {}", warning);
                warnings.push(warning);
            }

            sections.push(AllocatedSection {
                label: spec.label.clone(),
                question_type: spec.question_type,
                questions: candidates.into_iter().map(|i| pool[i].clone()).collect(),
            });
        }

        SectionAllocation {
            complete: warnings.is_empty(),
            sections,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{QuestionId, QuestionType};

    fn q(id: &str, t: QuestionType, marks: u32, topic: &str) -> QuestionEntity {
        QuestionEntity::new(QuestionId::new(id), "题干", marks, t).with_topic(topic)
    }

    fn spec(label: &str, t: QuestionType, count: usize, marks: u32, topic: Option<&str>) -> SectionSpec {
        SectionSpec {
            label: label.into(),
            question_type: t,
            required_count: count,
            marks_per_question: marks,
            topic_filter: topic.map(String::from),
        }
    }

    fn ids(section: &AllocatedSection) -> Vec<&str> {
        section.questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_exact_marks_then_closest_then_pool_order() {
        let pool = vec![
            q("a", QuestionType::MultipleChoice, 5, ""),
            q("b", QuestionType::MultipleChoice, 3, ""),
            q("c", QuestionType::MultipleChoice, 2, ""),
            q("d", QuestionType::MultipleChoice, 4, ""),
            q("e", QuestionType::MultipleChoice, 2, ""),
        ];
        let template = ExamTemplate {
            name: "期中".into(),
            sections: vec![spec("一、选择题", QuestionType::MultipleChoice, 4, 3, None)],
        };
        let allocation = SectionAllocator::allocate(&template, &pool);
        assert_eq!(ids(&allocation.sections[0]), vec!["b", "c", "d", "e"]);
        assert!(allocation.complete);
    }

    #[test]
    fn test_questions_are_used_once_and_topics_filter() {
        let pool = vec![
            q("a", QuestionType::ShortAnswer, 4, "Quadratic equations"),
            q("b", QuestionType::ShortAnswer, 4, "linear equations"),
            q("c", QuestionType::ShortAnswer, 4, "quadratic functions"),
        ];
        let template = ExamTemplate {
            name: "t".into(),
            sections: vec![
                spec("A", QuestionType::ShortAnswer, 1, 4, Some("  QUADRATIC ")),
                spec("B", QuestionType::ShortAnswer, 5, 4, None),
            ],
        };
        let allocation = SectionAllocator::allocate(&template, &pool);
        assert_eq!(ids(&allocation.sections[0]), vec!["a"]);
        assert_eq!(ids(&allocation.sections[1]), vec!["b", "c"]);
        assert!(!allocation.complete);
        assert_eq!(allocation.warnings, vec!["B: need 5, found 2"]);
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let pool: Vec<_> = (0..10)
            .map(|i| q(&format!("q{}", i), QuestionType::Essay, (i % 4) + 1, "x"))
            .collect();
        let template = ExamTemplate {
            name: "t".into(),
            sections: vec![spec("E", QuestionType::Essay, 3, 2, None)],
        };
        assert_eq!(
            SectionAllocator::allocate(&template, &pool),
            SectionAllocator::allocate(&template, &pool)
        );
    }
}
