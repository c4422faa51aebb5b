use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 题目 ID（由引擎分配，内容服务返回的 ID 一律不采信）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 引擎格式 `q-000042` 中的序号
    fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix("q-").and_then(|n| n.parse().ok())
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 题目 ID 分配器
///
/// 可在多个异步任务间共享（内部为原子计数）。
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配一个新的 ID
    pub fn next_id(&self) -> QuestionId {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        QuestionId(format!("q-{:06}", n))
    }

    /// 跳过已存在的 ID（例如从快照恢复的题目）
    pub fn reserve_past<'a>(&self, ids: impl IntoIterator<Item = &'a QuestionId>) {
        if let Some(max) = ids.into_iter().filter_map(QuestionId::sequence).max() {
            self.next.fetch_max(max, Ordering::Relaxed);
        }
    }
}

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "简单",
            Difficulty::Medium => "中等",
            Difficulty::Hard => "困难",
        }
    }
}

/// 题型，决定作答区域的渲染方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    Matching,
    FillInBlank,
    Numeric,
    ShortAnswer,
    Essay,
    Structured,
    PracticalOral,
}

impl QuestionType {
    pub const ALL: [QuestionType; 9] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::Matching,
        QuestionType::FillInBlank,
        QuestionType::Numeric,
        QuestionType::ShortAnswer,
        QuestionType::Essay,
        QuestionType::Structured,
        QuestionType::PracticalOral,
    ];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "选择题",
            QuestionType::TrueFalse => "判断题",
            QuestionType::Matching => "连线题",
            QuestionType::FillInBlank => "填空题",
            QuestionType::Numeric => "计算题",
            QuestionType::ShortAnswer => "简答题",
            QuestionType::Essay => "论述题",
            QuestionType::Structured => "综合题",
            QuestionType::PracticalOral => "实践/口试",
        }
    }

    /// 尝试从字符串解析题型（接受 snake_case 或中文名）
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|t| {
            t.name() == s
                || serde_json::to_value(t)
                    .ok()
                    .and_then(|v| v.as_str().map(|v| v.eq_ignore_ascii_case(s)))
                    .unwrap_or(false)
        })
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 连线题的一对
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingPair {
    pub left: String,
    pub right: String,
}

/// 小题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPart {
    pub body: String,
    pub marks: u32,
}

/// 题目的结构化内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionPayload {
    Options { options: Vec<String> },
    Matching { pairs: Vec<MatchingPair> },
    SubParts { parts: Vec<SubPart> },
    Image { src: String, caption: Option<String> },
}

/// 题目实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionEntity {
    pub id: QuestionId,
    /// 富文本题干（HTML 片段）
    pub body: String,
    pub marks: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topic: String,
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<QuestionPayload>,
    /// 论述题行数（覆盖主题默认值）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_lines: Option<u32>,
    /// 计算题单位
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl QuestionEntity {
    pub fn new(
        id: QuestionId,
        body: impl Into<String>,
        marks: u32,
        question_type: QuestionType,
    ) -> Self {
        Self {
            id,
            body: body.into(),
            marks: marks.max(1),
            difficulty: Difficulty::default(),
            topic: String::new(),
            question_type,
            payload: None,
            answer_lines: None,
            unit: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_payload(mut self, payload: QuestionPayload) -> Self {
        self.payload = Some(payload);
        self.recompute_marks();
        self
    }

    /// 小题列表（没有小题时为 None）
    pub fn sub_parts(&self) -> Option<&[SubPart]> {
        match &self.payload {
            Some(QuestionPayload::SubParts { parts }) => Some(parts),
            _ => None,
        }
    }

    /// 配图 `(src, caption)`
    pub fn image(&self) -> Option<(&str, Option<&str>)> {
        match &self.payload {
            Some(QuestionPayload::Image { src, caption }) => Some((src.as_str(), caption.as_deref())),
            _ => None,
        }
    }

    /// 追加小题，并重新汇总分值
    pub fn add_sub_part(&mut self, body: impl Into<String>, marks: u32) {
        let part = SubPart {
            body: body.into(),
            marks: marks.max(1),
        };
        match &mut self.payload {
            Some(QuestionPayload::SubParts { parts }) => parts.push(part),
            _ => {
                self.payload = Some(QuestionPayload::SubParts { parts: vec![part] });
            }
        }
        self.recompute_marks();
    }

    /// 删除小题（越界时无操作）
    pub fn remove_sub_part(&mut self, index: usize) -> bool {
        let removed = match &mut self.payload {
            Some(QuestionPayload::SubParts { parts }) if index < parts.len() => {
                parts.remove(index);
                true
            }
            _ => false,
        };
        if removed {
            self.recompute_marks();
        }
        removed
    }

    /// 修改某个小题的分值
    pub fn set_sub_part_marks(&mut self, index: usize, marks: u32) -> bool {
        let changed = match &mut self.payload {
            Some(QuestionPayload::SubParts { parts }) => match parts.get_mut(index) {
                Some(part) => {
                    part.marks = marks.max(1);
                    true
                }
                None => false,
            },
            _ => false,
        };
        if changed {
            self.recompute_marks();
        }
        changed
    }

    /// 有小题时：总分 = 各小题分值之和
    pub fn recompute_marks(&mut self) {
        if let Some(parts) = self.sub_parts() {
            if !parts.is_empty() {
                self.marks = parts.iter().map(|p| p.marks).sum();
            }
        }
    }

    /// 外部来源（快照、内容服务）的分值规整：小题与总分都至少 1 分，总分 = 小题之和
    pub fn normalize_marks(&mut self) {
        if let Some(QuestionPayload::SubParts { parts }) = &mut self.payload {
            for part in parts.iter_mut() {
                part.marks = part.marks.max(1);
            }
        }
        self.marks = self.marks.max(1);
        self.recompute_marks();
    }

    pub fn has_consistent_marks(&self) -> bool {
        match self.sub_parts() {
            Some(parts) if !parts.is_empty() => {
                self.marks == parts.iter().map(|p| p.marks).sum::<u32>()
            }
            _ => self.marks >= 1,
        }
    }
}

/// 尚未分配 ID 的题目（内容服务返回或手工录入）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub body: String,
    #[serde(default = "default_marks")]
    pub marks: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topic: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub payload: Option<QuestionPayload>,
    #[serde(default)]
    pub answer_lines: Option<u32>,
    #[serde(default)]
    pub unit: Option<String>,
}

fn default_marks() -> u32 {
    1
}

impl QuestionDraft {
    /// 以引擎分配的 ID 落地为题目实体
    pub fn into_entity(self, id: QuestionId) -> QuestionEntity {
        let mut entity = QuestionEntity {
            id,
            body: self.body,
            marks: self.marks.max(1),
            difficulty: self.difficulty,
            topic: self.topic,
            question_type: self.question_type,
            payload: self.payload,
            answer_lines: self.answer_lines,
            unit: self.unit,
        };
        entity.normalize_marks();
        entity
    }
}

/// 字母序号：0 → a, 25 → z, 26 → aa
pub fn alpha_label(index: usize, uppercase: bool) -> String {
    let base = if uppercase { b'A' } else { b'a' };
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push((base + (n % 26) as u8) as char);
        n /= 26;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composite() -> QuestionEntity {
        let mut q = QuestionEntity::new(QuestionId::new("q-000001"), "阅读材料并回答", 1, QuestionType::Structured);
        q.add_sub_part("概括材料观点", 2);
        q.add_sub_part("结合材料分析", 4);
        q
    }

    #[test]
    fn test_marks_follow_sub_parts_after_every_edit() {
        let mut q = composite();
        assert_eq!(q.marks, 6);

        q.set_sub_part_marks(0, 5);
        assert_eq!(q.marks, 9);
        assert!(q.has_consistent_marks());

        q.remove_sub_part(1);
        assert_eq!(q.marks, 5);

        q.add_sub_part("评价", 3);
        assert_eq!(q.marks, 8);
        assert!(q.has_consistent_marks());
    }

    #[test]
    fn test_out_of_range_sub_part_edit_is_noop() {
        let mut q = composite();
        assert!(!q.set_sub_part_marks(7, 10));
        assert!(!q.remove_sub_part(7));
        assert_eq!(q.marks, 6);
    }

    #[test]
    fn test_zero_marks_are_raised_to_one() {
        let q = QuestionEntity::new(QuestionId::new("q-1"), "x", 0, QuestionType::FillInBlank);
        assert_eq!(q.marks, 1);
    }

    #[test]
    fn test_id_allocator_skips_reserved_ids() {
        let ids = IdAllocator::new();
        ids.reserve_past(&[QuestionId::new("q-000041"), QuestionId::new("manual")]);
        assert_eq!(ids.next_id().as_str(), "q-000042");
    }

    #[test]
    fn test_alpha_label() {
        assert_eq!(alpha_label(0, false), "a");
        assert_eq!(alpha_label(2, true), "C");
        assert_eq!(alpha_label(26, false), "aa");
    }

    #[test]
    fn test_parse_question_type() {
        assert_eq!(QuestionType::parse("essay"), Some(QuestionType::Essay));
        assert_eq!(QuestionType::parse("选择题"), Some(QuestionType::MultipleChoice));
        assert_eq!(QuestionType::parse("unknown"), None);
    }
}
