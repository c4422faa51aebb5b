//! 终稿题目顺序 - 唯一数据源
//!
//! 控制列表与预览列表都订阅同一个 `PaperOrder`，
//! 任意一侧发起的排序都落在这里，再广播给两侧。

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::models::paper::PlacedQuestion;
use crate::models::question::{QuestionEntity, QuestionId};

/// 广播给视图的只读快照
pub type OrderSnapshot = Arc<Vec<PlacedQuestion>>;

/// 终稿题目的有序列表
///
/// 不变量：任意时刻 `items[k].number == k + 1`。
pub struct PaperOrder {
    items: Vec<PlacedQuestion>,
    tx: watch::Sender<OrderSnapshot>,
}

impl PaperOrder {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self {
            items: Vec::new(),
            tx,
        }
    }

    pub fn from_questions(questions: Vec<QuestionEntity>) -> Self {
        let mut order = Self::new();
        order.items = questions
            .into_iter()
            .map(|question| PlacedQuestion { number: 0, question })
            .collect();
        order.commit();
        order
    }

    /// 订阅顺序变化
    pub fn subscribe(&self) -> watch::Receiver<OrderSnapshot> {
        self.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[PlacedQuestion] {
        &self.items
    }

    pub fn contains(&self, id: &QuestionId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &QuestionId) -> Option<usize> {
        self.items.iter().position(|p| &p.question.id == id)
    }

    pub fn questions(&self) -> Vec<QuestionEntity> {
        self.items.iter().map(|p| p.question.clone()).collect()
    }

    /// 总分 = 各题分值之和
    pub fn total_marks(&self) -> u32 {
        self.items.iter().map(|p| p.question.marks).sum()
    }

    /// 追加到末尾
    pub fn push(&mut self, question: QuestionEntity) {
        self.items.push(PlacedQuestion { number: 0, question });
        self.commit();
    }

    pub fn remove(&mut self, id: &QuestionId) -> Option<QuestionEntity> {
        let index = self.position(id)?;
        let removed = self.items.remove(index);
        self.commit();
        Some(removed.question)
    }

    /// 把 `from` 处的题目移动到 `to`（先删除后插入，不是交换）
    ///
    /// 越界或 `from == to` 时无操作，返回 false。
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() || from == to {
            debug!("忽略无效的排序: {} -> {} (共 {} 题)", from, to, self.items.len());
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.commit();
        true
    }

    /// 就地编辑题目内容
    pub fn edit(&mut self, id: &QuestionId, edit: impl FnOnce(&mut QuestionEntity)) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        edit(&mut self.items[index].question);
        self.items[index].question.recompute_marks();
        self.commit();
        true
    }

    /// 重新编号并广播
    fn commit(&mut self) {
        for (k, item) in self.items.iter_mut().enumerate() {
            item.number = (k + 1) as u32;
        }
        self.tx.send_replace(Arc::new(self.items.clone()));
    }
}

impl Default for PaperOrder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    fn order_of(n: usize) -> PaperOrder {
        PaperOrder::from_questions(
            (1..=n)
                .map(|i| {
                    QuestionEntity::new(
                        QuestionId::new(format!("q-{}", i)),
                        format!("item{}", i),
                        i as u32,
                        QuestionType::ShortAnswer,
                    )
                })
                .collect(),
        )
    }

    fn bodies(order: &PaperOrder) -> Vec<&str> {
        order.items().iter().map(|p| p.question.body.as_str()).collect()
    }

    fn numbers(order: &PaperOrder) -> Vec<u32> {
        order.items().iter().map(|p| p.number).collect()
    }

    #[test]
    fn test_move_last_to_first_renumbers() {
        let mut order = order_of(4);
        assert!(order.move_item(3, 0));
        assert_eq!(bodies(&order), vec!["item4", "item1", "item2", "item3"]);
        assert_eq!(numbers(&order), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_move_is_array_move_not_swap() {
        let mut order = order_of(4);
        order.move_item(0, 2);
        assert_eq!(bodies(&order), vec!["item2", "item3", "item1", "item4"]);
    }

    #[test]
    fn test_every_reorder_keeps_numbers_sequential() {
        let mut order = order_of(6);
        let moves = [(5, 0), (1, 4), (2, 2), (0, 5), (9, 1), (3, 1)];
        for (from, to) in moves {
            order.move_item(from, to);
            for (k, item) in order.items().iter().enumerate() {
                assert_eq!(item.number as usize, k + 1);
            }
        }
        assert_eq!(order.len(), 6);
    }

    #[test]
    fn test_removal_renumbers_and_updates_total() {
        let mut order = order_of(3);
        assert_eq!(order.total_marks(), 6);
        order.remove(&QuestionId::new("q-1"));
        assert_eq!(numbers(&order), vec![1, 2]);
        assert_eq!(order.total_marks(), 5);
    }

    #[test]
    fn test_subscribers_see_latest_order() {
        let mut order = order_of(3);
        let rx = order.subscribe();
        order.move_item(2, 0);
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot[0].question.body, "item3");
        assert_eq!(snapshot[0].number, 1);
    }
}
