//! 选题流水线 - 流程层
//!
//! 题库（Bank）→ 备选（Staging）→ 终稿（Final）三级题池。
//!
//! ## 不变量
//! - 同一题目 ID 任意时刻至多属于一个题池
//! - 只有"从题库选出"会触发补题；删除操作从不补题
//! - 终稿即 `PaperOrder`，不存在第二份列表
//!
//! ## 补题的时序
//! 同步的题池转移先完成，再返回补题请求；请求完成的先后与后续用户操作无关。
//! 补题只追加、且按 ID 去重，因此乱序完成也不会破坏互斥性，
//! 只是题库大小会暂时比标称值少"在途请求数"。

use std::collections::HashSet;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::filter::FilterCriteria;
use crate::models::question::{QuestionEntity, QuestionId};
use crate::workflow::paper_order::{OrderSnapshot, PaperOrder};

/// 补题请求：由 `add_to_staging` 产生，调用方异步执行
#[derive(Debug, Clone, PartialEq)]
pub struct ReplenishmentRequest {
    pub ticket: u64,
    pub criteria: FilterCriteria,
    pub desired_count: usize,
    /// 发出请求时三个题池中的全部 ID
    pub existing_ids: Vec<QuestionId>,
}

/// 补题结果
#[derive(Debug, Clone, PartialEq)]
pub enum ReplenishmentOutcome {
    Delivered {
        ticket: u64,
        questions: Vec<QuestionEntity>,
    },
    Failed {
        ticket: u64,
        reason: String,
    },
}

impl ReplenishmentOutcome {
    pub fn ticket(&self) -> u64 {
        match self {
            ReplenishmentOutcome::Delivered { ticket, .. }
            | ReplenishmentOutcome::Failed { ticket, .. } => *ticket,
        }
    }
}

/// 三级题池
pub struct SelectionPipeline {
    bank: Vec<QuestionEntity>,
    staging: Vec<QuestionEntity>,
    final_order: PaperOrder,
    filter: FilterCriteria,
    next_ticket: u64,
    pending_tickets: HashSet<u64>,
    /// 补题失败导致的永久缺口（本次会话内）
    shortfall: usize,
}

impl SelectionPipeline {
    pub fn new(filter: FilterCriteria) -> Self {
        Self {
            bank: Vec::new(),
            staging: Vec::new(),
            final_order: PaperOrder::new(),
            filter,
            next_ticket: 0,
            pending_tickets: HashSet::new(),
            shortfall: 0,
        }
    }

    // ========== 查询 ==========

    pub fn bank(&self) -> &[QuestionEntity] {
        &self.bank
    }

    pub fn staging(&self) -> &[QuestionEntity] {
        &self.staging
    }

    pub fn final_order(&self) -> &PaperOrder {
        &self.final_order
    }

    /// 订阅终稿顺序（供两个列表视图使用）
    pub fn subscribe_final(&self) -> watch::Receiver<OrderSnapshot> {
        self.final_order.subscribe()
    }

    pub fn filter(&self) -> &FilterCriteria {
        &self.filter
    }

    /// 当前筛选条件下可见的题库题目；被筛掉的题目仍保留在题库中
    pub fn visible_bank(&self) -> Vec<&QuestionEntity> {
        self.bank.iter().filter(|q| self.filter.matches(q)).collect()
    }

    /// 终稿总分
    pub fn final_marks(&self) -> u32 {
        self.final_order.total_marks()
    }

    pub fn in_flight_replenishments(&self) -> usize {
        self.pending_tickets.len()
    }

    pub fn shortfall(&self) -> usize {
        self.shortfall
    }

    pub fn contains(&self, id: &QuestionId) -> bool {
        self.in_bank(id) || self.in_staging(id) || self.final_order.contains(id)
    }

    /// 三个题池的全部 ID
    pub fn all_ids(&self) -> Vec<QuestionId> {
        self.bank
            .iter()
            .chain(self.staging.iter())
            .map(|q| q.id.clone())
            .chain(self.final_order.items().iter().map(|p| p.question.id.clone()))
            .collect()
    }

    fn in_bank(&self, id: &QuestionId) -> bool {
        self.bank.iter().any(|q| &q.id == id)
    }

    fn in_staging(&self, id: &QuestionId) -> bool {
        self.staging.iter().any(|q| &q.id == id)
    }

    // ========== 初始化 ==========

    pub fn set_filter(&mut self, filter: FilterCriteria) {
        info!("🔎 筛选条件: {}", filter.describe());
        self.filter = filter;
    }

    /// 向题库追加题目（按 ID 去重），返回实际加入的数量
    pub fn seed_bank(&mut self, questions: impl IntoIterator<Item = QuestionEntity>) -> usize {
        let mut added = 0;
        for question in questions {
            if self.contains(&question.id) {
                debug!("题目 {} 已存在，跳过", question.id);
                continue;
            }
            self.bank.push(question);
            added += 1;
        }
        added
    }

    /// 恢复终稿（来自快照），按 ID 去重
    pub fn restore_final(&mut self, questions: impl IntoIterator<Item = QuestionEntity>) -> usize {
        let mut restored = 0;
        for question in questions {
            if self.contains(&question.id) {
                continue;
            }
            self.final_order.push(question);
            restored += 1;
        }
        restored
    }

    // ========== 题池转移 ==========

    /// 题库 → 备选
    ///
    /// 转移完成后返回一个补题请求；前置条件不满足时静默无操作。
    pub fn add_to_staging(&mut self, id: &QuestionId) -> Option<ReplenishmentRequest> {
        if self.in_staging(id) || self.final_order.contains(id) {
            debug!("题目 {} 已在备选或终稿中，忽略", id);
            return None;
        }
        let Some(index) = self.bank.iter().position(|q| &q.id == id) else {
            debug!("题目 {} 不在题库中，忽略", id);
            return None;
        };

        let question = self.bank.remove(index);
        self.staging.push(question);

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.pending_tickets.insert(ticket);

        Some(ReplenishmentRequest {
            ticket,
            criteria: self.filter.clone(),
            desired_count: 1,
            existing_ids: self.all_ids(),
        })
    }

    /// 备选 → 终稿
    pub fn move_to_final(&mut self, id: &QuestionId) -> bool {
        if self.final_order.contains(id) {
            return false;
        }
        let Some(index) = self.staging.iter().position(|q| &q.id == id) else {
            debug!("题目 {} 不在备选中，忽略", id);
            return false;
        };
        let question = self.staging.remove(index);
        self.final_order.push(question);
        debug!("终稿总分: {}", self.final_marks());
        true
    }

    /// 备选全部移入终稿（保持加入顺序，追加在已有终稿之后），并清空备选
    pub fn move_all_staging_to_final(&mut self) -> usize {
        let staged = std::mem::take(&mut self.staging);
        let mut moved = 0;
        for question in staged {
            if self.final_order.contains(&question.id) {
                continue;
            }
            self.final_order.push(question);
            moved += 1;
        }
        info!("✓ {} 道题移入终稿, 总分 {}", moved, self.final_marks());
        moved
    }

    pub fn remove_from_staging(&mut self, id: &QuestionId) -> bool {
        let before = self.staging.len();
        self.staging.retain(|q| &q.id != id);
        before != self.staging.len()
    }

    pub fn remove_from_final(&mut self, id: &QuestionId) -> bool {
        self.final_order.remove(id).is_some()
    }

    pub fn reorder_final(&mut self, from: usize, to: usize) -> bool {
        self.final_order.move_item(from, to)
    }

    /// 就地编辑题目（无论在哪个题池），编辑后重新汇总小题分值
    pub fn edit_question(&mut self, id: &QuestionId, edit: impl FnOnce(&mut QuestionEntity)) -> bool {
        if let Some(q) = self.bank.iter_mut().chain(self.staging.iter_mut()).find(|q| &q.id == id) {
            edit(q);
            q.recompute_marks();
            return true;
        }
        self.final_order.edit(id, edit)
    }

    // ========== 补题 ==========

    /// 应用补题结果，返回加入题库的数量
    ///
    /// 已存在于任一题池的 ID 直接丢弃；过期的结果照常应用。
    pub fn apply_replenishment(&mut self, outcome: ReplenishmentOutcome) -> usize {
        self.pending_tickets.remove(&outcome.ticket());

        match outcome {
            ReplenishmentOutcome::Delivered { ticket, questions } => {
                let added = self.seed_bank(questions);
                debug!("补题 #{} 完成: 新增 {} 题", ticket, added);
                added
            }
            ReplenishmentOutcome::Failed { ticket, reason } => {
                self.shortfall += 1;
                warn!("⚠️ 补题 #{} 失败，题库减少一题: {}", ticket, reason);
                0
            }
        }
    }
}
