//! 补题服务 - 业务能力层
//!
//! 把一个补题请求变成补题结果：调用内容服务、由引擎分配 ID、截取所需数量。
//! 从不返回错误，失败会变成 `ReplenishmentOutcome::Failed`。

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::models::filter::FilterCriteria;
use crate::models::question::{IdAllocator, QuestionEntity, QuestionId};
use crate::services::content_provider::{ContentProvider, ContentRequest};
use crate::workflow::selection::{ReplenishmentOutcome, ReplenishmentRequest};

/// 一批新题目
#[derive(Debug, Clone, Default)]
pub struct GeneratedBatch {
    pub questions: Vec<QuestionEntity>,
    pub suggested_title: Option<String>,
}

pub struct Replenisher<P> {
    provider: Arc<P>,
    ids: IdAllocator,
}

impl<P> Clone for Replenisher<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            ids: self.ids.clone(),
        }
    }
}

impl<P: ContentProvider> Replenisher<P> {
    pub fn new(provider: Arc<P>, ids: IdAllocator) -> Self {
        Self { provider, ids }
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// 请求最多 `count` 道新题目，服务返回的 ID 一律替换
    pub async fn fetch(
        &self,
        criteria: FilterCriteria,
        count: usize,
        existing_ids: Vec<QuestionId>,
    ) -> Result<GeneratedBatch, ProviderError> {
        if count == 0 {
            return Ok(GeneratedBatch::default());
        }
        let response = self
            .provider
            .generate(ContentRequest {
                criteria,
                desired_count: count,
                existing_ids,
            })
            .await?;

        let questions: Vec<QuestionEntity> = response
            .drafts
            .into_iter()
            .take(count)
            .map(|draft| draft.into_entity(self.ids.next_id()))
            .collect();
        debug!("内容服务返回 {} 道题 (请求 {})", questions.len(), count);

        Ok(GeneratedBatch {
            questions,
            suggested_title: response.suggested_title,
        })
    }

    pub async fn run(&self, request: ReplenishmentRequest) -> ReplenishmentOutcome {
        let ticket = request.ticket;
        match self
            .fetch(request.criteria, request.desired_count, request.existing_ids)
            .await
        {
            Ok(batch) if batch.questions.is_empty() => ReplenishmentOutcome::Failed {
                ticket,
                reason: "内容服务没有返回可用题目".to_string(),
            },
            Ok(batch) => ReplenishmentOutcome::Delivered {
                ticket,
                questions: batch.questions,
            },
            Err(e) => {
                warn!("补题 #{} 调用内容服务失败: {}", ticket, e);
                ReplenishmentOutcome::Failed {
                    ticket,
                    reason: e.to_string(),
                }
            }
        }
    }
}
