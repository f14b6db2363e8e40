//! 事务管理器（TransactionManager）
//!
//! 负责开启、提交与回滚事务。提交成功后依次释放事务上登记的提交后处理器：
//! 每个处理器在全新事务中执行（上下文继承关联ID，因果ID为事件ID），
//! 成功则提交该事务并继续释放其链式登记的处理器；失败只回滚自身事务，
//! 记录错误日志与死信，并体现在 `CommitReport` 中，不影响已提交的发布事务。
//!
use crate::domain_event::{EventContext, EventEnvelope};
use crate::error::{DomainError, DomainResult};
use crate::eventing::{
    DeadLetter, DeadLetterSink, DispatchConfig, EventHandler, EventPublisher, HandlerContext,
    InMemoryDeadLetters, PendingDelivery, PostCommitMode,
};
use bon::Builder;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

use super::transaction::Transaction;

/// 一次提交中提交后处理器的执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    transaction_id: Uuid,
    delivered: usize,
    failures: Vec<DeliveryFailure>,
    detached: usize,
}

/// 单个提交后处理器的失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub handler: String,
    pub kind: String,
    pub event_id: String,
    pub reason: String,
}

impl CommitReport {
    fn new(transaction_id: Uuid) -> Self {
        Self {
            transaction_id,
            ..Default::default()
        }
    }

    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    /// 成功执行的提交后处理器数量（含链式触发）
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn failures(&self) -> &[DeliveryFailure] {
        &self.failures
    }

    /// 交给独立任务执行、结果未计入本报告的投递数量
    pub fn detached(&self) -> usize {
        self.detached
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// 某处理器处理某事件是否失败
    pub fn failed_for(&self, handler: &str, event_id: &str) -> bool {
        self.failures
            .iter()
            .any(|f| f.handler == handler && f.event_id == event_id)
    }

    fn merge(&mut self, other: CommitReport) {
        self.delivered += other.delivered;
        self.detached += other.detached;
        self.failures.extend(other.failures);
    }
}

#[derive(Builder, Clone)]
pub struct TransactionManager {
    publisher: EventPublisher,
    #[builder(default = Arc::new(InMemoryDeadLetters::new()) as Arc<dyn DeadLetterSink>)]
    dead_letters: Arc<dyn DeadLetterSink>,
    #[builder(default)]
    config: DispatchConfig,
    #[builder(skip)]
    detached: TaskTracker,
}

impl TransactionManager {
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn dead_letters(&self) -> &Arc<dyn DeadLetterSink> {
        &self.dead_letters
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// 开启新事务（新的关联ID）
    pub fn begin(&self) -> Transaction {
        Transaction::new(EventContext::default())
    }

    /// 以给定上下文开启事务
    pub fn begin_with(&self, context: EventContext) -> Transaction {
        Transaction::new(context)
    }

    /// 提交事务并释放提交后处理器
    pub async fn commit(&self, mut tx: Transaction) -> DomainResult<CommitReport> {
        let pending = tx.commit_writes()?;
        debug!(
            transaction_id = %tx.id(),
            after_commit = pending.len(),
            "transaction committed"
        );
        Ok(self.release(tx.id(), pending, self.config.post_commit).await)
    }

    /// 回滚事务：丢弃暂存写入与全部提交后处理器
    pub fn rollback(&self, mut tx: Transaction) {
        let discarded = tx.discard();
        debug!(
            transaction_id = %tx.id(),
            discarded,
            "transaction rolled back"
        );
    }

    /// 等待所有以 `Detached` 方式派生的提交后任务完成
    pub async fn wait_detached(&self) {
        self.detached.close();
        self.detached.wait().await;
        self.detached.reopen();
    }

    /// 重放一条死信：在全新事务中重新执行原处理器
    pub async fn redeliver(&self, letter: &DeadLetter) -> DomainResult<CommitReport> {
        let handler = self
            .publisher
            .substrate()
            .lookup(letter.handler_name())
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "handler '{}' is not registered",
                    letter.handler_name()
                ))
            })?;

        let report = self
            .deliver(PendingDelivery::new(handler, letter.envelope().clone()))
            .await;
        if !report.failed_for(letter.handler_name(), letter.envelope().event_id()) {
            self.dead_letters.mark_reclaimed(letter).await?;
        }
        Ok(report)
    }

    /// 依次重放全部死信
    pub async fn redeliver_all(&self) -> DomainResult<CommitReport> {
        let mut report = CommitReport::default();
        for letter in self.dead_letters.fetch_pending().await? {
            report.merge(self.redeliver(&letter).await?);
        }
        Ok(report)
    }

    fn release(
        &self,
        transaction_id: Uuid,
        pending: Vec<PendingDelivery>,
        mode: PostCommitMode,
    ) -> BoxFuture<'_, CommitReport> {
        async move {
            let mut report = CommitReport::new(transaction_id);
            if pending.is_empty() {
                return report;
            }

            match mode {
                PostCommitMode::Inline => {
                    for delivery in pending {
                        report.merge(self.deliver(delivery).await);
                    }
                }
                PostCommitMode::Detached => {
                    report.detached = pending.len();
                    let this = self.clone();
                    self.detached.spawn(async move {
                        this.release(transaction_id, pending, PostCommitMode::Inline)
                            .await;
                    });
                }
            }
            report
        }
        .boxed()
    }

    fn deliver(&self, delivery: PendingDelivery) -> BoxFuture<'_, CommitReport> {
        let (handler, envelope) = delivery.into_parts();
        let span = info_span!(
            "after_commit",
            handler = handler.handler_name(),
            kind = envelope.kind(),
            event_id = envelope.event_id(),
        );

        async move {
            let mut tx = self.begin_with(EventContext::caused_by(&envelope));
            let outcome = {
                let mut ctx = HandlerContext::new(&mut tx, &self.publisher);
                handler.handle(&mut ctx, &envelope).await
            };

            let failure = match outcome {
                Ok(()) => match tx.commit_writes() {
                    Ok(pending) => {
                        let mut report = self
                            .release(tx.id(), pending, PostCommitMode::Inline)
                            .await;
                        report.delivered += 1;
                        return report;
                    }
                    Err(err) => err,
                },
                Err(err) => {
                    self.rollback(tx);
                    err
                }
            };
            self.fail(handler.as_ref(), &envelope, failure).await
        }
        .instrument(span)
        .boxed()
    }

    async fn fail(
        &self,
        handler: &dyn EventHandler,
        envelope: &EventEnvelope,
        err: DomainError,
    ) -> CommitReport {
        let reason = err.to_string();
        error!(
            handler = handler.handler_name(),
            kind = envelope.kind(),
            event_id = envelope.event_id(),
            error = %reason,
            "after-commit handler failed, its transaction was rolled back"
        );
        if let Err(sink_err) = self
            .dead_letters
            .mark_handler_failed(handler.handler_name(), envelope, &reason)
            .await
        {
            error!(error = %sink_err, "failed to record dead letter");
        }

        let mut report = CommitReport::default();
        report.failures.push(DeliveryFailure {
            handler: handler.handler_name().to_string(),
            kind: envelope.kind().to_string(),
            event_id: envelope.event_id().to_string(),
            reason,
        });
        report
    }
}
