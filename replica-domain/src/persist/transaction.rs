use crate::domain_event::EventContext;
use crate::error::{DomainError, DomainResult};
use crate::eventing::PendingDelivery;
use std::any::Any;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// 事务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    Committed,
    RolledBack,
}

/// 某张表在事务内暂存的写入
pub trait StagedWrites: Send + Sync {
    /// 所属表
    fn table_id(&self) -> Uuid;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 提交时把暂存写入应用到表
    fn apply(self: Box<Self>);
}

/// 工作单元
///
/// 写入先暂存在事务内，提交时一次性生效；提交后待投递的处理器（Phase B）
/// 也挂在事务上，回滚时与写入一并丢弃。
pub struct Transaction {
    id: Uuid,
    context: EventContext,
    status: TransactionStatus,
    staged: Vec<Box<dyn StagedWrites>>,
    after_commit: Vec<PendingDelivery>,
}

impl Transaction {
    pub(crate) fn new(context: EventContext) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            context: context.ensure_correlation(|| id.to_string()),
            status: TransactionStatus::Active,
            staged: Vec::new(),
            after_commit: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 本事务内发布事件时使用的上下文
    pub fn context(&self) -> &EventContext {
        &self.context
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    pub fn ensure_active(&self) -> DomainResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DomainError::transaction(format!(
                "transaction {} is {:?}",
                self.id, self.status
            )))
        }
    }

    /// 登记提交后执行的处理器
    pub fn defer(&mut self, delivery: PendingDelivery) -> DomainResult<()> {
        self.ensure_active()?;
        self.after_commit.push(delivery);
        Ok(())
    }

    /// 已登记、尚未释放的提交后处理器数量
    pub fn pending_deliveries(&self) -> usize {
        self.after_commit.len()
    }

    pub(crate) fn staged<W: StagedWrites + 'static>(&self, table_id: Uuid) -> Option<&W> {
        self.staged
            .iter()
            .find(|w| w.table_id() == table_id)
            .and_then(|w| w.as_any().downcast_ref::<W>())
    }

    pub(crate) fn staged_mut<W: StagedWrites + 'static>(
        &mut self,
        table_id: Uuid,
        init: impl FnOnce() -> W,
    ) -> DomainResult<&mut W> {
        self.ensure_active()?;
        let index = match self.staged.iter().position(|w| w.table_id() == table_id) {
            Some(index) => index,
            None => {
                self.staged.push(Box::new(init()));
                self.staged.len() - 1
            }
        };
        self.staged[index]
            .as_any_mut()
            .downcast_mut::<W>()
            .ok_or_else(|| {
                DomainError::transaction(format!("staged writes type mismatch for table {table_id}"))
            })
    }

    /// 应用全部暂存写入，返回待投递的提交后处理器
    ///
    /// 各表依次在自己的锁内应用，跨表不持有统一的锁：并发读者可能读到
    /// 只应用了一部分表的中间状态（例如订单已支付而钱包尚未扣款）。
    /// 本调用返回后全部表均已生效。
    pub(crate) fn commit_writes(&mut self) -> DomainResult<Vec<PendingDelivery>> {
        self.ensure_active()?;
        for writes in std::mem::take(&mut self.staged) {
            writes.apply();
        }
        self.status = TransactionStatus::Committed;
        Ok(std::mem::take(&mut self.after_commit))
    }

    /// 丢弃暂存写入与待投递处理器，返回被丢弃的处理器数量
    pub(crate) fn discard(&mut self) -> usize {
        self.staged.clear();
        let dropped = std::mem::take(&mut self.after_commit).len();
        if self.is_active() {
            self.status = TransactionStatus::RolledBack;
        }
        dropped
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("staged_tables", &self.staged.len())
            .field("after_commit", &self.after_commit.len())
            .finish()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.is_active() && (!self.staged.is_empty() || !self.after_commit.is_empty()) {
            warn!(
                transaction_id = %self.id,
                after_commit = self.after_commit.len(),
                "transaction dropped without commit; staged work discarded"
            );
        }
    }
}
