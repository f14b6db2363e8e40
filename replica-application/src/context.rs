use crate::error::AppError;
use replica_domain::domain_event::{DomainEvent, DomainEvents, EventContext};
use replica_domain::eventing::EventPublisher;
use replica_domain::persist::Transaction;

/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用所需的横切信息：关联追踪 `correlation_id`、因果链 `causation_id`、
/// 执行者类型/ID 等。命令事务以它作为事件上下文。
///
/// ```rust
/// use replica_application::context::AppContext;
///
/// let ctx = AppContext::actor("member", "7");
/// assert_eq!(ctx.biz.actor_id(), Some("7"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    /// 业务语境（链路追踪、审计主体、操作因果）
    pub biz: EventContext,
}

impl AppContext {
    pub fn new(biz: EventContext) -> Self {
        Self { biz }
    }

    /// 以某个执行者身份发起调用
    pub fn actor(actor_type: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            biz: EventContext::builder()
                .actor_type(actor_type)
                .actor_id(actor_id)
                .build(),
        }
    }
}

/// 命令执行上下文：应用上下文 + 命令事务 + 发布器
pub struct CommandContext {
    app: AppContext,
    tx: Transaction,
    publisher: EventPublisher,
}

impl CommandContext {
    pub(crate) fn new(app: AppContext, tx: Transaction, publisher: EventPublisher) -> Self {
        Self { app, tx, publisher }
    }

    pub fn app(&self) -> &AppContext {
        &self.app
    }

    pub fn tx(&mut self) -> &mut Transaction {
        &mut self.tx
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// 同时取得事务与发布器
    pub fn parts(&mut self) -> (&mut Transaction, &EventPublisher) {
        (&mut self.tx, &self.publisher)
    }

    /// 在命令事务内发布单个事件
    pub async fn publish<E: DomainEvent>(&mut self, event: &E) -> Result<(), AppError> {
        Ok(self.publisher.publish(&mut self.tx, event).await?)
    }

    /// 在命令事务内发布聚合收集的事件
    pub async fn publish_all(&mut self, events: DomainEvents) -> Result<(), AppError> {
        Ok(self.publisher.publish_all(&mut self.tx, events).await?)
    }

    pub(crate) fn into_transaction(self) -> Transaction {
        self.tx
    }
}
