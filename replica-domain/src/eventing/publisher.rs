//! 事件发布器（EventPublisher）
//!
//! 不使用全局单例：发布器由装配代码创建后注入用例与处理器。
//!
use crate::domain_event::{DomainEvent, DomainEvents, EventEnvelope};
use crate::error::DomainResult;
use crate::persist::Transaction;
use std::sync::Arc;
use tracing::debug;

use super::substrate::DispatchSubstrate;

#[derive(Clone)]
pub struct EventPublisher {
    substrate: Arc<dyn DispatchSubstrate>,
}

impl EventPublisher {
    pub fn new(substrate: Arc<dyn DispatchSubstrate>) -> Self {
        Self { substrate }
    }

    pub fn substrate(&self) -> &Arc<dyn DispatchSubstrate> {
        &self.substrate
    }

    /// 以事务上下文构造信封并发布
    pub async fn publish<E>(&self, tx: &mut Transaction, event: &E) -> DomainResult<()>
    where
        E: DomainEvent,
    {
        let envelope = EventEnvelope::new(event, tx.context().clone())?;
        self.publish_envelope(tx, envelope).await
    }

    /// 发布已构造的信封；未携带上下文的信封使用事务上下文
    pub async fn publish_envelope(
        &self,
        tx: &mut Transaction,
        envelope: EventEnvelope,
    ) -> DomainResult<()> {
        tx.ensure_active()?;
        let envelope = envelope.in_context(tx.context());
        debug!(
            transaction_id = %tx.id(),
            kind = envelope.kind(),
            event_id = envelope.event_id(),
            "publishing domain event"
        );
        self.substrate.dispatch(self, tx, &envelope).await
    }

    /// 按登记顺序发布收集到的事件，遇错即止
    pub async fn publish_all(&self, tx: &mut Transaction, events: DomainEvents) -> DomainResult<()> {
        for envelope in events {
            self.publish_envelope(tx, envelope).await?;
        }
        Ok(())
    }
}
