//! 进程内分发器（InProcessDispatcher）
//!
//! 按注册顺序匹配处理器：事务内处理器在发布事务中立即执行，
//! 提交后处理器登记到事务的待投递队列，由 `TransactionManager` 在提交后释放。
//!
use crate::domain_event::EventEnvelope;
use crate::error::{DomainError, DomainResult};
use crate::persist::Transaction;
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{trace, warn};

use super::handler::{DeliveryPhase, EventHandler, HandlerContext, PendingDelivery};
use super::publisher::EventPublisher;
use super::substrate::DispatchSubstrate;

#[derive(Clone)]
struct Registration {
    handler: Arc<dyn EventHandler>,
    phase: DeliveryPhase,
}

#[derive(Default)]
pub struct InProcessDispatcher {
    registry: RwLock<Vec<Registration>>,
}

impl InProcessDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以处理器声明的阶段注册
    pub fn register(&self, handler: Arc<dyn EventHandler>) -> DomainResult<()> {
        let phase = handler.delivery_phase();
        self.register_with_phase(handler, phase)
    }

    /// 以指定阶段注册；处理器名称必须唯一
    pub fn register_with_phase(
        &self,
        handler: Arc<dyn EventHandler>,
        phase: DeliveryPhase,
    ) -> DomainResult<()> {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry
            .iter()
            .any(|r| r.handler.handler_name() == handler.handler_name())
        {
            return Err(DomainError::dispatch(format!(
                "handler '{}' already registered",
                handler.handler_name()
            )));
        }
        registry.push(Registration { handler, phase });
        Ok(())
    }

    pub fn handler_names(&self) -> Vec<String> {
        self.read()
            .iter()
            .map(|r| r.handler.handler_name().to_string())
            .collect()
    }

    fn matching(&self, kind: &str) -> Vec<Registration> {
        self.read()
            .iter()
            .filter(|r| r.handler.handled_event_type().matches(kind))
            .cloned()
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Registration>> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DispatchSubstrate for InProcessDispatcher {
    async fn dispatch(
        &self,
        publisher: &EventPublisher,
        tx: &mut Transaction,
        envelope: &EventEnvelope,
    ) -> DomainResult<()> {
        let matched = self.matching(envelope.kind());
        if matched.is_empty() {
            trace!(kind = envelope.kind(), "no handler registered");
            return Ok(());
        }

        let (inline, deferred): (Vec<_>, Vec<_>) = matched
            .into_iter()
            .partition(|r| r.phase == DeliveryPhase::InTransaction);

        for Registration { handler, .. } in inline {
            let mut ctx = HandlerContext::new(tx, publisher);
            if let Err(err) = handler.handle(&mut ctx, envelope).await {
                warn!(
                    handler = handler.handler_name(),
                    kind = envelope.kind(),
                    event_id = envelope.event_id(),
                    error = %err,
                    "in-transaction handler failed, vetoing transaction"
                );
                return Err(DomainError::handler(handler.handler_name(), err));
            }
        }

        for Registration { handler, .. } in deferred {
            tx.defer(PendingDelivery::new(handler, envelope.clone()))?;
        }
        Ok(())
    }

    fn lookup(&self, handler_name: &str) -> Option<Arc<dyn EventHandler>> {
        self.read()
            .iter()
            .find(|r| r.handler.handler_name() == handler_name)
            .map(|r| r.handler.clone())
    }
}
