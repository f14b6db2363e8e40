//! 事件处理器（EventHandler）
//!
//! 定义消费某类/多类/全部事件的处理逻辑与元信息（名称、订阅类型、投递阶段）。
//!
use crate::domain_event::{DomainEvent, DomainEvents, EventEnvelope};
use crate::error::DomainResult;
use crate::persist::Transaction;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::publisher::EventPublisher;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandledEventType {
    One(String),
    Many(Vec<String>),
    All,
}

impl HandledEventType {
    /// 订阅单一类型化事件
    pub fn of<E: DomainEvent>() -> Self {
        Self::One(E::KIND.to_string())
    }

    pub fn matches(&self, kind: &str) -> bool {
        match self {
            Self::One(k) => k == kind,
            Self::Many(ks) => ks.iter().any(|k| k == kind),
            Self::All => true,
        }
    }
}

/// 投递阶段
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryPhase {
    /// 与发布事务同步执行；失败即否决发布事务
    InTransaction,
    /// 发布事务提交后执行，每个处理器使用全新事务
    #[default]
    AfterCommit,
}

/// 处理器执行上下文：当前事务 + 发布器
pub struct HandlerContext<'a> {
    tx: &'a mut Transaction,
    publisher: &'a EventPublisher,
}

impl<'a> HandlerContext<'a> {
    pub fn new(tx: &'a mut Transaction, publisher: &'a EventPublisher) -> Self {
        Self { tx, publisher }
    }

    pub fn tx(&mut self) -> &mut Transaction {
        &mut *self.tx
    }

    pub fn publisher(&self) -> &EventPublisher {
        self.publisher
    }

    /// 同时取得事务与发布器
    pub fn parts(&mut self) -> (&mut Transaction, &EventPublisher) {
        (&mut *self.tx, self.publisher)
    }

    /// 在当前事务内发布事件
    pub async fn publish<E: DomainEvent>(&mut self, event: &E) -> DomainResult<()> {
        self.publisher.publish(&mut *self.tx, event).await
    }

    /// 在当前事务内发布聚合收集的事件
    pub async fn publish_all(&mut self, events: DomainEvents) -> DomainResult<()> {
        self.publisher.publish_all(&mut *self.tx, events).await
    }
}

/// 事件处理器：处理某一类型的事件
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 处理器名称（注册表内唯一，用于失败记录与重放）
    fn handler_name(&self) -> &str;

    /// 返回该处理器支持的事件类型
    fn handled_event_type(&self) -> HandledEventType;

    /// 默认在发布事务提交后执行
    fn delivery_phase(&self) -> DeliveryPhase {
        DeliveryPhase::AfterCommit
    }

    /// 处理事件
    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()>;
}

/// 挂在事务上、等待提交后执行的投递
#[derive(Clone)]
pub struct PendingDelivery {
    handler: Arc<dyn EventHandler>,
    envelope: EventEnvelope,
}

impl PendingDelivery {
    pub fn new(handler: Arc<dyn EventHandler>, envelope: EventEnvelope) -> Self {
        Self { handler, envelope }
    }

    pub fn handler(&self) -> &Arc<dyn EventHandler> {
        &self.handler
    }

    pub fn envelope(&self) -> &EventEnvelope {
        &self.envelope
    }

    pub(crate) fn into_parts(self) -> (Arc<dyn EventHandler>, EventEnvelope) {
        (self.handler, self.envelope)
    }
}

impl fmt::Debug for PendingDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingDelivery")
            .field("handler", &self.handler.handler_name())
            .field("kind", &self.envelope.kind())
            .field("event_id", &self.envelope.event_id())
            .finish()
    }
}
