use super::domain_event_trait::DomainEvent;
use super::event_context::EventContext;
use super::event_envelope::EventEnvelope;
use crate::error::DomainResult;
use std::vec::IntoIter;

/// 待发布事件收集器
///
/// 聚合方法以 `&mut DomainEvents` 接收该上下文对象并登记事件；
/// 用例在同一事务内把收集到的事件交给发布器。登记时立即生成快照。
#[derive(Debug, Default)]
pub struct DomainEvents {
    events: Vec<EventEnvelope>,
}

impl DomainEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记事件：立即序列化为信封
    pub fn raise<E>(&mut self, event: &E) -> DomainResult<()>
    where
        E: DomainEvent,
    {
        self.events
            .push(EventEnvelope::new(event, EventContext::default())?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventEnvelope> {
        self.events.iter()
    }

    /// 取出全部事件并清空
    pub fn take(&mut self) -> Vec<EventEnvelope> {
        std::mem::take(&mut self.events)
    }
}

impl IntoIterator for DomainEvents {
    type Item = EventEnvelope;
    type IntoIter = IntoIter<EventEnvelope>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
