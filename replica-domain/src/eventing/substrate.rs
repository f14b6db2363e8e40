//! 分发底座（DispatchSubstrate）
//!
//! 发布器只依赖该协议；进程内实现见 `InProcessDispatcher`，
//! 将来替换为消息中间件时只需提供新的实现。
//!
use crate::domain_event::EventEnvelope;
use crate::error::DomainResult;
use crate::persist::Transaction;
use async_trait::async_trait;
use std::sync::Arc;

use super::handler::EventHandler;
use super::publisher::EventPublisher;

#[async_trait]
pub trait DispatchSubstrate: Send + Sync {
    /// 在发布事务内分发信封：
    /// - 事务内处理器立即执行，任一失败即返回错误；
    /// - 提交后处理器登记到事务的待投递队列。
    async fn dispatch(
        &self,
        publisher: &EventPublisher,
        tx: &mut Transaction,
        envelope: &EventEnvelope,
    ) -> DomainResult<()>;

    /// 按名称查找已注册处理器（用于死信重放）
    fn lookup(&self, _handler_name: &str) -> Option<Arc<dyn EventHandler>> {
        None
    }
}
