//! 事件子系统（eventing）
//!
//! 提供事务内领域事件分发与副本同步的基础抽象：
//! - `EventPublisher`：以依赖注入方式传递的发布器，把信封交给分发底座；
//! - `DispatchSubstrate`：可替换的分发底座（进程内实现为 `InProcessDispatcher`）；
//! - `EventHandler`：按事件类型与投递阶段（事务内 / 提交后）注册的处理器；
//! - `DeadLetterSink`：提交后处理失败的记录与人工重放；
//! - `fold_replica`：把事件快照幂等折叠到本地副本表。
//!
//! 该模块不绑定具体传输，替换为消息中间件时折叠代码无需改动。
//!
mod config;
mod dead_letter;
mod dispatcher;
mod fold;
mod handler;
mod publisher;
mod substrate;

pub use config::{DispatchConfig, PostCommitMode};
pub use dead_letter::{DeadLetter, DeadLetterSink, InMemoryDeadLetters};
pub use dispatcher::InProcessDispatcher;
pub use fold::{FoldOutcome, fold_replica};
pub use handler::{DeliveryPhase, EventHandler, HandledEventType, HandlerContext, PendingDelivery};
pub use publisher::EventPublisher;
pub use substrate::DispatchSubstrate;
