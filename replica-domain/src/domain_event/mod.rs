//! 领域事件（Domain Event）与事件信封
//!
//! 定义事件快照需要实现的最小接口（`DomainEvent`），将快照与元数据/上下文
//! 封装后的不可变 `EventEnvelope`，以及聚合在事务中收集待发布事件的 `DomainEvents`。

mod domain_event_trait;
mod domain_events;
mod event_context;
mod event_envelope;
mod metadata;

pub use domain_event_trait::DomainEvent;
pub use domain_events::DomainEvents;
pub use event_context::EventContext;
pub use event_envelope::EventEnvelope;
pub use metadata::Metadata;
