use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// 领域事件快照需要满足的通用能力边界
///
/// 快照是扁平、可序列化的值，不持有任何实体引用；通常通过 `#[domain_event]` 宏实现。
pub trait DomainEvent: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 事件类型（形如 `member.joined`）
    const KIND: &'static str;

    /// 快照结构版本
    const VERSION: usize = 1;
}
