//! 实体能力（Entity）
//!
//! 以组合代替继承：实体通过实现能力 trait 声明自己具备“标识”、“审计时间戳”，
//! 并按来源区分为两类：
//! - 源实体（`SourceEntity`）：由所属上下文写入，标识与审计时间由存储分配；
//! - 副本实体（`ReplicaEntity`）：由依赖上下文折叠事件快照得到，标识与时间从快照复制。
//!
use crate::value_object::AuditStamp;
use chrono::{DateTime, Utc};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// 实体标识
pub trait Identity:
    Clone + Eq + Ord + Hash + Debug + Display + Send + Sync + 'static
{
}

/// 由存储按表内序列分配的标识（从 1 开始）
pub trait SequentialIdentity: Identity {
    fn from_sequence(value: i64) -> Self;

    /// 未分配标识的占位值
    fn unassigned() -> Self {
        Self::from_sequence(0)
    }
}

/// 具备标识
pub trait HasIdentity {
    type Id: Identity;

    fn id(&self) -> &Self::Id;
}

/// 具备审计时间戳
pub trait HasAuditTimestamps {
    fn created_at(&self) -> DateTime<Utc>;

    fn modified_at(&self) -> DateTime<Utc>;
}

/// 源实体：只能由所属上下文修改，写入时由存储分配标识与审计时间
pub trait SourceEntity:
    HasIdentity<Id: SequentialIdentity> + HasAuditTimestamps + Clone + Send + Sync + 'static
{
    /// 存储在首次写入时回填标识
    fn assign_id(&mut self, id: Self::Id);

    /// 存储维护的审计时间戳
    fn audit_mut(&mut self) -> &mut AuditStamp;
}

/// 副本实体：其他上下文源实体的本地只读投影
///
/// 字段是白名单：只复制快照中的标识、源审计时间与允许的业务字段，
/// 副本自身派生的字段（如计数）在重复折叠时保持不变。
/// `refresh` 在提交时会重放到最新已提交行上，只能改动白名单字段与折叠时间。
pub trait ReplicaEntity: HasIdentity + HasAuditTimestamps + Clone + Send + Sync + 'static {
    /// 被折叠的事件快照
    type Snapshot: Clone + Send + Sync + 'static;

    /// 首次见到该标识时构建副本
    fn from_snapshot(snapshot: &Self::Snapshot, folded_at: DateTime<Utc>) -> Self;

    /// 再次见到该标识时覆盖白名单字段与源修改时间
    fn refresh(&mut self, snapshot: &Self::Snapshot, folded_at: DateTime<Utc>);

    /// 最近一次折叠时间
    fn folded_at(&self) -> DateTime<Utc>;
}
