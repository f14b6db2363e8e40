//! 副本折叠
//!
//! 把事件快照折叠到本地副本表：首次见到某标识时插入，之后只覆盖白名单字段。
//! 不做版本比较，最后应用者为准；对同一快照重复折叠结果不变。
//!
use crate::entity::{HasIdentity, ReplicaEntity};
use crate::error::DomainResult;
use crate::persist::{Table, Transaction};
use chrono::Utc;
use tracing::debug;

/// 折叠结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    /// 首次见到该标识，新建副本
    Created,
    /// 已有副本，覆盖白名单字段
    Updated,
}

impl FoldOutcome {
    pub fn is_first_sight(&self) -> bool {
        matches!(self, Self::Created)
    }
}

/// 在事务内把快照折叠到副本表，返回本事务内折叠后的副本
///
/// 再次折叠以字段级修改暂存，提交时只刷新最新已提交行的白名单字段，
/// 不会覆盖同时提交的副本自有字段。
pub fn fold_replica<R>(
    table: &Table<R>,
    tx: &mut Transaction,
    snapshot: &R::Snapshot,
) -> DomainResult<(R, FoldOutcome)>
where
    R: ReplicaEntity,
    R::Snapshot: HasIdentity<Id = R::Id>,
{
    let folded_at = Utc::now();
    let latest = snapshot.clone();
    let (replica, created) = table.upsert(
        tx,
        snapshot.id(),
        R::from_snapshot(snapshot, folded_at),
        move |row: &mut R| row.refresh(&latest, folded_at),
    )?;
    let outcome = if created {
        FoldOutcome::Created
    } else {
        FoldOutcome::Updated
    };

    debug!(
        table = table.name(),
        id = %replica.id(),
        outcome = ?outcome,
        "replica folded"
    );
    Ok((replica, outcome))
}
