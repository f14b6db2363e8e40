use super::transaction::{StagedWrites, Transaction};
use crate::entity::{HasIdentity, HasAuditTimestamps, SequentialIdentity, SourceEntity};
use crate::error::{DomainError, DomainResult};
use crate::value_object::AuditStamp;
use chrono::Utc;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// 内存事务表
///
/// - 事务内读取先看本事务暂存的写入（读己之写），再看已提交数据；
/// - 写入只在事务提交时生效，回滚即丢弃；
/// - 整行写入（`save` / `delete`）在并发事务之间以最后提交者为准；
/// - 字段级修改（`modify` / `upsert`）在提交时重放到最新已提交行上，
///   只改动闭包触及的字段，不会用事务开始时读到的旧值覆盖其他事务的提交；
/// - 源实体的标识来自表内序列（从 1 开始），序列值不随回滚回收；
/// - 每张表在各自的锁内应用写入，跨表提交对并发读者不是原子的：
///   读者可能先看到一张表的新值、另一张表的旧值。
pub struct Table<E>
where
    E: HasIdentity,
{
    inner: Arc<TableInner<E>>,
}

struct TableInner<E>
where
    E: HasIdentity,
{
    id: Uuid,
    name: String,
    rows: RwLock<BTreeMap<E::Id, E>>,
    sequence: AtomicI64,
}

/// 单张表在某个事务中的暂存写入
struct TableWrites<E>
where
    E: HasIdentity,
{
    table: Arc<TableInner<E>>,
    changes: BTreeMap<E::Id, StagedRow<E>>,
}

type Patch<E> = Box<dyn Fn(&mut E) + Send + Sync>;

/// 某一行的暂存操作，提交时按顺序重放到已提交行上
enum RowOp<E> {
    Put(E),
    Delete,
    /// 行存在时应用 `patch`；不存在时写入 `init`（`None` 则保持不存在）
    Merge { init: Option<E>, patch: Patch<E> },
}

impl<E> RowOp<E> {
    fn replay(self, current: Option<E>) -> Option<E> {
        match self {
            Self::Put(row) => Some(row),
            Self::Delete => None,
            Self::Merge { init, patch } => match current {
                Some(mut row) => {
                    patch(&mut row);
                    Some(row)
                }
                None => init,
            },
        }
    }
}

struct StagedRow<E> {
    /// 本事务看到的行
    view: Option<E>,
    ops: Vec<RowOp<E>>,
}

impl<E> Clone for Table<E>
where
    E: HasIdentity,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E> Table<E>
where
    E: HasIdentity + Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TableInner {
                id: Uuid::new_v4(),
                name: name.into(),
                rows: RwLock::new(BTreeMap::new()),
                sequence: AtomicI64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// 事务内按标识读取
    pub fn find(&self, tx: &Transaction, id: &E::Id) -> DomainResult<Option<E>> {
        tx.ensure_active()?;
        if let Some(change) = tx
            .staged::<TableWrites<E>>(self.inner.id)
            .and_then(|w| w.changes.get(id))
        {
            return Ok(change.view.clone());
        }
        Ok(self.find_committed(id))
    }

    /// 事务内按标识读取，不存在时返回 `NotFound`
    pub fn get(&self, tx: &Transaction, id: &E::Id) -> DomainResult<E> {
        self.find(tx, id)?.ok_or_else(|| {
            DomainError::not_found(format!("{} #{id} does not exist", self.inner.name))
        })
    }

    pub fn exists(&self, tx: &Transaction, id: &E::Id) -> DomainResult<bool> {
        Ok(self.find(tx, id)?.is_some())
    }

    /// 事务内可见的全部行（按标识排序）
    pub fn all(&self, tx: &Transaction) -> DomainResult<Vec<E>> {
        tx.ensure_active()?;
        let mut rows = self.read().clone();
        if let Some(writes) = tx.staged::<TableWrites<E>>(self.inner.id) {
            for (id, change) in &writes.changes {
                match &change.view {
                    Some(row) => rows.insert(id.clone(), row.clone()),
                    None => rows.remove(id),
                };
            }
        }
        Ok(rows.into_values().collect())
    }

    /// 写入（新增或覆盖）整行
    pub fn save(&self, tx: &mut Transaction, row: E) -> DomainResult<()> {
        let id = row.id().clone();
        self.stage(tx, id, Some(row.clone()), RowOp::Put(row))
    }

    /// 删除一行，返回删除前是否存在
    pub fn delete(&self, tx: &mut Transaction, id: &E::Id) -> DomainResult<bool> {
        let existed = self.exists(tx, id)?;
        self.stage(tx, id.clone(), None, RowOp::Delete)?;
        Ok(existed)
    }

    /// 修改已有行的部分字段，返回本事务内修改后的行
    ///
    /// `patch` 立即作用于本事务的视图，提交时再作用于最新已提交行；
    /// 提交前该行已被其他事务删除时不做任何事。
    pub fn modify<F>(&self, tx: &mut Transaction, id: &E::Id, patch: F) -> DomainResult<E>
    where
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let mut row = self.get(tx, id)?;
        patch(&mut row);
        self.stage(
            tx,
            id.clone(),
            Some(row.clone()),
            RowOp::Merge {
                init: None,
                patch: Box::new(patch),
            },
        )?;
        Ok(row)
    }

    /// 行不存在时写入 `init`，存在时只应用 `patch`
    ///
    /// 提交时按最新已提交状态重新判断。返回本事务内的行，以及是否为新建。
    pub fn upsert<F>(
        &self,
        tx: &mut Transaction,
        id: &E::Id,
        init: E,
        patch: F,
    ) -> DomainResult<(E, bool)>
    where
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let (row, created) = match self.find(tx, id)? {
            Some(mut row) => {
                patch(&mut row);
                (row, false)
            }
            None => (init.clone(), true),
        };
        self.stage(
            tx,
            id.clone(),
            Some(row.clone()),
            RowOp::Merge {
                init: Some(init),
                patch: Box::new(patch),
            },
        )?;
        Ok((row, created))
    }

    /// 已提交数据（事务外读取）
    pub fn find_committed(&self, id: &E::Id) -> Option<E> {
        self.read().get(id).cloned()
    }

    pub fn all_committed(&self) -> Vec<E> {
        self.read().values().cloned().collect()
    }

    pub fn count_committed(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<E::Id, E>> {
        self.inner.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn stage(
        &self,
        tx: &mut Transaction,
        id: E::Id,
        view: Option<E>,
        op: RowOp<E>,
    ) -> DomainResult<()> {
        let table = self.inner.clone();
        let writes = tx.staged_mut(self.inner.id, move || TableWrites {
            table,
            changes: BTreeMap::new(),
        })?;
        let staged = writes.changes.entry(id).or_insert_with(|| StagedRow {
            view: None,
            ops: Vec::new(),
        });
        staged.view = view;
        staged.ops.push(op);
        Ok(())
    }
}

impl<E> Table<E>
where
    E: SourceEntity,
{
    /// 新增源实体：分配序列标识与审计时间
    pub fn insert(&self, tx: &mut Transaction, mut row: E) -> DomainResult<E> {
        tx.ensure_active()?;
        let next = self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        row.assign_id(<E::Id as SequentialIdentity>::from_sequence(next));
        *row.audit_mut() = AuditStamp::new(Utc::now());
        self.save(tx, row.clone())?;
        Ok(row)
    }

    /// 更新源实体：保留创建时间，刷新修改时间
    pub fn update(&self, tx: &mut Transaction, mut row: E) -> DomainResult<E> {
        let existing = self.get(tx, row.id())?;
        let mut stamp = AuditStamp::new(existing.created_at());
        stamp.touch(Utc::now());
        *row.audit_mut() = stamp;
        self.save(tx, row.clone())?;
        Ok(row)
    }
}

impl<E> StagedWrites for TableWrites<E>
where
    E: HasIdentity + Clone + Send + Sync + 'static,
{
    fn table_id(&self) -> Uuid {
        self.table.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn apply(self: Box<Self>) {
        let TableWrites { table, changes } = *self;
        let mut rows = table.rows.write().unwrap_or_else(PoisonError::into_inner);
        for (id, staged) in changes {
            let mut current = rows.remove(&id);
            for op in staged.ops {
                current = op.replay(current);
            }
            if let Some(row) = current {
                rows.insert(id, row);
            }
        }
    }
}
