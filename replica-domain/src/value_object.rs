//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//! 审计时间戳以值对象形式组合进源实体与副本实体，而不是通过继承共享。
//!
use crate::error::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use replica_macros::value_object;

/// 值对象抽象
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    /// 创建值对象时进行验证
    fn validate(&self) -> Result<(), Self::Error>;
}

/// 审计时间戳（创建时间 / 最后修改时间）
///
/// 源实体由存储层在写入时分配；副本实体从事件快照中原样复制。
///
/// ```
/// use chrono::{Duration, Utc};
/// use replica_domain::value_object::AuditStamp;
///
/// let t0 = Utc::now();
/// let mut stamp = AuditStamp::new(t0);
/// stamp.touch(t0 + Duration::seconds(5));
/// assert_eq!(stamp.created_at(), t0);
/// assert!(stamp.modified_at() > stamp.created_at());
/// ```
#[value_object(default = false, copy = true)]
pub struct AuditStamp {
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl AuditStamp {
    /// 首次写入：创建与修改时间相同
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            modified_at: at,
        }
    }

    /// 由已有时间恢复（例如从快照复制）
    pub fn restore(created_at: DateTime<Utc>, modified_at: DateTime<Utc>) -> DomainResult<Self> {
        let stamp = Self {
            created_at,
            modified_at,
        };
        stamp.validate()?;
        Ok(stamp)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// 复制外部给出的时间（修改时间早于创建时间时取创建时间）
    pub fn copied(created_at: DateTime<Utc>, modified_at: DateTime<Utc>) -> Self {
        let mut stamp = Self::new(created_at);
        stamp.touch(modified_at);
        stamp
    }

    /// 更新修改时间，不早于创建时间
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.modified_at = at.max(self.created_at);
    }
}

impl ValueObject for AuditStamp {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.modified_at < self.created_at {
            return Err(DomainError::invalid_value(format!(
                "modified_at {} precedes created_at {}",
                self.modified_at, self.created_at
            )));
        }
        Ok(())
    }
}

/// 副本时间戳：源实体的审计时间（复制而来）+ 副本自身最近一次折叠的时间
#[value_object(default = false, copy = true)]
pub struct ReplicaStamp {
    origin: AuditStamp,
    folded_at: DateTime<Utc>,
}

impl ReplicaStamp {
    /// 首次折叠
    pub fn first_sight(origin: AuditStamp, folded_at: DateTime<Utc>) -> Self {
        Self { origin, folded_at }
    }

    /// 再次折叠：只刷新源修改时间与折叠时间，源创建时间保持不变
    pub fn refresh(&mut self, origin_modified_at: DateTime<Utc>, folded_at: DateTime<Utc>) {
        self.origin.touch(origin_modified_at);
        self.folded_at = folded_at;
    }

    pub fn origin(&self) -> &AuditStamp {
        &self.origin
    }

    pub fn folded_at(&self) -> DateTime<Utc> {
        self.folded_at
    }
}
