use crate::shared::member::{MemberDto, MemberId, MemberJoined, MemberModified};
use chrono::{DateTime, Utc};
use replica_domain::domain_event::DomainEvents;
use replica_domain::entity::{HasAuditTimestamps, HasIdentity, SequentialIdentity, SourceEntity};
use replica_domain::error::{DomainError, DomainResult};
use replica_domain::value_object::AuditStamp;

/// 会员（源实体）
///
/// 只能通过下列方法修改；标识与审计时间由存储在写入时分配。
#[derive(Debug, Clone)]
pub struct Member {
    id: MemberId,
    audit: AuditStamp,
    username: String,
    password: String,
    nickname: String,
    activity_score: i32,
}

impl Member {
    /// 新会员（尚未持久化）
    pub fn join(
        username: impl Into<String>,
        password: impl Into<String>,
        nickname: impl Into<String>,
    ) -> DomainResult<Self> {
        let username = username.into();
        let nickname = nickname.into();
        if username.trim().is_empty() {
            return Err(DomainError::invalid_command("username must not be blank"));
        }
        if nickname.trim().is_empty() {
            return Err(DomainError::invalid_command("nickname must not be blank"));
        }

        Ok(Self {
            id: MemberId::unassigned(),
            audit: AuditStamp::new(Utc::now()),
            username,
            password: password.into(),
            nickname,
            activity_score: 0,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn activity_score(&self) -> i32 {
        self.activity_score
    }

    pub fn check_password(&self, password: &str) -> bool {
        self.password == password
    }

    /// 修改昵称，返回是否有变化
    pub fn change_nickname(&mut self, nickname: impl Into<String>) -> DomainResult<bool> {
        let nickname = nickname.into();
        if nickname.trim().is_empty() {
            return Err(DomainError::invalid_command("nickname must not be blank"));
        }
        if nickname == self.nickname {
            return Ok(false);
        }
        self.nickname = nickname;
        Ok(true)
    }

    /// 增加活跃度
    pub fn increase_activity_score(&mut self, amount: i32) -> DomainResult<()> {
        if amount <= 0 {
            return Err(DomainError::invalid_command(format!(
                "activity score increment must be positive, got {amount}"
            )));
        }
        self.activity_score = self
            .activity_score
            .checked_add(amount)
            .ok_or_else(|| DomainError::invalid_state("activity score overflow"))?;
        Ok(())
    }

    pub fn to_dto(&self) -> MemberDto {
        MemberDto {
            id: self.id.clone(),
            created_at: self.created_at(),
            modified_at: self.modified_at(),
            username: self.username.clone(),
            nickname: self.nickname.clone(),
            activity_score: self.activity_score,
        }
    }

    /// 持久化后登记“已加入”事件
    pub fn raise_joined(&self, events: &mut DomainEvents) -> DomainResult<()> {
        events.raise(&MemberJoined {
            member: self.to_dto(),
        })
    }

    /// 持久化后登记“已修改”事件
    pub fn raise_modified(&self, events: &mut DomainEvents) -> DomainResult<()> {
        events.raise(&MemberModified {
            member: self.to_dto(),
        })
    }
}

impl HasIdentity for Member {
    type Id = MemberId;

    fn id(&self) -> &MemberId {
        &self.id
    }
}

impl HasAuditTimestamps for Member {
    fn created_at(&self) -> DateTime<Utc> {
        self.audit.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.audit.modified_at()
    }
}

impl SourceEntity for Member {
    fn assign_id(&mut self, id: MemberId) {
        self.id = id;
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }
}
