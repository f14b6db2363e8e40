use crate::shared::member::{MemberDto, MemberId, ReplicaMember};
use chrono::{DateTime, Utc};
use replica_domain::entity::{HasAuditTimestamps, HasIdentity, ReplicaEntity};

/// 结算上下文的会员副本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutMember {
    base: ReplicaMember,
}

impl PayoutMember {
    pub fn username(&self) -> &str {
        self.base.profile().username()
    }

    pub fn nickname(&self) -> &str {
        self.base.profile().nickname()
    }

    pub fn activity_score(&self) -> i32 {
        self.base.profile().activity_score()
    }

    pub fn replica(&self) -> &ReplicaMember {
        &self.base
    }
}

impl HasIdentity for PayoutMember {
    type Id = MemberId;

    fn id(&self) -> &MemberId {
        self.base.id()
    }
}

impl HasAuditTimestamps for PayoutMember {
    fn created_at(&self) -> DateTime<Utc> {
        self.base.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.base.modified_at()
    }
}

impl ReplicaEntity for PayoutMember {
    type Snapshot = MemberDto;

    fn from_snapshot(snapshot: &MemberDto, folded_at: DateTime<Utc>) -> Self {
        Self {
            base: ReplicaMember::first_sight(snapshot, folded_at),
        }
    }

    fn refresh(&mut self, snapshot: &MemberDto, folded_at: DateTime<Utc>) {
        self.base.refresh(snapshot, folded_at);
    }

    fn folded_at(&self) -> DateTime<Utc> {
        self.base.stamp().folded_at()
    }
}
