use crate::dto::Dto;
use chrono::{DateTime, Utc};
use replica_domain::domain_event::{DomainEvent, EventEnvelope};
use replica_domain::entity::{HasAuditTimestamps, HasIdentity};
use replica_domain::error::DomainResult;
use replica_domain::eventing::HandledEventType;
use replica_domain::value_object::{AuditStamp, ReplicaStamp};
use replica_macros::{domain_event, entity_id, value_object};
use serde::{Deserialize, Serialize};

#[entity_id(sequential)]
pub struct MemberId(i64);

/// 会员快照：副本折叠的唯一输入，不含密码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    pub id: MemberId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub username: String,
    pub nickname: String,
    pub activity_score: i32,
}

impl Dto for MemberDto {}

impl HasIdentity for MemberDto {
    type Id = MemberId;

    fn id(&self) -> &MemberId {
        &self.id
    }
}

#[domain_event(kind = "member.joined")]
pub struct MemberJoined {
    pub member: MemberDto,
}

#[domain_event(kind = "member.modified")]
pub struct MemberModified {
    pub member: MemberDto,
}

/// 订阅会员加入与修改事件
pub fn member_event_kinds() -> HandledEventType {
    HandledEventType::Many(vec![
        MemberJoined::KIND.to_string(),
        MemberModified::KIND.to_string(),
    ])
}

/// 从会员加入/修改事件中取出快照
pub fn member_snapshot(envelope: &EventEnvelope) -> DomainResult<MemberDto> {
    if envelope.is::<MemberJoined>() {
        Ok(envelope.decode::<MemberJoined>()?.member)
    } else {
        Ok(envelope.decode::<MemberModified>()?.member)
    }
}

/// 副本可复制的会员字段（白名单）
#[value_object(default = false)]
pub struct MemberProfile {
    username: String,
    nickname: String,
    activity_score: i32,
}

impl MemberProfile {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn activity_score(&self) -> i32 {
        self.activity_score
    }
}

impl From<&MemberDto> for MemberProfile {
    fn from(dto: &MemberDto) -> Self {
        Self {
            username: dto.username.clone(),
            nickname: dto.nickname.clone(),
            activity_score: dto.activity_score,
        }
    }
}

/// 各上下文会员副本的公共部分：标识 + 副本时间戳 + 白名单字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaMember {
    id: MemberId,
    stamp: ReplicaStamp,
    profile: MemberProfile,
}

impl ReplicaMember {
    /// 首次见到该会员
    pub fn first_sight(dto: &MemberDto, folded_at: DateTime<Utc>) -> Self {
        Self {
            id: dto.id.clone(),
            stamp: ReplicaStamp::first_sight(
                AuditStamp::copied(dto.created_at, dto.modified_at),
                folded_at,
            ),
            profile: MemberProfile::from(dto),
        }
    }

    /// 再次折叠：覆盖白名单字段与源修改时间
    pub fn refresh(&mut self, dto: &MemberDto, folded_at: DateTime<Utc>) {
        self.stamp.refresh(dto.modified_at, folded_at);
        self.profile = MemberProfile::from(dto);
    }

    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn profile(&self) -> &MemberProfile {
        &self.profile
    }

    pub fn stamp(&self) -> &ReplicaStamp {
        &self.stamp
    }
}

impl HasAuditTimestamps for ReplicaMember {
    fn created_at(&self) -> DateTime<Utc> {
        self.stamp.origin().created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.stamp.origin().modified_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use replica_domain::domain_event::EventContext;

    fn dto(nickname: &str, score: i32, modified_at: DateTime<Utc>) -> MemberDto {
        MemberDto {
            id: MemberId::new(7),
            created_at: modified_at - Duration::minutes(5),
            modified_at,
            username: "user7".into(),
            nickname: nickname.into(),
            activity_score: score,
        }
    }

    #[test]
    fn snapshot_payload_never_carries_password() {
        let envelope = EventEnvelope::new(
            &MemberJoined {
                member: dto("ann", 0, Utc::now()),
            },
            EventContext::default(),
        )
        .unwrap();

        assert_eq!(envelope.kind(), MemberJoined::KIND);
        let member = envelope.payload().get("member").unwrap();
        assert!(member.get("password").is_none());
        assert_eq!(member.get("nickname").unwrap(), "ann");
    }

    #[test]
    fn refresh_overwrites_allow_list_and_keeps_origin_creation() {
        let t0 = Utc::now();
        let first = dto("ann", 0, t0);
        let mut replica = ReplicaMember::first_sight(&first, t0);

        let later = dto("anna", 3, t0 + Duration::minutes(1));
        replica.refresh(&later, t0 + Duration::minutes(2));

        assert_eq!(replica.id(), &MemberId::new(7));
        assert_eq!(replica.created_at(), first.created_at);
        assert_eq!(replica.modified_at(), later.modified_at);
        assert_eq!(replica.profile().nickname(), "anna");
        assert_eq!(replica.profile().activity_score(), 3);
    }
}
