use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::domain_event_trait::DomainEvent;
use super::event_context::EventContext;
use super::metadata::Metadata;
use crate::error::{DomainError, DomainResult};

/// 事件信封，包含事件快照、元数据与业务上下文
///
/// 快照在构造时一次性序列化为 JSON 值，之后对源实体的任何修改都不会影响
/// 已经创建（或已分发）的信封。信封只读，可跨事务、跨任务安全传递。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    metadata: Metadata,
    context: EventContext,
    payload: Value,
}

impl EventEnvelope {
    pub fn new<E>(event: &E, context: EventContext) -> DomainResult<Self>
    where
        E: DomainEvent,
    {
        let payload = serde_json::to_value(event)?;
        let metadata = Metadata::builder()
            .event_id(Uuid::new_v4().to_string())
            .kind(E::KIND)
            .version(E::VERSION)
            .occurred_at(Utc::now())
            .build();

        Ok(Self {
            metadata,
            context,
            payload,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn kind(&self) -> &str {
        self.metadata.kind()
    }

    pub fn event_id(&self) -> &str {
        self.metadata.event_id()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        *self.metadata.occurred_at()
    }

    pub fn context(&self) -> &EventContext {
        &self.context
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// 是否为指定类型的事件
    pub fn is<E: DomainEvent>(&self) -> bool {
        self.kind() == E::KIND
    }

    /// 将快照还原为类型化事件；类型不符时返回 `TypeMismatch`
    pub fn decode<E>(&self) -> DomainResult<E>
    where
        E: DomainEvent,
    {
        if !self.is::<E>() {
            return Err(DomainError::TypeMismatch {
                expected: E::KIND.to_string(),
                found: self.kind().to_string(),
            });
        }
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    /// 以发布事务的上下文重新定位（事件ID与快照不变）
    pub(crate) fn in_context(mut self, context: &EventContext) -> Self {
        if self.context.correlation_id().is_none() {
            self.context = context.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Renamed {
        id: i64,
        nickname: String,
    }

    impl DomainEvent for Renamed {
        const KIND: &'static str = "test.renamed";
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Other {
        id: i64,
    }

    impl DomainEvent for Other {
        const KIND: &'static str = "test.other";
        const VERSION: usize = 2;
    }

    #[test]
    fn payload_is_detached_from_the_source_value() {
        let mut source = Renamed {
            id: 7,
            nickname: "ann".into(),
        };
        let envelope = EventEnvelope::new(&source, EventContext::default()).unwrap();
        source.nickname = "bob".into();

        let decoded: Renamed = envelope.decode().unwrap();
        assert_eq!(decoded.nickname, "ann");
        assert_eq!(envelope.kind(), "test.renamed");
        assert_eq!(envelope.metadata().version(), 1);
    }

    #[test]
    fn decode_rejects_other_kinds() {
        let envelope = EventEnvelope::new(&Other { id: 1 }, EventContext::default()).unwrap();
        assert_eq!(envelope.metadata().version(), 2);

        let err = envelope.decode::<Renamed>().unwrap_err();
        assert!(matches!(err, DomainError::TypeMismatch { .. }));
    }

    #[test]
    fn envelope_survives_wire_round_trip() {
        let ctx = EventContext::builder()
            .correlation_id("corr-1")
            .actor_id("7")
            .build();
        let envelope = EventEnvelope::new(
            &Renamed {
                id: 7,
                nickname: "ann".into(),
            },
            ctx,
        )
        .unwrap();

        let wire = serde_json::to_string(&envelope).unwrap();
        let back: EventEnvelope = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, envelope);
        assert_eq!(back.context().correlation_id(), Some("corr-1"));
    }

    #[test]
    fn caused_by_inherits_correlation_and_points_at_event() {
        let ctx = EventContext::builder().correlation_id("corr-9").build();
        let envelope = EventEnvelope::new(&Other { id: 3 }, ctx).unwrap();

        let next = EventContext::caused_by(&envelope);
        assert_eq!(next.correlation_id(), Some("corr-9"));
        assert_eq!(next.causation_id(), Some(envelope.event_id()));
    }
}
