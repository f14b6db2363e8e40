use bon::Builder;
use serde::{Deserialize, Serialize};

use super::event_envelope::EventEnvelope;

/// 业务上下文信息
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// 关联ID（同一业务请求引发的所有事务共享）
    #[builder(into)]
    correlation_id: Option<String>,
    /// 因果ID（直接引发本事务的事件ID）
    #[builder(into)]
    causation_id: Option<String>,
    /// 触发事件的主体类型（如用户、系统等）
    #[builder(into)]
    actor_type: Option<String>,
    /// 触发事件的主体ID
    #[builder(into)]
    actor_id: Option<String>,
}

impl EventContext {
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn actor_type(&self) -> Option<&str> {
        self.actor_type.as_deref()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    /// 由某个事件引发的后续上下文：继承关联ID与主体，因果ID为该事件ID
    pub fn caused_by(envelope: &EventEnvelope) -> Self {
        let parent = envelope.context();
        Self {
            correlation_id: parent
                .correlation_id
                .clone()
                .or_else(|| Some(envelope.event_id().to_string())),
            causation_id: Some(envelope.event_id().to_string()),
            actor_type: parent.actor_type.clone(),
            actor_id: parent.actor_id.clone(),
        }
    }

    /// 缺少关联ID时补齐
    pub(crate) fn ensure_correlation(mut self, fallback: impl FnOnce() -> String) -> Self {
        if self.correlation_id.is_none() {
            self.correlation_id = Some(fallback());
        }
        self
    }
}
