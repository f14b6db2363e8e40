//! 死信（DeadLetter）
//!
//! 提交后处理器失败时记录“处理器 + 信封 + 原因”，不自动重试；
//! 通过 `TransactionManager::redeliver` 人工重放，依赖折叠的幂等性。
//!
use crate::domain_event::EventEnvelope;
use crate::error::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// 一条失败记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    handler_name: String,
    envelope: EventEnvelope,
    reason: String,
    failed_at: DateTime<Utc>,
    attempts: u32,
}

impl DeadLetter {
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    pub fn envelope(&self) -> &EventEnvelope {
        &self.envelope
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn failed_at(&self) -> DateTime<Utc> {
        self.failed_at
    }

    /// 累计失败次数
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn same_target(&self, handler_name: &str, event_id: &str) -> bool {
        self.handler_name == handler_name && self.envelope.event_id() == event_id
    }
}

/// 死信存储
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// 处理器粒度的失败标记
    async fn mark_handler_failed(
        &self,
        handler_name: &str,
        envelope: &EventEnvelope,
        reason: &str,
    ) -> DomainResult<()>;

    /// 拉取待处理的失败记录
    async fn fetch_pending(&self) -> DomainResult<Vec<DeadLetter>>;

    /// 标记已重放成功（移除记录）
    async fn mark_reclaimed(&self, letter: &DeadLetter) -> DomainResult<()>;
}

#[derive(Default)]
pub struct InMemoryDeadLetters {
    letters: Mutex<Vec<DeadLetter>>,
}

impl InMemoryDeadLetters {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryDeadLetters {
    async fn mark_handler_failed(
        &self,
        handler_name: &str,
        envelope: &EventEnvelope,
        reason: &str,
    ) -> DomainResult<()> {
        let mut letters = self.letters.lock().await;
        match letters
            .iter_mut()
            .find(|l| l.same_target(handler_name, envelope.event_id()))
        {
            Some(letter) => {
                letter.attempts += 1;
                letter.reason = reason.to_string();
                letter.failed_at = Utc::now();
            }
            None => letters.push(DeadLetter {
                handler_name: handler_name.to_string(),
                envelope: envelope.clone(),
                reason: reason.to_string(),
                failed_at: Utc::now(),
                attempts: 1,
            }),
        }
        Ok(())
    }

    async fn fetch_pending(&self) -> DomainResult<Vec<DeadLetter>> {
        Ok(self.letters.lock().await.clone())
    }

    async fn mark_reclaimed(&self, letter: &DeadLetter) -> DomainResult<()> {
        self.letters
            .lock()
            .await
            .retain(|l| !l.same_target(letter.handler_name(), letter.envelope().event_id()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_event::{DomainEvent, EventContext};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping {
        n: u8,
    }

    impl DomainEvent for Ping {
        const KIND: &'static str = "test.ping";
    }

    #[tokio::test]
    async fn repeated_failures_accumulate_attempts() {
        let sink = InMemoryDeadLetters::new();
        let envelope = EventEnvelope::new(&Ping { n: 1 }, EventContext::default()).unwrap();

        sink.mark_handler_failed("h", &envelope, "first").await.unwrap();
        sink.mark_handler_failed("h", &envelope, "second").await.unwrap();
        sink.mark_handler_failed("other", &envelope, "x").await.unwrap();

        let pending = sink.fetch_pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].attempts(), 2);
        assert_eq!(pending[0].reason(), "second");

        sink.mark_reclaimed(&pending[0]).await.unwrap();
        let pending = sink.fetch_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].handler_name(), "other");
    }
}
