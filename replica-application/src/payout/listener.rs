use super::domain::PayoutMember;
use crate::shared::member::{member_event_kinds, member_snapshot};
use async_trait::async_trait;
use replica_domain::domain_event::EventEnvelope;
use replica_domain::error::DomainResult;
use replica_domain::eventing::{EventHandler, HandledEventType, HandlerContext, fold_replica};
use replica_domain::persist::Table;
use tracing::debug;

pub struct PayoutSyncMemberHandler {
    members: Table<PayoutMember>,
}

impl PayoutSyncMemberHandler {
    pub fn new(members: Table<PayoutMember>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl EventHandler for PayoutSyncMemberHandler {
    fn handler_name(&self) -> &str {
        "PayoutSyncMemberHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        member_event_kinds()
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let snapshot = member_snapshot(envelope)?;
        let (_, outcome) = fold_replica(&self.members, ctx.tx(), &snapshot)?;
        debug!(member_id = %snapshot.id, ?outcome, "payout member synced");
        Ok(())
    }
}
