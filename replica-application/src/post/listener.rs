use super::domain::PostMember;
use crate::shared::member::{member_event_kinds, member_snapshot};
use async_trait::async_trait;
use replica_domain::domain_event::EventEnvelope;
use replica_domain::error::DomainResult;
use replica_domain::eventing::{EventHandler, HandledEventType, HandlerContext, fold_replica};
use replica_domain::persist::Table;
use tracing::debug;

/// 会员加入/修改后折叠到帖子上下文的会员副本
pub struct PostSyncMemberHandler {
    members: Table<PostMember>,
}

impl PostSyncMemberHandler {
    pub fn new(members: Table<PostMember>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl EventHandler for PostSyncMemberHandler {
    fn handler_name(&self) -> &str {
        "PostSyncMemberHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        member_event_kinds()
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let snapshot = member_snapshot(envelope)?;
        let (member, outcome) = fold_replica(&self.members, ctx.tx(), &snapshot)?;
        debug!(member_id = %snapshot.id, ?outcome, post_count = member.post_count(), "post member synced");
        Ok(())
    }
}
