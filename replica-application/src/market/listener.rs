use super::app::MarketService;
use super::domain::MarketMember;
use crate::shared::market::MarketMemberCreated;
use crate::shared::member::{member_event_kinds, member_snapshot};
use async_trait::async_trait;
use replica_domain::domain_event::EventEnvelope;
use replica_domain::error::DomainResult;
use replica_domain::eventing::{EventHandler, HandledEventType, HandlerContext, fold_replica};
use replica_domain::persist::Table;

/// 会员加入/修改后折叠到市场上下文；首次见到某会员时发布 `market.member.created`
pub struct MarketSyncMemberHandler {
    members: Table<MarketMember>,
}

impl MarketSyncMemberHandler {
    pub fn new(members: Table<MarketMember>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl EventHandler for MarketSyncMemberHandler {
    fn handler_name(&self) -> &str {
        "MarketSyncMemberHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        member_event_kinds()
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let snapshot = member_snapshot(envelope)?;
        let (_, outcome) = fold_replica(&self.members, ctx.tx(), &snapshot)?;
        if outcome.is_first_sight() {
            ctx.publish(&MarketMemberCreated {
                member_id: snapshot.id,
            })
            .await?;
        }
        Ok(())
    }
}

/// 新会员进入市场上下文后创建购物车
pub struct MarketCreateCartHandler {
    service: MarketService,
}

impl MarketCreateCartHandler {
    pub fn new(service: MarketService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for MarketCreateCartHandler {
    fn handler_name(&self) -> &str {
        "MarketCreateCartHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::of::<MarketMemberCreated>()
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let event: MarketMemberCreated = envelope.decode()?;
        self.service.create_cart(ctx.tx(), &event.member_id)?;
        Ok(())
    }
}
