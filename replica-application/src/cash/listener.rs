use super::app::CashService;
use super::domain::CashMember;
use crate::shared::cash::CashMemberCreated;
use crate::shared::market::MarketOrderPaymentCompleted;
use crate::shared::member::{member_event_kinds, member_snapshot};
use async_trait::async_trait;
use replica_domain::domain_event::EventEnvelope;
use replica_domain::error::DomainResult;
use replica_domain::eventing::{
    DeliveryPhase, EventHandler, HandledEventType, HandlerContext, fold_replica,
};
use replica_domain::persist::Table;

/// 会员加入/修改后折叠到现金上下文；首次见到某会员时发布 `cash.member.created`
pub struct CashSyncMemberHandler {
    members: Table<CashMember>,
}

impl CashSyncMemberHandler {
    pub fn new(members: Table<CashMember>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl EventHandler for CashSyncMemberHandler {
    fn handler_name(&self) -> &str {
        "CashSyncMemberHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        member_event_kinds()
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let snapshot = member_snapshot(envelope)?;
        let (_, outcome) = fold_replica(&self.members, ctx.tx(), &snapshot)?;
        if outcome.is_first_sight() {
            ctx.publish(&CashMemberCreated {
                member_id: snapshot.id,
            })
            .await?;
        }
        Ok(())
    }
}

pub struct CashOpenWalletHandler {
    service: CashService,
}

impl CashOpenWalletHandler {
    pub fn new(service: CashService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for CashOpenWalletHandler {
    fn handler_name(&self) -> &str {
        "CashOpenWalletHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::of::<CashMemberCreated>()
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let event: CashMemberCreated = envelope.decode()?;
        self.service.open_wallet(ctx.tx(), &event.member_id)?;
        Ok(())
    }
}

/// 订单支付完成时在同一事务内扣款
///
/// 余额不足会否决整个支付事务：订单保持未支付，已挂起的提交后投递一并丢弃。
pub struct CashOrderPaymentHandler {
    service: CashService,
}

impl CashOrderPaymentHandler {
    pub fn new(service: CashService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for CashOrderPaymentHandler {
    fn handler_name(&self) -> &str {
        "CashOrderPaymentHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::of::<MarketOrderPaymentCompleted>()
    }

    fn delivery_phase(&self) -> DeliveryPhase {
        DeliveryPhase::InTransaction
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let event: MarketOrderPaymentCompleted = envelope.decode()?;
        self.service.pay_order(ctx.tx(), &event.order)?;
        Ok(())
    }
}
