use crate::shared::market::{
    CartDto, MarketOrderPaymentCompleted, OrderDto, OrderId, OrderItemDto,
};
use crate::shared::member::{MemberDto, MemberId, ReplicaMember};
use chrono::{DateTime, Utc};
use replica_domain::domain_event::DomainEvents;
use replica_domain::entity::{
    HasAuditTimestamps, HasIdentity, ReplicaEntity, SequentialIdentity, SourceEntity,
};
use replica_domain::error::{DomainError, DomainResult};
use replica_domain::value_object::AuditStamp;
use replica_macros::value_object;

/// 市场上下文的会员副本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketMember {
    base: ReplicaMember,
}

impl MarketMember {
    pub fn nickname(&self) -> &str {
        self.base.profile().nickname()
    }

    pub fn activity_score(&self) -> i32 {
        self.base.profile().activity_score()
    }
}

impl HasIdentity for MarketMember {
    type Id = MemberId;

    fn id(&self) -> &MemberId {
        self.base.id()
    }
}

impl HasAuditTimestamps for MarketMember {
    fn created_at(&self) -> DateTime<Utc> {
        self.base.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.base.modified_at()
    }
}

impl ReplicaEntity for MarketMember {
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

/// 购物车/订单中的商品行
#[value_object(default = false)]
pub struct LineItem {
    product_id: i64,
    price: i64,
}

impl LineItem {
    pub fn new(product_id: i64, price: i64) -> DomainResult<Self> {
        if price < 0 {
            return Err(DomainError::invalid_value(format!(
                "price must not be negative, got {price}"
            )));
        }
        Ok(Self { product_id, price })
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    fn to_dto(&self) -> OrderItemDto {
        OrderItemDto {
            product_id: self.product_id,
            price: self.price,
        }
    }
}

/// 购物车：每个会员一个，标识即会员标识
#[derive(Debug, Clone)]
pub struct Cart {
    id: MemberId,
    audit: AuditStamp,
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new(buyer: &MarketMember) -> Self {
        Self {
            id: buyer.id().clone(),
            audit: AuditStamp::new(Utc::now()),
            items: Vec::new(),
        }
    }

    pub fn buyer_id(&self) -> &MemberId {
        &self.id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn add_item(&mut self, item: LineItem) {
        self.items.push(item);
        self.audit.touch(Utc::now());
    }

    fn take_items(&mut self) -> Vec<LineItem> {
        self.audit.touch(Utc::now());
        std::mem::take(&mut self.items)
    }

    pub fn to_dto(&self) -> CartDto {
        CartDto {
            id: self.id.clone(),
            buyer_id: self.id.clone(),
            items: self.items.iter().map(LineItem::to_dto).collect(),
            items_count: self.items.len(),
        }
    }
}

impl HasIdentity for Cart {
    type Id = MemberId;

    fn id(&self) -> &MemberId {
        &self.id
    }
}

impl HasAuditTimestamps for Cart {
    fn created_at(&self) -> DateTime<Utc> {
        self.audit.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.audit.modified_at()
    }
}

/// 订单（源实体）
#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    audit: AuditStamp,
    buyer_id: MemberId,
    items: Vec<LineItem>,
    paid: bool,
}

impl Order {
    /// 由购物车下单，购物车随之清空
    pub fn place(cart: &mut Cart) -> DomainResult<Self> {
        if !cart.has_items() {
            return Err(DomainError::invalid_state(format!(
                "cart of member {} is empty",
                cart.buyer_id()
            )));
        }

        Ok(Self {
            id: OrderId::unassigned(),
            audit: AuditStamp::new(Utc::now()),
            buyer_id: cart.buyer_id().clone(),
            items: cart.take_items(),
            paid: false,
        })
    }

    pub fn buyer_id(&self) -> &MemberId {
        &self.buyer_id
    }

    pub fn total_price(&self) -> i64 {
        self.items.iter().map(LineItem::price).sum()
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    pub fn complete_payment(&mut self) -> DomainResult<()> {
        if self.paid {
            return Err(DomainError::invalid_state(format!(
                "order {} is already paid",
                self.id
            )));
        }
        self.paid = true;
        Ok(())
    }

    pub fn to_dto(&self) -> OrderDto {
        OrderDto {
            id: self.id.clone(),
            created_at: self.created_at(),
            modified_at: self.modified_at(),
            buyer_id: self.buyer_id.clone(),
            items: self.items.iter().map(LineItem::to_dto).collect(),
            total_price: self.total_price(),
            paid: self.paid,
        }
    }

    pub fn raise_payment_completed(&self, events: &mut DomainEvents) -> DomainResult<()> {
        events.raise(&MarketOrderPaymentCompleted {
            order: self.to_dto(),
        })
    }
}

impl HasIdentity for Order {
    type Id = OrderId;

    fn id(&self) -> &OrderId {
        &self.id
    }
}

impl HasAuditTimestamps for Order {
    fn created_at(&self) -> DateTime<Utc> {
        self.audit.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.audit.modified_at()
    }
}

impl SourceEntity for Order {
    fn assign_id(&mut self, id: OrderId) {
        self.id = id;
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer() -> MarketMember {
        let now = Utc::now();
        MarketMember::from_snapshot(
            &MemberDto {
                id: MemberId::new(3),
                created_at: now,
                modified_at: now,
                username: "user3".into(),
                nickname: "kim".into(),
                activity_score: 0,
            },
            now,
        )
    }

    #[test]
    fn cart_id_is_buyer_id() {
        let cart = Cart::new(&buyer());
        assert_eq!(cart.id(), &MemberId::new(3));
        assert!(!cart.has_items());
    }

    #[test]
    fn placing_an_order_empties_the_cart() {
        let mut cart = Cart::new(&buyer());
        assert!(Order::place(&mut cart).is_err());

        cart.add_item(LineItem::new(1, 1_000).unwrap());
        cart.add_item(LineItem::new(2, 2_500).unwrap());
        let order = Order::place(&mut cart).unwrap();

        assert_eq!(order.total_price(), 3_500);
        assert!(!cart.has_items());
        assert!(LineItem::new(3, -1).is_err());
    }

    #[test]
    fn payment_completes_once() {
        let mut cart = Cart::new(&buyer());
        cart.add_item(LineItem::new(1, 100).unwrap());
        let mut order = Order::place(&mut cart).unwrap();

        order.complete_payment().unwrap();
        assert!(order.is_paid());
        assert!(matches!(
            order.complete_payment(),
            Err(DomainError::InvalidState { .. })
        ));
    }
}
