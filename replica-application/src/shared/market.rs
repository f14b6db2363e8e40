use crate::dto::Dto;
use crate::shared::member::MemberId;
use chrono::{DateTime, Utc};
use replica_macros::{domain_event, entity_id};
use serde::{Deserialize, Serialize};

#[entity_id(sequential)]
pub struct OrderId(i64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemDto {
    pub product_id: i64,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub buyer_id: MemberId,
    pub items: Vec<OrderItemDto>,
    pub total_price: i64,
    pub paid: bool,
}

impl Dto for OrderDto {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDto {
    pub id: MemberId,
    pub buyer_id: MemberId,
    pub items: Vec<OrderItemDto>,
    pub items_count: usize,
}

impl Dto for CartDto {}

/// 市场上下文首次复制某会员
#[domain_event(kind = "market.member.created")]
pub struct MarketMemberCreated {
    pub member_id: MemberId,
}

#[domain_event(kind = "market.order.payment.completed")]
pub struct MarketOrderPaymentCompleted {
    pub order: OrderDto,
}
