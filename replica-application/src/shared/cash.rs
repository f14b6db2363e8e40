use crate::dto::Dto;
use crate::shared::member::MemberId;
use replica_macros::domain_event;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDto {
    pub id: MemberId,
    pub holder_id: MemberId,
    pub balance: i64,
}

impl Dto for WalletDto {}

/// 现金上下文首次复制某会员
#[domain_event(kind = "cash.member.created")]
pub struct CashMemberCreated {
    pub member_id: MemberId,
}
