use crate::shared::cash::WalletDto;
use crate::shared::member::{MemberDto, MemberId, ReplicaMember};
use chrono::{DateTime, Utc};
use replica_domain::entity::{HasAuditTimestamps, HasIdentity, ReplicaEntity};
use replica_domain::error::{DomainError, DomainResult};
use replica_domain::value_object::AuditStamp;

/// 现金上下文的会员副本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashMember {
    base: ReplicaMember,
}

impl CashMember {
    pub fn nickname(&self) -> &str {
        self.base.profile().nickname()
    }
}

impl HasIdentity for CashMember {
    type Id = MemberId;

    fn id(&self) -> &MemberId {
        self.base.id()
    }
}

impl HasAuditTimestamps for CashMember {
    fn created_at(&self) -> DateTime<Utc> {
        self.base.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.base.modified_at()
    }
}

impl ReplicaEntity for CashMember {
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

/// 钱包：每个会员一个，标识即持有人标识
#[derive(Debug, Clone)]
pub struct Wallet {
    id: MemberId,
    audit: AuditStamp,
    balance: i64,
}

impl Wallet {
    pub fn open(holder: &CashMember) -> Self {
        Self {
            id: holder.id().clone(),
            audit: AuditStamp::new(Utc::now()),
            balance: 0,
        }
    }

    pub fn holder_id(&self) -> &MemberId {
        &self.id
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn deposit(&mut self, amount: i64) -> DomainResult<()> {
        if amount <= 0 {
            return Err(DomainError::invalid_value(format!(
                "deposit amount must be positive, got {amount}"
            )));
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| DomainError::invalid_value("balance overflow"))?;
        self.audit.touch(Utc::now());
        Ok(())
    }

    pub fn withdraw(&mut self, amount: i64) -> DomainResult<()> {
        if amount < 0 {
            return Err(DomainError::invalid_value(format!(
                "withdraw amount must not be negative, got {amount}"
            )));
        }
        if self.balance < amount {
            return Err(DomainError::invalid_state(format!(
                "insufficient balance: wallet {} holds {}, needs {amount}",
                self.id, self.balance
            )));
        }
        self.balance -= amount;
        self.audit.touch(Utc::now());
        Ok(())
    }

    pub fn to_dto(&self) -> WalletDto {
        WalletDto {
            id: self.id.clone(),
            holder_id: self.id.clone(),
            balance: self.balance,
        }
    }
}

impl HasIdentity for Wallet {
    type Id = MemberId;

    fn id(&self) -> &MemberId {
        &self.id
    }
}

impl HasAuditTimestamps for Wallet {
    fn created_at(&self) -> DateTime<Utc> {
        self.audit.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.audit.modified_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder() -> CashMember {
        let now = Utc::now();
        CashMember::from_snapshot(
            &MemberDto {
                id: MemberId::new(5),
                created_at: now,
                modified_at: now,
                username: "user5".into(),
                nickname: "lee".into(),
                activity_score: 0,
            },
            now,
        )
    }

    #[test]
    fn withdraw_rejects_overdraft() {
        let mut wallet = Wallet::open(&holder());
        wallet.deposit(1_000).unwrap();

        let err = wallet.withdraw(1_001).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
        assert_eq!(wallet.balance(), 1_000);

        wallet.withdraw(400).unwrap();
        assert_eq!(wallet.balance(), 600);
    }

    #[test]
    fn deposit_must_be_positive() {
        let mut wallet = Wallet::open(&holder());
        assert!(wallet.deposit(0).is_err());
        assert_eq!(wallet.holder_id(), &MemberId::new(5));
    }
}
