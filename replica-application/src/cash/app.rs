use super::domain::{CashMember, Wallet};
use crate::command::Command;
use crate::command_handler::CommandHandler;
use crate::context::CommandContext;
use crate::error::AppError;
use crate::shared::cash::WalletDto;
use crate::shared::market::OrderDto;
use crate::shared::member::MemberId;
use async_trait::async_trait;
use replica_domain::error::DomainResult;
use replica_domain::persist::{Table, Transaction};
use tracing::info;

/// 向钱包充值
#[derive(Debug, Clone)]
pub struct Deposit {
    pub holder_id: MemberId,
    pub amount: i64,
}

impl Command for Deposit {
    const NAME: &'static str = "cash.deposit";
    type Output = WalletDto;
}

#[derive(Clone)]
pub struct CashService {
    members: Table<CashMember>,
    wallets: Table<Wallet>,
}

impl CashService {
    pub fn new(members: Table<CashMember>, wallets: Table<Wallet>) -> Self {
        Self { members, wallets }
    }

    /// 为新同步的会员开立钱包；已存在时不重复开立
    pub fn open_wallet(&self, tx: &mut Transaction, holder_id: &MemberId) -> DomainResult<WalletDto> {
        if let Some(wallet) = self.wallets.find(tx, holder_id)? {
            return Ok(wallet.to_dto());
        }
        let holder = self.members.get(tx, holder_id)?;
        let wallet = Wallet::open(&holder);
        self.wallets.save(tx, wallet.clone())?;
        info!(member_id = %holder_id, "wallet opened");
        Ok(wallet.to_dto())
    }

    /// 订单支付扣款，余额不足时返回错误
    pub fn pay_order(&self, tx: &mut Transaction, order: &OrderDto) -> DomainResult<WalletDto> {
        let mut wallet = self.wallets.get(tx, &order.buyer_id)?;
        wallet.withdraw(order.total_price)?;
        self.wallets.save(tx, wallet.clone())?;
        info!(
            order_id = %order.id,
            member_id = %order.buyer_id,
            amount = order.total_price,
            "order paid from wallet"
        );
        Ok(wallet.to_dto())
    }
}

#[async_trait]
impl CommandHandler<Deposit> for CashService {
    async fn handle(&self, ctx: &mut CommandContext, cmd: Deposit) -> Result<WalletDto, AppError> {
        let mut wallet = self.wallets.get(ctx.tx(), &cmd.holder_id)?;
        wallet.deposit(cmd.amount)?;
        self.wallets.save(ctx.tx(), wallet.clone())?;
        Ok(wallet.to_dto())
    }
}
