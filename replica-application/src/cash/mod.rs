//! 现金上下文：钱包与订单扣款
//!
pub mod app;
pub mod domain;
pub mod listener;

use crate::error::AppError;
use crate::inmemory_command_bus::InMemoryCommandBus;
use app::{CashService, Deposit};
use domain::{CashMember, Wallet};
use listener::{CashOpenWalletHandler, CashOrderPaymentHandler, CashSyncMemberHandler};
use replica_domain::eventing::InProcessDispatcher;
use replica_domain::persist::Table;
use std::sync::Arc;

pub struct CashContext {
    pub members: Table<CashMember>,
    pub wallets: Table<Wallet>,
    service: CashService,
}

impl Default for CashContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CashContext {
    pub fn new() -> Self {
        let members = Table::new("cash_member");
        let wallets = Table::new("cash_wallet");
        Self {
            service: CashService::new(members.clone(), wallets.clone()),
            members,
            wallets,
        }
    }

    pub fn register_handlers(&self, dispatcher: &InProcessDispatcher) -> Result<(), AppError> {
        dispatcher.register(Arc::new(CashSyncMemberHandler::new(self.members.clone())))?;
        dispatcher.register(Arc::new(CashOpenWalletHandler::new(self.service.clone())))?;
        dispatcher.register(Arc::new(CashOrderPaymentHandler::new(self.service.clone())))?;
        Ok(())
    }

    pub fn register_commands(&self, bus: &InMemoryCommandBus) -> Result<(), AppError> {
        bus.register::<Deposit, _>(Arc::new(self.service.clone()))?;
        Ok(())
    }
}
