//! 结算上下文：目前只维护会员副本
//!
pub mod domain;
pub mod listener;

use crate::error::AppError;
use domain::PayoutMember;
use listener::PayoutSyncMemberHandler;
use replica_domain::eventing::InProcessDispatcher;
use replica_domain::persist::Table;
use std::sync::Arc;

pub struct PayoutContext {
    pub members: Table<PayoutMember>,
}

impl Default for PayoutContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PayoutContext {
    pub fn new() -> Self {
        Self {
            members: Table::new("payout_member"),
        }
    }

    pub fn register_handlers(&self, dispatcher: &InProcessDispatcher) -> Result<(), AppError> {
        dispatcher.register(Arc::new(PayoutSyncMemberHandler::new(self.members.clone())))?;
        Ok(())
    }
}
