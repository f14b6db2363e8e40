//! 会员上下文：会员是源实体，其他上下文只持有副本
//!
pub mod app;
pub mod domain;
pub mod listener;

use crate::error::AppError;
use crate::inmemory_command_bus::InMemoryCommandBus;
use app::{ChangeMemberNickname, IncreaseActivityScore, JoinMember, MemberService};
use domain::Member;
use listener::MemberActivityHandler;
use replica_domain::eventing::InProcessDispatcher;
use replica_domain::persist::Table;
use std::sync::Arc;

pub struct MemberContext {
    pub members: Table<Member>,
    service: MemberService,
}

impl Default for MemberContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberContext {
    pub fn new() -> Self {
        let members = Table::new("member_member");
        Self {
            service: MemberService::new(members.clone()),
            members,
        }
    }

    pub fn service(&self) -> &MemberService {
        &self.service
    }

    pub fn register_handlers(&self, dispatcher: &InProcessDispatcher) -> Result<(), AppError> {
        dispatcher.register(Arc::new(MemberActivityHandler::new(self.service.clone())))?;
        Ok(())
    }

    pub fn register_commands(&self, bus: &InMemoryCommandBus) -> Result<(), AppError> {
        let service = Arc::new(self.service.clone());
        bus.register::<JoinMember, _>(service.clone())?;
        bus.register::<ChangeMemberNickname, _>(service.clone())?;
        bus.register::<IncreaseActivityScore, _>(service)?;
        Ok(())
    }
}
