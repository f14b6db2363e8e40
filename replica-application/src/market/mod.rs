//! 市场上下文：购物车与订单；会员为本地副本
//!
pub mod app;
pub mod domain;
pub mod listener;

use crate::error::AppError;
use crate::inmemory_command_bus::InMemoryCommandBus;
use app::{AddCartItem, CompleteOrderPayment, MarketService, PlaceOrder};
use domain::{Cart, MarketMember, Order};
use listener::{MarketCreateCartHandler, MarketSyncMemberHandler};
use replica_domain::eventing::InProcessDispatcher;
use replica_domain::persist::Table;
use std::sync::Arc;

pub struct MarketContext {
    pub members: Table<MarketMember>,
    pub carts: Table<Cart>,
    pub orders: Table<Order>,
    service: MarketService,
}

impl Default for MarketContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketContext {
    pub fn new() -> Self {
        let members = Table::new("market_member");
        let carts = Table::new("market_cart");
        let orders = Table::new("market_order");
        Self {
            service: MarketService::new(members.clone(), carts.clone(), orders.clone()),
            members,
            carts,
            orders,
        }
    }

    pub fn register_handlers(&self, dispatcher: &InProcessDispatcher) -> Result<(), AppError> {
        dispatcher.register(Arc::new(MarketSyncMemberHandler::new(self.members.clone())))?;
        dispatcher.register(Arc::new(MarketCreateCartHandler::new(self.service.clone())))?;
        Ok(())
    }

    pub fn register_commands(&self, bus: &InMemoryCommandBus) -> Result<(), AppError> {
        let service = Arc::new(self.service.clone());
        bus.register::<AddCartItem, _>(service.clone())?;
        bus.register::<PlaceOrder, _>(service.clone())?;
        bus.register::<CompleteOrderPayment, _>(service)?;
        Ok(())
    }
}
