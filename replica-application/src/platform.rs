//! 组装各限界上下文：共享一个进程内分发器、事务管理器与命令总线
//!
use crate::cash::CashContext;
use crate::command::Command;
use crate::command_bus::CommandBus;
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppError;
use crate::inmemory_command_bus::InMemoryCommandBus;
use crate::market::MarketContext;
use crate::member::MemberContext;
use crate::payout::PayoutContext;
use crate::post::PostContext;
use replica_domain::eventing::{EventPublisher, InProcessDispatcher};
use replica_domain::persist::TransactionManager;
use std::sync::Arc;
use tracing::info;

pub struct Platform {
    pub member: MemberContext,
    pub post: PostContext,
    pub market: MarketContext,
    pub cash: CashContext,
    pub payout: PayoutContext,
    dispatcher: Arc<InProcessDispatcher>,
    bus: InMemoryCommandBus,
}

impl Platform {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let dispatcher = Arc::new(InProcessDispatcher::new());
        let manager = TransactionManager::builder()
            .publisher(EventPublisher::new(dispatcher.clone()))
            .config(config.dispatch)
            .build();

        let platform = Self {
            member: MemberContext::new(),
            post: PostContext::new(),
            market: MarketContext::new(),
            cash: CashContext::new(),
            payout: PayoutContext::new(),
            dispatcher,
            bus: InMemoryCommandBus::new(manager),
        };
        platform.register()?;

        info!(
            handlers = platform.dispatcher.handler_names().len(),
            post_commit = ?config.dispatch.post_commit,
            "platform ready"
        );
        Ok(platform)
    }

    // 副本同步处理器先于业务反应注册：同一事件的提交后投递按注册顺序执行
    fn register(&self) -> Result<(), AppError> {
        self.post.register_handlers(&self.dispatcher)?;
        self.market.register_handlers(&self.dispatcher)?;
        self.cash.register_handlers(&self.dispatcher)?;
        self.payout.register_handlers(&self.dispatcher)?;
        self.member.register_handlers(&self.dispatcher)?;

        self.member.register_commands(&self.bus)?;
        self.post.register_commands(&self.bus)?;
        self.market.register_commands(&self.bus)?;
        self.cash.register_commands(&self.bus)?;
        Ok(())
    }

    pub fn dispatcher(&self) -> &Arc<InProcessDispatcher> {
        &self.dispatcher
    }

    pub fn manager(&self) -> &TransactionManager {
        self.bus.manager()
    }

    pub fn bus(&self) -> &InMemoryCommandBus {
        &self.bus
    }

    /// 以给定应用上下文执行命令（一条命令一个事务）
    pub async fn execute<C: Command>(&self, ctx: &AppContext, cmd: C) -> Result<C::Output, AppError> {
        self.bus.dispatch(ctx, cmd).await
    }
}
