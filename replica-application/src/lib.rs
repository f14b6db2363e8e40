//! 应用层（replica-application）
//!
//! 会员、帖子、市场、现金、结算五个限界上下文。会员是唯一的会员源实体，
//! 其余上下文各自持有会员副本，通过领域事件折叠保持同步；
//! 用例以命令形式经由事务性命令总线执行。
//!
pub mod cash;
pub mod command;
pub mod command_bus;
pub mod command_handler;
pub mod config;
pub mod context;
pub mod dto;
pub mod error;
pub mod inmemory_command_bus;
pub mod market;
pub mod member;
pub mod payout;
pub mod platform;
pub mod post;
pub mod shared;
pub mod telemetry;

pub use inmemory_command_bus::InMemoryCommandBus;
pub use platform::Platform;
