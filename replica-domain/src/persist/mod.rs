//! 事务与存储（persist）
//!
//! 定义分发机制依赖的事务协议与内存事务表：
//! - `Transaction`：写入暂存、提交后待投递队列、提交/回滚状态；
//! - `Table`：按实体标识存储的内存表，事务内读己之写，提交时整体生效；
//! - `TransactionManager`：开启/提交/回滚事务，并在提交后以全新事务逐个执行延迟处理器。
//!
//! 具体存储引擎可替换，只需保持“回滚即丢弃暂存写入与待投递事件”的语义。
//!
mod table;
mod transaction;
mod transaction_manager;

pub use table::Table;
pub use transaction::{StagedWrites, Transaction, TransactionStatus};
pub use transaction_manager::{CommitReport, DeliveryFailure, TransactionManager};
