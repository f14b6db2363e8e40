//! 领域层基础库（replica-domain）
//!
//! 为按限界上下文拆分的系统提供“事务内领域事件分发 + 副本同步”的通用构件：
//! - 源实体 / 副本实体建模（`entity`、`value_object`）
//! - 领域事件与不可变事件信封（`domain_event`）
//! - 事务与内存事务表（`persist`）：写入暂存、提交后释放延迟投递
//! - 事件系统（`eventing`）：发布器、可替换的分发底座、处理器、副本折叠与死信
//!
//! 分发分为两个阶段：
//! 1. 事务内（Phase A）：与触发事务同步执行，失败即否决整个事务；
//! 2. 提交后（Phase B）：仅在触发事务提交后执行，每个处理器使用全新事务。
//!
//! 典型用法：
//! 1. 定义源实体与副本实体，实现 `SourceEntity` / `ReplicaEntity`；
//! 2. 通过 `#[domain_event]` 定义事件快照；
//! 3. 向 `InProcessDispatcher` 注册处理器，组装 `EventPublisher` 与 `TransactionManager`；
//! 4. 在事务中修改源实体并发布事件，提交后由各上下文折叠到本地副本。
//!
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod persist;
pub mod value_object;

// 允许在本 crate 内部通过 ::replica_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::replica_domain 路径。
extern crate self as replica_domain;
