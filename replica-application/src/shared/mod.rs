//! 跨上下文共享的契约：标识、DTO（事件快照）与领域事件
//!
//! 各限界上下文之间只通过这里的类型交流，不共享存储，也不互相同步调用。
//!
pub mod cash;
pub mod market;
pub mod member;
pub mod post;
