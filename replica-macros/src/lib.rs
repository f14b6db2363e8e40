//! 领域建模辅助宏（replica-macros）
//!
//! - `#[entity_id]`：为单字段 tuple struct 生成实体标识类型；
//! - `#[value_object]`：为值对象合并默认派生；
//! - `#[domain_event(kind = "...")]`：为事件快照结构体生成 `DomainEvent` 实现。
//!
//! 生成代码通过 `::replica_domain` 绝对路径引用领域层类型。
use proc_macro::TokenStream;

mod domain_event;
mod entity_id;
mod utils;
mod value_object;

/// 实体标识宏
///
/// 仅支持单字段 tuple struct，例如 `struct MemberId(i64);`。
/// 追加参数 `sequential` 时，额外实现 `SequentialIdentity`，
/// 使该标识可以由存储层的自增序列分配（源实体使用）。
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}

/// 值对象宏
///
/// 合并派生：Clone, PartialEq, Eq, Serialize, Deserialize，以及可控的 Debug/Default/Copy。
#[proc_macro_attribute]
pub fn value_object(attr: TokenStream, item: TokenStream) -> TokenStream {
    value_object::expand(attr, item)
}

/// 领域事件宏
///
/// 用于具名字段结构体：`#[domain_event(kind = "member.joined", version = 1)]`。
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}
