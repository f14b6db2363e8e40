use serde::Serialize;

/// 数据传输对象（DTO）
///
/// 用例的返回值，同时作为事件快照在上下文之间传递；只含白名单字段，
/// 不携带认证秘密（如密码）。
pub trait Dto: Serialize + Send + Sync + 'static {}
