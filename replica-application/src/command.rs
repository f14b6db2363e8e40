/// 应用层命令（Command）
///
/// 修改某个上下文源数据的写请求。命令总线为每条命令开启一个事务：
/// 处理器返回 `Ok` 时提交并释放提交后投递，返回 `Err` 时整体回滚。
///
/// `Output` 是返回给调用方的 DTO，不暴露领域对象。
pub trait Command: Send + Sync + 'static {
    /// 稳定名称，用于日志与追踪（如 `member.join`）
    const NAME: &'static str;

    type Output: Send + 'static;
}
