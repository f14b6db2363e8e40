//! 领域层统一错误定义
//!
//! 聚焦序列化、事件分发、事务、命令与状态校验等最小必要集合，
//! 便于在各实现层统一转换为 `DomainError`。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 事件系统 ---
    #[error("event dispatch error: {reason}")]
    Dispatch { reason: String },
    #[error("event handler error: handler={handler}, reason={source}")]
    EventHandler {
        handler: String,
        #[source]
        source: Box<DomainError>,
    },

    // --- 事务 ---
    #[error("transaction error: {reason}")]
    Transaction { reason: String },

    // --- 领域规则/命令与状态 ---
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
    #[error("not found: {reason}")]
    NotFound { reason: String },
}

impl DomainError {
    pub fn dispatch(reason: impl Into<String>) -> Self {
        Self::Dispatch {
            reason: reason.into(),
        }
    }

    pub fn handler(handler: impl Into<String>, source: DomainError) -> Self {
        Self::EventHandler {
            handler: handler.into(),
            source: Box::new(source),
        }
    }

    pub fn transaction(reason: impl Into<String>) -> Self {
        Self::Transaction {
            reason: reason.into(),
        }
    }

    pub fn invalid_command(reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    /// 剥离处理器包装，返回最内层的业务错误
    pub fn root_cause(&self) -> &DomainError {
        match self {
            Self::EventHandler { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
