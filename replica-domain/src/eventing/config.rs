use bon::Builder;
use std::str::FromStr;

use crate::error::DomainError;

/// 提交后处理器的执行方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PostCommitMode {
    /// 在提交调用所在任务中依次执行，`commit` 返回时副作用已完成
    #[default]
    Inline,
    /// 派生独立 tokio 任务执行，`commit` 返回时不保证已完成
    Detached,
}

impl FromStr for PostCommitMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "detached" => Ok(Self::Detached),
            other => Err(DomainError::invalid_value(format!(
                "unknown post-commit mode '{other}', expected inline | detached"
            ))),
        }
    }
}

/// 分发配置
#[derive(Builder, Clone, Copy, Debug, Default)]
pub struct DispatchConfig {
    #[builder(default)]
    pub post_commit: PostCommitMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_post_commit_mode() {
        assert_eq!("inline".parse::<PostCommitMode>().unwrap(), PostCommitMode::Inline);
        assert_eq!(" Detached ".parse::<PostCommitMode>().unwrap(), PostCommitMode::Detached);
        assert!("later".parse::<PostCommitMode>().is_err());
        assert_eq!(DispatchConfig::builder().build().post_commit, PostCommitMode::Inline);
    }
}
