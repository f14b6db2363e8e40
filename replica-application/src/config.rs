//! 应用配置：从环境变量读取，缺省值可直接运行
//!
use crate::error::AppError;
use bon::Builder;
use replica_domain::eventing::{DispatchConfig, PostCommitMode};

/// 提交后投递方式：`inline` | `detached`
pub const POST_COMMIT_MODE_ENV: &str = "REPLICA_POST_COMMIT_MODE";
/// 日志过滤表达式，语法同 `tracing_subscriber::EnvFilter`
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Builder, Clone, Debug)]
pub struct AppConfig {
    #[builder(default)]
    pub dispatch: DispatchConfig,
    #[builder(default = DEFAULT_LOG_FILTER.to_string())]
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 以任意键值来源构建配置，未设置的键取默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let post_commit = match lookup(POST_COMMIT_MODE_ENV) {
            Some(raw) => raw
                .parse::<PostCommitMode>()
                .map_err(|err| AppError::Config(format!("{POST_COMMIT_MODE_ENV}: {err}")))?,
            None => PostCommitMode::default(),
        };

        let log_filter = lookup(LOG_FILTER_ENV)
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            dispatch: DispatchConfig::builder().post_commit(post_commit).build(),
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.dispatch.post_commit, PostCommitMode::Inline);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn reads_mode_and_filter() {
        let config = AppConfig::from_lookup(lookup(&[
            (POST_COMMIT_MODE_ENV, "Detached"),
            (LOG_FILTER_ENV, "replica_domain=debug"),
        ]))
        .unwrap();
        assert_eq!(config.dispatch.post_commit, PostCommitMode::Detached);
        assert_eq!(config.log_filter, "replica_domain=debug");
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = AppConfig::from_lookup(lookup(&[(POST_COMMIT_MODE_ENV, "eventually")])).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains(POST_COMMIT_MODE_ENV)));
    }
}
