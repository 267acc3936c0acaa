//! 路由执行统一错误定义
//!
//! 对应执行引擎的错误分类：候选路由查询（Store）、过滤表达式求值（Evaluation）、
//! 转换管道（Transformation）、未知投递协议（UnknownScheme）与发布失败（Publish）。
//! 除 Store 外，其余错误只影响单条路由，不会中断同一事件的其它路由。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RoutingError {
    // --- 解析/值对象 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: String },
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },

    // --- 执行引擎 ---
    #[error("route store error: {reason}")]
    Store { reason: String },
    #[error("evaluation error: expression={expression}, reason={reason}")]
    Evaluation { expression: String, reason: String },
    #[error("transformation error: step={step}, reason={reason}")]
    Transformation { step: String, reason: String },
    #[error("no publisher registered for scheme: {scheme}")]
    UnknownScheme { scheme: String },
    #[error("publish error: scheme={scheme}, reason={reason}")]
    Publish { scheme: String, reason: String },
    #[error("publisher already registered: scheme={scheme}")]
    AlreadyRegistered { scheme: String },

    // --- 外部网关 ---
    #[error("gateway error: {reason}")]
    Gateway { reason: String },

    // --- 工作池 ---
    #[error("worker pool is shut down")]
    PoolShutdown,
    #[error("execution task failed: {reason}")]
    Execution { reason: String },
}

/// 统一 Result 类型别名
pub type RoutingResult<T> = Result<T, RoutingError>;

impl RoutingError {
    pub fn store(reason: impl Into<String>) -> Self {
        Self::Store {
            reason: reason.into(),
        }
    }

    pub fn evaluation(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Evaluation {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn transformation(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transformation {
            step: step.into(),
            reason: reason.into(),
        }
    }

    pub fn gateway(reason: impl Into<String>) -> Self {
        Self::Gateway {
            reason: reason.into(),
        }
    }
}
