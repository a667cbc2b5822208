//! 执行器错误定义

use thiserror::Error;

/// 执行器操作结果类型
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// 执行器错误类型
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// 可执行文件不存在或无法启动
    #[error("无法启动 {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 命令在超时内没有结束
    #[error("{0} 超时")]
    Timeout(String),

    /// 节点不可达（ssh 自身失败）
    #[error("节点 {host} 不可达: {reason}")]
    Unreachable { host: String, reason: String },

    /// 节点拒绝密钥
    #[error("节点 {host} 拒绝认证: {reason}")]
    AuthRejected { host: String, reason: String },

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutorError {
    /// 连接阶段的失败（可重试）
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            ExecutorError::Unreachable { .. } | ExecutorError::AuthRejected { .. } | ExecutorError::Timeout(_)
        )
    }
}
