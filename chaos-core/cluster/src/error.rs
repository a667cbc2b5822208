//! 集群错误定义

use thiserror::Error;

/// 集群操作结果类型
pub type Result<T> = std::result::Result<T, ClusterError>;

/// 集群错误类型
#[derive(Error, Debug)]
pub enum ClusterError {
    /// 命令无法执行
    #[error("执行器错误: {0}")]
    Executor(#[from] chaos_executor::ExecutorError),

    /// kubectl 返回非零退出码
    #[error("{command} 执行失败: {output}")]
    CommandFailed { command: String, output: String },

    /// 等待节点 Ready 失败（超时或节点不存在）
    #[error("等待节点 {node} Ready 失败: {output}")]
    WaitFailed { node: String, output: String },

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// JSON 错误
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),
}
