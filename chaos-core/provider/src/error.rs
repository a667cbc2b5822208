//! 云厂商错误定义

use thiserror::Error;

/// 云厂商操作结果类型
pub type Result<T> = std::result::Result<T, ProviderError>;

/// 云厂商错误类型
#[derive(Error, Debug)]
pub enum ProviderError {
    /// 命令无法执行（进程启动失败、超时等）
    #[error("执行器错误: {0}")]
    Executor(#[from] chaos_executor::ExecutorError),

    /// CLI 返回非零退出码
    #[error("{command} 执行失败 (退出码 {exit_code:?}): {output}")]
    CommandFailed {
        command: String,
        exit_code: Option<u32>,
        output: String,
    },

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 不支持的云厂商
    #[error("不支持的云厂商: {0}")]
    UnsupportedCloud(String),
}
