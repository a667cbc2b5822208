//! 场景错误定义

use thiserror::Error;

use crate::scenarios::ScenarioKind;

/// 场景操作结果类型
pub type Result<T> = std::result::Result<T, ScenarioError>;

/// 场景错误类型
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// 没有符合条件的可注入节点
    #[error("节点选择失败: {0}")]
    Selection(String),

    /// 云厂商命令失败或输出无法解析
    #[error("云厂商错误: {0}")]
    Provider(#[from] chaos_provider::ProviderError),

    /// 集群查询或等待失败
    #[error("集群错误: {0}")]
    Cluster(#[from] chaos_cluster::ClusterError),

    /// 超时内未达到目标状态
    #[error("{subject} 在 {samples} 次采样内未达到 {expected}，最后状态 {last}")]
    Confirmation {
        subject: String,
        expected: String,
        last: String,
        samples: u32,
    },

    /// 无法建立远程会话
    #[error("无法连接到 {address}（尝试 {attempts} 次）: {last_error}")]
    Connection {
        address: String,
        attempts: u32,
        last_error: String,
    },

    /// 终止后节点仍在集群中
    #[error("node could not be terminated: {0}")]
    Termination(String),

    /// 服务状态查询失败
    #[error("服务 {service} 状态查询失败: {reason}")]
    ServiceQuery { service: String, reason: String },

    /// 注入被取消
    #[error("操作已取消")]
    Cancelled,

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 一次注入失败的统一报告
    #[error("{scenario} 注入失败 (节点 {node}, 第 {iteration} 次): {source}")]
    InjectionFailed {
        scenario: ScenarioKind,
        node: String,
        iteration: u32,
        #[source]
        source: Box<ScenarioError>,
    },
}

impl ScenarioError {
    /// 取出被 [`ScenarioError::InjectionFailed`] 包裹的根因
    pub fn root(&self) -> &ScenarioError {
        match self {
            ScenarioError::InjectionFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
