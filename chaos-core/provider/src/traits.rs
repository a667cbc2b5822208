//! 云厂商生命周期接口

use async_trait::async_trait;

use crate::error::Result;
use crate::models::InstanceStatus;

/// 计算实例生命周期接口
///
/// 所有操作都是对云厂商控制面的同步调用；任何失败都以 [`crate::ProviderError`]
/// 返回，由场景引擎中止当前注入。
#[async_trait]
pub trait LifecycleProvider: Send + Sync {
    /// 云厂商名称，用于日志
    fn name(&self) -> &str;

    /// 启动实例，返回 CLI 原始输出
    async fn start(&self, instance: &str) -> Result<String>;

    /// 停止实例
    async fn stop(&self, instance: &str) -> Result<String>;

    /// 终止实例
    ///
    /// 没有真正终止原语的云厂商可以将其实现为 `stop`，需在实现处注明。
    async fn terminate(&self, instance: &str) -> Result<String>;

    /// 重启实例（不等待状态变化）
    async fn reboot(&self, instance: &str) -> Result<String>;

    /// 查询实例当前状态
    async fn status(&self, instance: &str) -> Result<InstanceStatus>;

    /// 解析实例的可路由地址
    async fn address(&self, instance: &str) -> Result<String>;
}
