//! Chaos 云厂商生命周期客户端
//!
//! 对集群节点背后的计算实例执行生命周期操作：
//! - 启动 / 停止 / 终止 / 软重启
//! - 查询实例状态（ACTIVE、SHUTOFF 等）
//! - 解析实例外部地址，用于远程服务检查
//!
//! 所有云厂商实现统一暴露为 [`LifecycleProvider`]，由配置中的 `cloud_type`
//! 经 [`create_provider`] 选择具体实现。
//!
//! # 示例
//!
//! ```ignore
//! use std::sync::Arc;
//! use chaos_executor::LocalRunner;
//! use chaos_provider::{create_provider, ProviderConfig};
//!
//! let provider = create_provider(&ProviderConfig::default(), Arc::new(LocalRunner::default()));
//! provider.stop("ocp-prod-worker-3").await?;
//! let status = provider.status("ocp-prod-worker-3").await?;
//! ```

mod error;
mod ibmcloud;
mod models;
mod parser;
mod traits;

use std::sync::Arc;

use chaos_executor::CommandRunner;

pub use error::{ProviderError, Result};
pub use ibmcloud::IbmCloudProvider;
pub use models::{CloudType, InstanceStatus, LifecycleAction, ProviderConfig};
pub use parser::{parse_external_address, parse_instance_status};
pub use traits::LifecycleProvider;

/// 根据配置创建云厂商客户端
pub fn create_provider(
    config: &ProviderConfig,
    runner: Arc<dyn CommandRunner>,
) -> Arc<dyn LifecycleProvider> {
    match config.cloud_type {
        CloudType::IbmCloud => {
            let mut provider = IbmCloudProvider::new(runner);
            if let Some(cli) = &config.cli_path {
                provider = provider.with_program(cli.clone());
            }
            Arc::new(provider)
        }
    }
}
