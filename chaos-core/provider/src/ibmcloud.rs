//! IBM Cloud (Power Virtual Server) 客户端

use std::sync::Arc;

use async_trait::async_trait;
use chaos_executor::CommandRunner;
use tracing::{debug, info};

use crate::error::{ProviderError, Result};
use crate::models::InstanceStatus;
use crate::parser::{parse_external_address, parse_instance_status};
use crate::traits::LifecycleProvider;

/// IBM Cloud 客户端
///
/// 通过 `ibmcloud pi` 命令操作实例。PowerVS 没有独立的终止原语，
/// `terminate` 等同于 `stop`，这是云厂商能力限制。
pub struct IbmCloudProvider {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl IbmCloudProvider {
    /// 创建新的 IBM Cloud 客户端
    ///
    /// # Arguments
    /// * `runner` - 本地命令执行器
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            program: "ibmcloud".to_string(),
        }
    }

    /// 指定 ibmcloud 可执行文件
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// 执行 `ibmcloud pi <subcommand> <instance>`，非零退出码视为失败
    async fn invoke(&self, subcommand: &str, instance: &str) -> Result<String> {
        let args = vec!["pi".to_string(), subcommand.to_string(), instance.to_string()];
        let output = self.runner.run(&self.program, &args).await?;

        if !output.is_success() {
            return Err(ProviderError::CommandFailed {
                command: format!("{} {}", self.program, args.join(" ")),
                exit_code: output.exit_code,
                output: output.combined_output(),
            });
        }

        Ok(output.stdout)
    }

    async fn action(&self, subcommand: &str, instance: &str) -> Result<String> {
        let output = self.invoke(subcommand, instance).await?;
        info!("IBMCLOUD CLI INFO: {}", output);
        Ok(output)
    }
}

#[async_trait]
impl LifecycleProvider for IbmCloudProvider {
    fn name(&self) -> &str {
        "ibmcloud"
    }

    async fn start(&self, instance: &str) -> Result<String> {
        self.action("instance-start", instance).await
    }

    async fn stop(&self, instance: &str) -> Result<String> {
        self.action("instance-stop", instance).await
    }

    async fn terminate(&self, instance: &str) -> Result<String> {
        self.action("instance-stop", instance).await
    }

    async fn reboot(&self, instance: &str) -> Result<String> {
        self.action("instance-soft-reboot", instance).await
    }

    async fn status(&self, instance: &str) -> Result<InstanceStatus> {
        let output = self.invoke("instance", instance).await?;
        let status = parse_instance_status(&output)?;
        debug!("实例 {} 当前状态: {}", instance, status);
        Ok(status)
    }

    async fn address(&self, instance: &str) -> Result<String> {
        let output = self.invoke("instance", instance).await?;
        let address = parse_external_address(&output)?;
        info!("IBMCLOUD CLI INFO: IP Address is {}", address);
        Ok(address)
    }
}
