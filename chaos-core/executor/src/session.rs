//! 远程会话抽象
//!
//! 服务状态检查只依赖这里的两个 trait，具体 SSH 实现为 [`SshConnector`]。

use async_trait::async_trait;

use crate::client::SshClient;
use crate::config::SshConfig;
use crate::error::Result;
use crate::output::CommandOutput;

/// 已建立的远程会话
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// 执行单条命令
    async fn execute(&self, command: &str) -> Result<CommandOutput>;

    /// 关闭会话
    async fn close(self: Box<Self>) -> Result<()>;
}

/// 远程会话工厂
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// 连接到指定地址；连接失败返回错误而不是空会话
    async fn connect(&self, address: &str) -> Result<Box<dyn RemoteSession>>;
}

#[async_trait]
impl RemoteSession for SshClient {
    async fn execute(&self, command: &str) -> Result<CommandOutput> {
        SshClient::execute(self, command).await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        (*self).disconnect().await
    }
}

/// 基于系统 ssh 的会话工厂
///
/// 持有一份 `host` 为空的配置模板，每次连接时填入目标地址。
#[derive(Debug, Clone)]
pub struct SshConnector {
    template: SshConfig,
}

impl SshConnector {
    pub fn new(template: SshConfig) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &SshConfig {
        &self.template
    }
}

#[async_trait]
impl SessionConnector for SshConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn RemoteSession>> {
        let client = SshClient::connect(self.template.for_host(address)).await?;
        Ok(Box::new(client))
    }
}
