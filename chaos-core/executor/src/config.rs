//! 节点 SSH 会话参数
//!
//! 配置文件中的 `[ssh]` 段只描述"怎么登录节点"，不含目标地址；
//! 每次连接时由 [`SshConfig::for_host`] 生成具体主机的参数。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 节点身份认证
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMethod {
    /// 指定私钥文件（`ssh -i`）
    KeyFile { path: PathBuf },
    /// 交给 ssh 自行查找（agent、~/.ssh/config、默认身份文件）
    SshDefaults,
}

impl Default for AuthMethod {
    fn default() -> Self {
        AuthMethod::KeyFile {
            path: PathBuf::from("~/.ssh/id_rsa"),
        }
    }
}

/// 节点 SSH 参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// 目标节点，模板中为空
    #[serde(skip)]
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMethod,
    /// 建立连接的超时 (秒)，传给 `ConnectTimeout`
    pub connect_timeout_secs: u64,
    /// 单条远程命令的超时 (秒)
    pub command_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: "root".to_string(),
            auth: AuthMethod::default(),
            connect_timeout_secs: 10,
            command_timeout_secs: 60,
        }
    }
}

impl SshConfig {
    /// 以指定用户和认证方式创建模板
    pub fn template(username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            username: username.into(),
            auth,
            ..Self::default()
        }
    }

    /// 复制模板并填入目标节点地址
    pub fn for_host(&self, host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..self.clone()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, command: Duration) -> Self {
        self.connect_timeout_secs = connect.as_secs().max(1);
        self.command_timeout_secs = command.as_secs().max(1);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// `user@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}
