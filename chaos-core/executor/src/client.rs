//! 基于系统 ssh 的节点会话
//!
//! 每条命令都是一次独立的 `ssh user@host <command>` 调用。只允许非交互的
//! 密钥认证，节点拒绝或不可达时 ssh 以 255 退出。
//!
//! 限制：远程命令自身以 255 退出时与 ssh 失败无法区分，同样报告为
//! [`ExecutorError::Unreachable`]（或 `AuthRejected`）。`systemctl status`
//! 的退出码不超过 4，不受影响。

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::{AuthMethod, SshConfig};
use crate::error::{ExecutorError, Result};
use crate::output::CommandOutput;

const SSH_FAILURE: u32 = 255;

/// 到单个节点的 SSH 会话
pub struct SshClient {
    config: SshConfig,
}

impl SshClient {
    /// 执行一次 `true` 确认节点可登录
    pub async fn connect(config: SshConfig) -> Result<Self> {
        debug!("探测节点 SSH: {}", config.destination());
        let client = Self { config };
        client.execute("true").await?;
        info!("已登录节点 {}", client.config.destination());
        Ok(client)
    }

    /// 在节点上执行命令；远程命令的非零退出码不视为错误
    pub async fn execute(&self, command: &str) -> Result<CommandOutput> {
        timeout(self.config.command_timeout(), self.run_ssh(command))
            .await
            .map_err(|_| {
                ExecutorError::Timeout(format!("{} 上的命令 `{}`", self.config.host, command))
            })?
    }

    fn ssh_command(&self, command: &str) -> Command {
        let mut cmd = Command::new("ssh");
        if let AuthMethod::KeyFile { path } = &self.config.auth {
            cmd.arg("-i").arg(expand_home(path));
        }
        for option in [
            "BatchMode=yes".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "LogLevel=ERROR".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
        ] {
            cmd.arg("-o").arg(option);
        }
        cmd.arg("-p")
            .arg(self.config.port.to_string())
            .arg(self.config.destination())
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run_ssh(&self, command: &str) -> Result<CommandOutput> {
        debug!("{}: {}", self.config.host, command);
        let child = self
            .ssh_command(command)
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                program: "ssh".to_string(),
                source,
            })?;
        let output = CommandOutput::from(child.wait_with_output().await?);

        if output.exit_code == Some(SSH_FAILURE) {
            let host = self.config.host.clone();
            let reason = output.stderr;
            if reason.contains("Permission denied") {
                return Err(ExecutorError::AuthRejected { host, reason });
            }
            return Err(ExecutorError::Unreachable { host, reason });
        }
        Ok(output)
    }

    /// 结束会话；每条命令都是独立进程，这里只记录日志
    pub async fn disconnect(self) -> Result<()> {
        debug!("断开节点 {}", self.config.destination());
        Ok(())
    }

    pub fn config(&self) -> &SshConfig {
        &self.config
    }
}

/// 将开头的 `~` 替换为用户主目录
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
