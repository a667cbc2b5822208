//! 本地命令执行
//!
//! 云厂商 CLI 和 kubectl 都通过 [`CommandRunner`] 调用，测试中可替换为脚本化实现。

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ExecutorError, Result};
use crate::output::CommandOutput;

/// 本地命令执行接口
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// 执行 `program args...` 并捕获输出
    ///
    /// 非零退出码不视为错误，由调用方根据 [`CommandOutput::is_success`] 判断。
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// 以调用方给定的时限执行，用于自身带超时参数的长命令（如 `kubectl wait`）
    ///
    /// 默认实现忽略 `limit`，直接调用 [`CommandRunner::run`]。
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[String],
        limit: Duration,
    ) -> Result<CommandOutput> {
        let _ = limit;
        self.run(program, args).await
    }
}

/// 基于 `tokio::process` 的本地执行器
#[derive(Debug, Clone)]
pub struct LocalRunner {
    command_timeout: Duration,
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(120),
        }
    }
}

impl LocalRunner {
    /// 创建指定超时的执行器
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }

    async fn spawn_and_wait(
        &self,
        program: &str,
        args: &[String],
        limit: Duration,
    ) -> Result<CommandOutput> {
        debug!("执行本地命令 (时限 {:?}): {} {}", limit, program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| ExecutorError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let output = timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| ExecutorError::Timeout(format!("{} {}", program, args.join(" "))))??;

        Ok(output.into())
    }
}

#[async_trait]
impl CommandRunner for LocalRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.spawn_and_wait(program, args, self.command_timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[String],
        limit: Duration,
    ) -> Result<CommandOutput> {
        self.spawn_and_wait(program, args, limit).await
    }
}
