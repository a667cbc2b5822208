//! Chaos 命令执行器
//!
//! 为故障注入提供两类命令执行能力：
//! - 本地 CLI 调用（云厂商 CLI、kubectl 等），见 [`CommandRunner`]
//! - 到节点的 SSH 远程会话，见 [`SessionConnector`] / [`RemoteSession`]
//!
//! # 示例
//!
//! ```ignore
//! use chaos_executor::{AuthMethod, CommandRunner, LocalRunner, SessionConnector, SshConnector, SshConfig};
//!
//! // 本地执行 CLI
//! let runner = LocalRunner::default();
//! let output = runner.run("kubectl", &["get".into(), "nodes".into()]).await?;
//!
//! // 使用密钥连接节点
//! let connector = SshConnector::new(SshConfig::template("core", AuthMethod::SshDefaults));
//! let session = connector.connect("10.0.0.8").await?;
//! let output = session.execute("hostname").await?;
//! session.close().await?;
//! ```

mod client;
mod config;
mod error;
mod local;
mod output;
mod session;

pub use client::SshClient;
pub use config::{AuthMethod, SshConfig};
pub use error::{ExecutorError, Result};
pub use local::{CommandRunner, LocalRunner};
pub use output::CommandOutput;
pub use session::{RemoteSession, SessionConnector, SshConnector};
