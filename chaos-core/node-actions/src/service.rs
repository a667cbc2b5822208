//! 远程服务状态检查

use std::sync::Arc;
use std::time::Duration;

use chaos_executor::{RemoteSession, SessionConnector};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, ScenarioError};
use crate::poller::{sleep_or_cancel, MIN_INTERVAL};

/// 一次服务状态探测结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProbe {
    /// 服务名
    pub service: String,
    /// systemd ActiveState（active、inactive、failed 等）
    pub status: String,
}

impl ServiceProbe {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// 从 `systemctl status` 输出中提取状态
///
/// 优先取 `Active:` 行的第二个字段；没有该行时退回到第一行非空输出。
pub fn parse_service_status(output: &str) -> Option<String> {
    let active = output.lines().map(str::trim).find_map(|line| {
        line.strip_prefix("Active:")
            .and_then(|rest| rest.split_whitespace().next())
    });

    active
        .or_else(|| output.lines().map(str::trim).find(|l| !l.is_empty()))
        .map(str::to_string)
}

/// systemd 单元名只允许字母、数字和 `@ . _ : - \\`
///
/// 单元名会原样拼进远程 shell 命令，其它字符一律拒绝。
pub fn is_valid_unit_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@._:-\\".contains(c))
}

/// 远程服务检查器
pub struct ServiceChecker {
    connector: Arc<dyn SessionConnector>,
    retry_interval: Duration,
}

impl ServiceChecker {
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self {
            connector,
            retry_interval: Duration::from_secs(1),
        }
    }

    /// 设置连接重试间隔（默认 1 秒，不小于 [`MIN_INTERVAL`]）
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval.max(MIN_INTERVAL);
        self
    }

    /// 检查节点上指定服务的状态
    ///
    /// 节点不可达或拒绝认证时按重试间隔重试，最多 `max(timeout / interval, 1)` 次；
    /// 本地无法启动 ssh 时不再重试。连不上时返回 [`ScenarioError::Connection`]，
    /// 不会执行状态查询。服务名不合法时直接返回 [`ScenarioError::ServiceQuery`]，
    /// 不建立连接。
    pub async fn check_service(
        &self,
        address: &str,
        service: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ServiceProbe> {
        if !is_valid_unit_name(service) {
            return Err(ScenarioError::ServiceQuery {
                service: service.to_string(),
                reason: "非法的服务名".to_string(),
            });
        }

        let session = self.connect_with_retry(address, timeout, cancel).await?;

        info!("检查服务状态: {}", service);
        let result = session.execute(&format!("systemctl status {}", service)).await;

        // 无论查询成功与否都关闭会话
        if let Err(e) = session.close().await {
            warn!("关闭到 {} 的会话失败: {}", address, e);
        }

        let output = result.map_err(|e| ScenarioError::ServiceQuery {
            service: service.to_string(),
            reason: e.to_string(),
        })?;

        let status = parse_service_status(&output.stdout).ok_or_else(|| ScenarioError::ServiceQuery {
            service: service.to_string(),
            reason: format!("没有输出: {}", output.stderr),
        })?;

        info!("服务 {} 状态为 {}", service, status);
        Ok(ServiceProbe {
            service: service.to_string(),
            status,
        })
    }

    async fn connect_with_retry(
        &self,
        address: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn RemoteSession>> {
        let interval_ms = self.retry_interval.as_millis();
        let max_attempts = ((timeout.as_millis() / interval_ms) as u32).max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            info!("尝试 SSH 连接实例: {} ({}/{})", address, attempt, max_attempts);
            match self.connector.connect(address).await {
                Ok(session) => return Ok(session),
                Err(e) if !e.is_connect_failure() => {
                    return Err(ScenarioError::Connection {
                        address: address.to_string(),
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => {
                    debug!("连接 {} 失败: {}", address, e);
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts && !sleep_or_cancel(self.retry_interval, cancel).await {
                return Err(ScenarioError::Cancelled);
            }
        }

        Err(ScenarioError::Connection {
            address: address.to_string(),
            attempts: max_attempts,
            last_error,
        })
    }
}
