//! 节点场景引擎
//!
//! 每个场景按 `instance_kill_count` 顺序执行若干轮，每轮：
//! 1. 向云厂商发出一条生命周期命令
//! 2. 轮询云厂商实例状态确认
//! 3. 轮询 / 等待集群侧节点状态确认
//!
//! 任一步骤失败都会中止整个场景（不再执行剩余轮次），并返回
//! [`ScenarioError::InjectionFailed`]。注入动作不做回滚。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chaos_cluster::{ClusterBridge, NodeCondition};
use chaos_executor::SessionConnector;
use chaos_provider::{LifecycleAction, LifecycleProvider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{Result, ScenarioError};
use crate::poller::{poll_until, sleep_or_cancel, PollOutcome, PollPolicy};
use crate::service::{ServiceChecker, ServiceProbe};

/// 场景类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioKind {
    #[serde(rename = "node_start_scenario")]
    NodeStart,
    #[serde(rename = "node_stop_scenario")]
    NodeStop,
    #[serde(rename = "node_termination_scenario")]
    NodeTermination,
    #[serde(rename = "node_reboot_scenario")]
    NodeReboot,
    #[serde(rename = "stop_start_node_scenario")]
    StopStart,
    #[serde(rename = "node_service_status")]
    ServiceStatus,
}

impl ScenarioKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::NodeStart => "node_start_scenario",
            ScenarioKind::NodeStop => "node_stop_scenario",
            ScenarioKind::NodeTermination => "node_termination_scenario",
            ScenarioKind::NodeReboot => "node_reboot_scenario",
            ScenarioKind::StopStart => "stop_start_node_scenario",
            ScenarioKind::ServiceStatus => "node_service_status",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "node_start_scenario" => Ok(ScenarioKind::NodeStart),
            "node_stop_scenario" => Ok(ScenarioKind::NodeStop),
            "node_termination_scenario" => Ok(ScenarioKind::NodeTermination),
            "node_reboot_scenario" => Ok(ScenarioKind::NodeReboot),
            "stop_start_node_scenario" => Ok(ScenarioKind::StopStart),
            "node_service_status" => Ok(ScenarioKind::ServiceStatus),
            other => Err(ScenarioError::Config(format!("未知的场景: {}", other))),
        }
    }
}

/// 场景执行报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// 场景类型
    pub kind: ScenarioKind,
    /// 集群节点名
    pub node: String,
    /// 云厂商实例名
    pub instance: String,
    /// 完成的轮次
    pub iterations: u32,
    /// 服务探测结果（仅服务检查场景）
    #[serde(default)]
    pub probes: Vec<ServiceProbe>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// 引擎参数
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// 轮询间隔与退避（超时由各调用点覆盖）
    pub poll: PollPolicy,
    /// 云厂商实例状态确认的超时
    pub provider_wait: Duration,
    /// SSH 连接重试间隔
    pub connect_retry: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            provider_wait: Duration::from_secs(30),
            connect_retry: Duration::from_secs(1),
        }
    }
}

/// 堡垒机不参与集群健康上报，跳过集群侧确认
pub fn is_bastion(node: &str) -> bool {
    node.contains("bastion")
}

/// 节点场景引擎
pub struct NodeScenarios {
    provider: Arc<dyn LifecycleProvider>,
    cluster: Arc<dyn ClusterBridge>,
    checker: ServiceChecker,
    settings: EngineSettings,
    cancel: CancellationToken,
}

impl NodeScenarios {
    pub fn new(
        provider: Arc<dyn LifecycleProvider>,
        cluster: Arc<dyn ClusterBridge>,
        connector: Arc<dyn SessionConnector>,
    ) -> Self {
        let settings = EngineSettings::default();
        Self {
            provider,
            cluster,
            checker: ServiceChecker::new(connector).with_retry_interval(settings.connect_retry),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self.checker = self.checker.with_retry_interval(settings.connect_retry);
        self
    }

    /// 使用外部取消令牌（例如进程收到 SIGINT 时取消）
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 节点对应的云厂商实例名：`<集群名>-<节点名>`
    pub async fn instance_name(&self, node: &str) -> Result<String> {
        let cluster = self.cluster.cluster_name().await?;
        Ok(format!("{}-{}", cluster, node))
    }

    // ============================================
    // 场景入口
    // ============================================

    /// 启动节点
    pub async fn node_start_scenario(
        &self,
        instance_kill_count: u32,
        node: &str,
        timeout: Duration,
    ) -> Result<ScenarioReport> {
        self.repeat(ScenarioKind::NodeStart, instance_kill_count, node, timeout, Duration::ZERO)
            .await
    }

    /// 停止节点
    pub async fn node_stop_scenario(
        &self,
        instance_kill_count: u32,
        node: &str,
        timeout: Duration,
    ) -> Result<ScenarioReport> {
        self.repeat(ScenarioKind::NodeStop, instance_kill_count, node, timeout, Duration::ZERO)
            .await
    }

    /// 终止节点
    pub async fn node_termination_scenario(
        &self,
        instance_kill_count: u32,
        node: &str,
        timeout: Duration,
    ) -> Result<ScenarioReport> {
        self.repeat(
            ScenarioKind::NodeTermination,
            instance_kill_count,
            node,
            timeout,
            Duration::ZERO,
        )
        .await
    }

    /// 重启节点
    pub async fn node_reboot_scenario(
        &self,
        instance_kill_count: u32,
        node: &str,
        timeout: Duration,
    ) -> Result<ScenarioReport> {
        self.repeat(ScenarioKind::NodeReboot, instance_kill_count, node, timeout, Duration::ZERO)
            .await
    }

    /// 停止节点，等待 `duration` 后再启动
    pub async fn stop_start_node_scenario(
        &self,
        instance_kill_count: u32,
        node: &str,
        timeout: Duration,
        duration: Duration,
    ) -> Result<ScenarioReport> {
        self.repeat(ScenarioKind::StopStart, instance_kill_count, node, timeout, duration)
            .await
    }

    /// 依次检查节点上的服务状态
    pub async fn node_service_status(
        &self,
        node: &str,
        services: &[String],
        timeout: Duration,
    ) -> Result<ScenarioReport> {
        let kind = ScenarioKind::ServiceStatus;
        let started_at = Utc::now();
        info!("检查节点 {} 上的服务状态", node);

        let result = async {
            let instance = self.instance_name(node).await?;
            let address = self.provider.address(&instance).await?;
            let address = address.trim();

            let mut probes = Vec::with_capacity(services.len());
            for service in services {
                let probe = self
                    .checker
                    .check_service(address, service.trim(), timeout, &self.cancel)
                    .await?;
                info!("节点 {} 服务 {} 状态已检查", node, probe.service);
                probes.push(probe);
            }
            Ok::<_, ScenarioError>((instance, probes))
        }
        .await;

        match result {
            Ok((instance, probes)) => {
                info!("{} 注入成功", kind);
                Ok(ScenarioReport {
                    kind,
                    node: node.to_string(),
                    instance,
                    iterations: 1,
                    probes,
                    started_at,
                    finished_at: Utc::now(),
                })
            }
            Err(e) => Err(self.fail(kind, node, 1, e)),
        }
    }

    /// 按场景类型分发（服务检查需要服务列表，走 [`Self::node_service_status`]）
    pub async fn run(
        &self,
        kind: ScenarioKind,
        instance_kill_count: u32,
        node: &str,
        timeout: Duration,
        duration: Duration,
    ) -> Result<ScenarioReport> {
        if kind == ScenarioKind::ServiceStatus {
            return Err(ScenarioError::Config(
                "node_service_status 需要服务列表".to_string(),
            ));
        }
        self.repeat(kind, instance_kill_count, node, timeout, duration).await
    }

    // ============================================
    // 确认步骤
    // ============================================

    /// 轮询直到节点 Ready 条件变为 Unknown
    pub async fn wait_for_unknown_status(&self, node: &str, timeout: Duration) -> Result<()> {
        let policy = self.settings.poll.timeout(timeout);
        let cluster = self.cluster.as_ref();
        let outcome = poll_until(
            &policy,
            &self.cancel,
            move || cluster.node_condition(node),
            |c| *c == NodeCondition::Unknown,
        )
        .await?;

        self.check_outcome(format!("节点 {}", node), NodeCondition::Unknown, outcome)
    }

    /// 等待节点 Ready（委托给集群自身的等待原语）
    pub async fn wait_for_ready_status(&self, node: &str, timeout: Duration) -> Result<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ScenarioError::Cancelled),
            result = self.cluster.wait_for_ready(node, timeout) => Ok(result?),
        }
    }

    /// 轮询实例状态直到达到操作对应的目标状态
    async fn wait_for_instance(&self, instance: &str, action: LifecycleAction) -> Result<()> {
        let expected = action.expected_status();
        let policy = self.settings.poll.timeout(self.settings.provider_wait);
        let provider = self.provider.as_ref();
        let outcome = poll_until(
            &policy,
            &self.cancel,
            move || provider.status(instance),
            |s| *s == expected,
        )
        .await?;

        if outcome.is_reached() {
            info!("实例 {} 已达到目标状态 {}", instance, expected);
        }
        self.check_outcome(format!("实例 {}", instance), expected, outcome)
    }

    /// 轮询直到节点从集群中移除
    async fn wait_for_removal(&self, node: &str, timeout: Duration) -> Result<()> {
        let policy = self.settings.poll.timeout(timeout);
        let cluster = self.cluster.as_ref();
        let outcome = poll_until(
            &policy,
            &self.cancel,
            move || cluster.node_present(node),
            |present| !*present,
        )
        .await?;

        match outcome {
            PollOutcome::Reached { .. } => Ok(()),
            PollOutcome::Cancelled { .. } => Err(ScenarioError::Cancelled),
            PollOutcome::TimedOut { samples, .. } => Err(ScenarioError::Termination(format!(
                "节点 {} 在 {} 次采样后仍在集群中",
                node, samples
            ))),
        }
    }

    fn check_outcome<T: fmt::Display>(
        &self,
        subject: String,
        expected: impl fmt::Display,
        outcome: PollOutcome<T>,
    ) -> Result<()> {
        match outcome {
            PollOutcome::Reached { .. } => Ok(()),
            PollOutcome::Cancelled { .. } => Err(ScenarioError::Cancelled),
            PollOutcome::TimedOut { last, samples } => Err(ScenarioError::Confirmation {
                subject,
                expected: expected.to_string(),
                last: last.to_string(),
                samples,
            }),
        }
    }

    // ============================================
    // 单轮执行
    // ============================================

    async fn repeat(
        &self,
        kind: ScenarioKind,
        instance_kill_count: u32,
        node: &str,
        timeout: Duration,
        duration: Duration,
    ) -> Result<ScenarioReport> {
        if instance_kill_count == 0 {
            return Err(ScenarioError::Config(
                "instance_kill_count 必须为正整数".to_string(),
            ));
        }

        let started_at = Utc::now();
        let mut instance = String::new();

        for iteration in 1..=instance_kill_count {
            info!("开始 {} 注入 (节点 {}, 第 {}/{} 次)", kind, node, iteration, instance_kill_count);

            let result = match kind {
                ScenarioKind::NodeStart => self.start_once(node, timeout).await,
                ScenarioKind::NodeStop => self.stop_once(node, timeout).await,
                ScenarioKind::NodeTermination => self.terminate_once(node, timeout).await,
                ScenarioKind::NodeReboot => self.reboot_once(node, timeout).await,
                ScenarioKind::StopStart => self.stop_start_once(node, timeout, duration).await,
                ScenarioKind::ServiceStatus => Err(ScenarioError::Config(
                    "node_service_status 不支持重复执行".to_string(),
                )),
            };

            match result {
                Ok(name) => instance = name,
                Err(e) => return Err(self.fail(kind, node, iteration, e)),
            }

            info!("{} 注入成功", kind);
        }

        Ok(ScenarioReport {
            kind,
            node: node.to_string(),
            instance,
            iterations: instance_kill_count,
            probes: Vec::new(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn fail(&self, kind: ScenarioKind, node: &str, iteration: u32, e: ScenarioError) -> ScenarioError {
        error!("{} 注入失败 (节点 {}, 第 {} 次): {}", kind, node, iteration, e);
        ScenarioError::InjectionFailed {
            scenario: kind,
            node: node.to_string(),
            iteration,
            source: Box::new(e),
        }
    }

    async fn start_once(&self, node: &str, timeout: Duration) -> Result<String> {
        info!("启动节点 {}", node);
        let instance = self.instance_name(node).await?;
        self.provider.start(&instance).await?;
        self.wait_for_instance(&instance, LifecycleAction::Start).await?;
        if !is_bastion(node) {
            self.wait_for_ready_status(node, timeout).await?;
        }
        info!("实例 {} 已处于运行状态", instance);
        Ok(instance)
    }

    async fn stop_once(&self, node: &str, timeout: Duration) -> Result<String> {
        info!("停止节点 {}", node);
        let instance = self.instance_name(node).await?;
        self.provider.stop(&instance).await?;
        self.wait_for_instance(&instance, LifecycleAction::Stop).await?;
        info!("实例 {} 已处于停止状态", instance);
        if !is_bastion(node) {
            self.wait_for_unknown_status(node, timeout).await?;
        }
        Ok(instance)
    }

    async fn terminate_once(&self, node: &str, timeout: Duration) -> Result<String> {
        info!("终止节点 {}", node);
        let instance = self.instance_name(node).await?;
        self.provider.terminate(&instance).await?;
        self.wait_for_instance(&instance, LifecycleAction::Terminate).await?;
        self.wait_for_removal(node, timeout).await?;
        info!("实例 {} 已终止", instance);
        Ok(instance)
    }

    async fn reboot_once(&self, node: &str, timeout: Duration) -> Result<String> {
        info!("重启节点 {}", node);
        let instance = self.instance_name(node).await?;
        self.provider.reboot(&instance).await?;
        self.wait_for_unknown_status(node, timeout).await?;
        self.wait_for_ready_status(node, timeout).await?;
        info!("实例 {} 已重启", instance);
        Ok(instance)
    }

    async fn stop_start_once(&self, node: &str, timeout: Duration, duration: Duration) -> Result<String> {
        self.stop_once(node, timeout).await?;
        info!("等待 {:?} 后启动节点 {}", duration, node);
        if !sleep_or_cancel(duration, &self.cancel).await {
            return Err(ScenarioError::Cancelled);
        }
        self.start_once(node, timeout).await
    }
}
