//! 节点场景清单执行
//!
//! 对清单中的每一条：校验场景名 → 选择目标节点 → 按 `cloud_type` 创建云厂商
//! 客户端 → 依次执行场景。任一场景失败立即返回，后续条目不再执行。

use std::sync::Arc;

use chaos_cluster::{ClusterBridge, KubectlCluster};
use chaos_executor::{CommandRunner, LocalRunner, SessionConnector, SshConnector};
use chaos_provider::{create_provider, CloudType, LifecycleProvider, ProviderConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{ChaosConfig, NodeScenarioConfig, NodeScenarioFile};
use crate::error::{Result, ScenarioError};
use crate::scenarios::{EngineSettings, NodeScenarios, ScenarioKind, ScenarioReport};
use crate::selector::select_node;
use crate::service::is_valid_unit_name;

/// 按云厂商类型创建客户端
pub type ProviderFactory = Arc<dyn Fn(CloudType) -> Arc<dyn LifecycleProvider> + Send + Sync>;

/// 节点场景清单执行器
pub struct NodeScenarioRunner {
    cluster: Arc<dyn ClusterBridge>,
    connector: Arc<dyn SessionConnector>,
    providers: ProviderFactory,
    default_cloud: CloudType,
    settings: EngineSettings,
    rng: Mutex<StdRng>,
    cancel: CancellationToken,
}

impl NodeScenarioRunner {
    pub fn new(
        cluster: Arc<dyn ClusterBridge>,
        connector: Arc<dyn SessionConnector>,
        providers: ProviderFactory,
    ) -> Self {
        Self {
            cluster,
            connector,
            providers,
            default_cloud: CloudType::default(),
            settings: EngineSettings::default(),
            rng: Mutex::new(StdRng::from_entropy()),
            cancel: CancellationToken::new(),
        }
    }

    /// 由引擎配置组装 kubectl、云厂商 CLI 和 SSH 实现
    pub fn from_config(config: &ChaosConfig) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(LocalRunner::new(config.command_timeout()));
        let cluster = KubectlCluster::new(runner.clone()).with_program(config.kubectl.program.clone());
        let connector = SshConnector::new(config.ssh.clone());

        let cli_path = config.provider.cli_path.clone();
        let providers: ProviderFactory = Arc::new(move |cloud_type| {
            let provider_config = ProviderConfig {
                cloud_type,
                cli_path: cli_path.clone(),
            };
            create_provider(&provider_config, runner.clone())
        });

        Self::new(Arc::new(cluster), Arc::new(connector), providers)
            .with_default_cloud(config.provider.cloud_type)
            .with_settings(config.engine_settings())
    }

    pub fn with_default_cloud(mut self, cloud_type: CloudType) -> Self {
        self.default_cloud = cloud_type;
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 使用固定种子选择节点
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 执行整个清单
    pub async fn run(&self, file: &NodeScenarioFile) -> Result<Vec<ScenarioReport>> {
        let mut reports = Vec::new();
        for entry in &file.node_scenarios {
            reports.extend(self.run_entry(entry).await?);
        }
        Ok(reports)
    }

    /// 执行单条场景配置
    pub async fn run_entry(&self, entry: &NodeScenarioConfig) -> Result<Vec<ScenarioReport>> {
        let kinds = validate(entry)?;

        let node = {
            let mut rng = self.rng.lock().await;
            select_node(
                self.cluster.as_ref(),
                entry.node_name.as_deref(),
                entry.label_selector.as_deref(),
                &mut *rng,
            )
            .await?
        };
        info!("目标节点: {}", node);

        let provider = (self.providers)(entry.cloud_type.unwrap_or(self.default_cloud));
        let engine = NodeScenarios::new(provider, self.cluster.clone(), self.connector.clone())
            .with_settings(self.settings)
            .with_cancellation(self.cancel.clone());

        let mut reports = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let report = match kind {
                ScenarioKind::ServiceStatus => {
                    engine
                        .node_service_status(&node, &entry.service, entry.timeout())
                        .await?
                }
                _ => {
                    engine
                        .run(
                            kind,
                            entry.instance_kill_count,
                            &node,
                            entry.timeout(),
                            entry.duration(),
                        )
                        .await?
                }
            };
            reports.push(report);
        }
        Ok(reports)
    }
}

/// 按引擎配置执行场景清单
pub async fn run_node_scenarios(
    config: &ChaosConfig,
    file: &NodeScenarioFile,
) -> Result<Vec<ScenarioReport>> {
    NodeScenarioRunner::from_config(config).run(file).await
}

/// 在发出任何命令之前校验场景配置
fn validate(entry: &NodeScenarioConfig) -> Result<Vec<ScenarioKind>> {
    let kinds = entry
        .actions
        .iter()
        .map(|a| a.parse::<ScenarioKind>())
        .collect::<Result<Vec<_>>>()?;

    if kinds.is_empty() {
        return Err(ScenarioError::Config("actions 不能为空".to_string()));
    }
    if entry.instance_kill_count == 0 {
        return Err(ScenarioError::Config(
            "instance_kill_count 必须为正整数".to_string(),
        ));
    }
    if kinds.contains(&ScenarioKind::ServiceStatus) && entry.service.is_empty() {
        return Err(ScenarioError::Config(
            "node_service_status 需要 service 列表".to_string(),
        ));
    }
    if let Some(bad) = entry.service.iter().find(|s| !is_valid_unit_name(s)) {
        return Err(ScenarioError::Config(format!("非法的服务名: {}", bad)));
    }
    Ok(kinds)
}
