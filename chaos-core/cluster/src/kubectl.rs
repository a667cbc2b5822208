//! 基于 kubectl 的集群桥接实现

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chaos_executor::{CommandOutput, CommandRunner};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::bridge::ClusterBridge;
use crate::error::{ClusterError, Result};
use crate::models::{NodeCondition, NodeInfo};
use crate::parser::{parse_node, parse_node_list};

/// `kubectl wait` 自身超时之外留给进程启动和 API 往返的余量
const WAIT_GRACE: Duration = Duration::from_secs(30);

/// kubectl 集群客户端
///
/// 集群名称在首次查询后缓存，切换 kubeconfig 上下文后需调用
/// [`KubectlCluster::invalidate_cluster_name`]。
pub struct KubectlCluster {
    runner: Arc<dyn CommandRunner>,
    program: String,
    cluster_name: RwLock<Option<String>>,
}

impl KubectlCluster {
    /// 创建新的 kubectl 客户端
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            program: "kubectl".to_string(),
            cluster_name: RwLock::new(None),
        }
    }

    /// 指定 kubectl 可执行文件
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// 清除缓存的集群名称
    pub async fn invalidate_cluster_name(&self) {
        *self.cluster_name.write().await = None;
    }

    async fn kubectl(&self, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        Ok(self.runner.run(&self.program, &args).await?)
    }

    async fn kubectl_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.kubectl(args).await?;
        if !output.is_success() {
            return Err(ClusterError::CommandFailed {
                command: format!("{} {}", self.program, args.join(" ")),
                output: output.combined_output(),
            });
        }
        Ok(output.stdout)
    }

    /// 获取节点详细信息
    pub async fn get_nodes(&self, label_selector: Option<&str>) -> Result<Vec<NodeInfo>> {
        let mut args = vec!["get", "nodes", "-o", "json"];
        if let Some(selector) = label_selector.filter(|s| !s.is_empty()) {
            args.extend(["-l", selector]);
        }
        let output = self.kubectl_checked(&args).await?;
        parse_node_list(&output)
    }
}

/// kubectl 报告的对象不存在错误
fn is_not_found(output: &CommandOutput) -> bool {
    output.stderr.contains("NotFound") || output.stderr.contains("not found")
}

#[async_trait]
impl ClusterBridge for KubectlCluster {
    async fn list_killable_nodes(&self, label_selector: Option<&str>) -> Result<Vec<String>> {
        let nodes: Vec<String> = self
            .get_nodes(label_selector)
            .await?
            .into_iter()
            .filter(NodeInfo::is_killable)
            .map(|n| n.name)
            .collect();
        debug!("可注入节点 (selector={:?}): {:?}", label_selector, nodes);
        Ok(nodes)
    }

    async fn node_condition(&self, node: &str) -> Result<NodeCondition> {
        let output = self.kubectl(&["get", "node", node, "-o", "json"]).await?;
        if !output.is_success() {
            if is_not_found(&output) {
                return Ok(NodeCondition::Absent);
            }
            return Err(ClusterError::CommandFailed {
                command: format!("{} get node {}", self.program, node),
                output: output.combined_output(),
            });
        }
        Ok(parse_node(&output.stdout)?.condition)
    }

    async fn node_present(&self, node: &str) -> Result<bool> {
        Ok(self.node_condition(node).await? != NodeCondition::Absent)
    }

    async fn cluster_name(&self) -> Result<String> {
        if let Some(name) = self.cluster_name.read().await.as_ref() {
            return Ok(name.clone());
        }

        let output = self
            .kubectl_checked(&[
                "config",
                "view",
                "--minify",
                "-o",
                "jsonpath={.contexts[0].context.cluster}",
            ])
            .await?;

        let name = output
            .split_whitespace()
            .next()
            .ok_or_else(|| ClusterError::ParseError("kubeconfig 没有当前上下文".to_string()))?
            .to_string();

        info!("当前集群: {}", name);
        *self.cluster_name.write().await = Some(name.clone());
        Ok(name)
    }

    async fn wait_for_ready(&self, node: &str, timeout: Duration) -> Result<()> {
        let target = format!("node/{}", node);
        let timeout_arg = format!("--timeout={}s", timeout.as_secs());
        let args: Vec<String> = ["wait", "--for=condition=Ready", target.as_str(), timeout_arg.as_str()]
            .iter()
            .map(|a| a.to_string())
            .collect();
        // 进程时限长于 kubectl 自身的等待时间
        let output = self
            .runner
            .run_with_timeout(&self.program, &args, timeout + WAIT_GRACE)
            .await?;

        if !output.is_success() {
            return Err(ClusterError::WaitFailed {
                node: node.to_string(),
                output: output.combined_output(),
            });
        }

        info!("节点 {} 已 Ready", node);
        Ok(())
    }
}
