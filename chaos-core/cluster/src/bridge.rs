//! 集群健康桥接接口

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NodeCondition;

/// 集群只读视图
#[async_trait]
pub trait ClusterBridge: Send + Sync {
    /// 列出可注入节点（Ready 节点），可按标签选择器过滤
    async fn list_killable_nodes(&self, label_selector: Option<&str>) -> Result<Vec<String>>;

    /// 节点当前 Ready 条件；节点不存在时返回 [`NodeCondition::Absent`]
    async fn node_condition(&self, node: &str) -> Result<NodeCondition>;

    /// 节点是否仍为集群成员
    async fn node_present(&self, node: &str) -> Result<bool>;

    /// 当前上下文的集群名称
    async fn cluster_name(&self) -> Result<String>;

    /// 阻塞直到节点 Ready，超时返回错误
    async fn wait_for_ready(&self, node: &str, timeout: Duration) -> Result<()>;
}
