//! Chaos 集群健康桥接
//!
//! 提供故障注入所需的集群只读视图：
//! - 可注入节点列表（健康节点，可按标签过滤）
//! - 节点 Ready 条件值、节点是否仍为集群成员
//! - 集群名称（用于拼接云厂商实例名）
//! - 等待节点 Ready（委托给 `kubectl wait`）
//!
//! # 示例
//!
//! ```ignore
//! use std::sync::Arc;
//! use chaos_cluster::{ClusterBridge, KubectlCluster};
//! use chaos_executor::LocalRunner;
//!
//! let cluster = KubectlCluster::new(Arc::new(LocalRunner::default()));
//! let nodes = cluster.list_killable_nodes(Some("node-role.kubernetes.io/worker")).await?;
//! let condition = cluster.node_condition(&nodes[0]).await?;
//! ```

mod bridge;
mod error;
mod kubectl;
mod models;
mod parser;

pub use bridge::ClusterBridge;
pub use error::{ClusterError, Result};
pub use kubectl::KubectlCluster;
pub use models::{NodeCondition, NodeInfo};
pub use parser::{parse_node, parse_node_list};
