//! kubectl JSON 输出解析
//!
//! 只反序列化需要的字段：`metadata.name`、`metadata.labels` 和
//! `status.conditions` 中 `type == "Ready"` 的条目。

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::models::{NodeCondition, NodeInfo};

#[derive(Deserialize)]
struct RawNodeList {
    #[serde(default)]
    items: Vec<RawNode>,
}

#[derive(Deserialize)]
struct RawNode {
    metadata: RawMetadata,
    #[serde(default)]
    status: RawStatus,
}

#[derive(Deserialize)]
struct RawMetadata {
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Deserialize, Default)]
struct RawStatus {
    #[serde(default)]
    conditions: Vec<RawCondition>,
}

#[derive(Deserialize)]
struct RawCondition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

impl From<RawNode> for NodeInfo {
    fn from(raw: RawNode) -> Self {
        // 没有 Ready 条件的节点（刚注册）视为 Unknown
        let condition = raw
            .status
            .conditions
            .iter()
            .find(|c| c.kind == "Ready")
            .map(|c| NodeCondition::from_ready_status(&c.status))
            .unwrap_or(NodeCondition::Unknown);

        NodeInfo {
            name: raw.metadata.name,
            labels: raw.metadata.labels,
            condition,
        }
    }
}

/// 解析 `kubectl get nodes -o json`
pub fn parse_node_list(output: &str) -> Result<Vec<NodeInfo>> {
    let list: RawNodeList = serde_json::from_str(output)?;
    let nodes: Vec<NodeInfo> = list.items.into_iter().map(NodeInfo::from).collect();
    debug!("解析到 {} 个节点", nodes.len());
    Ok(nodes)
}

/// 解析 `kubectl get node <name> -o json`
pub fn parse_node(output: &str) -> Result<NodeInfo> {
    let node: RawNode = serde_json::from_str(output)?;
    Ok(node.into())
}
