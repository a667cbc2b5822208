//! 集群数据模型

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 节点 Ready 条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCondition {
    /// Ready=True
    Ready,
    /// Ready=False
    NotReady,
    /// Ready=Unknown（kubelet 失联）
    Unknown,
    /// 节点已不在集群中
    Absent,
}

impl NodeCondition {
    /// 从 Ready 条件的 `status` 字段解析
    pub fn from_ready_status(status: &str) -> Self {
        match status {
            "True" => NodeCondition::Ready,
            "False" => NodeCondition::NotReady,
            _ => NodeCondition::Unknown,
        }
    }
}

impl fmt::Display for NodeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeCondition::Ready => "Ready",
            NodeCondition::NotReady => "NotReady",
            NodeCondition::Unknown => "Unknown",
            NodeCondition::Absent => "Absent",
        };
        f.write_str(s)
    }
}

/// 节点信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// 节点名
    pub name: String,
    /// 标签
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Ready 条件
    pub condition: NodeCondition,
}

impl NodeInfo {
    /// 是否可作为注入目标
    pub fn is_killable(&self) -> bool {
        self.condition == NodeCondition::Ready
    }
}
