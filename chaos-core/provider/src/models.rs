//! 云厂商数据模型

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// 实例状态
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceStatus {
    /// 运行中
    Active,
    /// 已关机
    Shutoff,
    /// 其他状态（BUILD、ERROR、WARNING 等），保留原始文本
    Other(String),
}

impl InstanceStatus {
    /// 从 CLI 输出的状态字段解析
    pub fn parse(token: &str) -> Self {
        match token.trim().to_uppercase().as_str() {
            "ACTIVE" => InstanceStatus::Active,
            "SHUTOFF" => InstanceStatus::Shutoff,
            _ => InstanceStatus::Other(token.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InstanceStatus::Active => "ACTIVE",
            InstanceStatus::Shutoff => "SHUTOFF",
            InstanceStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 会改变实例状态的生命周期操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Start,
    Stop,
    Terminate,
}

impl LifecycleAction {
    /// 操作完成后实例应处于的状态
    pub fn expected_status(&self) -> InstanceStatus {
        match self {
            LifecycleAction::Start => InstanceStatus::Active,
            LifecycleAction::Stop | LifecycleAction::Terminate => InstanceStatus::Shutoff,
        }
    }
}

/// 云厂商类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CloudType {
    #[default]
    #[serde(rename = "ibmcloud", alias = "ibm")]
    IbmCloud,
}

impl FromStr for CloudType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ibmcloud" | "ibm" => Ok(CloudType::IbmCloud),
            other => Err(ProviderError::UnsupportedCloud(other.to_string())),
        }
    }
}

/// 云厂商配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 云厂商类型
    #[serde(default)]
    pub cloud_type: CloudType,

    /// CLI 可执行文件路径（默认使用 PATH 中的同名命令）
    #[serde(default)]
    pub cli_path: Option<String>,
}
