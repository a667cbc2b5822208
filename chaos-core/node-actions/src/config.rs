//! 配置管理
//!
//! 两类配置：
//! - [`ChaosConfig`]：引擎运行参数 (TOML)
//! - [`NodeScenarioFile`]：节点场景清单 (YAML)
//!
//! 引擎配置搜索路径 (按优先级):
//! 1. `CHAOS_CONFIG` 环境变量指定的路径
//! 2. `./chaos.toml` (当前目录)
//! 3. `~/.config/chaos/config.toml` (用户配置目录)
//! 4. 默认值

use anyhow::{bail, Context, Result};
use chaos_executor::SshConfig;
use chaos_provider::{CloudType, ProviderConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::poller::PollPolicy;
use crate::scenarios::EngineSettings;

// ============================================
// 引擎配置
// ============================================

/// 引擎配置 (顶层)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// 云厂商配置
    #[serde(default)]
    pub provider: ProviderConfig,

    /// kubectl 配置
    #[serde(default)]
    pub kubectl: KubectlConfig,

    /// 轮询配置
    #[serde(default)]
    pub polling: PollingConfig,

    /// 节点 SSH 配置（`host` 留空）
    #[serde(default)]
    pub ssh: SshConfig,
}

/// kubectl 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubectlConfig {
    /// 可执行文件
    #[serde(default = "default_kubectl")]
    pub program: String,

    /// 本地命令超时 (秒)，同时用于云厂商 CLI
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,
}

/// 轮询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// 采样间隔 (秒)
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// 云厂商实例状态确认超时 (秒)
    #[serde(default = "default_provider_wait")]
    pub provider_wait: u64,

    /// 间隔增长倍数
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// 最大采样间隔 (秒)
    #[serde(default = "default_max_interval")]
    pub max_interval: u64,

    /// SSH 连接重试间隔 (秒)
    #[serde(default = "default_interval")]
    pub connect_retry: u64,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            program: default_kubectl(),
            command_timeout: default_command_timeout(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            provider_wait: default_provider_wait(),
            backoff_multiplier: default_backoff_multiplier(),
            max_interval: default_max_interval(),
            connect_retry: default_interval(),
        }
    }
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

fn default_command_timeout() -> u64 {
    120
}

fn default_interval() -> u64 {
    1
}

fn default_provider_wait() -> u64 {
    30
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_max_interval() -> u64 {
    10
}

impl ChaosConfig {
    /// 按搜索路径加载配置，找不到文件时使用默认值
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// 从指定文件加载
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("解析配置文件失败: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验轮询参数，间隔为 0 时轮询不会推进超时
    pub fn validate(&self) -> Result<()> {
        let polling = &self.polling;
        if polling.interval == 0 {
            bail!("polling.interval 必须大于 0");
        }
        if polling.connect_retry == 0 {
            bail!("polling.connect_retry 必须大于 0");
        }
        if polling.backoff_multiplier < 1.0 {
            bail!(
                "polling.backoff_multiplier 不能小于 1.0: {}",
                polling.backoff_multiplier
            );
        }
        Ok(())
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("CHAOS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("chaos.toml");
        if local.exists() {
            return Some(local);
        }

        dirs::home_dir()
            .map(|home| home.join(".config").join("chaos").join("config.toml"))
            .filter(|p| p.exists())
    }

    /// 本地命令超时
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.kubectl.command_timeout)
    }

    /// 转换为引擎参数
    pub fn engine_settings(&self) -> EngineSettings {
        let polling = &self.polling;
        let poll = PollPolicy::with_interval(
            Duration::from_secs(polling.provider_wait),
            Duration::from_secs(polling.interval),
        )
        .backoff(
            polling.backoff_multiplier,
            Duration::from_secs(polling.max_interval),
        );

        EngineSettings {
            poll,
            provider_wait: Duration::from_secs(polling.provider_wait),
            connect_retry: Duration::from_secs(polling.connect_retry),
        }
    }
}

// ============================================
// 场景清单
// ============================================

/// 节点场景清单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeScenarioFile {
    pub node_scenarios: Vec<NodeScenarioConfig>,
}

/// 单条节点场景
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeScenarioConfig {
    /// 依次执行的场景名
    pub actions: Vec<String>,

    /// 目标节点名（不可注入时按标签选择）
    #[serde(default)]
    pub node_name: Option<String>,

    /// 标签选择器
    #[serde(default = "default_label_selector")]
    pub label_selector: Option<String>,

    /// 每个场景的重复次数
    #[serde(default = "default_kill_count")]
    pub instance_kill_count: u32,

    /// 集群侧确认超时 (秒)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// 云厂商（缺省时使用引擎配置）
    #[serde(default)]
    pub cloud_type: Option<CloudType>,

    /// 服务检查列表
    #[serde(default)]
    pub service: Vec<String>,

    /// stop_start 场景中停止后的等待时间 (秒)
    #[serde(default = "default_duration")]
    pub duration: u64,
}

fn default_label_selector() -> Option<String> {
    Some("node-role.kubernetes.io/worker".to_string())
}

fn default_kill_count() -> u32 {
    1
}

fn default_timeout() -> u64 {
    120
}

fn default_duration() -> u64 {
    120
}

impl NodeScenarioFile {
    /// 从 YAML 文件加载
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取场景文件失败: {:?}", path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("解析场景文件失败: {:?}", path))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

impl NodeScenarioConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }
}
