//! Chaos 节点场景
//!
//! 节点级故障注入：通过云厂商对节点背后的实例执行启动、停止、终止、重启，
//! 并同时轮询云厂商实例状态与集群节点状态确认注入生效；另可检查节点上
//! systemd 服务的状态。
//!
//! # 示例
//!
//! ```ignore
//! use std::time::Duration;
//! use chaos_node_actions::{ChaosConfig, NodeScenarioFile, NodeScenarioRunner};
//!
//! let config = ChaosConfig::load()?;
//! let runner = NodeScenarioRunner::from_config(&config);
//! let file = NodeScenarioFile::from_yaml_file("scenarios/node.yaml".as_ref())?;
//! for report in runner.run(&file).await? {
//!     println!("{} {} x{}", report.kind, report.node, report.iterations);
//! }
//! ```

pub mod config;
pub mod error;
pub mod poller;
pub mod runner;
pub mod scenarios;
pub mod selector;
pub mod service;

pub use config::{ChaosConfig, KubectlConfig, NodeScenarioConfig, NodeScenarioFile, PollingConfig};
pub use error::{Result, ScenarioError};
pub use poller::{poll_until, sleep_or_cancel, PollOutcome, PollPolicy, MIN_INTERVAL};
pub use runner::{run_node_scenarios, NodeScenarioRunner, ProviderFactory};
pub use scenarios::{is_bastion, EngineSettings, NodeScenarios, ScenarioKind, ScenarioReport};
pub use selector::select_node;
pub use service::{is_valid_unit_name, parse_service_status, ServiceChecker, ServiceProbe};
