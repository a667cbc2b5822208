//! 测试用的脚本化协作者

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chaos_cluster::{ClusterBridge, ClusterError, NodeCondition};
use chaos_executor::{CommandOutput, ExecutorError, RemoteSession, SessionConnector};
use chaos_provider::{InstanceStatus, LifecycleProvider, ProviderError};

/// 按脚本依次返回值，脚本耗尽后一直返回最后一个值
pub struct Script<T: Clone> {
    values: Mutex<VecDeque<T>>,
    last: Mutex<T>,
    calls: AtomicU32,
}

impl<T: Clone> Script<T> {
    pub fn new(values: Vec<T>) -> Self {
        let last = values.last().cloned().expect("script needs at least one value");
        Self {
            values: Mutex::new(values.into()),
            last: Mutex::new(last),
            calls: AtomicU32::new(0),
        }
    }

    pub fn next(&self) -> T {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut values = self.values.lock().unwrap();
        match values.pop_front() {
            Some(v) => {
                *self.last.lock().unwrap() = v.clone();
                v
            }
            None => self.last.lock().unwrap().clone(),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

// ============================================
// 云厂商
// ============================================

pub struct FakeProvider {
    pub statuses: Script<InstanceStatus>,
    pub address: String,
    pub fail_on: Option<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(statuses: Vec<InstanceStatus>) -> Self {
        Self {
            statuses: Script::new(statuses),
            address: " 169.48.2.15\n".to_string(),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(operation))
            .count()
    }

    fn record(&self, operation: &'static str, instance: &str) -> chaos_provider::Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", operation, instance));
        if self.fail_on == Some(operation) {
            return Err(ProviderError::CommandFailed {
                command: format!("ibmcloud pi {} {}", operation, instance),
                exit_code: Some(1),
                output: "FAILED".to_string(),
            });
        }
        Ok(format!("{} accepted", operation))
    }
}

#[async_trait]
impl LifecycleProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start(&self, instance: &str) -> chaos_provider::Result<String> {
        self.record("start", instance)
    }

    async fn stop(&self, instance: &str) -> chaos_provider::Result<String> {
        self.record("stop", instance)
    }

    async fn terminate(&self, instance: &str) -> chaos_provider::Result<String> {
        self.record("terminate", instance)
    }

    async fn reboot(&self, instance: &str) -> chaos_provider::Result<String> {
        self.record("reboot", instance)
    }

    async fn status(&self, instance: &str) -> chaos_provider::Result<InstanceStatus> {
        if self.fail_on == Some("status") {
            return Err(ProviderError::ParseError(format!("no status for {instance}")));
        }
        Ok(self.statuses.next())
    }

    async fn address(&self, instance: &str) -> chaos_provider::Result<String> {
        self.record("address", instance)?;
        Ok(self.address.clone())
    }
}

// ============================================
// 集群
// ============================================

pub struct FakeCluster {
    pub name: String,
    pub killable: Vec<String>,
    pub by_selector: HashMap<String, Vec<String>>,
    pub conditions: Script<NodeCondition>,
    pub present: Script<bool>,
    pub ready_ok: bool,
    pub ready_waits: Mutex<Vec<(String, Duration)>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self {
            name: "c1".to_string(),
            killable: vec!["worker-1".into(), "worker-2".into(), "worker-3".into()],
            by_selector: HashMap::new(),
            conditions: Script::new(vec![NodeCondition::Unknown]),
            present: Script::new(vec![false]),
            ready_ok: true,
            ready_waits: Mutex::new(Vec::new()),
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<NodeCondition>) -> Self {
        self.conditions = Script::new(conditions);
        self
    }

    pub fn with_presence(mut self, present: Vec<bool>) -> Self {
        self.present = Script::new(present);
        self
    }

    pub fn with_selector(mut self, selector: &str, nodes: &[&str]) -> Self {
        self.by_selector
            .insert(selector.to_string(), nodes.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn never_ready(mut self) -> Self {
        self.ready_ok = false;
        self
    }

    pub fn ready_waits(&self) -> Vec<(String, Duration)> {
        self.ready_waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterBridge for FakeCluster {
    async fn list_killable_nodes(
        &self,
        label_selector: Option<&str>,
    ) -> chaos_cluster::Result<Vec<String>> {
        match label_selector {
            None => Ok(self.killable.clone()),
            Some(selector) => Ok(self.by_selector.get(selector).cloned().unwrap_or_default()),
        }
    }

    async fn node_condition(&self, _node: &str) -> chaos_cluster::Result<NodeCondition> {
        Ok(self.conditions.next())
    }

    async fn node_present(&self, _node: &str) -> chaos_cluster::Result<bool> {
        Ok(self.present.next())
    }

    async fn cluster_name(&self) -> chaos_cluster::Result<String> {
        Ok(self.name.clone())
    }

    async fn wait_for_ready(&self, node: &str, timeout: Duration) -> chaos_cluster::Result<()> {
        self.ready_waits
            .lock()
            .unwrap()
            .push((node.to_string(), timeout));
        if self.ready_ok {
            Ok(())
        } else {
            Err(ClusterError::WaitFailed {
                node: node.to_string(),
                output: "timed out waiting for the condition".to_string(),
            })
        }
    }
}

// ============================================
// 远程会话
// ============================================

#[derive(Default)]
pub struct SessionLog {
    pub attempts: AtomicU32,
    pub closed: AtomicU32,
    pub commands: Mutex<Vec<String>>,
}

pub struct FakeConnector {
    pub reachable: bool,
    pub ssh_missing: bool,
    pub status_output: String,
    pub log: Arc<SessionLog>,
}

impl FakeConnector {
    pub fn reachable(status_output: &str) -> Self {
        Self {
            reachable: true,
            ssh_missing: false,
            status_output: status_output.to_string(),
            log: Arc::new(SessionLog::default()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ssh_missing: false,
            status_output: String::new(),
            log: Arc::new(SessionLog::default()),
        }
    }

    /// 本地没有 ssh 可执行文件
    pub fn without_ssh() -> Self {
        Self {
            ssh_missing: true,
            ..Self::unreachable()
        }
    }
}

struct FakeSession {
    output: String,
    log: Arc<SessionLog>,
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn execute(&self, command: &str) -> chaos_executor::Result<CommandOutput> {
        self.log.commands.lock().unwrap().push(command.to_string());
        Ok(CommandOutput {
            stdout: self.output.clone(),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }

    async fn close(self: Box<Self>) -> chaos_executor::Result<()> {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SessionConnector for FakeConnector {
    async fn connect(&self, address: &str) -> chaos_executor::Result<Box<dyn RemoteSession>> {
        self.log.attempts.fetch_add(1, Ordering::SeqCst);
        if self.ssh_missing {
            return Err(ExecutorError::Spawn {
                program: "ssh".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            });
        }
        if !self.reachable {
            return Err(ExecutorError::Unreachable {
                host: address.to_string(),
                reason: format!("ssh: connect to host {address} port 22: No route to host"),
            });
        }
        Ok(Box::new(FakeSession {
            output: self.status_output.clone(),
            log: self.log.clone(),
        }))
    }
}
