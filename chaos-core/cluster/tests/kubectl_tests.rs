//! kubectl 集群桥接测试

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chaos_cluster::*;
use chaos_executor::{CommandOutput, CommandRunner};

/// 按参数前缀返回预设输出的执行器
#[derive(Default)]
struct ScriptedKubectl {
    responses: HashMap<String, CommandOutput>,
    calls: Mutex<Vec<String>>,
    limits: Mutex<Vec<Duration>>,
}

impl ScriptedKubectl {
    fn respond(mut self, args: &str, output: CommandOutput) -> Self {
        self.responses.insert(args.to_string(), output);
        self
    }

    fn limits(&self) -> Vec<Duration> {
        self.limits.lock().unwrap().clone()
    }

    fn call_count(&self, args: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == args).count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedKubectl {
    async fn run(&self, _program: &str, args: &[String]) -> chaos_executor::Result<CommandOutput> {
        let key = args.join(" ");
        self.calls.lock().unwrap().push(key.clone());
        Ok(self
            .responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| CommandOutput::failure(1, format!("unexpected: {key}"))))
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[String],
        limit: Duration,
    ) -> chaos_executor::Result<CommandOutput> {
        self.limits.lock().unwrap().push(limit);
        self.run(program, args).await
    }
}

const NODES: &str = r#"{"items": [
  {"metadata": {"name": "worker-1"}, "status": {"conditions": [{"type": "Ready", "status": "True"}]}},
  {"metadata": {"name": "worker-2"}, "status": {"conditions": [{"type": "Ready", "status": "Unknown"}]}},
  {"metadata": {"name": "worker-3"}, "status": {"conditions": [{"type": "Ready", "status": "True"}]}}
]}"#;

#[tokio::test]
async fn test_list_killable_nodes_filters_unhealthy() {
    let runner = Arc::new(
        ScriptedKubectl::default()
            .respond(
                "get nodes -o json -l node-role.kubernetes.io/worker",
                CommandOutput::success(NODES),
            )
            .respond("get nodes -o json", CommandOutput::success(NODES)),
    );
    let cluster = KubectlCluster::new(runner);

    let killable = cluster
        .list_killable_nodes(Some("node-role.kubernetes.io/worker"))
        .await
        .unwrap();
    assert_eq!(killable, vec!["worker-1", "worker-3"]);

    let all = cluster.get_nodes(None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].condition, NodeCondition::Unknown);
}

#[tokio::test]
async fn test_node_condition_and_presence() {
    let runner = Arc::new(
        ScriptedKubectl::default()
            .respond(
                "get node worker-2 -o json",
                CommandOutput::success(
                    r#"{"metadata": {"name": "worker-2"}, "status": {"conditions": [{"type": "Ready", "status": "Unknown"}]}}"#,
                ),
            )
            .respond(
                "get node worker-9 -o json",
                CommandOutput::failure(1, r#"Error from server (NotFound): nodes "worker-9" not found"#),
            ),
    );
    let cluster = KubectlCluster::new(runner);

    assert_eq!(
        cluster.node_condition("worker-2").await.unwrap(),
        NodeCondition::Unknown
    );
    assert_eq!(
        cluster.node_condition("worker-9").await.unwrap(),
        NodeCondition::Absent
    );
    assert!(cluster.node_present("worker-2").await.unwrap());
    assert!(!cluster.node_present("worker-9").await.unwrap());
}

#[tokio::test]
async fn test_node_condition_command_failure() {
    let runner = Arc::new(ScriptedKubectl::default().respond(
        "get node worker-1 -o json",
        CommandOutput::failure(1, "Unable to connect to the server"),
    ));
    let cluster = KubectlCluster::new(runner);

    assert!(matches!(
        cluster.node_condition("worker-1").await,
        Err(ClusterError::CommandFailed { .. })
    ));
}

#[tokio::test]
async fn test_cluster_name_is_cached_until_invalidated() {
    let key = "config view --minify -o jsonpath={.contexts[0].context.cluster}";
    let runner = Arc::new(
        ScriptedKubectl::default().respond(key, CommandOutput::success("ocp-prod")),
    );
    let cluster = KubectlCluster::new(runner.clone());

    assert_eq!(cluster.cluster_name().await.unwrap(), "ocp-prod");
    assert_eq!(cluster.cluster_name().await.unwrap(), "ocp-prod");
    assert_eq!(runner.call_count(key), 1);

    cluster.invalidate_cluster_name().await;
    cluster.cluster_name().await.unwrap();
    assert_eq!(runner.call_count(key), 2);
}

#[tokio::test]
async fn test_wait_for_ready() {
    let runner = Arc::new(
        ScriptedKubectl::default()
            .respond(
                "wait --for=condition=Ready node/worker-1 --timeout=30s",
                CommandOutput::success("node/worker-1 condition met"),
            )
            .respond(
                "wait --for=condition=Ready node/worker-2 --timeout=5s",
                CommandOutput::failure(1, "error: timed out waiting for the condition on nodes/worker-2"),
            ),
    );
    let cluster = KubectlCluster::new(runner);

    cluster
        .wait_for_ready("worker-1", Duration::from_secs(30))
        .await
        .unwrap();

    let err = cluster
        .wait_for_ready("worker-2", Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ClusterError::WaitFailed { ref node, .. } if node == "worker-2"));
}

#[tokio::test]
async fn test_cluster_name_reads_current_context_only() {
    // `--minify` 只保留当前上下文；不带它时 kubeconfig 中所有上下文的集群都会输出
    let runner = Arc::new(
        ScriptedKubectl::default()
            .respond(
                "config view -o jsonpath={.contexts[].context.cluster}",
                CommandOutput::success("ocp-staging ocp-prod"),
            )
            .respond(
                "config view --minify -o jsonpath={.contexts[0].context.cluster}",
                CommandOutput::success("ocp-prod"),
            ),
    );
    let cluster = KubectlCluster::new(runner);

    assert_eq!(cluster.cluster_name().await.unwrap(), "ocp-prod");
}

#[tokio::test]
async fn test_wait_for_ready_outlives_requested_timeout() {
    let runner = Arc::new(ScriptedKubectl::default().respond(
        "wait --for=condition=Ready node/worker-1 --timeout=180s",
        CommandOutput::success("node/worker-1 condition met"),
    ));
    let cluster = KubectlCluster::new(runner.clone());

    cluster
        .wait_for_ready("worker-1", Duration::from_secs(180))
        .await
        .unwrap();

    let limits = runner.limits();
    assert_eq!(limits.len(), 1);
    assert!(limits[0] > Duration::from_secs(180));
}

#[cfg(unix)]
#[tokio::test]
async fn test_slow_ready_wait_not_cut_by_command_timeout() {
    use chaos_executor::LocalRunner;
    use std::os::unix::fs::PermissionsExt;

    // 模拟一个 2 秒后才报告 Ready 的 kubectl
    let script = std::env::temp_dir().join(format!("chaos-slow-kubectl-{}", std::process::id()));
    std::fs::write(&script, "#!/bin/sh\nsleep 2\necho \"$3 condition met\"\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let cluster = KubectlCluster::new(Arc::new(LocalRunner::new(Duration::from_secs(1))))
        .with_program(script.to_string_lossy().into_owned());
    let result = cluster.wait_for_ready("worker-1", Duration::from_secs(10)).await;
    let _ = std::fs::remove_file(&script);

    result.unwrap();
}
