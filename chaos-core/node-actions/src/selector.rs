//! 目标节点选择

use chaos_cluster::ClusterBridge;
use rand::Rng;
use tracing::info;

use crate::error::{Result, ScenarioError};

/// 将节点请求解析为一个具体的可注入节点
///
/// 请求的节点名在可注入节点集合中时原样返回；否则在匹配 `label_selector`
/// 的可注入节点中随机选取一个。随机源由调用方注入，测试中可使用固定种子。
pub async fn select_node<R: Rng>(
    cluster: &dyn ClusterBridge,
    requested: Option<&str>,
    label_selector: Option<&str>,
    rng: &mut R,
) -> Result<String> {
    if let Some(name) = requested.filter(|n| !n.is_empty()) {
        let killable = cluster.list_killable_nodes(None).await?;
        if killable.iter().any(|n| n == name) {
            return Ok(name.to_string());
        }
        info!(
            "节点 {} 不存在或处于 NotReady 状态，改为按标签选择",
            name
        );
    }

    let nodes = cluster.list_killable_nodes(label_selector).await?;
    if nodes.is_empty() {
        return Err(ScenarioError::Selection(format!(
            "没有匹配标签选择器 {:?} 的 Ready 节点",
            label_selector.unwrap_or_default()
        )));
    }

    info!("匹配标签选择器 {:?} 的 Ready 节点: {:?}", label_selector, nodes);
    let node = nodes[rng.gen_range(0..nodes.len())].clone();
    Ok(node)
}
