//! 프로세스 내부에서 흉내 내는 로컬 데모 클러스터.

use std::fmt;
use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};

use crate::application::ports::DemoSupervisor;
use crate::domain::demo::NodeSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Liveness {
    Live,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Active,
    Decommissioned,
}

#[derive(Debug, Clone, Copy)]
struct DemoNode {
    id: u32,
    liveness: Liveness,
    membership: Membership,
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Liveness::Live => "live",
            Liveness::Stopped => "stopped",
        })
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Membership::Active => "active",
            Membership::Decommissioned => "decommissioned",
        })
    }
}

/// 노드 상태표만 관리하는 데모 클러스터. 실제 프로세스는 띄우지 않는다.
pub struct LocalDemoCluster {
    nodes: Mutex<Vec<DemoNode>>,
}

impl LocalDemoCluster {
    /// 1..=count 번 노드를 모두 live/active 상태로 만든다.
    pub fn new(count: u32) -> Self {
        let nodes = (1..=count.max(1))
            .map(|id| DemoNode {
                id,
                liveness: Liveness::Live,
                membership: Membership::Active,
            })
            .collect();
        Self {
            nodes: Mutex::new(nodes),
        }
    }

    /// 선택된 노드 중 `eligible`을 만족하는 노드에 `change`를 적용한다.
    /// 단일 노드가 조건을 어기면 `reason`으로 실패하고, `*`는 해당 노드가 없을 때만 실패한다.
    fn transition(
        &self,
        selector: NodeSelector,
        action: &str,
        eligible: fn(&DemoNode) -> bool,
        reason: &str,
        change: fn(&mut DemoNode),
    ) -> Result<String> {
        let mut nodes = self
            .nodes
            .lock()
            .map_err(|_| anyhow!("demo cluster state is unavailable"))?;

        let touched: Vec<u32> = match selector {
            NodeSelector::Node(id) => {
                let node = nodes
                    .iter_mut()
                    .find(|n| n.id == id)
                    .ok_or_else(|| anyhow!("node {id} does not exist"))?;
                if !eligible(node) {
                    bail!("node {id} {reason}");
                }
                change(node);
                vec![id]
            }
            NodeSelector::All => {
                let mut ids = Vec::new();
                for node in nodes.iter_mut().filter(|n| eligible(n)) {
                    change(node);
                    ids.push(node.id);
                }
                if ids.is_empty() {
                    bail!("no node to {action}: every node {reason}");
                }
                ids
            }
        };

        tracing::info!(action, nodes = ?touched, "demo cluster changed");
        Ok(match touched.as_slice() {
            [id] => format!("node {id} {action} done"),
            ids => format!(
                "nodes {} {action} done",
                ids.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
    }
}

impl DemoSupervisor for LocalDemoCluster {
    fn shutdown(&self, node: NodeSelector) -> Result<String> {
        self.transition(
            node,
            "shutdown",
            |n| n.liveness == Liveness::Live,
            "is already stopped",
            |n| n.liveness = Liveness::Stopped,
        )
    }

    fn restart(&self, node: NodeSelector) -> Result<String> {
        self.transition(
            node,
            "restart",
            |n| n.liveness == Liveness::Stopped,
            "is already running",
            |n| n.liveness = Liveness::Live,
        )
    }

    fn decommission(&self, node: NodeSelector) -> Result<String> {
        self.transition(
            node,
            "decommission",
            |n| n.membership == Membership::Active,
            "is already decommissioned",
            |n| n.membership = Membership::Decommissioned,
        )
    }

    fn recommission(&self, node: NodeSelector) -> Result<String> {
        self.transition(
            node,
            "recommission",
            |n| n.membership == Membership::Decommissioned,
            "is not decommissioned",
            |n| n.membership = Membership::Active,
        )
    }

    fn list(&self) -> Result<String> {
        let nodes = self
            .nodes
            .lock()
            .map_err(|_| anyhow!("demo cluster state is unavailable"))?;
        Ok(nodes
            .iter()
            .map(|n| format!("node {:<3} {:<8} {}", n.id, n.liveness, n.membership))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
