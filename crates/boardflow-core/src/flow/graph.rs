//! Canvas model and the graph ↔ rule converters.
//!
//! The node-graph is a derived editor view, never persisted. Each rule
//! maps to one simple path: trigger → conditions → actions. The forward
//! conversion is deterministic and lossless; the reverse walk rejects
//! branching and cycles with typed errors instead of guessing an edge.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GraphError;
use crate::flow::action::FlowAction;
use crate::flow::condition::FlowCondition;
use crate::flow::rule::{FlowRule, RuleDraft};
use crate::flow::trigger::FlowTrigger;

/// Horizontal distance between rule columns
const COLUMN_SPACING: f64 = 320.0;
/// Vertical distance between consecutive chain nodes
const ROW_SPACING: f64 = 140.0;

/// What a canvas node represents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Condition,
    Action,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Condition => "condition",
            NodeKind::Action => "action",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Payload a node carries, enough to rebuild the rule without the graph.
///
/// The trigger node holds the rule's head fields; condition and action
/// nodes own their respective component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    Trigger {
        rule_id: String,
        rule_name: String,
        description: Option<String>,
        is_active: bool,
        trigger: FlowTrigger,
    },
    Condition {
        rule_id: String,
        condition: FlowCondition,
    },
    Action {
        rule_id: String,
        action: FlowAction,
    },
}

impl NodeData {
    pub fn rule_id(&self) -> &str {
        match self {
            NodeData::Trigger { rule_id, .. } => rule_id,
            NodeData::Condition { rule_id, .. } => rule_id,
            NodeData::Action { rule_id, .. } => rule_id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Trigger { .. } => NodeKind::Trigger,
            NodeData::Condition { .. } => NodeKind::Condition,
            NodeData::Action { .. } => NodeKind::Action,
        }
    }
}

/// One node on the canvas
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowNode {
    pub id: String,
    pub kind: NodeKind,
    pub position: Position,
    pub data: NodeData,
}

/// A directed connection between two nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// The editor's node/edge set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

/// Which source → target kinds a user may connect
pub fn connection_allowed(source: NodeKind, target: NodeKind) -> bool {
    matches!(
        (source, target),
        (NodeKind::Trigger, NodeKind::Condition)
            | (NodeKind::Trigger, NodeKind::Action)
            | (NodeKind::Condition, NodeKind::Action)
            | (NodeKind::Action, NodeKind::Action)
    )
}

impl FlowGraph {
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Add a user-drawn connection after validating it.
    ///
    /// Rejected connections leave the edge set untouched: unknown
    /// endpoints, self loops, cross-rule links, illegal kind pairs, and
    /// duplicates all return the typed error.
    pub fn connect(&mut self, source_id: &str, target_id: &str) -> Result<(), GraphError> {
        let source = self
            .node(source_id)
            .ok_or_else(|| GraphError::UnknownNode(source_id.to_string()))?;
        let target = self
            .node(target_id)
            .ok_or_else(|| GraphError::UnknownNode(target_id.to_string()))?;

        if source_id == target_id {
            return Err(GraphError::SelfLoop);
        }
        if source.data.rule_id() != target.data.rule_id() {
            return Err(GraphError::CrossRule);
        }
        if !connection_allowed(source.kind, target.kind) {
            return Err(GraphError::EdgeNotAllowed {
                from: source.kind,
                to: target.kind,
            });
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == source_id && e.target == target_id)
        {
            return Err(GraphError::DuplicateEdge {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
            });
        }

        self.edges.push(FlowEdge {
            id: format!("edge-{source_id}-{target_id}"),
            source: source_id.to_string(),
            target: target_id.to_string(),
        });
        Ok(())
    }
}

/// Project rules onto the canvas, one rule per column.
///
/// Node ids follow `trigger-{rule}`, `condition-{rule}-{condition}`,
/// `action-{rule}-{action}`; actions appear in execution order. Same
/// input always yields the same nodes, positions, and edges.
pub fn rules_to_graph(rules: &[FlowRule]) -> FlowGraph {
    let mut graph = FlowGraph::default();

    for (column, rule) in rules.iter().enumerate() {
        let x = column as f64 * COLUMN_SPACING;
        let mut row = 0usize;
        let mut previous_id: Option<String> = None;

        let place = |graph: &mut FlowGraph,
                         row: &mut usize,
                         previous_id: &mut Option<String>,
                         id: String,
                         data: NodeData| {
            graph.nodes.push(FlowNode {
                id: id.clone(),
                kind: data.kind(),
                position: Position {
                    x,
                    y: *row as f64 * ROW_SPACING,
                },
                data,
            });
            if let Some(previous) = previous_id.take() {
                graph.edges.push(FlowEdge {
                    id: format!("edge-{previous}-{id}"),
                    source: previous,
                    target: id.clone(),
                });
            }
            *previous_id = Some(id);
            *row += 1;
        };

        place(
            &mut graph,
            &mut row,
            &mut previous_id,
            format!("trigger-{}", rule.id),
            NodeData::Trigger {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                description: rule.description.clone(),
                is_active: rule.is_active,
                trigger: rule.trigger.clone(),
            },
        );

        for condition in &rule.conditions {
            place(
                &mut graph,
                &mut row,
                &mut previous_id,
                format!("condition-{}-{}", rule.id, condition.id),
                NodeData::Condition {
                    rule_id: rule.id.clone(),
                    condition: condition.clone(),
                },
            );
        }

        for action in rule.actions_in_order() {
            place(
                &mut graph,
                &mut row,
                &mut previous_id,
                format!("action-{}-{}", rule.id, action.id),
                NodeData::Action {
                    rule_id: rule.id.clone(),
                    action: action.clone(),
                },
            );
        }
    }

    graph
}

/// Rebuild one rule from its canvas nodes and edges.
///
/// Walks the single path from the trigger node, collecting conditions
/// and actions and renumbering action `order` 0,1,2,… by visitation, so
/// persisted order always derives from edge topology. Nodes unreachable
/// from the trigger are dropped. Branching and cycles are rejected.
pub fn graph_to_rule(
    graph: &FlowGraph,
    rule_id: &str,
    existing: Option<&FlowRule>,
) -> Result<RuleDraft, GraphError> {
    let nodes: HashMap<&str, &FlowNode> = graph
        .nodes
        .iter()
        .filter(|n| n.data.rule_id() == rule_id)
        .map(|n| (n.id.as_str(), n))
        .collect();

    let trigger_nodes: Vec<&&FlowNode> =
        nodes.values().filter(|n| n.kind == NodeKind::Trigger).collect();
    let trigger_node = match trigger_nodes.as_slice() {
        [] => return Err(GraphError::MissingTrigger),
        [only] => **only,
        many => return Err(GraphError::MultipleTriggers(many.len())),
    };

    // One outgoing edge per node along the valid chain; more is a
    // branching canvas the user must resolve, not a guess to make.
    let mut successors: HashMap<&str, &str> = HashMap::new();
    let mut outgoing: HashMap<&str, usize> = HashMap::new();
    for edge in &graph.edges {
        if !nodes.contains_key(edge.source.as_str()) {
            continue;
        }
        if !nodes.contains_key(edge.target.as_str()) {
            // dangling reference is an error, another rule's node is not ours
            if graph.node(&edge.target).is_some() {
                continue;
            }
            return Err(GraphError::UnknownNode(edge.target.clone()));
        }
        let count = outgoing.entry(edge.source.as_str()).or_insert(0);
        *count += 1;
        if *count > 1 {
            return Err(GraphError::Branching {
                node_id: edge.source.clone(),
                count: *count,
            });
        }
        successors.insert(edge.source.as_str(), edge.target.as_str());
    }

    let (rule_name, description, is_active, trigger) = match &trigger_node.data {
        NodeData::Trigger {
            rule_name,
            description,
            is_active,
            trigger,
            ..
        } => (rule_name.clone(), description.clone(), *is_active, trigger.clone()),
        _ => return Err(GraphError::MissingTrigger),
    };

    let mut conditions = Vec::new();
    let mut actions = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(trigger_node.id.as_str());

    let mut current = successors.get(trigger_node.id.as_str()).copied();
    while let Some(node_id) = current {
        if !visited.insert(node_id) {
            return Err(GraphError::Cycle {
                node_id: node_id.to_string(),
            });
        }
        let node = nodes
            .get(node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_string()))?;

        match &node.data {
            NodeData::Condition { condition, .. } => conditions.push(condition.clone()),
            NodeData::Action { action, .. } => {
                let mut action = action.clone();
                action.order = actions.len() as u32;
                actions.push(action);
            }
            NodeData::Trigger { .. } => return Err(GraphError::MultipleTriggers(2)),
        }

        current = successors.get(node_id).copied();
    }

    let dropped = nodes.len() - visited.len();
    if dropped > 0 {
        debug!(rule_id, dropped, "dropping nodes unreachable from the trigger");
    }

    Ok(RuleDraft {
        board_id: existing.map(|r| r.board_id.clone()),
        workspace_id: existing.map(|r| r.workspace_id.clone()),
        name: rule_name,
        description,
        is_active,
        trigger,
        conditions,
        actions,
    })
}
