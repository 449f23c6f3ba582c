//! The knowledge graph: nodes and the links between them.
//!
//! Nodes live in a `StableDiGraph` so indices survive deletions while the
//! layout library still holds references. An id → index map gives O(1)
//! lookup by the backend identifier.

use crate::id::EntityId;
use crate::model::{GroupKey, Node, Point};
use crate::wire::{NodePatch, WireLink};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    graph: StableDiGraph<Node, ()>,
    index: HashMap<EntityId, NodeIndex>,
}

/// Node/link payload handed to the force-layout library.
#[derive(Debug, Clone, Serialize)]
pub struct GraphData<'a> {
    pub nodes: Vec<&'a Node>,
    pub links: Vec<WireLink>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every node and link. Links to unknown nodes are dropped.
    pub fn set_all(&mut self, nodes: Vec<Node>, links: &[WireLink]) {
        self.graph.clear();
        self.index.clear();
        for node in nodes {
            self.insert(node);
        }
        for link in links {
            if !self.link(link.source, link.target) {
                log::debug!("dropping dangling link {} -> {}", link.source, link.target);
            }
        }
    }

    /// Insert or replace a node.
    pub fn insert(&mut self, node: Node) {
        match self.index.get(&node.id) {
            Some(&idx) => self.graph[idx] = node,
            None => {
                let id = node.id;
                let idx = self.graph.add_node(node);
                self.index.insert(id, idx);
            }
        }
    }

    /// Add a link between two existing nodes.
    pub fn link(&mut self, source: EntityId, target: EntityId) -> bool {
        match (self.index.get(&source), self.index.get(&target)) {
            (Some(&a), Some(&b)) => {
                self.graph.update_edge(a, b, ());
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Node> {
        self.index.get(&id).map(|&idx| &self.graph[idx])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Node> {
        let idx = *self.index.get(&id)?;
        self.graph.node_weight_mut(idx)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn set_position(&mut self, id: EntityId, p: Point) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.set_position(p);
                true
            }
            None => false,
        }
    }

    pub fn update(&mut self, id: EntityId, patch: &NodePatch) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                patch.apply(node);
                true
            }
            None => false,
        }
    }

    /// Remove a node together with its incident links.
    pub fn remove(&mut self, id: EntityId) -> Option<Node> {
        let idx = self.index.remove(&id)?;
        self.graph.remove_node(idx)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    pub fn in_group(&self, group: GroupKey) -> impl Iterator<Item = &Node> {
        self.nodes().filter(move |n| n.group == group)
    }

    pub fn links(&self) -> Vec<WireLink> {
        self.graph
            .edge_references()
            .map(|e| WireLink {
                source: self.graph[e.source()].id,
                target: self.graph[e.target()].id,
            })
            .collect()
    }

    /// Nodes of `group` plus the links whose ends are both in it.
    pub fn graph_data(&self, group: GroupKey) -> GraphData<'_> {
        let nodes: Vec<&Node> = self.in_group(group).collect();
        let links = self
            .graph
            .edge_references()
            .filter(|e| {
                self.graph[e.source()].group == group && self.graph[e.target()].group == group
            })
            .map(|e| WireLink {
                source: self.graph[e.source()].id,
                target: self.graph[e.target()].id,
            })
            .collect();
        GraphData { nodes, links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f64, y: f64, group: GroupKey) -> Node {
        Node {
            id: EntityId::intern(id),
            x,
            y,
            title: id.to_string(),
            color: None,
            group,
        }
    }

    #[test]
    fn remove_drops_incident_links() {
        let mut g = KnowledgeGraph::new();
        g.set_all(
            vec![node("a", 0.0, 0.0, 0), node("b", 1.0, 1.0, 0), node("c", 2.0, 2.0, 0)],
            &[
                WireLink {
                    source: EntityId::intern("a"),
                    target: EntityId::intern("b"),
                },
                WireLink {
                    source: EntityId::intern("b"),
                    target: EntityId::intern("c"),
                },
            ],
        );
        assert_eq!(g.links().len(), 2);
        assert!(g.remove(EntityId::intern("b")).is_some());
        assert!(g.links().is_empty());
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn dangling_links_are_ignored() {
        let mut g = KnowledgeGraph::new();
        g.set_all(
            vec![node("solo", 0.0, 0.0, 0)],
            &[WireLink {
                source: EntityId::intern("solo"),
                target: EntityId::intern("ghost"),
            }],
        );
        assert!(g.links().is_empty());
    }

    #[test]
    fn graph_data_filters_by_group() {
        let mut g = KnowledgeGraph::new();
        g.set_all(
            vec![node("g1a", 0.0, 0.0, 1), node("g1b", 0.0, 0.0, 1), node("g2a", 0.0, 0.0, 2)],
            &[
                WireLink {
                    source: EntityId::intern("g1a"),
                    target: EntityId::intern("g1b"),
                },
                WireLink {
                    source: EntityId::intern("g1a"),
                    target: EntityId::intern("g2a"),
                },
            ],
        );
        let data = g.graph_data(1);
        assert_eq!(data.nodes.len(), 2);
        assert_eq!(data.links.len(), 1);
    }

    #[test]
    fn update_applies_patch() {
        let mut g = KnowledgeGraph::new();
        g.insert(node("n", 0.0, 0.0, 0));
        assert!(g.update(EntityId::intern("n"), &NodePatch::position(Point::new(5.0, 6.0))));
        assert_eq!(g.get(EntityId::intern("n")).unwrap().position(), Point::new(5.0, 6.0));
        assert!(!g.update(EntityId::intern("missing"), &NodePatch::default()));
    }
}
