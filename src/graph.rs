//! Plan graph arena
//!
//! Nodes and edges live in vectors owned by [`Graph`] and are addressed by
//! [`NodeId`]/[`EdgeId`] handles. An edge is a directed single-producer,
//! single-consumer connection: its producer is fixed when the edge is
//! allocated and its consumer is set exactly once. Edges whose consumer is
//! still unset are terminal and are the candidate outputs of a compiled
//! statement.
//!
//! The graph performs no cycle detection. The compiler only builds forward
//! (sources → merges → calls → outputs), so the result is a DAG by
//! construction.

use crate::ast::ValueType;
use crate::node::PlanNode;

/// Handle to a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Handle to an edge in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(usize);

impl EdgeId {
    /// Position of the edge in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A directed data-flow connection between two nodes
#[derive(Debug, Clone)]
pub struct Edge {
    producer: NodeId,
    consumer: Option<NodeId>,
    value_type: Option<ValueType>,
}

impl Edge {
    /// The node writing to this edge
    pub fn producer(&self) -> NodeId {
        self.producer
    }

    /// The node reading from this edge, once wired
    pub fn consumer(&self) -> Option<NodeId> {
        self.consumer
    }

    /// Inferred value type flowing over this edge, if known
    pub fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    /// A terminal edge has no consumer yet
    pub fn is_terminal(&self) -> bool {
        self.consumer.is_none()
    }
}

/// Arena holding the plan's nodes and edges
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<PlanNode>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the arena
    pub fn insert(&mut self, node: PlanNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Allocate an edge produced by `producer` with no consumer yet
    pub fn new_edge(&mut self, producer: NodeId) -> EdgeId {
        self.new_typed_edge(producer, None)
    }

    /// Allocate an edge produced by `producer` carrying a value type tag
    pub fn new_typed_edge(&mut self, producer: NodeId, value_type: Option<ValueType>) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            producer,
            consumer: None,
            value_type,
        });
        id
    }

    /// Wire `consumer` to an edge. The consumer is set exactly once;
    /// wiring an already-consumed edge is a bug in the caller.
    pub fn connect(&mut self, edge: EdgeId, consumer: NodeId) {
        let slot = &mut self.edges[edge.0].consumer;
        assert!(slot.is_none(), "edge {} already has a consumer", edge);
        *slot = Some(consumer);
    }

    /// Allocate an edge from `from` to `to` and wire both ends atomically
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        let edge = self.new_edge(from);
        self.connect(edge, to);
        edge
    }

    /// Consume a terminal edge with `node` and return a fresh pass-through
    /// edge produced by `node`, carrying the same value type. Used to sit a
    /// node between an existing producer and the statement outputs.
    pub fn splice(&mut self, edge: EdgeId, node: NodeId) -> EdgeId {
        let value_type = self.edges[edge.0].value_type;
        self.connect(edge, node);
        self.new_typed_edge(node, value_type)
    }

    /// Record the value type flowing over an edge
    pub fn set_value_type(&mut self, edge: EdgeId, value_type: Option<ValueType>) {
        self.edges[edge.0].value_type = value_type;
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> &PlanNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut PlanNode {
        &mut self.nodes[id.0]
    }

    /// Look up an edge
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    /// Edges consumed by `node`, in creation order. For a merge this is
    /// statement source order.
    pub fn inputs(&self, node: NodeId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.consumer == Some(node))
            .map(|(i, _)| EdgeId(i))
            .collect()
    }

    /// Edges produced by `node`, in creation order
    pub fn outputs(&self, node: NodeId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.producer == node)
            .map(|(i, _)| EdgeId(i))
            .collect()
    }

    /// Number of nodes in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the arena
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate nodes with their handles
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PlanNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Render the graph as one line per edge, for diagnostics
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (i, edge) in self.edges.iter().enumerate() {
            let producer = &self.nodes[edge.producer.0];
            let consumer = match edge.consumer {
                Some(c) => format!("{} {}", c, self.nodes[c.0]),
                None => "(terminal)".to_string(),
            };
            let ty = match edge.value_type {
                Some(t) => format!(" [{}]", t),
                None => String::new(),
            };
            out.push_str(&format!(
                "e{}: {} {} -> {}{}\n",
                i, edge.producer, producer, consumer, ty
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Measurement;

    fn reader(graph: &mut Graph, name: &str) -> NodeId {
        graph.insert(PlanNode::IteratorCreator {
            measurement: Measurement::new(name),
            field: None,
        })
    }

    #[test]
    fn test_new_edge_is_terminal() {
        let mut graph = Graph::new();
        let node = reader(&mut graph, "cpu");
        let edge = graph.new_edge(node);

        assert_eq!(graph.edge(edge).producer(), node);
        assert!(graph.edge(edge).is_terminal());
    }

    #[test]
    fn test_add_edge_wires_both_ends() {
        let mut graph = Graph::new();
        let from = reader(&mut graph, "cpu");
        let to = graph.insert(PlanNode::Merge);
        let edge = graph.add_edge(from, to);

        assert_eq!(graph.edge(edge).producer(), from);
        assert_eq!(graph.edge(edge).consumer(), Some(to));
        assert!(!graph.edge(edge).is_terminal());
    }

    #[test]
    #[should_panic(expected = "already has a consumer")]
    fn test_connect_rejects_second_consumer() {
        let mut graph = Graph::new();
        let from = reader(&mut graph, "cpu");
        let merge = graph.insert(PlanNode::Merge);
        let other = graph.insert(PlanNode::Merge);

        let edge = graph.add_edge(from, merge);
        graph.connect(edge, other);
    }

    #[test]
    fn test_inputs_preserve_creation_order() {
        let mut graph = Graph::new();
        let merge = graph.insert(PlanNode::Merge);
        let a = reader(&mut graph, "cpu");
        let b = reader(&mut graph, "gpu");

        let ea = graph.add_edge(a, merge);
        let eb = graph.add_edge(b, merge);

        assert_eq!(graph.inputs(merge), vec![ea, eb]);
        assert_eq!(graph.outputs(a), vec![ea]);
    }

    #[test]
    fn test_splice_preserves_value_type() {
        let mut graph = Graph::new();
        let from = reader(&mut graph, "cpu");
        let edge = graph.new_typed_edge(from, Some(ValueType::Float));

        let aux = graph.insert(PlanNode::AuxiliaryFields { fields: Vec::new() });
        let spliced = graph.splice(edge, aux);

        assert_eq!(graph.edge(edge).consumer(), Some(aux));
        assert_eq!(graph.edge(spliced).producer(), aux);
        assert!(graph.edge(spliced).is_terminal());
        assert_eq!(graph.edge(spliced).value_type(), Some(ValueType::Float));
    }

    #[test]
    fn test_describe_lists_every_edge() {
        let mut graph = Graph::new();
        let from = reader(&mut graph, "cpu");
        let merge = graph.insert(PlanNode::Merge);
        graph.add_edge(from, merge);
        graph.new_edge(merge);

        let rendered = graph.describe();
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.contains("(terminal)"));
    }
}
