// Workflow graph model: the node graph that gets submitted to the
// generation server. Node inputs are either literal JSON values or
// references to another node's output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A reference to the Nth output of another node. On the wire this is the
/// two-element array `["<node id>", <output index>]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeRef(pub String, pub u32);

impl NodeRef {
    pub fn new(node_id: impl Into<String>, output_index: u32) -> Self {
        NodeRef(node_id.into(), output_index)
    }

    pub fn node_id(&self) -> &str {
        &self.0
    }

    pub fn output_index(&self) -> u32 {
        self.1
    }
}

/// Value bound to a node input.
///
/// Deserialization tries `Reference` first, so a literal that happens to be
/// a `[string, non-negative integer]` pair reads back as a reference. The
/// server interprets such arrays the same way.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum InputValue {
    Reference(NodeRef),
    Literal(Value),
}

impl InputValue {
    pub fn as_reference(&self) -> Option<&NodeRef> {
        match self {
            InputValue::Reference(r) => Some(r),
            InputValue::Literal(_) => None,
        }
    }
}

impl From<NodeRef> for InputValue {
    fn from(r: NodeRef) -> Self {
        InputValue::Reference(r)
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Literal(Value::from(s))
    }
}

impl From<String> for InputValue {
    fn from(s: String) -> Self {
        InputValue::Literal(Value::from(s))
    }
}

impl From<i64> for InputValue {
    fn from(n: i64) -> Self {
        InputValue::Literal(Value::from(n))
    }
}

impl From<f64> for InputValue {
    fn from(n: f64) -> Self {
        InputValue::Literal(Value::from(n))
    }
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self {
        InputValue::Literal(Value::from(b))
    }
}

/// Display metadata, serialized under `_meta`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeMeta {
    pub title: String,
}

/// One node of the graph: the server-side class to run and its inputs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub class_type: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputValue>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<NodeMeta>,
}

impl NodeSpec {
    pub fn new(class_type: impl Into<String>) -> Self {
        NodeSpec {
            class_type: class_type.into(),
            inputs: BTreeMap::new(),
            meta: None,
        }
    }

    /// Builder-style helper to bind one input.
    pub fn input(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.meta = Some(NodeMeta { title: title.into() });
        self
    }

    /// References this node makes to other nodes' outputs.
    pub fn references(&self) -> impl Iterator<Item = &NodeRef> {
        self.inputs.values().filter_map(InputValue::as_reference)
    }
}

/// Mapping from node id to node. The graph is expected to be acyclic, but
/// neither that nor the existence of referenced nodes is checked here: the
/// server validates the graph and reports problems in `node_errors`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct WorkflowGraph(BTreeMap<String, NodeSpec>);

impl WorkflowGraph {
    pub fn new() -> Self {
        WorkflowGraph(BTreeMap::new())
    }

    /// Insert a node, returning the node previously stored under that id.
    pub fn insert(&mut self, id: impl Into<String>, node: NodeSpec) -> Option<NodeSpec> {
        self.0.insert(id.into(), node)
    }

    pub fn with_node(mut self, id: impl Into<String>, node: NodeSpec) -> Self {
        self.insert(id, node);
        self
    }

    pub fn get(&self, id: &str) -> Option<&NodeSpec> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NodeSpec)> {
        self.0.iter()
    }

    /// Load a graph from its JSON (API format) text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_node_graph() -> WorkflowGraph {
        WorkflowGraph::new()
            .with_node("1", NodeSpec::new("A").input("x", 1i64))
            .with_node(
                "2",
                NodeSpec::new("B")
                    .input("in", NodeRef::new("1", 0))
                    .title("Second"),
            )
    }

    #[test]
    fn serializes_to_api_format() {
        let value = serde_json::to_value(two_node_graph()).unwrap();
        assert_eq!(
            value,
            json!({
                "1": {"class_type": "A", "inputs": {"x": 1}},
                "2": {"class_type": "B", "inputs": {"in": ["1", 0]}, "_meta": {"title": "Second"}}
            })
        );
    }

    #[test]
    fn reads_references_and_literals() {
        let graph = WorkflowGraph::from_json(
            r#"{"7": {"class_type": "SaveImage",
                      "inputs": {"images": ["3", 1], "filename_prefix": "out", "tags": ["a", "b"]}}}"#,
        )
        .unwrap();
        let node = graph.get("7").unwrap();
        assert_eq!(node.inputs["images"], InputValue::Reference(NodeRef::new("3", 1)));
        assert_eq!(node.inputs["filename_prefix"], InputValue::from("out"));
        assert_eq!(node.inputs["tags"], InputValue::Literal(json!(["a", "b"])));
        assert!(node.meta.is_none());
    }

    #[test]
    fn negative_index_pair_stays_literal() {
        let graph =
            WorkflowGraph::from_json(r#"{"1": {"class_type": "A", "inputs": {"p": ["x", -1]}}}"#)
                .unwrap();
        assert_eq!(graph.get("1").unwrap().inputs["p"], InputValue::Literal(json!(["x", -1])));
    }

    #[test]
    fn json_round_trip_preserves_graph() {
        let graph = two_node_graph();
        let text = serde_json::to_string(&graph).unwrap();
        assert_eq!(WorkflowGraph::from_json(&text).unwrap(), graph);
    }

    #[test]
    fn lists_node_references() {
        let graph = two_node_graph();
        let refs: Vec<_> = graph.get("2").unwrap().references().collect();
        assert_eq!(refs, vec![&NodeRef::new("1", 0)]);
        assert_eq!(graph.get("1").unwrap().references().count(), 0);
    }
}
