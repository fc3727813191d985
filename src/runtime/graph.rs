/// Execution graph of a loaded workflow
///
/// Built from the document's `ExecutionGraph` element. Top-level nodes live in
/// a petgraph `DiGraph` with parent -> child edges; iteration follows insertion
/// order, which is the order the nodes appear in the document. Structural
/// nodes (If, While, Switch) keep their nested branches as plain node lists.

use crate::document::schema::{ATTR_ID, NS};
use crate::document::Element;
use anyhow::{anyhow, Result};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// A node of the execution graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: i32,
    pub parent_id: i32,
    pub kind: NodeKind,
}

/// Closed set of node shapes understood by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Plain task node; `id` refers to a task of the workflow
    Task,
    If {
        /// Task whose outcome selects the branch
        condition: i32,
        do_nodes: Vec<GraphNode>,
        else_nodes: Vec<GraphNode>,
    },
    While {
        condition: i32,
        nodes: Vec<GraphNode>,
    },
    Switch {
        /// Task whose result selects the case
        selector: i32,
        cases: Vec<SwitchCase>,
        default: Vec<GraphNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCase {
    pub value: String,
    pub nodes: Vec<GraphNode>,
}

/// Top-level execution graph of one workflow
#[derive(Debug, Clone, Default)]
pub struct ExecutionGraph {
    graph: DiGraph<GraphNode, ()>,
    node_id_to_index: HashMap<i32, NodeIndex>,
}

impl ExecutionGraph {
    /// Build the graph from an optional `ExecutionGraph` element
    ///
    /// A missing element yields an empty graph.
    pub fn from_element(element: Option<&Element>) -> Result<Self> {
        match element {
            Some(element) => Self::from_nodes(parse_nodes(element)?),
            None => Ok(Self::default()),
        }
    }

    /// Build the graph from top-level nodes, rejecting duplicate ids and cycles
    pub fn from_nodes(nodes: Vec<GraphNode>) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut node_id_to_index = HashMap::new();

        for node in nodes {
            let id = node.id;
            let index = graph.add_node(node);
            if node_id_to_index.insert(id, index).is_some() {
                return Err(anyhow!("Execution graph contains node {} more than once", id));
            }
        }

        let edges: Vec<(NodeIndex, NodeIndex)> = graph
            .node_indices()
            .filter_map(|index| {
                let parent = node_id_to_index.get(&graph[index].parent_id)?;
                Some((*parent, index))
            })
            .collect();
        for (parent, child) in edges {
            graph.add_edge(parent, child, ());
        }

        if is_cyclic_directed(&graph) {
            return Err(anyhow!("Execution graph contains a cycle"));
        }

        Ok(Self {
            graph,
            node_id_to_index,
        })
    }

    /// Top-level nodes in document order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    pub fn node(&self, id: i32) -> Option<&GraphNode> {
        self.node_id_to_index.get(&id).map(|index| &self.graph[*index])
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

fn parse_nodes(container: &Element) -> Result<Vec<GraphNode>> {
    let mut nodes = Vec::new();
    for element in container.elements() {
        if element.namespace() != NS {
            continue;
        }
        let node = match element.local_name() {
            "Task" => parse_task(element)?,
            "If" => GraphNode {
                id: int_attribute(element, ATTR_ID)?,
                parent_id: int_attribute(element, "parent")?,
                kind: NodeKind::If {
                    condition: int_attribute(element, "if")?,
                    do_nodes: branch(element, "Do")?,
                    else_nodes: branch(element, "Else")?,
                },
            },
            "While" => GraphNode {
                id: int_attribute(element, ATTR_ID)?,
                parent_id: int_attribute(element, "parent")?,
                kind: NodeKind::While {
                    condition: int_attribute(element, "while")?,
                    nodes: parse_nodes(element)?,
                },
            },
            "Switch" => GraphNode {
                id: int_attribute(element, ATTR_ID)?,
                parent_id: int_attribute(element, "parent")?,
                kind: NodeKind::Switch {
                    selector: int_attribute(element, "switch")?,
                    cases: element
                        .children_named(NS, "Case")
                        .map(|case| {
                            Ok(SwitchCase {
                                value: case.attribute("value").unwrap_or_default().to_string(),
                                nodes: parse_nodes(case)?,
                            })
                        })
                        .collect::<Result<_>>()?,
                    default: branch(element, "Default")?,
                },
            },
            other => {
                tracing::debug!("Ignoring execution graph element <{}>", other);
                continue;
            }
        };
        nodes.push(node);
    }
    Ok(nodes)
}

fn parse_task(element: &Element) -> Result<GraphNode> {
    let id = int_attribute(element, ATTR_ID)?;
    let parent = element
        .child(NS, "Parent")
        .ok_or_else(|| anyhow!("Execution graph task {} has no Parent", id))?;
    Ok(GraphNode {
        id,
        parent_id: int_attribute(parent, ATTR_ID)?,
        kind: NodeKind::Task,
    })
}

fn branch(element: &Element, name: &str) -> Result<Vec<GraphNode>> {
    match element.child(NS, name) {
        Some(branch) => parse_nodes(branch),
        None => Ok(Vec::new()),
    }
}

fn int_attribute(element: &Element, name: &str) -> Result<i32> {
    let text = element
        .attribute(name)
        .ok_or_else(|| anyhow!("<{}> is missing attribute '{}'", element.local_name(), name))?;
    text.trim()
        .parse()
        .map_err(|_| anyhow!("<{}> has invalid {} '{}'", element.local_name(), name, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::reader;

    fn graph(xml: &str) -> Result<ExecutionGraph> {
        let doc = reader::parse(xml).unwrap();
        ExecutionGraph::from_element(doc.root().child(NS, "ExecutionGraph"))
    }

    #[test]
    fn parses_structural_nodes_in_document_order() {
        let graph = graph(
            r#"<Workflow xmlns="urn:wexflow-schema"><ExecutionGraph>
                <Task id="1"><Parent id="-1"/></Task>
                <If id="100" parent="1" if="2">
                  <Do><Task id="3"><Parent id="-1"/></Task></Do>
                  <Else><Task id="4"><Parent id="-1"/></Task></Else>
                </If>
                <While id="101" parent="100" while="5"><Task id="6"><Parent id="-1"/></Task></While>
                <Switch id="102" parent="101" switch="7">
                  <Case value="a"><Task id="8"><Parent id="-1"/></Task></Case>
                  <Default/>
                </Switch>
            </ExecutionGraph></Workflow>"#,
        )
        .unwrap();

        let ids: Vec<_> = graph.nodes().map(|node| node.id).collect();
        assert_eq!(ids, [1, 100, 101, 102]);

        match &graph.node(100).unwrap().kind {
            NodeKind::If { condition, do_nodes, else_nodes } => {
                assert_eq!(*condition, 2);
                assert_eq!(do_nodes[0].id, 3);
                assert_eq!(else_nodes[0].id, 4);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        match &graph.node(102).unwrap().kind {
            NodeKind::Switch { cases, default, .. } => {
                assert_eq!(cases[0].value, "a");
                assert!(default.is_empty());
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn missing_graph_is_empty() {
        let graph = graph(r#"<Workflow xmlns="urn:wexflow-schema"/>"#).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn rejects_cycles_and_duplicates() {
        let cyclic = vec![
            GraphNode { id: 1, parent_id: 2, kind: NodeKind::Task },
            GraphNode { id: 2, parent_id: 1, kind: NodeKind::Task },
        ];
        assert!(ExecutionGraph::from_nodes(cyclic).is_err());

        let duplicated = vec![
            GraphNode { id: 1, parent_id: -1, kind: NodeKind::Task },
            GraphNode { id: 1, parent_id: -1, kind: NodeKind::Task },
        ];
        assert!(ExecutionGraph::from_nodes(duplicated).is_err());
    }
}
