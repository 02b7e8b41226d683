use serde::{Deserialize, Serialize};

use crate::ports::GraphView;

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDto {
    pub id: String,
    pub file: String,
    pub declared: bool,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct EdgeDto {
    pub from: String,
    pub to: String,
}

impl GraphDto {
    /// Nodes sorted by id, edges by (from, to).
    pub fn from_view(view: &GraphView<'_>) -> Self {
        let mut nodes: Vec<NodeDto> = view
            .graph
            .nodes
            .iter()
            .map(|n| NodeDto {
                id: n.id.clone(),
                file: view.file_of(&n.id),
                declared: n.is_declared(),
                status: format!("{:?}", view.status(&n.id)).to_lowercase(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<EdgeDto> = view
            .graph
            .edges()
            .map(|(from, to)| EdgeDto {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect();
        edges.sort();

        GraphDto { nodes, edges }
    }
}
