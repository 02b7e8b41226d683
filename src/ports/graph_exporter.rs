//! Graph DOT Exporter
//!
//! Renders a call graph as Graphviz DOT with impact highlighting: one box per
//! source file, procedures coloured by whether they changed or are impacted.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::callgraph::{owning_file_name, CallGraph, ProcToFile};
use crate::error::Result;

/// Everything a visualizer needs for one rendering.
#[derive(Debug, Clone)]
pub struct GraphView<'a> {
    pub graph: &'a CallGraph,
    pub proc_to_file: &'a ProcToFile,
    pub changed: BTreeSet<String>,
    pub impacted: BTreeSet<String>,
    pub fallback_extension: &'a str,
}

impl<'a> GraphView<'a> {
    /// Plain view with nothing highlighted.
    pub fn plain(graph: &'a CallGraph, proc_to_file: &'a ProcToFile, fallback_extension: &'a str) -> Self {
        Self {
            graph,
            proc_to_file,
            changed: BTreeSet::new(),
            impacted: BTreeSet::new(),
            fallback_extension,
        }
    }

    pub fn status(&self, id: &str) -> NodeStatus {
        if self.impacted.contains(id) {
            NodeStatus::Impacted
        } else if self.changed.contains(id) {
            NodeStatus::Changed
        } else {
            NodeStatus::Unchanged
        }
    }

    pub fn file_of(&self, id: &str) -> String {
        owning_file_name(self.proc_to_file, id, self.fallback_extension)
    }
}

/// Highlight class of a procedure node. Impacted takes precedence over
/// changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Changed,
    Impacted,
    Unchanged,
}

pub trait GraphExporter {
    fn render(&self, view: &GraphView<'_>) -> Result<String>;

    fn export(&self, view: &GraphView<'_>, path: &str) -> Result<()> {
        let content = self.render(view)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub struct DotExporter;

impl GraphExporter for DotExporter {
    fn render(&self, view: &GraphView<'_>) -> Result<String> {
        Ok(Self::to_dot(view))
    }
}

impl DotExporter {
    pub fn to_dot(view: &GraphView<'_>) -> String {
        let mut lines = Vec::new();

        lines.push("digraph Dependencies {".to_string());
        lines.push("    rankdir=LR;".to_string());
        lines.push("    node [fontname=\"Helvetica\", fontsize=12];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=10];".to_string());
        lines.push("".to_string());

        // File container nodes, then membership edges
        let mut members: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for node in &view.graph.nodes {
            members.entry(view.file_of(&node.id)).or_default().push(&node.id);
        }
        for file in members.keys() {
            lines.push(format!(
                "    \"file:{}\" [label=\"{}\", shape=box, style=\"filled\", fillcolor=\"{}\"];",
                Self::escape(file),
                Self::escape(file),
                FILE_COLOR
            ));
        }

        for node in &view.graph.nodes {
            let label = Self::escape(&node.id);
            lines.push(format!(
                "    \"{}\" [label=\"{}\", shape=ellipse, style=\"filled\", fillcolor=\"{}\"];",
                label,
                label,
                Self::fill_color(view.status(&node.id))
            ));
        }

        lines.push("".to_string());

        for (file, procs) in &members {
            for id in procs {
                lines.push(format!(
                    "    \"file:{}\" -> \"{}\" [style=dashed, arrowhead=none];",
                    Self::escape(file),
                    Self::escape(id)
                ));
            }
        }

        for (from, to) in view.graph.edges() {
            lines.push(format!(
                "    \"{}\" -> \"{}\";",
                Self::escape(from),
                Self::escape(to)
            ));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }

    fn fill_color(status: NodeStatus) -> &'static str {
        match status {
            NodeStatus::Changed => "#ff4b4b",  // Red
            NodeStatus::Impacted => "#ffa500", // Orange
            NodeStatus::Unchanged => "#97c2fc", // Blue
        }
    }

    fn escape(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}

const FILE_COLOR: &str = "#90ee90";

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (CallGraph, ProcToFile) {
        let mut graph = CallGraph::new();
        graph.declare("MAIN", "src/main.pli");
        graph.declare("CALC", "src/calc.pli");
        graph.add_edge("MAIN", "CALC");
        graph.add_edge("CALC", "EXTERN");
        let mut proc_to_file = ProcToFile::new();
        proc_to_file.insert("MAIN".to_string(), "src/main.pli".to_string());
        proc_to_file.insert("CALC".to_string(), "src/calc.pli".to_string());
        (graph, proc_to_file)
    }

    #[test]
    fn test_to_dot() {
        let (graph, proc_to_file) = sample();
        let view = GraphView::plain(&graph, &proc_to_file, "pli");

        let dot = DotExporter::to_dot(&view);
        assert!(dot.starts_with("digraph Dependencies {"));
        assert!(dot.contains("\"file:main.pli\""));
        assert!(dot.contains("\"file:calc.pli\""));
        assert!(dot.contains("\"file:EXTERN.pli\""));
        assert!(dot.contains("\"MAIN\" -> \"CALC\";"));
        assert!(dot.contains("\"file:calc.pli\" -> \"CALC\" [style=dashed"));
        assert!(!dot.contains("#ff4b4b"));
    }

    #[test]
    fn test_highlight_colors() {
        let (graph, proc_to_file) = sample();
        let mut view = GraphView::plain(&graph, &proc_to_file, "pli");
        view.changed.insert("CALC".to_string());
        view.impacted.insert("MAIN".to_string());

        assert_eq!(view.status("CALC"), NodeStatus::Changed);
        assert_eq!(view.status("MAIN"), NodeStatus::Impacted);
        assert_eq!(view.status("EXTERN"), NodeStatus::Unchanged);

        let dot = DotExporter::to_dot(&view);
        assert!(dot.contains("\"CALC\" [label=\"CALC\", shape=ellipse, style=\"filled\", fillcolor=\"#ff4b4b\"]"));
        assert!(dot.contains("\"MAIN\" [label=\"MAIN\", shape=ellipse, style=\"filled\", fillcolor=\"#ffa500\"]"));
    }

    #[test]
    fn test_changed_and_impacted_renders_as_impacted() {
        let (graph, proc_to_file) = sample();
        let mut view = GraphView::plain(&graph, &proc_to_file, "pli");
        view.changed.insert("MAIN".to_string());
        view.impacted.insert("MAIN".to_string());
        assert_eq!(view.status("MAIN"), NodeStatus::Impacted);
    }

    #[test]
    fn test_export_writes_file() {
        let (graph, proc_to_file) = sample();
        let view = GraphView::plain(&graph, &proc_to_file, "pli");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.dot");

        DotExporter.export(&view, path.to_str().unwrap()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("digraph Dependencies"));
    }
}
