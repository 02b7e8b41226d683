// Infrastructure implementations for pli-impact.

pub mod change_detector;
pub mod concurrency;
pub mod diff;
pub mod project_loader;
pub mod reviewer;

use rayon::prelude::*;
use std::fmt::Write as _;
use tracing::{debug, info};

use crate::api::dto::GraphDto;
use crate::domain::callgraph::{CallGraph, ProcToFile};
use crate::domain::extract::{extract, Procedure};
use crate::domain::snapshot::SourceFile;
use crate::error::Result;
use crate::ports::{CallGraphBuilder, GraphExporter, GraphView};

pub use change_detector::ContentHashDetector;
pub use project_loader::{LoadWarning, LoadedSnapshot, ProjectLoader};

/// Builds a call graph from lexical procedure extraction.
///
/// Extraction runs per file on the rayon pool; results are collected in input
/// order and merged on the calling thread, so the graph does not depend on
/// which worker finishes first.
pub struct LexicalCallGraphBuilder;

impl CallGraphBuilder for LexicalCallGraphBuilder {
    fn build_call_graph(&self, sources: &[SourceFile]) -> (CallGraph, ProcToFile) {
        let extracted: Vec<(&str, Vec<Procedure>)> = sources
            .par_iter()
            .map(|file| (file.path.as_str(), extract(&file.text)))
            .collect();

        let mut graph = CallGraph::new();

        // First pass: every declaration becomes a node, call-free or not
        for (path, procedures) in &extracted {
            for procedure in procedures {
                if !graph.declare(&procedure.name, path) {
                    debug!(
                        procedure = %procedure.name,
                        file = %path,
                        kept = graph.node(&procedure.name).and_then(|n| n.file.as_deref()).unwrap_or(""),
                        "duplicate declaration; keeping first file"
                    );
                }
            }
        }

        // Second pass: edges, creating undeclared callees as needed
        for (_, procedures) in &extracted {
            for procedure in procedures {
                for callee in &procedure.calls {
                    graph.add_edge(&procedure.name, callee);
                }
            }
        }

        info!(
            files = sources.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built call graph"
        );

        let proc_to_file = graph.proc_to_file();
        (graph, proc_to_file)
    }
}

/// Writes the graph as pretty-printed [`GraphDto`] JSON.
pub struct JsonExporter;

impl GraphExporter for JsonExporter {
    fn render(&self, view: &GraphView<'_>) -> Result<String> {
        let dto = GraphDto::from_view(view);
        Ok(serde_json::to_string_pretty(&dto)?)
    }
}

/// One line per procedure: `NAME [file] -> CALLEE, ...`.
pub struct TextExporter;

impl GraphExporter for TextExporter {
    fn render(&self, view: &GraphView<'_>) -> Result<String> {
        let mut out = String::new();
        for node in &view.graph.nodes {
            let _ = write!(out, "{} [{}]", node.id, view.file_of(&node.id));
            if !node.callees.is_empty() {
                let _ = write!(out, " -> {}", node.callees.join(", "));
            }
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn build(files: &[(&str, &str)]) -> (CallGraph, ProcToFile) {
        let sources: Vec<SourceFile> = files
            .iter()
            .map(|(path, text)| SourceFile::new(*path, *text))
            .collect();
        LexicalCallGraphBuilder.build_call_graph(&sources)
    }

    const FILE_A: (&str, &str) = ("a.pli", "FOO: PROC;\n CALL BAR;\nEND;\n");
    const FILE_B: (&str, &str) = ("b.pli", "BAR: PROC;\n X = 1;\nEND;\n");

    #[test]
    fn test_two_pass_independent_of_order() {
        for files in [[FILE_A, FILE_B], [FILE_B, FILE_A]] {
            let (graph, proc_to_file) = build(&files);
            let nodes: BTreeSet<String> = ["BAR", "FOO"].iter().map(|s| s.to_string()).collect();
            let edges: BTreeSet<(String, String)> =
                [("FOO".to_string(), "BAR".to_string())].into_iter().collect();
            assert_eq!(graph.node_set(), nodes);
            assert_eq!(graph.edge_set(), edges);
            assert_eq!(proc_to_file["FOO"], "a.pli");
            assert_eq!(proc_to_file["BAR"], "b.pli");
        }
    }

    #[test]
    fn test_dangling_callee_has_no_out_edges() {
        let (graph, proc_to_file) = build(&[("a.pli", "FOO: PROC;\n CALL UNDECLARED;\n")]);
        let node = graph.node("UNDECLARED").unwrap();
        assert!(node.callees.is_empty());
        assert!(!proc_to_file.contains_key("UNDECLARED"));
    }

    #[test]
    fn test_isolated_procedure_is_a_node() {
        let (graph, _) = build(&[("a.pli", "LONELY: PROC;\n X = 1;\n")]);
        assert!(graph.contains("LONELY"));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_first_declaration_wins() {
        let (_, proc_to_file) = build(&[
            ("one.pli", "DUP: PROC;\n CALL X;\n"),
            ("two.pli", "DUP: PROC;\n CALL Y;\n"),
        ]);
        assert_eq!(proc_to_file["DUP"], "one.pli");
    }

    #[test]
    fn test_colliding_names_merge_edges() {
        let (graph, _) = build(&[
            ("one.pli", "DUP: PROC;\n CALL X;\n"),
            ("two.pli", "DUP: PROC;\n CALL Y;\n"),
        ]);
        assert_eq!(graph.callees("DUP"), ["X".to_string(), "Y".to_string()]);
    }

    #[test]
    fn test_call_in_other_case_reaches_declaration() {
        let (graph, proc_to_file) = build(&[
            ("MAIN.pli", "MAIN: PROC OPTIONS(MAIN);\n CALL calc;\nEND MAIN;\n"),
            ("calc.pli", "CALC: PROC;\n X = 1;\nEND CALC;\n"),
        ]);
        let nodes: BTreeSet<String> = ["CALC", "MAIN"].iter().map(|s| s.to_string()).collect();
        assert_eq!(graph.node_set(), nodes);
        assert_eq!(graph.callees("MAIN"), ["CALC".to_string()]);
        assert_eq!(proc_to_file["CALC"], "calc.pli");

        let impacted = crate::domain::impact::impacted_by(&graph, "CALC");
        assert!(impacted.contains("MAIN"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let files = [
            FILE_A,
            FILE_B,
            ("c.pli", "C1: PROC;\n CALL FOO; CALL C2;\nC2: PROC;\n CALL C1;\n"),
        ];
        let (first, first_map) = build(&files);
        let (second, second_map) = build(&files);
        assert_eq!(first.node_set(), second.node_set());
        assert_eq!(first.edge_set(), second.edge_set());
        assert_eq!(first_map, second_map);
    }

    #[test]
    fn test_text_exporter() {
        let (graph, proc_to_file) = build(&[FILE_A, FILE_B]);
        let view = GraphView::plain(&graph, &proc_to_file, "pli");
        let text = TextExporter.render(&view).unwrap();
        assert!(text.contains("FOO [a.pli] -> BAR\n"));
        assert!(text.contains("BAR [b.pli]\n"));
    }

    #[test]
    fn test_json_exporter() {
        let (graph, proc_to_file) = build(&[FILE_A, FILE_B]);
        let view = GraphView::plain(&graph, &proc_to_file, "pli");
        let json = JsonExporter.render(&view).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["edges"][0]["from"], "FOO");
        assert_eq!(value["edges"][0]["to"], "BAR");
    }
}
