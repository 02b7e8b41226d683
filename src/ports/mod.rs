use crate::domain::callgraph::{CallGraph, ProcToFile};
use crate::domain::snapshot::{Snapshot, SourceFile};

pub mod graph_exporter;

pub use graph_exporter::{GraphExporter, GraphView};

pub trait CallGraphBuilder {
    fn build_call_graph(&self, sources: &[SourceFile]) -> (CallGraph, ProcToFile);
}

/// Decides which file names differ between two snapshots.
pub trait ChangeDetector {
    /// Sorted basenames considered changed.
    fn detect_changes(&self, old: &Snapshot, new: &Snapshot) -> Vec<String>;
}

/// What a reviewer is asked about one (changed, impacted) file pair.
#[derive(Debug, Clone, Copy)]
pub struct ReviewRequest<'a> {
    pub changed_file: &'a str,
    pub changed_text: &'a str,
    pub impacted_file: &'a str,
    pub impacted_text: &'a str,
}

/// Free-text commentary on whether a change affects another file.
/// Implementations may be slow or fail; callers treat errors as non-fatal.
pub trait ImpactReviewer {
    fn review(&self, request: &ReviewRequest<'_>) -> anyhow::Result<String>;
}
