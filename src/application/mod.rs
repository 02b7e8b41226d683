// Application layer: two-snapshot impact analysis orchestration.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::domain::callgraph::{owning_file_name, CallGraph, ProcToFile};
use crate::domain::impact::ImpactAnalyzer;
use crate::domain::snapshot::{file_stem, Snapshot};
use crate::infrastructure::project_loader::{LoadWarning, LoadedSnapshot, ProjectLoader};
use crate::ports::{CallGraphBuilder, ChangeDetector, GraphView};

/// Changed file name -> impacted file names.
pub type ImpactMap = BTreeMap<String, Vec<String>>;

/// One snapshot after loading and graph construction.
#[derive(Debug, Clone)]
pub struct SnapshotAnalysis {
    pub snapshot: Snapshot,
    pub graph: CallGraph,
    pub proc_to_file: ProcToFile,
    pub warnings: Vec<LoadWarning>,
}

impl SnapshotAnalysis {
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            files: self.snapshot.len(),
            procedures: self.graph.node_count(),
            calls: self.graph.edge_count(),
            dangling: self.graph.dangling().count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub files: usize,
    pub procedures: usize,
    pub calls: usize,
    pub dangling: usize,
}

/// Impact of one changed file's procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureImpact {
    pub changed_file: String,
    /// Node id in the new graph, or the file stem when no node matches.
    pub procedure: String,
    pub in_graph: bool,
    pub impacted: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactReport {
    pub changed_files: Vec<String>,
    pub procedures: Vec<ProcedureImpact>,
    pub impact_map: ImpactMap,
    pub warnings: Vec<LoadWarning>,
    pub old_stats: GraphStats,
    pub new_stats: GraphStats,
}

impl ImpactReport {
    /// Changed procedures that exist in the new graph.
    pub fn changed_procedures(&self) -> BTreeSet<String> {
        self.procedures
            .iter()
            .filter(|p| p.in_graph)
            .map(|p| p.procedure.clone())
            .collect()
    }

    /// Union of all impact sets.
    pub fn all_impacted(&self) -> BTreeSet<String> {
        self.procedures
            .iter()
            .flat_map(|p| p.impacted.iter().cloned())
            .collect()
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Old graph: {} files, {} procedures, {} calls",
            self.old_stats.files, self.old_stats.procedures, self.old_stats.calls
        );
        let _ = writeln!(
            out,
            "New graph: {} files, {} procedures, {} calls",
            self.new_stats.files, self.new_stats.procedures, self.new_stats.calls
        );

        for warning in &self.warnings {
            let _ = writeln!(out, "Skipped {}: {}", warning.path, warning.message);
        }

        if self.changed_files.is_empty() {
            out.push_str("No differences found between files.\n");
            return out;
        }

        let _ = writeln!(out, "Changed files: {}", self.changed_files.join(", "));
        for proc_impact in &self.procedures {
            let _ = writeln!(out, "\nImpacted by {}:", proc_impact.procedure);
            if !proc_impact.in_graph {
                out.push_str("  (not in new graph)\n");
            } else if proc_impact.impacted.is_empty() {
                out.push_str("  (no callers)\n");
            }
            for name in &proc_impact.impacted {
                let _ = writeln!(out, "  {}", name);
            }
        }

        out.push_str("\nFull Impact Map\n");
        for (changed, impacted) in &self.impact_map {
            let _ = writeln!(out, "  {} -> [{}]", changed, impacted.join(", "));
        }
        out
    }
}

/// Both analysed snapshots plus the report built from them.
#[derive(Debug, Clone)]
pub struct ImpactRun {
    pub old: SnapshotAnalysis,
    pub new: SnapshotAnalysis,
    pub report: ImpactReport,
}

impl ImpactRun {
    /// New-version graph with changed and impacted procedures highlighted.
    pub fn highlighted_view<'a>(&'a self, config: &'a AnalysisConfig) -> GraphView<'a> {
        GraphView {
            graph: &self.new.graph,
            proc_to_file: &self.new.proc_to_file,
            changed: self.report.changed_procedures(),
            impacted: self.report.all_impacted(),
            fallback_extension: &config.fallback_extension,
        }
    }
}

/// The main usecase: compare two snapshots and trace the impact of changes.
pub struct AnalyzeUsecase<'a> {
    pub callgraph_builder: &'a dyn CallGraphBuilder,
    pub change_detector: &'a dyn ChangeDetector,
    pub config: &'a AnalysisConfig,
}

impl<'a> AnalyzeUsecase<'a> {
    pub fn run(&self, old_dir: &Path, new_dir: &Path) -> Result<ImpactRun> {
        let old = self
            .analyze_folder(old_dir)
            .with_context(|| format!("Failed to analyze old version at {}", old_dir.display()))?;
        let new = self
            .analyze_folder(new_dir)
            .with_context(|| format!("Failed to analyze new version at {}", new_dir.display()))?;

        let report = self.assess(&old, &new);
        Ok(ImpactRun { old, new, report })
    }

    pub fn analyze_folder(&self, dir: &Path) -> Result<SnapshotAnalysis> {
        let loaded = ProjectLoader::load_folder(dir, self.config)?;
        Ok(self.analyze(loaded))
    }

    pub fn analyze(&self, loaded: LoadedSnapshot) -> SnapshotAnalysis {
        let (graph, proc_to_file) = self.callgraph_builder.build_call_graph(&loaded.snapshot.files);
        SnapshotAnalysis {
            snapshot: loaded.snapshot,
            graph,
            proc_to_file,
            warnings: loaded.warnings,
        }
    }

    /// Derive changed procedures from changed files and query them as one
    /// batch against the new graph.
    pub fn assess(&self, old: &SnapshotAnalysis, new: &SnapshotAnalysis) -> ImpactReport {
        let changed_files = self
            .change_detector
            .detect_changes(&old.snapshot, &new.snapshot);
        // Stem -> node id in the new graph; names match ignoring case
        let resolved: Vec<(&String, String, Option<&str>)> = changed_files
            .iter()
            .map(|file| {
                let derived = file_stem(file);
                let id = new.graph.node(&derived).map(|n| n.id.as_str());
                (file, derived, id)
            })
            .collect();
        let impact_sets = ImpactAnalyzer::new(&new.graph)
            .impact_all(resolved.iter().filter_map(|(_, _, id)| *id));

        let mut procedures = Vec::new();
        let mut impact_map = ImpactMap::new();

        for (changed_file, derived, id) in resolved {
            let (procedure, in_graph, impacted) = match id {
                Some(id) => (id.to_string(), true, impact_sets[id].clone()),
                None => (derived, false, BTreeSet::new()),
            };

            let impacted_files: BTreeSet<String> = impacted
                .iter()
                .map(|id| owning_file_name(&new.proc_to_file, id, &self.config.fallback_extension))
                .collect();
            impact_map.insert(changed_file.clone(), impacted_files.into_iter().collect());

            info!(
                file = %changed_file,
                procedure = %procedure,
                impacted = impacted.len(),
                "traced change"
            );
            procedures.push(ProcedureImpact {
                changed_file: changed_file.clone(),
                procedure,
                in_graph,
                impacted,
            });
        }

        let mut warnings = old.warnings.clone();
        warnings.extend(new.warnings.iter().cloned());

        ImpactReport {
            changed_files,
            procedures,
            impact_map,
            warnings,
            old_stats: old.stats(),
            new_stats: new.stats(),
        }
    }
}
