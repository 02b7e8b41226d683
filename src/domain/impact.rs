//! Impact analysis (reverse call graph).
//!
//! A change to a procedure can affect every procedure that reaches it through
//! calls. The analyzer inverts the graph once and then answers each query
//! with a breadth-first walk over callers, so a query only touches the part
//! of the graph that can reach the target.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::domain::callgraph::CallGraph;

/// Changed procedure -> everything that transitively calls it.
pub type ImpactSets = BTreeMap<String, BTreeSet<String>>;

/// Reverse-adjacency view over a [`CallGraph`].
pub struct ImpactAnalyzer<'g> {
    graph: &'g CallGraph,
    callers: HashMap<&'g str, Vec<&'g str>>,
}

impl<'g> ImpactAnalyzer<'g> {
    pub fn new(graph: &'g CallGraph) -> Self {
        let mut callers: HashMap<&str, Vec<&str>> = HashMap::new();
        for (caller, callee) in graph.edges() {
            callers.entry(callee).or_default().push(caller);
        }
        Self { graph, callers }
    }

    /// Procedures that call `id` directly.
    pub fn direct_callers(&self, id: &str) -> &[&'g str] {
        self.graph
            .node(id)
            .and_then(|n| self.callers.get(n.id.as_str()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All ancestors of `id`. The target itself is never included, even when
    /// it sits on a call cycle. Unknown names have no ancestors.
    pub fn impacted_by(&self, id: &str) -> BTreeSet<String> {
        let mut impacted = BTreeSet::new();
        let Some(start) = self.graph.node(id) else {
            return impacted;
        };

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start.id.as_str());
        queue.push_back(start.id.as_str());

        while let Some(current) = queue.pop_front() {
            let callers = self.callers.get(current).map(|v| v.as_slice()).unwrap_or(&[]);
            for &caller in callers {
                if visited.insert(caller) {
                    impacted.insert(caller.to_string());
                    queue.push_back(caller);
                }
            }
        }

        impacted
    }

    /// One independent query per name, keyed by the name as given.
    pub fn impact_all<'a, I>(&self, ids: I) -> ImpactSets
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .map(|id| (id.to_string(), self.impacted_by(id)))
            .collect()
    }
}

/// Single-shot query. Prefer [`ImpactAnalyzer`] when asking more than once.
pub fn impacted_by(graph: &CallGraph, id: &str) -> BTreeSet<String> {
    ImpactAnalyzer::new(graph).impacted_by(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_of(edges: &[(&str, &str)]) -> CallGraph {
        let mut graph = CallGraph::new();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_acyclic_chain() {
        let graph = graph_of(&[("A", "B"), ("B", "C")]);
        assert_eq!(impacted_by(&graph, "C"), set(&["A", "B"]));
        assert_eq!(impacted_by(&graph, "B"), set(&["A"]));
        assert!(impacted_by(&graph, "A").is_empty());
    }

    #[test]
    fn test_cycle_terminates_and_excludes_target() {
        let graph = graph_of(&[("A", "B"), ("B", "A")]);
        assert_eq!(impacted_by(&graph, "A"), set(&["B"]));
        assert_eq!(impacted_by(&graph, "B"), set(&["A"]));
    }

    #[test]
    fn test_self_recursion() {
        let graph = graph_of(&[("MAIN", "LOOP"), ("LOOP", "LOOP")]);
        assert_eq!(impacted_by(&graph, "LOOP"), set(&["MAIN"]));
    }

    #[test]
    fn test_absent_node_is_empty() {
        let graph = graph_of(&[("A", "B")]);
        assert!(impacted_by(&graph, "NOPE").is_empty());
    }

    #[test]
    fn test_diamond_counts_each_caller_once() {
        let graph = graph_of(&[("TOP", "L"), ("TOP", "R"), ("L", "BASE"), ("R", "BASE")]);
        assert_eq!(impacted_by(&graph, "BASE"), set(&["L", "R", "TOP"]));
    }

    #[test]
    fn test_impact_all_keeps_queries_independent() {
        let graph = graph_of(&[("A", "B"), ("C", "D")]);
        let analyzer = ImpactAnalyzer::new(&graph);
        let sets = analyzer.impact_all(["B", "D", "MISSING"]);
        assert_eq!(sets["B"], set(&["A"]));
        assert_eq!(sets["D"], set(&["C"]));
        assert!(sets["MISSING"].is_empty());
    }

    #[test]
    fn test_query_ignores_case() {
        let graph = graph_of(&[("Main", "calc"), ("REPORT", "CALC")]);
        assert_eq!(impacted_by(&graph, "Calc"), set(&["Main", "REPORT"]));
        let analyzer = ImpactAnalyzer::new(&graph);
        assert_eq!(analyzer.direct_callers("CALC"), ["Main", "REPORT"]);
    }

    #[test]
    fn test_direct_callers() {
        let graph = graph_of(&[("A", "C"), ("B", "C")]);
        let analyzer = ImpactAnalyzer::new(&graph);
        assert_eq!(analyzer.direct_callers("C"), ["A", "B"]);
        assert!(analyzer.direct_callers("A").is_empty());
    }
}
