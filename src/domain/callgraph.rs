// Call graph structures for pli-impact.
// Procedure-level caller -> callee relationships for a single snapshot.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Procedure name -> path of the file that declared it first.
pub type ProcToFile = BTreeMap<String, String>;

/// A node in the call graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallGraphNode {
    pub id: String,           // procedure name, case preserved
    pub callees: Vec<String>, // unique, in first-seen order
    pub file: Option<String>, // owning file; None for dangling callees
}

impl CallGraphNode {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            callees: Vec::new(),
            file: None,
        }
    }

    /// Declared somewhere in the snapshot, as opposed to only being called.
    pub fn is_declared(&self) -> bool {
        self.file.is_some()
    }
}

/// The call graph itself.
///
/// Names match ignoring ASCII case: `CALC`, `Calc` and `calc` are one node,
/// whose `id` keeps the spelling seen first.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    pub nodes: Vec<CallGraphNode>,
    index: HashMap<String, usize>, // upper-cased name -> position in `nodes`
}

fn fold(id: &str) -> String {
    id.to_ascii_uppercase()
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` if absent. Returns true when the node was created.
    pub fn add_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.intern(id);
        self.nodes.len() > before
    }

    /// Register a declaration. The first file recorded for a name sticks;
    /// returns false when `id` already had an owner.
    pub fn declare(&mut self, id: &str, file: &str) -> bool {
        let i = self.intern(id);
        let node = &mut self.nodes[i];
        if node.file.is_some() {
            return false;
        }
        node.file = Some(file.to_string());
        true
    }

    /// Add `caller -> callee`, creating either endpoint on demand.
    /// Repeated edges are ignored, whatever the spelling.
    pub fn add_edge(&mut self, caller_id: &str, callee_id: &str) {
        let caller = self.intern(caller_id);
        let callee = self.intern(callee_id);
        let callee_name = self.nodes[callee].id.clone();
        let node = &mut self.nodes[caller];
        if !node.callees.contains(&callee_name) {
            node.callees.push(callee_name);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(&fold(id))
    }

    pub fn node(&self, id: &str) -> Option<&CallGraphNode> {
        self.index.get(&fold(id)).map(|&i| &self.nodes[i])
    }

    pub fn callees(&self, id: &str) -> &[String] {
        self.node(id).map(|n| n.callees.as_slice()).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.callees.len()).sum()
    }

    /// All `(caller, callee)` pairs, using node ids on both ends.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.nodes
            .iter()
            .flat_map(|n| n.callees.iter().map(move |c| (n.id.as_str(), c.as_str())))
    }

    pub fn node_set(&self) -> BTreeSet<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn edge_set(&self) -> BTreeSet<(String, String)> {
        self.edges()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect()
    }

    /// Nodes that exist only because something calls them.
    pub fn dangling(&self) -> impl Iterator<Item = &CallGraphNode> + '_ {
        self.nodes.iter().filter(|n| !n.is_declared())
    }

    /// Node id -> owning file, for every declared node.
    pub fn proc_to_file(&self) -> ProcToFile {
        self.nodes
            .iter()
            .filter_map(|n| n.file.clone().map(|f| (n.id.clone(), f)))
            .collect()
    }

    fn intern(&mut self, id: &str) -> usize {
        let key = fold(id);
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(key, i);
        self.nodes.push(CallGraphNode::new(id));
        i
    }
}

/// Display name of the file a procedure belongs to: the basename of its
/// owning file, or `<name>.<fallback_ext>` when it was never declared.
pub fn owning_file_name(proc_to_file: &ProcToFile, id: &str, fallback_ext: &str) -> String {
    match proc_to_file.get(id) {
        Some(path) => Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.clone()),
        None => format!("{}.{}", id, fallback_ext),
    }
}
