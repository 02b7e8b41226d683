//! Content-hash change detection between two snapshots.

use std::collections::{BTreeMap, BTreeSet};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::snapshot::Snapshot;
use crate::ports::ChangeDetector;

/// Files are matched by basename. A name is changed when its SHA-256 digest
/// differs, or when it is present in only one snapshot.
pub struct ContentHashDetector;

impl ChangeDetector for ContentHashDetector {
    fn detect_changes(&self, old: &Snapshot, new: &Snapshot) -> Vec<String> {
        let old_digests = digests(old);
        let new_digests = digests(new);

        let names: BTreeSet<&String> = old_digests.keys().chain(new_digests.keys()).collect();
        let changed: Vec<String> = names
            .into_iter()
            .filter(|name| old_digests.get(*name) != new_digests.get(*name))
            .cloned()
            .collect();

        debug!(changed = changed.len(), "compared snapshots");
        changed
    }
}

fn digests(snapshot: &Snapshot) -> BTreeMap<String, Vec<u8>> {
    snapshot
        .files_by_name()
        .into_iter()
        .map(|(name, file)| (name, Sha256::digest(file.text.as_bytes()).to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::SourceFile;

    fn snapshot(files: &[(&str, &str)]) -> Snapshot {
        Snapshot::new(
            files
                .iter()
                .map(|(path, text)| SourceFile::new(*path, *text))
                .collect(),
        )
    }

    #[test]
    fn test_identical_snapshots_have_no_changes() {
        let old = snapshot(&[("old/a.pli", "A: PROC;")]);
        let new = snapshot(&[("new/a.pli", "A: PROC;")]);
        assert!(ContentHashDetector.detect_changes(&old, &new).is_empty());
    }

    #[test]
    fn test_modified_added_and_removed() {
        let old = snapshot(&[
            ("old/same.pli", "S: PROC;"),
            ("old/edit.pli", "E: PROC;\n CALL X;"),
            ("old/gone.pli", "G: PROC;"),
        ]);
        let new = snapshot(&[
            ("new/same.pli", "S: PROC;"),
            ("new/edit.pli", "E: PROC;\n CALL Y;"),
            ("new/added.pli", "N: PROC;"),
        ]);
        assert_eq!(
            ContentHashDetector.detect_changes(&old, &new),
            vec!["added.pli", "edit.pli", "gone.pli"]
        );
    }
}
