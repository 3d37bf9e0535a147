//! File Selector: resolve requested file indices against a torrent's file tree.

use std::collections::HashSet;

use floodgate_torrent_core::{FileTree, TorrentFile};

/// Collect the leaves whose index is in `indices`.
///
/// Each directory contributes its own matching files first, then its
/// subdirectories in mapping order. Requested indices that match nothing are
/// ignored.
#[must_use]
pub fn select_by_indices<'a>(
    indices: &HashSet<String>,
    tree: &'a FileTree,
) -> Vec<&'a TorrentFile> {
    let mut selected = Vec::new();
    collect(indices, tree, &mut selected);
    selected
}

fn collect<'a>(indices: &HashSet<String>, node: &'a FileTree, selected: &mut Vec<&'a TorrentFile>) {
    selected.extend(
        node.files
            .iter()
            .filter(|file| indices.contains(&file.index.to_string())),
    );
    for child in node.directories.values() {
        collect(indices, child, selected);
    }
}

/// Parse a comma-separated index list (`"0,3,5"`) into a selection set.
#[must_use]
pub fn parse_indices(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|index| !index.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use floodgate_test_support::fixtures::nested_tree;

    use super::*;

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn root_leaf_is_selected_alone() {
        let tree = nested_tree();
        let selected = select_by_indices(&set(&["2"]), &tree);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].index, 2);
    }

    #[test]
    fn root_leaves_precede_nested_leaves() {
        let tree = nested_tree();
        let selected = select_by_indices(&set(&["5", "2"]), &tree);
        let indices: Vec<u32> = selected.iter().map(|file| file.index).collect();
        assert_eq!(indices, vec![2, 5]);
    }

    #[test]
    fn unknown_indices_are_ignored() {
        let tree = nested_tree();
        assert!(select_by_indices(&set(&["99"]), &tree).is_empty());
        assert_eq!(select_by_indices(&set(&["2", "99"]), &tree).len(), 1);
    }

    #[test]
    fn index_lists_parse_loosely() {
        assert_eq!(parse_indices("0, 3,,5"), set(&["0", "3", "5"]));
        assert!(parse_indices("").is_empty());
    }
}
