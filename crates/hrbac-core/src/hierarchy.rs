//! Hierarchy graph
//!
//! This module provides the parent-pointer graph shared by the role and
//! resource registries. Each entry identifier maps to an ordered list of
//! direct parent identifiers; the ancestor closure is computed with a
//! depth-first, pre-order traversal that tolerates cycles.

use serde_json::Value;

use crate::error::{HrbacError, HrbacResult};

/// Insertion-ordered parent-pointer graph over entry identifiers.
///
/// Identifiers are opaque, case-sensitive strings. An entry exists once a
/// parent list has been recorded for it (even an empty one); unknown
/// identifiers behave as entries with no parents. Entry order is the order
/// of first registration and is preserved by serialization.
///
/// Cyclic parent chains are tolerated structurally: traversal terminates
/// via a visited set, and each identifier appears exactly once in the
/// closure, at its first-discovered position.
///
/// # Example
///
/// ```
/// use hrbac_core::HierarchyGraph;
///
/// let mut graph = HierarchyGraph::new();
/// graph.set_parents("user", ["guest"]);
/// graph.set_parents("author", ["user", "creator"]);
///
/// assert_eq!(
///     graph.parents_recursive("author"),
///     vec!["author", "user", "guest", "creator"]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyGraph {
    /// (id, parent ids) in first-registration order.
    entries: Vec<(String, Vec<String>)>,
}

impl HierarchyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the id has a recorded parent list, even an empty one.
    pub fn has_entry(&self, id: &str) -> bool {
        self.entries.iter().any(|(entry, _)| entry == id)
    }

    /// Get the registered direct parents of `id`.
    ///
    /// Unknown ids yield an empty slice; nothing is recorded as a side
    /// effect.
    pub fn parents(&self, id: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(_, parents)| parents.as_slice())
            .unwrap_or(&[])
    }

    /// Replace the registered parent list of `id` wholesale.
    ///
    /// Registers the entry if it was unknown.
    pub fn set_parents<I, S>(&mut self, id: impl Into<String>, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let parents: Vec<String> = parents.into_iter().map(Into::into).collect();

        match self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            Some((_, existing)) => *existing = parents,
            None => self.entries.push((id, parents)),
        }
    }

    /// Append parent ids that are not already registered for `id`.
    ///
    /// Idempotent: re-adding an existing parent is a no-op. Relative order
    /// of first appearance is preserved. Registers the entry if unknown.
    pub fn add_parents<I, S>(&mut self, id: impl Into<String>, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let idx = match self.entries.iter().position(|(entry, _)| *entry == id) {
            Some(idx) => idx,
            None => {
                self.entries.push((id, Vec::new()));
                self.entries.len() - 1
            }
        };

        let (_, existing) = &mut self.entries[idx];
        for parent in parents {
            let parent = parent.into();
            if !existing.contains(&parent) {
                existing.push(parent);
            }
        }
    }

    /// Compute the full ancestor closure of `id`, starting with the entry
    /// itself.
    ///
    /// Depth-first pre-order with an explicit stack: pop an id, skip it if
    /// already emitted, emit it, then push its direct parents in reverse
    /// order so they are visited left to right. Each id appears exactly
    /// once, at its first-discovered position (closest first). Terminates
    /// on cyclic graphs.
    pub fn parents_recursive(&self, id: &str) -> Vec<String> {
        self.closure(id, &[])
    }

    /// Ancestor closure with `local_parents` treated as additional direct
    /// parents of the starting entry, ahead of its registered parents.
    pub(crate) fn closure(&self, start: &str, local_parents: &[String]) -> Vec<String> {
        let mut stack = vec![start.to_string()];
        let mut result: Vec<String> = Vec::new();

        while let Some(id) = stack.pop() {
            if result.contains(&id) {
                continue;
            }

            let registered = self.parents(&id);
            let direct: Vec<&String> = if id == start {
                local_parents.iter().chain(registered).collect()
            } else {
                registered.iter().collect()
            };

            for parent in direct.into_iter().rev() {
                stack.push(parent.clone());
            }

            result.push(id);
        }

        result
    }

    /// Export the graph as an ordered sequence of `(id, parents)` pairs.
    pub fn to_serializable(&self) -> Vec<(String, Vec<String>)> {
        self.entries.clone()
    }

    /// Import serialized hierarchy data, merging entry by entry.
    ///
    /// Expects a JSON array of `[id, [parents...]]` pairs. Each valid entry
    /// replaces the registered parent list for its id. Validation is
    /// strict; a malformed entry fails with [`HrbacError::InvalidHierarchy`]
    /// naming the entry. Entries consumed before the failure stay imported.
    pub fn import_serialized(&mut self, data: &Value) -> HrbacResult<()> {
        let entries = data
            .as_array()
            .ok_or_else(|| HrbacError::InvalidHierarchy(data.to_string()))?;

        for entry in entries {
            let pair = entry
                .as_array()
                .filter(|pair| pair.len() == 2)
                .ok_or_else(|| HrbacError::InvalidHierarchy(entry.to_string()))?;

            let id = pair[0]
                .as_str()
                .ok_or_else(|| HrbacError::InvalidHierarchy(entry.to_string()))?;

            let parents = pair[1]
                .as_array()
                .ok_or_else(|| HrbacError::InvalidHierarchy(entry.to_string()))?
                .iter()
                .map(|parent| {
                    parent
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| HrbacError::InvalidHierarchy(entry.to_string()))
                })
                .collect::<HrbacResult<Vec<String>>>()?;

            self.set_parents(id, parents);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_entry_has_no_parents() {
        let graph = HierarchyGraph::new();
        assert!(!graph.has_entry("a"));
        assert!(graph.parents("a").is_empty());
    }

    #[test]
    fn test_set_parents_registers_entry() {
        let mut graph = HierarchyGraph::new();
        graph.set_parents("a", ["b", "c"]);

        assert!(graph.has_entry("a"));
        assert_eq!(graph.parents("a"), ["b", "c"]);
    }

    #[test]
    fn test_set_parents_replaces_wholesale() {
        let mut graph = HierarchyGraph::new();
        graph.set_parents("a", ["b", "c"]);
        graph.set_parents("a", ["d"]);

        assert_eq!(graph.parents("a"), ["d"]);
    }

    #[test]
    fn test_add_parents_is_idempotent() {
        let mut graph = HierarchyGraph::new();
        graph.add_parents("a", ["b"]);
        graph.add_parents("a", ["b", "c"]);
        graph.add_parents("a", ["b"]);

        assert_eq!(graph.parents("a"), ["b", "c"]);
    }

    #[test]
    fn test_parents_recursive_orders_closest_first() {
        let mut graph = HierarchyGraph::new();
        graph.add_parents("user", ["guest"]);
        graph.add_parents("author", ["user"]);
        graph.add_parents("author", ["creator"]);

        assert_eq!(
            graph.parents_recursive("author"),
            vec!["author", "user", "guest", "creator"]
        );
    }

    #[test]
    fn test_parents_recursive_terminates_on_cycle() {
        let mut graph = HierarchyGraph::new();
        graph.set_parents("a", ["b", "c"]);
        graph.set_parents("b", ["d", "e"]);
        graph.set_parents("e", ["a"]);

        assert_eq!(graph.parents_recursive("a"), vec!["a", "b", "d", "e", "c"]);
    }

    #[test]
    fn test_closure_seeds_local_parents_first() {
        let mut graph = HierarchyGraph::new();
        graph.set_parents("a", ["registered"]);
        graph.set_parents("local", ["grandparent"]);

        let local = vec!["local".to_string()];
        assert_eq!(
            graph.closure("a", &local),
            vec!["a", "local", "grandparent", "registered"]
        );
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut graph = HierarchyGraph::new();
        graph.set_parents("a", ["b", "c"]);
        graph.set_parents("b", ["d", "e"]);
        graph.set_parents("e", ["a"]);

        let data = serde_json::to_value(graph.to_serializable()).unwrap();
        assert_eq!(
            data,
            json!([["a", ["b", "c"]], ["b", ["d", "e"]], ["e", ["a"]]])
        );

        let mut imported = HierarchyGraph::new();
        imported.import_serialized(&data).unwrap();
        assert_eq!(imported, graph);
    }

    #[test]
    fn test_import_merges_into_existing_entries() {
        let mut graph = HierarchyGraph::new();
        graph.set_parents("a", ["old"]);
        graph.set_parents("keep", ["kept"]);

        graph
            .import_serialized(&json!([["a", ["new"]]]))
            .unwrap();

        assert_eq!(graph.parents("a"), ["new"]);
        assert_eq!(graph.parents("keep"), ["kept"]);
    }

    #[test]
    fn test_import_rejects_malformed_entries() {
        let mut graph = HierarchyGraph::new();

        assert!(graph.import_serialized(&json!({"a": []})).is_err());
        assert!(graph.import_serialized(&json!([["a"]])).is_err());
        assert!(graph.import_serialized(&json!([[1, ["b"]]])).is_err());
        assert!(graph.import_serialized(&json!([["a", "b"]])).is_err());
        assert!(graph.import_serialized(&json!([["a", ["b", 2]]])).is_err());
    }

    #[test]
    fn test_import_is_best_effort() {
        let mut graph = HierarchyGraph::new();
        let result = graph.import_serialized(&json!([["a", ["b"]], ["bad"]]));

        assert!(result.is_err());
        // The valid entry before the failure stays imported.
        assert_eq!(graph.parents("a"), ["b"]);
    }
}
