//! # Selection
//!
//! The selected nodes, held as `Rc` references for cheap reads by a
//! property panel. Every mutation produces new node objects along the
//! edited path, so after each commit the held references are re-resolved
//! against the fresh node map. Without that, a panel would keep showing the
//! value from before the edit.

use std::rc::Rc;

use pagecraft_schema::{Node, NodeId, NodeMap};

#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Selected nodes in selection order
    entries: Vec<(NodeId, Rc<Node>)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `node`, either alongside the current selection or instead of it
    pub fn select(&mut self, node: Rc<Node>, additive: bool) {
        if !additive {
            self.entries.clear();
        }
        match self.entries.iter_mut().find(|(id, _)| *id == node.id) {
            Some(entry) => entry.1 = node,
            None => self.entries.push((node.id.clone(), node)),
        }
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(selected, _)| selected != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Rc<Node>> {
        self.entries.iter().map(|(_, node)| node)
    }

    pub fn get(&self, id: &str) -> Option<&Rc<Node>> {
        self.entries
            .iter()
            .find(|(selected, _)| selected == id)
            .map(|(_, node)| node)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-resolve every held reference against `map`. Ids that are no longer
    /// in the tree leave the selection. Returns how many were dropped.
    pub fn sync(&mut self, map: &NodeMap) -> usize {
        let before = self.entries.len();
        self.entries.retain_mut(|(id, node)| match map.get(id) {
            Some(current) => {
                *node = Rc::clone(current);
                true
            }
            None => false,
        });
        before - self.entries.len()
    }

    /// True when every held reference is the map's current node
    pub fn is_synced_with(&self, map: &NodeMap) -> bool {
        self.entries
            .iter()
            .all(|(id, node)| map.get(id).is_some_and(|current| Rc::ptr_eq(current, node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_schema::{build_node_map, delete_node, update_node_props, PropMap};
    use serde_json::json;

    fn tree() -> Rc<Node> {
        Rc::new(
            Node::new("root", "page")
                .with_child(Node::new("a", "text"))
                .with_child(Node::new("b", "text")),
        )
    }

    #[test]
    fn test_select_replaces_or_extends() {
        let root = tree();
        let map = build_node_map(&root);
        let mut selection = Selection::new();

        selection.select(Rc::clone(map.get("a").unwrap()), false);
        selection.select(Rc::clone(map.get("b").unwrap()), true);
        assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["a", "b"]);

        selection.select(Rc::clone(map.get("b").unwrap()), true);
        assert_eq!(selection.len(), 2);

        selection.select(Rc::clone(map.get("a").unwrap()), false);
        assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["a"]);

        assert!(selection.deselect("a"));
        assert!(!selection.deselect("a"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_sync_replaces_stale_references() {
        let root = tree();
        let mut selection = Selection::new();
        selection.select(Rc::clone(build_node_map(&root).get("a").unwrap()), false);

        let patch: PropMap = [("text".to_string(), json!("edited"))].into_iter().collect();
        let next = update_node_props(&root, "a", &patch);
        let map = build_node_map(&next);

        assert!(!selection.is_synced_with(&map));
        assert_eq!(selection.sync(&map), 0);
        assert!(selection.is_synced_with(&map));
        assert_eq!(selection.get("a").unwrap().prop("text"), Some(&json!("edited")));
    }

    #[test]
    fn test_sync_drops_deleted_nodes() {
        let root = tree();
        let map = build_node_map(&root);
        let mut selection = Selection::new();
        selection.select(Rc::clone(map.get("a").unwrap()), false);
        selection.select(Rc::clone(map.get("b").unwrap()), true);

        let next = delete_node(&root, "a");
        assert_eq!(selection.sync(&build_node_map(&next)), 1);
        assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["b"]);
    }
}
