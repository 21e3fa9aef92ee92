//! # Node Map
//!
//! id → node lookup cache over one version of the tree.
//!
//! A full build walks every node. After an edit, `refresh` only re-walks
//! the path from the root to each changed node, descending below it only
//! into subtrees whose `Rc` changed. Untouched subtrees keep their entries.
//!
//! Paths are found through the `parent_id` hints recorded in the previous
//! map and verified against the new tree. A hint that no longer leads to
//! the node falls back to a full search, so stale hints cost time, never
//! correctness.

use std::collections::HashMap;
use std::rc::Rc;

use crate::mutations::path_to;
use crate::{preorder, Node, NodeId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMap {
    entries: HashMap<NodeId, Rc<Node>>,
}

impl NodeMap {
    pub fn build(root: &Rc<Node>) -> Self {
        let entries = preorder(root)
            .map(|node| (node.id.clone(), Rc::clone(node)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&Rc<Node>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Rc<Node>)> {
        self.entries.iter()
    }

    /// Bring the map in line with `root` after the nodes in `changed` were
    /// edited, added, or removed.
    ///
    /// For a removed node pass either its id or its former parent's id. For
    /// a moved node its id is enough: the container it left is found through
    /// this map's parent hints.
    pub fn refresh(&mut self, root: &Rc<Node>, changed: &[&str]) {
        let mut paths = Vec::with_capacity(changed.len());
        for id in changed {
            if !self.locate(root, id, &mut paths) {
                *self = Self::build(root);
                return;
            }
        }

        // Shallow first: a subtree refresh covers every changed node below it
        paths.sort_by_key(|path| path.len());

        let mut departed = Vec::new();
        for path in &paths {
            self.refresh_path(root, path, &mut departed);
        }
        for node in &departed {
            self.evict(node);
        }
    }

    /// Push the paths to refresh for `id` in the new tree. False when
    /// nothing in the new tree accounts for it.
    fn locate(&self, root: &Rc<Node>, id: &str, paths: &mut Vec<Vec<usize>>) -> bool {
        if let Some(path) = self.hinted_path(root, id) {
            paths.push(path);
            return true;
        }

        let former_parent = self
            .entries
            .get(id)
            .and_then(|node| node.parent_id.as_deref());

        match (path_to(root, id), former_parent) {
            // Moved: the container it left changed as well
            (Some(path), Some(former_parent)) => {
                paths.push(path);
                self.locate(root, former_parent, paths)
            }
            (Some(path), None) => {
                paths.push(path);
                true
            }
            // Gone from the tree: refresh its former container instead
            (None, Some(former_parent)) => self.locate(root, former_parent, paths),
            (None, None) => false,
        }
    }

    /// Follow the previous map's parent hints down the new tree
    fn hinted_path(&self, root: &Rc<Node>, id: &str) -> Option<Vec<usize>> {
        let mut chain = vec![id];
        let mut cursor = self.entries.get(id)?;
        while let Some(parent_id) = cursor.parent_id.as_deref() {
            chain.push(parent_id);
            cursor = self.entries.get(parent_id)?;
            if chain.len() > self.entries.len() {
                return None;
            }
        }

        if chain.pop()? != root.id {
            return None;
        }

        let mut path = Vec::with_capacity(chain.len());
        let mut node = root;
        for step in chain.iter().rev() {
            let index = node.children.iter().position(|child| child.id == *step)?;
            path.push(index);
            node = &node.children[index];
        }
        Some(path)
    }

    fn refresh_path(&mut self, root: &Rc<Node>, path: &[usize], departed: &mut Vec<Rc<Node>>) {
        let mut node = root;
        for &index in path {
            self.entries.insert(node.id.clone(), Rc::clone(node));
            node = &node.children[index];
        }
        self.refresh_subtree(node, departed);
    }

    fn refresh_subtree(&mut self, node: &Rc<Node>, departed: &mut Vec<Rc<Node>>) {
        let previous = self.entries.insert(node.id.clone(), Rc::clone(node));

        if let Some(previous) = previous {
            if Rc::ptr_eq(&previous, node) {
                return;
            }
            for old_child in &previous.children {
                if !node.children.iter().any(|child| child.id == old_child.id) {
                    departed.push(Rc::clone(old_child));
                }
            }
        }

        for child in &node.children {
            self.refresh_subtree(child, departed);
        }
    }

    /// Drop a subtree that left its container, unless it was re-inserted
    /// somewhere else during the same refresh
    fn evict(&mut self, node: &Rc<Node>) {
        let still_mapped = self
            .entries
            .get(&node.id)
            .is_some_and(|current| Rc::ptr_eq(current, node));

        if still_mapped {
            self.entries.remove(&node.id);
            for child in &node.children {
                self.evict(child);
            }
        }
    }
}

pub fn build_node_map(root: &Rc<Node>) -> NodeMap {
    NodeMap::build(root)
}

/// Derive the map for `root` from the map of the previous tree version
pub fn update_node_map_incremental(root: &Rc<Node>, changed_id: &str, old: &NodeMap) -> NodeMap {
    let mut map = old.clone();
    map.refresh(root, &[changed_id]);
    map
}
