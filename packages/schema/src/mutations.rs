//! # Tree Mutations
//!
//! Pure, copy-on-write operations on a node tree.
//!
//! ## Design Principles
//!
//! 1. **Persistent**: every function takes a root and returns a new root
//! 2. **Path copying**: only the nodes between the root and the edited node
//!    are reallocated; every other subtree is the same `Rc` as before
//! 3. **Identity on no-op**: an operation addressed at an id that does not
//!    exist returns `Rc::clone(root)`, so `Rc::ptr_eq` tells callers nothing
//!    happened
//!
//! ## Mutation Semantics
//!
//! ### Move
//! - Delete-then-insert of the same node (id and subtree preserved)
//! - Fails with `CyclicMove` if the target is the node or one of its descendants
//! - Fails with `CannotMoveRoot` for the root
//! - `position` indexes the target's children after the node was taken out
//!
//! ### Update props / style
//! - Shallow merge of the patch into the target's map only
//!
//! ### Delete
//! - Removes the node and all descendants; the root cannot be deleted

use std::collections::HashSet;
use std::rc::Rc;

use crate::{IdGenerator, Node, NodeId, PropMap, SchemaError, SchemaResult, StyleMap};

/// A subtree taken out of a tree, with enough context to put it back
#[derive(Debug, Clone, PartialEq)]
pub struct Removed {
    pub node: Rc<Node>,
    pub parent_id: NodeId,
    pub index: usize,
}

pub fn find(root: &Rc<Node>, id: &str) -> Option<Rc<Node>> {
    crate::preorder(root).find(|node| node.id == id).cloned()
}

pub fn find_parent(root: &Rc<Node>, id: &str) -> Option<Rc<Node>> {
    crate::preorder(root)
        .find(|node| node.children.iter().any(|child| child.id == id))
        .cloned()
}

/// Child-index path from `root` to `id`. Empty for the root itself.
pub fn path_to(root: &Node, id: &str) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    if collect_path(root, id, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn collect_path(node: &Node, id: &str, path: &mut Vec<usize>) -> bool {
    if node.id == id {
        return true;
    }

    for (index, child) in node.children.iter().enumerate() {
        path.push(index);
        if collect_path(child, id, path) {
            return true;
        }
        path.pop();
    }

    false
}

/// Node reached by following `path` from `root`
pub fn node_at<'a>(root: &'a Rc<Node>, path: &[usize]) -> Option<&'a Rc<Node>> {
    path.iter()
        .try_fold(root, |node, &index| node.children.get(index))
}

/// Rebuild the nodes along `path`, editing the last one. Everything off the
/// path is shared with the input tree.
fn rewrite_at<F>(node: &Rc<Node>, path: &[usize], edit: F) -> Rc<Node>
where
    F: FnOnce(&mut Node),
{
    let mut next = Node::clone(node);
    match path.split_first() {
        None => edit(&mut next),
        Some((&index, rest)) => {
            next.children[index] = rewrite_at(&node.children[index], rest, edit);
        }
    }
    Rc::new(next)
}

fn update_node<F>(root: &Rc<Node>, id: &str, edit: F) -> Rc<Node>
where
    F: FnOnce(&mut Node),
{
    match path_to(root, id) {
        Some(path) => rewrite_at(root, &path, edit),
        None => Rc::clone(root),
    }
}

/// Stamp `parent_id` on a node about to be inserted, reusing the allocation
/// when it is already correct
fn adopt(node: Rc<Node>, parent_id: &str) -> Rc<Node> {
    if node.parent_id.as_deref() == Some(parent_id) {
        return node;
    }
    let mut node = Rc::unwrap_or_clone(node);
    node.parent_id = Some(parent_id.to_string());
    Rc::new(node)
}

pub fn append_child(root: &Rc<Node>, parent_id: &str, node: impl Into<Rc<Node>>) -> Rc<Node> {
    let node = node.into();
    update_node(root, parent_id, |parent| {
        let child = adopt(node, &parent.id);
        parent.children.push(child);
    })
}

/// Insert under `parent_id` at `index`, clamped to the number of children
pub fn insert_at(
    root: &Rc<Node>,
    parent_id: &str,
    index: usize,
    node: impl Into<Rc<Node>>,
) -> Rc<Node> {
    let node = node.into();
    update_node(root, parent_id, |parent| {
        let child = adopt(node, &parent.id);
        let index = index.min(parent.children.len());
        parent.children.insert(index, child);
    })
}

pub fn insert_before(root: &Rc<Node>, target_id: &str, node: impl Into<Rc<Node>>) -> Rc<Node> {
    insert_beside(root, target_id, node.into(), 0)
}

pub fn insert_after(root: &Rc<Node>, target_id: &str, node: impl Into<Rc<Node>>) -> Rc<Node> {
    insert_beside(root, target_id, node.into(), 1)
}

fn insert_beside(root: &Rc<Node>, target_id: &str, node: Rc<Node>, offset: usize) -> Rc<Node> {
    let Some(mut path) = path_to(root, target_id) else {
        return Rc::clone(root);
    };
    // The root has no siblings
    let Some(index) = path.pop() else {
        return Rc::clone(root);
    };

    rewrite_at(root, &path, |parent| {
        let child = adopt(node, &parent.id);
        parent.children.insert(index + offset, child);
    })
}

/// Take a subtree out of the tree. `None` if `id` is missing or is the root.
pub fn remove_node(root: &Rc<Node>, id: &str) -> Option<(Rc<Node>, Removed)> {
    let mut path = path_to(root, id)?;
    let index = path.pop()?;

    let mut removed = None;
    let new_root = rewrite_at(root, &path, |parent| {
        let node = parent.children.remove(index);
        removed = Some(Removed {
            node,
            parent_id: parent.id.clone(),
            index,
        });
    });

    removed.map(|removed| (new_root, removed))
}

pub fn delete_node(root: &Rc<Node>, id: &str) -> Rc<Node> {
    match remove_node(root, id) {
        Some((new_root, _)) => new_root,
        None => Rc::clone(root),
    }
}

/// Shallow-merge `patch` into the node's props
pub fn update_node_props(root: &Rc<Node>, id: &str, patch: &PropMap) -> Rc<Node> {
    update_node(root, id, |node| {
        node.props
            .extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
    })
}

/// Shallow-merge `patch` into the node's style
pub fn update_node_style(root: &Rc<Node>, id: &str, patch: &StyleMap) -> Rc<Node> {
    update_node(root, id, |node| {
        node.style
            .extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
    })
}

/// Replace the node's props wholesale (keys missing from `props` go away)
pub fn replace_node_props(root: &Rc<Node>, id: &str, props: PropMap) -> Rc<Node> {
    update_node(root, id, |node| node.props = props)
}

/// Replace the node's style wholesale
pub fn replace_node_style(root: &Rc<Node>, id: &str, style: StyleMap) -> Rc<Node> {
    update_node(root, id, |node| node.style = style)
}

pub fn set_hidden(root: &Rc<Node>, id: &str, hidden: bool) -> Rc<Node> {
    update_node(root, id, |node| node.hidden = hidden)
}

pub fn set_locked(root: &Rc<Node>, id: &str, locked: bool) -> Rc<Node> {
    update_node(root, id, |node| node.locked = locked)
}

/// Deep copy with a fresh id for the node and every descendant.
///
/// The copy keeps the source's `parent_id`; inserting it re-stamps that.
pub fn clone_node<G>(node: &Node, ids: &mut G) -> Node
where
    G: IdGenerator + ?Sized,
{
    fresh_copy(node, node.parent_id.clone(), ids)
}

fn fresh_copy<G>(node: &Node, parent_id: Option<NodeId>, ids: &mut G) -> Node
where
    G: IdGenerator + ?Sized,
{
    let id = ids.new_id();
    let children = node
        .children
        .iter()
        .map(|child| Rc::new(fresh_copy(child, Some(id.clone()), ids)))
        .collect();

    Node {
        id,
        kind: node.kind.clone(),
        props: node.props.clone(),
        style: node.style.clone(),
        children,
        parent_id,
        locked: node.locked,
        hidden: node.hidden,
    }
}

/// Relocate a node under `target_parent_id` at `position`.
///
/// Missing node or target is a no-op, like every other mutation here.
pub fn move_node(
    root: &Rc<Node>,
    id: &str,
    target_parent_id: &str,
    position: usize,
) -> SchemaResult<Rc<Node>> {
    let Some(path) = path_to(root, id) else {
        return Ok(Rc::clone(root));
    };
    if path.is_empty() {
        return Err(SchemaError::CannotMoveRoot);
    }

    let Some(node) = node_at(root, &path) else {
        return Ok(Rc::clone(root));
    };
    if path_to(node, target_parent_id).is_some() {
        return Err(SchemaError::cyclic_move(id, target_parent_id));
    }
    if path_to(root, target_parent_id).is_none() {
        return Ok(Rc::clone(root));
    }

    match remove_node(root, id) {
        Some((without, removed)) => {
            Ok(insert_at(&without, target_parent_id, position, removed.node))
        }
        None => Ok(Rc::clone(root)),
    }
}

/// Recompute every `parent_id` from the actual containers. Subtrees that are
/// already correct are shared.
pub fn restamp_parents(root: &Rc<Node>) -> Rc<Node> {
    restamp(root, None)
}

fn restamp(node: &Rc<Node>, parent_id: Option<&str>) -> Rc<Node> {
    let children: Vec<Rc<Node>> = node
        .children
        .iter()
        .map(|child| restamp(child, Some(&node.id)))
        .collect();

    let parent_ok = parent_id.is_none() || node.parent_id.as_deref() == parent_id;
    let children_ok = children
        .iter()
        .zip(&node.children)
        .all(|(new, old)| Rc::ptr_eq(new, old));

    if parent_ok && children_ok {
        return Rc::clone(node);
    }

    let mut next = Node::clone(node);
    if let Some(parent_id) = parent_id {
        next.parent_id = Some(parent_id.to_string());
    }
    next.children = children;
    Rc::new(next)
}

/// Check the structural invariants: ids unique across the tree and every
/// child's `parent_id` naming its actual container.
pub fn check_invariants(root: &Node) -> SchemaResult<()> {
    let mut seen = HashSet::new();
    check_node(root, &mut seen)
}

fn check_node<'a>(node: &'a Node, seen: &mut HashSet<&'a str>) -> SchemaResult<()> {
    if !seen.insert(node.id.as_str()) {
        return Err(SchemaError::DuplicateId(node.id.clone()));
    }

    for child in &node.children {
        if child.parent_id.as_deref() != Some(node.id.as_str()) {
            return Err(SchemaError::ParentMismatch {
                node_id: child.id.clone(),
                expected: node.id.clone(),
                found: child.parent_id.clone(),
            });
        }
        check_node(child, seen)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SequentialIds;
    use serde_json::json;

    fn props(pairs: &[(&str, serde_json::Value)]) -> PropMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sample() -> Rc<Node> {
        Rc::new(
            Node::new("root", "page")
                .with_child(
                    Node::new("a", "container")
                        .with_child(Node::new("a1", "text"))
                        .with_child(Node::new("a2", "text")),
                )
                .with_child(Node::new("b", "container").with_child(Node::new("b1", "image"))),
        )
    }

    fn child_ids(node: &Node) -> Vec<&str> {
        node.children.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_find_and_find_parent() {
        let root = sample();
        assert_eq!(find(&root, "a2").unwrap().kind, "text");
        assert_eq!(find_parent(&root, "a2").unwrap().id, "a");
        assert!(find(&root, "missing").is_none());
        assert!(find_parent(&root, "root").is_none());
    }

    #[test]
    fn test_update_shares_untouched_subtrees() {
        let root = sample();
        let next = update_node_props(&root, "a1", &props(&[("text", json!("hi"))]));

        assert!(!Rc::ptr_eq(&root, &next));
        // Path nodes are new
        assert!(!Rc::ptr_eq(&root.children[0], &next.children[0]));
        assert!(!Rc::ptr_eq(&root.children[0].children[0], &next.children[0].children[0]));
        // Siblings and unrelated subtrees are shared
        assert!(Rc::ptr_eq(&root.children[0].children[1], &next.children[0].children[1]));
        assert!(Rc::ptr_eq(&root.children[1], &next.children[1]));

        assert_eq!(find(&next, "a1").unwrap().prop("text"), Some(&json!("hi")));
        // Input tree untouched
        assert!(find(&root, "a1").unwrap().props.is_empty());
    }

    #[test]
    fn test_update_props_is_shallow_merge() {
        let root = sample();
        let root = update_node_props(
            &root,
            "a1",
            &props(&[("text", json!("hi")), ("size", json!(12))]),
        );
        let root = update_node_props(&root, "a1", &props(&[("size", json!(14))]));

        let node = find(&root, "a1").unwrap();
        assert_eq!(node.prop("text"), Some(&json!("hi")));
        assert_eq!(node.prop("size"), Some(&json!(14)));
    }

    #[test]
    fn test_update_style_targets_only_node() {
        let root = sample();
        let patch: StyleMap = props(&[("color", json!("red"))]);
        let next = update_node_style(&root, "b", &patch);

        assert_eq!(find(&next, "b").unwrap().style.get("color"), Some(&json!("red")));
        assert!(find(&next, "b1").unwrap().style.is_empty());
    }

    #[test]
    fn test_missing_ids_return_same_root() {
        let root = sample();
        let patch = props(&[("x", json!(1))]);

        assert!(Rc::ptr_eq(&root, &update_node_props(&root, "nope", &patch)));
        assert!(Rc::ptr_eq(&root, &update_node_style(&root, "nope", &patch)));
        assert!(Rc::ptr_eq(&root, &delete_node(&root, "nope")));
        assert!(Rc::ptr_eq(&root, &append_child(&root, "nope", Node::new("n", "text"))));
        assert!(Rc::ptr_eq(&root, &insert_before(&root, "nope", Node::new("n", "text"))));
        assert!(Rc::ptr_eq(&root, &insert_after(&root, "nope", Node::new("n", "text"))));
        assert!(Rc::ptr_eq(&root, &move_node(&root, "nope", "a", 0).unwrap()));
        assert!(Rc::ptr_eq(&root, &move_node(&root, "a1", "nope", 0).unwrap()));
    }

    #[test]
    fn test_append_child_stamps_parent() {
        let root = sample();
        let next = append_child(&root, "b", Node::new("b2", "text"));

        let b = find(&next, "b").unwrap();
        assert_eq!(child_ids(&b), vec!["b1", "b2"]);
        assert_eq!(b.children[1].parent_id.as_deref(), Some("b"));
        check_invariants(&next).unwrap();
    }

    #[test]
    fn test_insert_before_and_after() {
        let root = sample();
        let root = insert_before(&root, "a2", Node::new("x", "text"));
        let root = insert_after(&root, "a2", Node::new("y", "text"));

        assert_eq!(child_ids(&find(&root, "a").unwrap()), vec!["a1", "x", "a2", "y"]);
        check_invariants(&root).unwrap();

        // The root has no siblings
        assert!(Rc::ptr_eq(&root, &insert_after(&root, "root", Node::new("z", "text"))));
    }

    #[test]
    fn test_insert_at_clamps_index() {
        let root = sample();
        let next = insert_at(&root, "a", 99, Node::new("z", "text"));
        assert_eq!(child_ids(&find(&next, "a").unwrap()), vec!["a1", "a2", "z"]);
    }

    #[test]
    fn test_remove_node_reports_position() {
        let root = sample();
        let (next, removed) = remove_node(&root, "a2").unwrap();

        assert_eq!(removed.parent_id, "a");
        assert_eq!(removed.index, 1);
        assert!(Rc::ptr_eq(&removed.node, &root.children[0].children[1]));
        assert!(find(&next, "a2").is_none());

        assert!(remove_node(&root, "root").is_none());
    }

    #[test]
    fn test_delete_removes_subtree() {
        let root = sample();
        let next = delete_node(&root, "a");

        assert!(find(&next, "a").is_none());
        assert!(find(&next, "a1").is_none());
        assert!(find(&next, "a2").is_none());
        assert_eq!(next.subtree_len(), 3);
        // Deleting the root is a no-op
        assert!(Rc::ptr_eq(&root, &delete_node(&root, "root")));
    }

    #[test]
    fn test_clone_node_mints_fresh_ids() {
        let root = sample();
        let mut ids = SequentialIds::new("clone-test");
        let a = find(&root, "a").unwrap();
        let copy = clone_node(&a, &mut ids);

        let original = a.ids();
        let cloned = copy.ids();
        assert_eq!(cloned.len(), original.len());
        assert!(cloned.is_disjoint(&original));
        assert_eq!(copy.kind, a.kind);
        assert_eq!(copy.children.len(), 2);
        assert_eq!(copy.children[0].parent_id.as_deref(), Some(copy.id.as_str()));
        assert_eq!(copy.parent_id.as_deref(), Some("root"));
    }

    #[test]
    fn test_move_node_between_parents() {
        let root = sample();
        let next = move_node(&root, "a1", "b", 0).unwrap();

        assert_eq!(child_ids(&find(&next, "a").unwrap()), vec!["a2"]);
        assert_eq!(child_ids(&find(&next, "b").unwrap()), vec!["a1", "b1"]);
        assert_eq!(find(&next, "a1").unwrap().parent_id.as_deref(), Some("b"));
        check_invariants(&next).unwrap();
    }

    #[test]
    fn test_move_within_same_parent() {
        let root = sample();
        let next = move_node(&root, "a1", "a", 5).unwrap();
        assert_eq!(child_ids(&find(&next, "a").unwrap()), vec!["a2", "a1"]);
    }

    #[test]
    fn test_move_into_self_or_descendant_is_rejected() {
        let root = sample();

        assert_eq!(
            move_node(&root, "a", "a", 0),
            Err(SchemaError::cyclic_move("a", "a"))
        );
        assert_eq!(
            move_node(&root, "a", "a1", 0),
            Err(SchemaError::cyclic_move("a", "a1"))
        );
        assert_eq!(move_node(&root, "root", "a", 0), Err(SchemaError::CannotMoveRoot));
    }

    #[test]
    fn test_restamp_parents_shares_correct_subtrees() {
        let root = sample();
        assert!(Rc::ptr_eq(&root, &restamp_parents(&root)));

        let mut broken = Node::clone(&root);
        let mut child = Node::clone(&broken.children[1]);
        child.parent_id = Some("elsewhere".to_string());
        broken.children[1] = Rc::new(child);
        let broken = Rc::new(broken);
        assert!(check_invariants(&broken).is_err());

        let fixed = restamp_parents(&broken);
        check_invariants(&fixed).unwrap();
        assert!(Rc::ptr_eq(&fixed.children[0], &broken.children[0]));
    }

    #[test]
    fn test_check_invariants_detects_duplicates() {
        let root = Node::new("root", "page")
            .with_child(Node::new("dup", "text"))
            .with_child(Node::new("dup", "text"));

        assert_eq!(
            check_invariants(&root),
            Err(SchemaError::DuplicateId("dup".to_string()))
        );
    }
}
