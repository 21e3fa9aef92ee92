//! # History Actions
//!
//! One undoable unit of change, carrying everything needed to apply it
//! forward and to invert it without looking at anything else.
//!
//! ## Action Semantics
//!
//! ### UpdateProps / UpdateStyle
//! - Carry the whole map before and after the edit
//! - Forward sets `after`, inverse sets `before`
//! - Consecutive edits of the same node coalesce: first `before`, last `after`
//!
//! ### AddNode / DeleteNode
//! - Carry the subtree, its parent and its index
//! - Each is the other's inverse
//!
//! ### MoveNode
//! - `to_index` is the final index under the new parent
//! - Inverse moves the node back to `from_index` under the old parent
//!
//! ### FullSnapshot
//! - Replaces the whole document
//! - Cannot be inverted; undo stops at it

use std::rc::Rc;

use pagecraft_schema::{self as schema, Document, Node, NodeId, PropMap, StyleMap};
use serde::{Deserialize, Serialize};

use crate::HistoryError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HistoryAction {
    UpdateProps {
        node_id: NodeId,
        before: PropMap,
        after: PropMap,
    },

    UpdateStyle {
        node_id: NodeId,
        before: StyleMap,
        after: StyleMap,
    },

    AddNode {
        parent_id: NodeId,
        index: usize,
        node: Rc<Node>,
    },

    DeleteNode {
        parent_id: NodeId,
        index: usize,
        node: Rc<Node>,
    },

    MoveNode {
        node_id: NodeId,
        from_parent_id: NodeId,
        from_index: usize,
        to_parent_id: NodeId,
        to_index: usize,
    },

    /// `hidden` is the value after the toggle
    ToggleVisibility {
        node_id: NodeId,
        hidden: bool,
    },

    /// `locked` is the value after the toggle
    ToggleLock {
        node_id: NodeId,
        locked: bool,
    },

    /// Sub-actions in application order
    BatchUpdate {
        actions: Vec<HistoryAction>,
    },

    FullSnapshot {
        document: Document,
    },
}

impl HistoryAction {
    /// Get a debug name for this action
    pub fn name(&self) -> &'static str {
        match self {
            HistoryAction::UpdateProps { .. } => "UpdateProps",
            HistoryAction::UpdateStyle { .. } => "UpdateStyle",
            HistoryAction::AddNode { .. } => "AddNode",
            HistoryAction::DeleteNode { .. } => "DeleteNode",
            HistoryAction::MoveNode { .. } => "MoveNode",
            HistoryAction::ToggleVisibility { .. } => "ToggleVisibility",
            HistoryAction::ToggleLock { .. } => "ToggleLock",
            HistoryAction::BatchUpdate { .. } => "BatchUpdate",
            HistoryAction::FullSnapshot { .. } => "FullSnapshot",
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, HistoryAction::FullSnapshot { .. })
    }

    /// Apply this action to a document
    pub fn apply(&self, doc: &Document) -> Result<Document, HistoryError> {
        let root = &doc.root;
        let next = match self {
            HistoryAction::UpdateProps { node_id, after, .. } => {
                schema::replace_node_props(root, node_id, after.clone())
            }

            HistoryAction::UpdateStyle { node_id, after, .. } => {
                schema::replace_node_style(root, node_id, after.clone())
            }

            HistoryAction::AddNode { parent_id, index, node } => {
                schema::insert_at(root, parent_id, *index, Rc::clone(node))
            }

            HistoryAction::DeleteNode { node, .. } => schema::delete_node(root, &node.id),

            HistoryAction::MoveNode { node_id, to_parent_id, to_index, .. } => {
                schema::move_node(root, node_id, to_parent_id, *to_index)?
            }

            HistoryAction::ToggleVisibility { node_id, hidden } => {
                schema::set_hidden(root, node_id, *hidden)
            }

            HistoryAction::ToggleLock { node_id, locked } => {
                schema::set_locked(root, node_id, *locked)
            }

            HistoryAction::BatchUpdate { actions } => {
                let mut doc = doc.clone();
                for action in actions {
                    doc = action.apply(&doc)?;
                }
                return Ok(doc);
            }

            HistoryAction::FullSnapshot { document } => return Ok(document.clone()),
        };

        Ok(doc.with_root(next))
    }

    /// Create the inverse action for undo
    pub fn to_inverse(&self) -> Result<HistoryAction, HistoryError> {
        let inverse = match self {
            HistoryAction::UpdateProps { node_id, before, after } => HistoryAction::UpdateProps {
                node_id: node_id.clone(),
                before: after.clone(),
                after: before.clone(),
            },

            HistoryAction::UpdateStyle { node_id, before, after } => HistoryAction::UpdateStyle {
                node_id: node_id.clone(),
                before: after.clone(),
                after: before.clone(),
            },

            HistoryAction::AddNode { parent_id, index, node } => HistoryAction::DeleteNode {
                parent_id: parent_id.clone(),
                index: *index,
                node: Rc::clone(node),
            },

            HistoryAction::DeleteNode { parent_id, index, node } => HistoryAction::AddNode {
                parent_id: parent_id.clone(),
                index: *index,
                node: Rc::clone(node),
            },

            HistoryAction::MoveNode {
                node_id,
                from_parent_id,
                from_index,
                to_parent_id,
                to_index,
            } => HistoryAction::MoveNode {
                node_id: node_id.clone(),
                from_parent_id: to_parent_id.clone(),
                from_index: *to_index,
                to_parent_id: from_parent_id.clone(),
                to_index: *from_index,
            },

            HistoryAction::ToggleVisibility { node_id, hidden } => HistoryAction::ToggleVisibility {
                node_id: node_id.clone(),
                hidden: !hidden,
            },

            HistoryAction::ToggleLock { node_id, locked } => HistoryAction::ToggleLock {
                node_id: node_id.clone(),
                locked: !locked,
            },

            HistoryAction::BatchUpdate { actions } => HistoryAction::BatchUpdate {
                actions: actions
                    .iter()
                    .rev()
                    .map(HistoryAction::to_inverse)
                    .collect::<Result<_, _>>()?,
            },

            HistoryAction::FullSnapshot { .. } => {
                return Err(HistoryError::NotInvertible(self.name()))
            }
        };

        Ok(inverse)
    }

    /// Fold a later edit of the same field into this one.
    ///
    /// Returns false (and leaves `self` alone) when the two edits are not
    /// the same kind of edit on the same node.
    pub fn coalesce(&mut self, next: &HistoryAction) -> bool {
        match (self, next) {
            (
                HistoryAction::UpdateProps { node_id, after, .. },
                HistoryAction::UpdateProps { node_id: next_id, after: next_after, .. },
            )
            | (
                HistoryAction::UpdateStyle { node_id, after, .. },
                HistoryAction::UpdateStyle { node_id: next_id, after: next_after, .. },
            ) if node_id == next_id => {
                *after = next_after.clone();
                true
            }
            _ => false,
        }
    }

    /// Containers whose contents this action changes, for refreshing a node
    /// map. `None` means the change is too broad and the map needs a rebuild.
    pub fn touched_ids(&self) -> Option<Vec<NodeId>> {
        match self {
            HistoryAction::UpdateProps { node_id, .. }
            | HistoryAction::UpdateStyle { node_id, .. }
            | HistoryAction::ToggleVisibility { node_id, .. }
            | HistoryAction::ToggleLock { node_id, .. } => Some(vec![node_id.clone()]),

            HistoryAction::AddNode { parent_id, .. }
            | HistoryAction::DeleteNode { parent_id, .. } => Some(vec![parent_id.clone()]),

            HistoryAction::MoveNode { from_parent_id, to_parent_id, .. } => {
                Some(vec![from_parent_id.clone(), to_parent_id.clone()])
            }

            HistoryAction::BatchUpdate { .. } | HistoryAction::FullSnapshot { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_schema::find;
    use serde_json::json;

    fn doc() -> Document {
        Document::new(
            Node::new("root", "page")
                .with_child(Node::new("a", "container").with_child(Node::new("a1", "text")))
                .with_child(Node::new("b", "container")),
        )
    }

    fn props(value: &str) -> PropMap {
        [("text".to_string(), json!(value))].into_iter().collect()
    }

    fn assert_round_trip(action: HistoryAction, start: &Document) {
        let forward = action.apply(start).unwrap();
        let back = action.to_inverse().unwrap().apply(&forward).unwrap();
        assert_eq!(&back, start, "{} did not invert", action.name());
    }

    #[test]
    fn test_update_props_round_trip() {
        let start = doc();
        let action = HistoryAction::UpdateProps {
            node_id: "a1".to_string(),
            before: PropMap::new(),
            after: props("hi"),
        };

        let forward = action.apply(&start).unwrap();
        assert_eq!(find(&forward.root, "a1").unwrap().prop("text"), Some(&json!("hi")));
        assert_round_trip(action, &start);
    }

    #[test]
    fn test_add_delete_round_trip() {
        let start = doc();
        let node = Rc::new(Node::new("new", "text"));
        assert_round_trip(
            HistoryAction::AddNode { parent_id: "b".to_string(), index: 0, node: Rc::clone(&node) },
            &start,
        );

        let (_, removed) = schema::remove_node(&start.root, "a").unwrap();
        assert_round_trip(
            HistoryAction::DeleteNode {
                parent_id: removed.parent_id,
                index: removed.index,
                node: removed.node,
            },
            &start,
        );
    }

    #[test]
    fn test_move_round_trip() {
        let start = doc();
        assert_round_trip(
            HistoryAction::MoveNode {
                node_id: "a1".to_string(),
                from_parent_id: "a".to_string(),
                from_index: 0,
                to_parent_id: "b".to_string(),
                to_index: 0,
            },
            &start,
        );
    }

    #[test]
    fn test_batch_inverts_in_reverse_order() {
        let start = doc();
        let batch = HistoryAction::BatchUpdate {
            actions: vec![
                HistoryAction::AddNode {
                    parent_id: "b".to_string(),
                    index: 0,
                    node: Rc::new(Node::new("x", "container")),
                },
                HistoryAction::AddNode {
                    parent_id: "x".to_string(),
                    index: 0,
                    node: Rc::new(Node::new("y", "text")),
                },
                HistoryAction::ToggleVisibility { node_id: "y".to_string(), hidden: true },
            ],
        };

        let forward = batch.apply(&start).unwrap();
        assert!(find(&forward.root, "y").unwrap().hidden);
        assert_round_trip(batch, &start);
    }

    #[test]
    fn test_full_snapshot_is_not_invertible() {
        let snapshot = HistoryAction::FullSnapshot { document: Document::default() };
        assert_eq!(snapshot.apply(&doc()).unwrap(), Document::default());
        assert_eq!(snapshot.to_inverse(), Err(HistoryError::NotInvertible("FullSnapshot")));

        let batch = HistoryAction::BatchUpdate { actions: vec![snapshot] };
        assert!(batch.to_inverse().is_err());
    }

    #[test]
    fn test_coalesce_same_node_keeps_first_before() {
        let mut first = HistoryAction::UpdateProps {
            node_id: "a1".to_string(),
            before: props("v0"),
            after: props("v1"),
        };
        let second = HistoryAction::UpdateProps {
            node_id: "a1".to_string(),
            before: props("v1"),
            after: props("v2"),
        };

        assert!(first.coalesce(&second));
        assert_eq!(
            first,
            HistoryAction::UpdateProps {
                node_id: "a1".to_string(),
                before: props("v0"),
                after: props("v2"),
            }
        );
    }

    #[test]
    fn test_coalesce_rejects_other_targets() {
        let mut props_edit = HistoryAction::UpdateProps {
            node_id: "a1".to_string(),
            before: PropMap::new(),
            after: props("v1"),
        };
        let other_node = HistoryAction::UpdateProps {
            node_id: "b".to_string(),
            before: PropMap::new(),
            after: props("v1"),
        };
        let style_edit = HistoryAction::UpdateStyle {
            node_id: "a1".to_string(),
            before: StyleMap::new(),
            after: StyleMap::new(),
        };

        assert!(!props_edit.coalesce(&other_node));
        assert!(!props_edit.coalesce(&style_edit));
    }

    #[test]
    fn test_action_serialization() {
        let action = HistoryAction::ToggleVisibility { node_id: "a".to_string(), hidden: true };
        let json = serde_json::to_string(&action).unwrap();
        let deserialized: HistoryAction = serde_json::from_str(&json).unwrap();
        assert_eq!(action, deserialized);
    }
}
