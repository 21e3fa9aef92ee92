//! # Editor Store
//!
//! Owns the live document, the node map, the selection and the history, and
//! exposes the only sanctioned way to change them.
//!
//! Every mutating action runs the same pipeline:
//!
//! ```text
//! compute new tree → replace document → refresh node map
//!                  → sync selection → record history
//! ```
//!
//! Prop and style edits are recorded debounced so typing produces one undo
//! step per field. Structural edits are recorded immediately so each one
//! is undoable on its own. Selection changes never touch history.
//!
//! Actions addressed at ids that are not in the document return
//! `EditorError::NodeNotFound` and change nothing.

use std::collections::HashSet;
use std::rc::Rc;

use pagecraft_schema::{
    self as schema, Document, IdGenerator, Node, NodeId, NodeMap, PropMap, SequentialIds, StyleMap,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    Clock, EditorConfig, EditorError, HistoryAction, HistoryManager, HistoryStep, MaterialRegistry,
    Selection, SystemClock,
};

type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Record {
    Immediate,
    Debounced,
}

/// How to bring the node map up to date after a change
enum Refresh {
    Nodes(Vec<NodeId>),
    Full,
}

impl Refresh {
    fn of(action: &HistoryAction) -> Self {
        action.touched_ids().map_or(Refresh::Full, Refresh::Nodes)
    }
}

pub struct EditorStore {
    document: Document,
    node_map: NodeMap,
    selection: Selection,
    history: HistoryManager,
    materials: MaterialRegistry,
    ids: SequentialIds,
    clock: Box<dyn Clock>,
}

impl EditorStore {
    /// Create a store with an empty page, driven by the system clock
    pub fn new(config: &EditorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: &EditorConfig, clock: impl Clock + 'static) -> Self {
        let document = Document::default();
        let node_map = NodeMap::build(&document.root);

        Self {
            document,
            node_map,
            selection: Selection::new(),
            history: HistoryManager::from_config(&config.history),
            materials: config.registry(),
            ids: SequentialIds::new(&config.id_seed),
            clock: Box::new(clock),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn root(&self) -> &Rc<Node> {
        &self.document.root
    }

    pub fn node_map(&self) -> &NodeMap {
        &self.node_map
    }

    pub fn get_node(&self, id: &str) -> Option<&Rc<Node>> {
        self.node_map.get(id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_nodes(&self) -> Vec<Rc<Node>> {
        self.selection.nodes().cloned().collect()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn node(&self, id: &str) -> Result<Rc<Node>> {
        self.node_map
            .get(id)
            .cloned()
            .ok_or_else(|| EditorError::NodeNotFound(id.to_string()))
    }

    /// Actual container of `id`. The parent hint is checked against the
    /// container's children before it is believed.
    fn parent_of(&self, id: &str) -> Result<Rc<Node>> {
        let node = self.node(id)?;
        let hinted = node
            .parent_id
            .as_deref()
            .and_then(|parent_id| self.node_map.get(parent_id))
            .filter(|parent| parent.children.iter().any(|child| child.id == id))
            .cloned();

        match hinted {
            Some(parent) => Ok(parent),
            None if id == self.document.root.id => Err(EditorError::RootOperation("detached")),
            None => schema::find_parent(&self.document.root, id)
                .ok_or_else(|| EditorError::NodeNotFound(id.to_string())),
        }
    }

    fn require_container(&self, node: &Node) -> Result<()> {
        if self.materials.accepts_children(&node.kind) {
            Ok(())
        } else {
            Err(EditorError::NotAContainer(node.kind.clone()))
        }
    }

    /// Steps 2-5 of every mutation: install the new document, refresh the
    /// node map, re-resolve the selection, record the action
    fn commit(
        &mut self,
        document: Document,
        refresh: Refresh,
        action: HistoryAction,
        record: Record,
    ) -> Result<()> {
        self.install(document, refresh);

        let now = self.clock.now();
        self.history.record(action, record == Record::Immediate, now)?;
        Ok(())
    }

    fn install(&mut self, document: Document, refresh: Refresh) {
        self.document = document;

        match refresh {
            Refresh::Nodes(ids) => {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                self.node_map.refresh(&self.document.root, &ids);
            }
            Refresh::Full => self.node_map = NodeMap::build(&self.document.root),
        }

        let dropped = self.selection.sync(&self.node_map);
        if dropped > 0 {
            debug!(dropped, "Removed deleted nodes from selection");
        }
    }

    fn install_step(&mut self, step: HistoryStep) {
        let refresh = Refresh::of(&step.action);
        self.install(step.document, refresh);
    }

    /// Create a node of a registered type as the last child of `parent_id`
    /// (the root when `None`) and select it
    #[instrument(skip(self))]
    pub fn add_node(&mut self, kind: &str, parent_id: Option<&str>) -> Result<NodeId> {
        let parent_id = parent_id.unwrap_or(&self.document.root.id).to_string();
        let parent = self.node(&parent_id)?;
        let mut node = self.materials.create_node(kind, self.ids.new_id())?;
        self.require_container(&parent)?;

        node.parent_id = Some(parent_id.clone());
        let node = Rc::new(node);
        let id = node.id.clone();

        let index = parent.children.len();
        let root = schema::insert_at(&self.document.root, &parent_id, index, Rc::clone(&node));
        let action = HistoryAction::AddNode {
            parent_id: parent_id.clone(),
            index,
            node,
        };
        self.commit(
            self.document.with_root(root),
            Refresh::Nodes(vec![parent_id]),
            action,
            Record::Immediate,
        )?;

        self.select_node(&id, false)?;
        debug!(node_id = %id, kind, "Added node");
        Ok(id)
    }

    /// Remove a node and its subtree
    pub fn delete_node(&mut self, id: &str) -> Result<()> {
        if id == self.document.root.id {
            return Err(EditorError::RootOperation("deleted"));
        }
        let (root, removed) = schema::remove_node(&self.document.root, id)
            .ok_or_else(|| EditorError::NodeNotFound(id.to_string()))?;

        let parent_id = removed.parent_id.clone();
        let action = HistoryAction::DeleteNode {
            parent_id: removed.parent_id,
            index: removed.index,
            node: removed.node,
        };
        self.commit(
            self.document.with_root(root),
            Refresh::Nodes(vec![parent_id]),
            action,
            Record::Immediate,
        )?;

        debug!(node_id = %id, "Deleted node");
        Ok(())
    }

    /// Shallow-merge `patch` into a node's props (debounced history)
    pub fn update_node_props(&mut self, id: &str, patch: PropMap) -> Result<()> {
        let node = self.node(id)?;
        let before = node.props.clone();
        let mut after = before.clone();
        after.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));

        let root = schema::update_node_props(&self.document.root, id, &patch);
        let action = HistoryAction::UpdateProps {
            node_id: id.to_string(),
            before,
            after,
        };
        self.commit(
            self.document.with_root(root),
            Refresh::Nodes(vec![id.to_string()]),
            action,
            Record::Debounced,
        )
    }

    /// Shallow-merge `patch` into a node's style (debounced history)
    pub fn update_node_style(&mut self, id: &str, patch: StyleMap) -> Result<()> {
        let node = self.node(id)?;
        let before = node.style.clone();
        let mut after = before.clone();
        after.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));

        let root = schema::update_node_style(&self.document.root, id, &patch);
        let action = HistoryAction::UpdateStyle {
            node_id: id.to_string(),
            before,
            after,
        };
        self.commit(
            self.document.with_root(root),
            Refresh::Nodes(vec![id.to_string()]),
            action,
            Record::Debounced,
        )
    }

    /// Move a node under `target_parent_id` at `position` (clamped)
    #[instrument(skip(self))]
    pub fn move_node_to(
        &mut self,
        id: &str,
        target_parent_id: &str,
        position: usize,
    ) -> Result<()> {
        let target = self.node(target_parent_id)?;
        self.require_container(&target)?;
        if id == self.document.root.id {
            return Err(schema::SchemaError::CannotMoveRoot.into());
        }

        let from_parent = self.parent_of(id)?;
        let from_index = from_parent
            .children
            .iter()
            .position(|child| child.id == id)
            .ok_or_else(|| EditorError::NodeNotFound(id.to_string()))?;

        let root = schema::move_node(&self.document.root, id, target_parent_id, position)?;
        let to_index = schema::find(&root, target_parent_id)
            .and_then(|parent| parent.children.iter().position(|child| child.id == id))
            .ok_or_else(|| EditorError::NodeNotFound(id.to_string()))?;

        let action = HistoryAction::MoveNode {
            node_id: id.to_string(),
            from_parent_id: from_parent.id.clone(),
            from_index,
            to_parent_id: target_parent_id.to_string(),
            to_index,
        };
        self.commit(
            self.document.with_root(root),
            Refresh::Nodes(vec![from_parent.id.clone(), target_parent_id.to_string()]),
            action,
            Record::Immediate,
        )
    }

    /// Deep-copy a node with fresh ids right after the original and select
    /// the copy
    pub fn duplicate_node(&mut self, id: &str) -> Result<NodeId> {
        if id == self.document.root.id {
            return Err(EditorError::RootOperation("duplicated"));
        }
        let node = self.node(id)?;
        let parent = self.parent_of(id)?;
        let index = parent
            .children
            .iter()
            .position(|child| child.id == id)
            .map_or(parent.children.len(), |i| i + 1);

        let copy = Rc::new(schema::clone_node(&node, &mut self.ids));
        let copy_id = copy.id.clone();

        let root = schema::insert_after(&self.document.root, id, Rc::clone(&copy));
        let action = HistoryAction::AddNode {
            parent_id: parent.id.clone(),
            index,
            node: copy,
        };
        self.commit(
            self.document.with_root(root),
            Refresh::Nodes(vec![parent.id.clone()]),
            action,
            Record::Immediate,
        )?;

        self.select_node(&copy_id, false)?;
        debug!(node_id = %id, copy_id = %copy_id, "Duplicated node");
        Ok(copy_id)
    }

    pub fn toggle_visibility(&mut self, id: &str) -> Result<bool> {
        let hidden = !self.node(id)?.hidden;
        let root = schema::set_hidden(&self.document.root, id, hidden);
        let action = HistoryAction::ToggleVisibility {
            node_id: id.to_string(),
            hidden,
        };
        self.commit(
            self.document.with_root(root),
            Refresh::Nodes(vec![id.to_string()]),
            action,
            Record::Immediate,
        )?;
        Ok(hidden)
    }

    pub fn toggle_lock(&mut self, id: &str) -> Result<bool> {
        let locked = !self.node(id)?.locked;
        let root = schema::set_locked(&self.document.root, id, locked);
        let action = HistoryAction::ToggleLock {
            node_id: id.to_string(),
            locked,
        };
        self.commit(
            self.document.with_root(root),
            Refresh::Nodes(vec![id.to_string()]),
            action,
            Record::Immediate,
        )?;
        Ok(locked)
    }

    /// Delete every selected node as one undo step. Nodes nested under
    /// another selected node go with their ancestor. Returns how many
    /// subtrees were removed.
    #[instrument(skip(self))]
    pub fn delete_selected(&mut self) -> Result<usize> {
        let root_id = self.document.root.id.as_str();
        let selected: HashSet<&str> = self.selection.ids().filter(|id| *id != root_id).collect();
        let targets: Vec<NodeId> = self
            .selection
            .ids()
            .filter(|id| selected.contains(id))
            .filter(|id| !self.has_selected_ancestor(id, &selected))
            .map(str::to_string)
            .collect();

        if targets.is_empty() {
            return Ok(0);
        }

        let mut root = Rc::clone(&self.document.root);
        let mut actions = Vec::with_capacity(targets.len());
        let mut parents = Vec::with_capacity(targets.len());
        for id in &targets {
            let Some((next, removed)) = schema::remove_node(&root, id) else {
                warn!(node_id = %id, "Selected node missing from document");
                continue;
            };
            root = next;
            parents.push(removed.parent_id.clone());
            actions.push(HistoryAction::DeleteNode {
                parent_id: removed.parent_id,
                index: removed.index,
                node: removed.node,
            });
        }

        let count = actions.len();
        self.commit(
            self.document.with_root(root),
            Refresh::Nodes(parents),
            HistoryAction::BatchUpdate { actions },
            Record::Immediate,
        )?;

        debug!(count, "Deleted selection");
        Ok(count)
    }

    fn has_selected_ancestor(&self, id: &str, selected: &HashSet<&str>) -> bool {
        let mut cursor = self.node_map.get(id).and_then(|node| node.parent_id.clone());
        while let Some(parent_id) = cursor {
            if selected.contains(parent_id.as_str()) {
                return true;
            }
            cursor = self.node_map.get(&parent_id).and_then(|node| node.parent_id.clone());
        }
        false
    }

    #[instrument(skip(self))]
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo(&self.document)? {
            Some(step) => {
                self.install_step(step);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self))]
    pub fn redo(&mut self) -> Result<bool> {
        match self.history.redo(&self.document)? {
            Some(step) => {
                self.install_step(step);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Select a node, alongside the current selection when `additive`
    pub fn select_node(&mut self, id: &str, additive: bool) -> Result<()> {
        let node = self.node(id)?;
        self.selection.select(node, additive);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Event-loop hook: commit the debounced history entry once its quiet
    /// period is over. Returns whether anything was committed.
    pub fn tick(&mut self) -> Result<bool> {
        let now = self.clock.now();
        Ok(self.history.poll(now)?)
    }

    /// Commit the debounced history entry now
    pub fn flush_history(&mut self) -> Result<bool> {
        Ok(self.history.flush()?)
    }

    /// Start a new editing session on `document`
    #[instrument(skip_all)]
    pub fn load_document(&mut self, document: Document) -> Result<()> {
        let document = document.with_root(schema::restamp_parents(&document.root));
        schema::check_invariants(&document.root)?;

        self.ids.observe_tree(&document.root);
        self.selection.clear();
        self.install(document, Refresh::Full);
        self.history.reset(Some(self.document.clone()));

        info!(nodes = self.node_map.len(), "Loaded document");
        Ok(())
    }

    /// Replace the whole document inside the current session. Undo stops at
    /// the import.
    #[instrument(skip_all)]
    pub fn import_document(&mut self, document: Document) -> Result<()> {
        let document = document.with_root(schema::restamp_parents(&document.root));
        schema::check_invariants(&document.root)?;

        self.ids.observe_tree(&document.root);
        let action = HistoryAction::FullSnapshot {
            document: document.clone(),
        };
        self.commit(document, Refresh::Full, action, Record::Immediate)?;

        info!(nodes = self.node_map.len(), "Imported document");
        Ok(())
    }
}
