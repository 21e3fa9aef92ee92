//! # Pagecraft Editor
//!
//! Editing session for a visual page builder: the live document, a node
//! lookup map, the selection and undo/redo history.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: immutable node tree + mutations     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditorStore                         │
//! │  - Materials create typed nodes             │
//! │  - Every edit refreshes map + selection     │
//! │  - History records invertible actions       │
//! │  - Prop/style edits are debounced           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Trees are values**: each edit yields a new root sharing untouched subtrees
//! 2. **One pipeline**: every action goes through the store, never around it
//! 3. **Invertible history**: undo applies an action's inverse to the live document
//! 4. **Derived views stay fresh**: map and selection are re-resolved after each commit
//!
//! ## Usage
//!
//! ```rust
//! use pagecraft_editor::{EditorConfig, EditorStore};
//! use serde_json::json;
//!
//! let mut store = EditorStore::new(&EditorConfig::default());
//!
//! let id = store.add_node("text", None)?;
//! let patch = [("text".to_string(), json!("Hello"))].into_iter().collect();
//! store.update_node_props(&id, patch)?;
//!
//! assert_eq!(store.selected_nodes()[0].prop("text"), Some(&json!("Hello")));
//!
//! store.undo()?;
//! assert_eq!(store.get_node(&id).unwrap().prop("text"), Some(&json!("Text")));
//! # Ok::<(), pagecraft_editor::EditorError>(())
//! ```

mod action;
mod clock;
mod config;
mod debounce;
mod errors;
mod history;
mod material;
mod selection;
mod store;

pub use action::HistoryAction;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EditorConfig, HistoryConfig, DEFAULT_CONFIG_NAME};
pub use debounce::Debouncer;
pub use errors::{EditorError, HistoryError};
pub use history::{HistoryManager, HistoryStep};
pub use material::{Material, MaterialRegistry};
pub use selection::Selection;
pub use store::EditorStore;

// Re-export schema types for convenience
pub use pagecraft_schema as schema;
pub use pagecraft_schema::{Document, Node, NodeId, NodeMap, PropMap, StyleMap};
