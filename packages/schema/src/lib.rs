//! # Pagecraft Schema
//!
//! Document model and pure tree operations for the Pagecraft editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: Node tree + copy-on-write mutations │
//! │  - Document / Node model                    │
//! │  - find / insert / delete / update / move   │
//! │  - NodeMap id → node cache                  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: history, selection, store           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Values, not places**: every mutation returns a new root
//! 2. **Structural sharing**: unaffected subtrees are the same `Rc`, so
//!    consumers can skip them with `Rc::ptr_eq`
//! 3. **Children own, parent ids hint**: `parent_id` is re-stamped by every
//!    mutation and never treated as ownership
//!
//! ## Usage
//!
//! ```rust
//! use std::rc::Rc;
//! use pagecraft_schema::{append_child, find, Node};
//!
//! let root = Rc::new(Node::new("root", "page"));
//! let next = append_child(&root, "root", Node::new("title", "text"));
//!
//! assert!(find(&root, "title").is_none());
//! assert_eq!(find(&next, "title").unwrap().parent_id.as_deref(), Some("root"));
//! ```

pub mod error;
pub mod id_generator;
pub mod mutations;
pub mod node;
pub mod node_map;

pub use error::{SchemaError, SchemaResult};
pub use id_generator::{session_seed, IdGenerator, SequentialIds};
pub use mutations::{
    append_child, check_invariants, clone_node, delete_node, find, find_parent, insert_after,
    insert_at, insert_before, move_node, node_at, path_to, remove_node, replace_node_props,
    replace_node_style, restamp_parents, set_hidden, set_locked, update_node_props,
    update_node_style, Removed,
};
pub use node::{
    preorder, Document, Node, NodeId, Preorder, PropMap, StyleMap, ROOT_ID, SCHEMA_VERSION,
};
pub use node_map::{build_node_map, update_node_map_incremental, NodeMap};
