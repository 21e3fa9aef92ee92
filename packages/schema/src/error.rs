use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Cannot move {node_id} into itself or its descendant {target_parent_id}")]
    CyclicMove {
        node_id: String,
        target_parent_id: String,
    },

    #[error("The root node cannot be moved")]
    CannotMoveRoot,

    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    #[error("Node {node_id} records parent {found:?} but lives under {expected}")]
    ParentMismatch {
        node_id: String,
        expected: String,
        found: Option<String>,
    },
}

impl SchemaError {
    pub fn cyclic_move(node_id: impl Into<String>, target_parent_id: impl Into<String>) -> Self {
        Self::CyclicMove {
            node_id: node_id.into(),
            target_parent_id: target_parent_id.into(),
        }
    }
}
