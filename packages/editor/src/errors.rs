//! Error types for the editor

use pagecraft_schema::SchemaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("The root node cannot be {0}")]
    RootOperation(&'static str),

    #[error("Material {0} cannot have children")]
    NotAContainer(String),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    #[error("{0} cannot be inverted")]
    NotInvertible(&'static str),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}
