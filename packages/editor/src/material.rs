//! # Material Registry
//!
//! Maps a node type tag to the props and style a fresh node of that type
//! starts with. Creating a node of an unregistered type is an error: it
//! means a palette or plugin asked for something nobody registered.

use std::collections::HashMap;

use pagecraft_schema::{Node, NodeId, PropMap, StyleMap};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::EditorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub props: PropMap,

    #[serde(default)]
    pub style: StyleMap,

    /// Whether nodes of this type may have children
    #[serde(default)]
    pub container: bool,
}

impl Material {
    pub fn new(kind: impl Into<String>, container: bool) -> Self {
        Self {
            kind: kind.into(),
            props: PropMap::new(),
            style: StyleMap::new(),
            container,
        }
    }

    pub fn prop(mut self, key: &str, value: serde_json::Value) -> Self {
        self.props.insert(key.to_string(), value);
        self
    }

    pub fn style(mut self, key: &str, value: serde_json::Value) -> Self {
        self.style.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: HashMap<String, Material>,
}

impl MaterialRegistry {
    /// Registry with no materials at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in materials
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Material::new("page", true).style("width", json!(1280)));
        registry.register(
            Material::new("container", true)
                .style("display", json!("flex"))
                .style("padding", json!(8)),
        );
        registry.register(
            Material::new("text", false)
                .prop("text", json!("Text"))
                .style("fontSize", json!(14)),
        );
        registry.register(
            Material::new("image", false)
                .prop("src", json!(""))
                .prop("alt", json!("")),
        );
        registry.register(Material::new("button", false).prop("label", json!("Button")));
        registry
    }

    /// Register a material, returning the one it replaced
    pub fn register(&mut self, material: Material) -> Option<Material> {
        self.materials.insert(material.kind.clone(), material)
    }

    pub fn get(&self, kind: &str) -> Option<&Material> {
        self.materials.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.materials.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Unregistered types never accept children
    pub fn accepts_children(&self, kind: &str) -> bool {
        self.get(kind).is_some_and(|material| material.container)
    }

    /// Fresh node of `kind` carrying the material defaults
    pub fn create_node(&self, kind: &str, id: NodeId) -> Result<Node, EditorError> {
        let material = self
            .get(kind)
            .ok_or_else(|| EditorError::UnknownMaterial(kind.to_string()))?;

        Ok(Node::new(id, kind)
            .with_props(material.props.clone())
            .with_style(material.style.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_materials() {
        let registry = MaterialRegistry::builtin();
        assert_eq!(registry.len(), 5);
        assert!(registry.accepts_children("container"));
        assert!(registry.accepts_children("page"));
        assert!(!registry.accepts_children("text"));
        assert!(!registry.accepts_children("unknown"));
    }

    #[test]
    fn test_create_node_uses_defaults() {
        let registry = MaterialRegistry::builtin();
        let node = registry.create_node("text", "t-1".to_string()).unwrap();

        assert_eq!(node.id, "t-1");
        assert_eq!(node.kind, "text");
        assert_eq!(node.prop("text"), Some(&json!("Text")));
        assert_eq!(node.style.get("fontSize"), Some(&json!(14)));
    }

    #[test]
    fn test_unknown_material_is_an_error() {
        let registry = MaterialRegistry::builtin();
        let err = registry.create_node("carousel", "c-1".to_string()).unwrap_err();
        assert!(matches!(err, EditorError::UnknownMaterial(kind) if kind == "carousel"));
    }

    #[test]
    fn test_register_overrides_defaults() {
        let mut registry = MaterialRegistry::builtin();
        let previous = registry.register(Material::new("text", false).prop("text", json!("Hello")));
        assert!(previous.is_some());

        let node = registry.create_node("text", "t".to_string()).unwrap();
        assert_eq!(node.prop("text"), Some(&json!("Hello")));
        assert!(node.style.is_empty());
    }

    #[test]
    fn test_material_from_json() {
        let material: Material = serde_json::from_str(
            r#"{ "type": "video", "props": { "src": "" }, "container": false }"#,
        )
        .unwrap();
        assert_eq!(material.kind, "video");
        assert!(material.style.is_empty());
    }
}
