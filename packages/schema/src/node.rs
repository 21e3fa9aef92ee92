use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

pub type NodeId = String;

/// Material-specific properties (text content, image source, ...)
pub type PropMap = BTreeMap<String, Value>;

/// Presentation attributes (width, color, padding, ...)
pub type StyleMap = BTreeMap<String, Value>;

/// Schema version written into new documents
pub const SCHEMA_VERSION: u32 = 1;

/// Id given to the root of a default document
pub const ROOT_ID: &str = "root";

/// One element of the edited document.
///
/// Children are owned exclusively by their parent and shared between tree
/// versions through `Rc`. `parent_id` is a lookup hint that mutations keep
/// stamped; the parent's `children` list is the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    /// Material tag, e.g. "text" or "container"
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub props: PropMap,

    #[serde(default)]
    pub style: StyleMap,

    #[serde(default)]
    pub children: Vec<Rc<Node>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,

    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub hidden: bool,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            props: PropMap::new(),
            style: StyleMap::new(),
            children: Vec::new(),
            parent_id: None,
            locked: false,
            hidden: false,
        }
    }

    pub fn with_props(mut self, props: PropMap) -> Self {
        self.props = props;
        self
    }

    pub fn with_style(mut self, style: StyleMap) -> Self {
        self.style = style;
        self
    }

    /// Append a child, stamping its parent id
    pub fn with_child(mut self, mut child: Node) -> Self {
        child.parent_id = Some(self.id.clone());
        self.children.push(Rc::new(child));
        self
    }

    /// Look up a single prop
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Number of nodes in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.subtree_len())
            .sum::<usize>()
    }

    /// Every id in this subtree
    pub fn ids(&self) -> HashSet<NodeId> {
        let mut ids = HashSet::new();
        collect_ids(self, &mut ids);
        ids
    }
}

fn collect_ids(node: &Node, ids: &mut HashSet<NodeId>) {
    ids.insert(node.id.clone());
    for child in &node.children {
        collect_ids(child, ids);
    }
}

/// Depth-first, pre-order walk over a tree
pub fn preorder(root: &Rc<Node>) -> Preorder<'_> {
    Preorder { stack: vec![root] }
}

pub struct Preorder<'a> {
    stack: Vec<&'a Rc<Node>>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Rc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// The whole edited page: tree plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,

    #[serde(default)]
    pub meta: BTreeMap<String, Value>,

    pub root: Rc<Node>,
}

impl Document {
    pub fn new(root: Node) -> Self {
        Self {
            version: SCHEMA_VERSION,
            meta: BTreeMap::new(),
            root: Rc::new(root),
        }
    }

    /// Same document with a different tree
    pub fn with_root(&self, root: Rc<Node>) -> Self {
        Self {
            version: self.version,
            meta: self.meta.clone(),
            root,
        }
    }

    /// Parse a persisted document. Parent hints are re-stamped since they are
    /// never trusted from storage.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut doc: Document = serde_json::from_str(json)?;
        doc.root = crate::restamp_parents(&doc.root);
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Document {
    /// Empty page
    fn default() -> Self {
        Self::new(Node::new(ROOT_ID, "page"))
    }
}
