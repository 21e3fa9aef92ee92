use crc32fast::Hasher;

use crate::{preorder, Node};

/// Mints node ids. Every id handed out must be unique for the session.
pub trait IdGenerator {
    fn new_id(&mut self) -> String;
}

/// Generate a session seed from a session name using CRC32
pub fn session_seed(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for nodes within an editing session
#[derive(Debug, Clone)]
pub struct SequentialIds {
    seed: String, // Session seed (CRC32)
    count: u64,   // Sequential counter
}

impl SequentialIds {
    pub fn new(name: &str) -> Self {
        Self::from_seed(session_seed(name))
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Get session seed
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Make sure an id that already exists is never handed out again.
    ///
    /// Ids minted under a different seed cannot collide and are ignored.
    pub fn observe(&mut self, id: &str) {
        let counter = id
            .strip_prefix(self.seed.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|n| n.parse::<u64>().ok());

        if let Some(n) = counter {
            self.count = self.count.max(n);
        }
    }

    /// Observe every id in a tree (used when a document is loaded)
    pub fn observe_tree(&mut self, root: &std::rc::Rc<Node>) {
        for node in preorder(root) {
            self.observe(&node.id);
        }
    }
}

impl IdGenerator for SequentialIds {
    /// Generate next sequential ID
    fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }
}
