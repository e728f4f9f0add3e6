use crate::scene::{NodeId, SceneGraph};
use std::collections::HashMap;

/// Bone name to bone node, iterated in first-insertion order.
///
/// A derived view over one skeleton; rebuild it whenever the skeleton is
/// reloaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneIndex {
    entries: Vec<(String, NodeId)>,
    positions: HashMap<String, usize>,
}

impl BoneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bone. A repeated name overwrites the node but keeps its slot.
    pub fn insert(&mut self, name: &str, node: NodeId) {
        match self.positions.get(name) {
            Some(&pos) => self.entries[pos].1 = node,
            None => {
                self.positions.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), node));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.positions.get(name).map(|&pos| self.entries[pos].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), *node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Index every bone in the subtree at `root` under its raw name.
/// Later duplicates win.
pub fn build_bone_index(scene: &SceneGraph, root: NodeId) -> BoneIndex {
    let mut index = BoneIndex::new();
    for id in scene.traverse(root) {
        let node = scene.node(id);
        if node.kind.is_bone() {
            index.insert(&node.name, id);
        }
    }
    index
}
