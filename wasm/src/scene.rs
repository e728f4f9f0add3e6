//! Arena-backed scene graph for the character and clip skeletons.
//!
//! Nodes are stored parent-before-child, so a single forward pass over the
//! arena is enough to resolve world transforms. Node references are plain
//! `NodeId` indices into the arena.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a node inside its `SceneGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Convert to arena index
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Local transform: translation, rotation, scale (applied as T * R * S)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Morph-target dictionary plus the parallel influence array of a skinned mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphTargets {
    pub dictionary: HashMap<String, usize>,
    pub influences: Vec<f32>,
}

impl MorphTargets {
    /// Pair a dictionary with its influences. A short array is padded to one
    /// slot per entry at most; entries still pointing past the end are dropped.
    pub fn new(mut dictionary: HashMap<String, usize>, mut influences: Vec<f32>) -> Self {
        if influences.len() < dictionary.len() {
            influences.resize(dictionary.len(), 0.0);
        }
        dictionary.retain(|name, &mut index| {
            let in_range = index < influences.len();
            if !in_range {
                log::warn!(
                    "Dropping morph target '{}': slot {} outside {} influences",
                    name,
                    index,
                    influences.len()
                );
            }
            in_range
        });
        Self {
            dictionary,
            influences,
        }
    }

    /// Influence slot for a morph name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.dictionary
            .get(name)
            .copied()
            .filter(|&i| i < self.influences.len())
    }

    pub fn influence(&self, name: &str) -> Option<f32> {
        self.index_of(name).map(|i| self.influences[i])
    }

    /// Set an influence by name. Returns false if the morph does not exist.
    pub fn set_influence(&mut self, name: &str, value: f32) -> bool {
        match self.index_of(name) {
            Some(i) => {
                self.influences[i] = value;
                true
            }
            None => false,
        }
    }

    /// Relax every morph to neutral
    pub fn reset(&mut self) {
        self.influences.fill(0.0);
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty() || self.influences.is_empty()
    }
}

/// What a node is, checked at traversal time
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Bone,
    SkinnedMesh(MorphTargets),
}

impl NodeKind {
    #[inline]
    pub fn is_bone(&self) -> bool {
        matches!(self, NodeKind::Bone)
    }

    pub fn morph_targets(&self) -> Option<&MorphTargets> {
        match self {
            NodeKind::SkinnedMesh(morphs) if !morphs.is_empty() => Some(morphs),
            _ => None,
        }
    }

    pub fn morph_targets_mut(&mut self) -> Option<&mut MorphTargets> {
        match self {
            NodeKind::SkinnedMesh(morphs) if !morphs.is_empty() => Some(morphs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Not guaranteed unique
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Create a graph holding a single root group
    pub fn new(root_name: &str) -> Self {
        Self {
            nodes: vec![SceneNode {
                name: root_name.to_string(),
                kind: NodeKind::Group,
                transform: Transform::IDENTITY,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a child node under `parent`
    pub fn add_node(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        self.add_node_with_transform(parent, name, kind, Transform::IDENTITY)
    }

    pub fn add_node_with_transform(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
        transform: Transform,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode {
            name: name.to_string(),
            kind,
            transform,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.index()]
    }

    /// Depth-first walk of the subtree at `start`, parent before children,
    /// children in child-array order
    pub fn traverse(&self, start: NodeId) -> Traverse<'_> {
        Traverse {
            scene: self,
            stack: vec![start],
        }
    }

    /// First node with this name in traversal order
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse(self.root())
            .find(|&id| self.node(id).name == name)
    }

    /// First skinned mesh that carries morph data
    pub fn find_morph_mesh(&self) -> Option<NodeId> {
        self.traverse(self.root())
            .find(|&id| self.node(id).kind.morph_targets().is_some())
    }

    /// World matrix of every node, indexed by `NodeId::index`
    pub fn world_matrices(&self, root_transform: Mat4) -> Vec<Mat4> {
        let mut world = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let parent = match node.parent {
                Some(parent) => world[parent.index()],
                None => root_transform,
            };
            world.push(parent * node.transform.to_matrix());
        }
        world
    }

    /// Build a graph from a parsed description
    pub fn from_description(desc: &NodeDescription) -> Self {
        let mut scene = Self {
            nodes: Vec::new(),
        };
        scene.push_description(None, desc);
        scene
    }

    /// Parse the JSON scene description produced by the page-side loader
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let desc: NodeDescription = serde_json::from_str(json)?;
        Ok(Self::from_description(&desc))
    }

    fn push_description(&mut self, parent: Option<NodeId>, desc: &NodeDescription) {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode {
            name: desc.name.clone(),
            kind: desc.node_kind(),
            transform: desc.transform(),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        for child in &desc.children {
            self.push_description(Some(id), child);
        }
    }
}

/// Pre-order iterator returned by `SceneGraph::traverse`
pub struct Traverse<'a> {
    scene: &'a SceneGraph,
    stack: Vec<NodeId>,
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.scene.node(id).children.iter().rev().copied());
        Some(id)
    }
}

// ============================================================================
// JSON description
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKindDescription {
    #[default]
    Group,
    Bone,
    SkinnedMesh,
}

/// Scene node as handed over by the page's asset loader
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NodeDescription {
    pub name: String,

    #[serde(default)]
    pub kind: NodeKindDescription,

    #[serde(default)]
    pub translation: Option<[f32; 3]>,

    /// Quaternion in x, y, z, w order
    #[serde(default)]
    pub rotation: Option<[f32; 4]>,

    #[serde(default)]
    pub scale: Option<[f32; 3]>,

    #[serde(default)]
    pub morph_targets: HashMap<String, usize>,

    #[serde(default)]
    pub influences: Vec<f32>,

    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

impl NodeDescription {
    fn node_kind(&self) -> NodeKind {
        match self.kind {
            NodeKindDescription::Group => NodeKind::Group,
            NodeKindDescription::Bone => NodeKind::Bone,
            NodeKindDescription::SkinnedMesh => NodeKind::SkinnedMesh(MorphTargets::new(
                self.morph_targets.clone(),
                self.influences.clone(),
            )),
        }
    }

    fn transform(&self) -> Transform {
        let mut transform = Transform::IDENTITY;
        if let Some(t) = self.translation {
            transform.translation = Vec3::from_array(t);
        }
        if let Some(r) = self.rotation {
            transform.rotation = Quat::from_array(r).normalize();
        }
        if let Some(s) = self.scale {
            transform.scale = Vec3::from_array(s);
        }
        transform
    }
}
