use crate::drawable::{Drawable, PointLight};
use glam::{Mat4, Vec3};
use orbitview_common::{NodeId, Transform};
use std::collections::BTreeMap;

/// Errors from structural scene graph operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("parent node {0} is not in the scene graph")]
    InvalidParent(NodeId),
    #[error("node {0} is not in the scene graph")]
    NodeNotFound(NodeId),
    #[error("moving node {node} under {parent} would create a cycle")]
    WouldCycle { node: NodeId, parent: NodeId },
}

/// A named, transformable node carrying a drawable payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub drawable: Drawable,
}

impl Node {
    pub fn new(name: impl Into<String>, drawable: Drawable) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            drawable,
        }
    }

    /// Grouping node with no drawable.
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, Drawable::Empty)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }
}

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Owner of a tree of nodes.
///
/// Children keep insertion order so traversal is reproducible; the slot map
/// is a BTreeMap for deterministic iteration in inspection tooling.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    slots: BTreeMap<NodeId, Slot>,
    roots: Vec<NodeId>,
}

/// One step of a traversal: the node plus its accumulated world matrix.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub id: NodeId,
    pub node: &'a Node,
    pub world: Mat4,
    /// 0 for root nodes.
    pub depth: usize,
}

impl Visit<'_> {
    pub fn world_position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }
}

/// A point light resolved to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldLight {
    pub id: NodeId,
    pub position: Vec3,
    pub light: PointLight,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Root nodes in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Insert a node at the root.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId::new();
        self.insert(id, None, node);
        id
    }

    /// Insert a node at the root (`parent == None`) or under `parent`.
    pub fn add_node(&mut self, parent: Option<NodeId>, node: Node) -> Result<NodeId, SceneError> {
        if let Some(parent) = parent {
            if !self.slots.contains_key(&parent) {
                return Err(SceneError::InvalidParent(parent));
            }
        }
        let id = NodeId::new();
        self.insert(id, parent, node);
        Ok(id)
    }

    fn insert(&mut self, id: NodeId, parent: Option<NodeId>, node: Node) {
        tracing::debug!(node = %id, name = %node.name, "add node");
        self.slots.insert(
            id,
            Slot {
                node,
                parent,
                children: Vec::new(),
            },
        );
        self.siblings_mut(parent).push(id);
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent.and_then(|p| self.slots.get_mut(&p)) {
            Some(slot) => &mut slot.children,
            None => &mut self.roots,
        }
    }

    /// Remove a node and its entire subtree. Returns the removed node.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, SceneError> {
        let parent = self
            .slots
            .get(&id)
            .ok_or(SceneError::NodeNotFound(id))?
            .parent;
        self.siblings_mut(parent).retain(|c| *c != id);

        let mut pending = vec![id];
        let mut removed = None;
        while let Some(next) = pending.pop() {
            if let Some(slot) = self.slots.remove(&next) {
                pending.extend(slot.children);
                if next == id {
                    removed = Some(slot.node);
                }
            }
        }
        tracing::debug!(node = %id, "removed subtree");
        removed.ok_or(SceneError::NodeNotFound(id))
    }

    /// Move a subtree under a new parent (or to the root).
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), SceneError> {
        let old_parent = self
            .slots
            .get(&id)
            .ok_or(SceneError::NodeNotFound(id))?
            .parent;
        if let Some(parent) = new_parent {
            if !self.slots.contains_key(&parent) {
                return Err(SceneError::InvalidParent(parent));
            }
            // Walk up from the new parent; meeting `id` means it is a descendant.
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == id {
                    return Err(SceneError::WouldCycle { node: id, parent });
                }
                cursor = self.slots.get(&current).and_then(|s| s.parent);
            }
        }

        self.siblings_mut(old_parent).retain(|c| *c != id);
        self.siblings_mut(new_parent).push(id);
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.parent = new_parent;
        }
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(&id).map(|s| &s.node)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(&id).map(|s| &mut s.node)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(&id).and_then(|s| s.parent)
    }

    /// Children of `id` in insertion order; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(&id)
            .map(|s| s.children.as_slice())
            .unwrap_or(&[])
    }

    /// First node (in traversal order) with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse().find(|v| v.node.name == name).map(|v| v.id)
    }

    /// Depth-first, parent-before-child walk computing world matrices.
    ///
    /// The iterator borrows the graph and can be restarted by calling
    /// `traverse` again.
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse {
            graph: self,
            stack: self
                .roots
                .iter()
                .rev()
                .map(|id| (*id, Mat4::IDENTITY, 0))
                .collect(),
        }
    }

    /// Point lights with their world-space positions.
    pub fn lights(&self) -> impl Iterator<Item = WorldLight> + '_ {
        self.traverse().filter_map(|visit| {
            visit.node.drawable.as_light().map(|light| WorldLight {
                id: visit.id,
                position: visit.world_position(),
                light: *light,
            })
        })
    }
}

/// Lazy pre-order traversal; see [`SceneGraph::traverse`].
pub struct Traverse<'a> {
    graph: &'a SceneGraph,
    stack: Vec<(NodeId, Mat4, usize)>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, parent_world, depth) = self.stack.pop()?;
        let slot = self.graph.slots.get(&id)?;
        let world = parent_world * slot.node.transform.matrix();
        self.stack.extend(
            slot.children
                .iter()
                .rev()
                .map(|child| (*child, world, depth + 1)),
        );
        Some(Visit {
            id,
            node: &slot.node,
            world,
            depth,
        })
    }
}
