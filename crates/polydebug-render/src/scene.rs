//! Scene graph contract and an in-memory implementation.
//!
//! The renderer never walks a host's hierarchy directly. It asks a
//! [`SceneGraph`] for four things: which polygons live under a node, whether
//! a polygon is active and enabled right now, the polygon's data, and its
//! local-to-world transform.
//!
//! [`Scene`] implements that contract for hosts (and tests) that have no
//! scene graph of their own. Nodes are addressed by generational
//! [`NodeId`]s, so a handle to a despawned node is detected immediately
//! instead of aliasing whatever reuses its slot.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use polydebug_shapes::prelude::*;
use serde::{Deserialize, Serialize};

use crate::transform::{Affine2, Transform2D};
use crate::SceneError;

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// A generational node identifier.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// SceneGraph
// ---------------------------------------------------------------------------

/// What the debug renderer needs from a host scene graph.
pub trait SceneGraph {
    /// Whether `id` refers to a live node.
    fn contains(&self, id: NodeId) -> bool;

    /// Every node carrying a polygon in the subtree rooted at `root`
    /// (including `root` itself), in a stable order. Inactive nodes and
    /// disabled shapes are included; activity is checked per frame.
    fn polygons_in_subtree(&self, root: NodeId) -> Vec<NodeId>;

    /// The polygon carried by `id`, if any.
    fn polygon(&self, id: NodeId) -> Option<&Polygon>;

    /// Whether the node and all its ancestors are active and its shape is
    /// enabled. `false` for unknown nodes.
    fn is_active_and_enabled(&self, id: NodeId) -> bool;

    /// Local-to-world transform of `id`. Identity for unknown nodes.
    fn local_to_world(&self, id: NodeId) -> Affine2;

    /// Map a point from `id`'s local space to world space.
    fn transform_point(&self, id: NodeId, local: Vec2) -> Vec2 {
        self.local_to_world(id).transform_point(local)
    }
}

// ---------------------------------------------------------------------------
// SelectionSet
// ---------------------------------------------------------------------------

/// The editor's current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: HashSet<NodeId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id`. Returns `false` if it was already selected.
    pub fn select(&mut self, id: NodeId) -> bool {
        self.selected.insert(id)
    }

    pub fn deselect(&mut self, id: NodeId) -> bool {
        self.selected.remove(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

impl FromIterator<NodeId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            selected: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A shape attached to a node, with its own enabled flag.
#[derive(Debug)]
struct ShapeSlot {
    shape: AnyShape,
    enabled: bool,
}

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    transform: Transform2D,
    active: bool,
    shape: Option<ShapeSlot>,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_owned(),
            parent,
            children: Vec::new(),
            transform: Transform2D::default(),
            active: true,
            shape: None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// In-memory hierarchy of named nodes, each with a local transform, an
/// active flag, and at most one shape.
///
/// Free slots are recycled FIFO and their generation bumped on despawn.
#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free_indices: VecDeque<u32>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root node.
    pub fn spawn(&mut self, name: &str) -> NodeId {
        self.allocate(Node::new(name, None))
    }

    /// Create a node as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `parent` does not exist.
    pub fn spawn_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::StaleNode(parent));
        }
        let id = self.allocate(Node::new(name, Some(parent)));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Move `child` under `parent` (or to the root level with `None`),
    /// appending it after any existing children.
    ///
    /// # Errors
    ///
    /// - [`SceneError::StaleNode`] if either node does not exist.
    /// - [`SceneError::Cycle`] if `parent` is `child` or one of its
    ///   descendants.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        self.node(child)?;
        if let Some(parent) = parent {
            self.node(parent)?;
            let mut cursor = Some(parent);
            while let Some(id) = cursor {
                if id == child {
                    return Err(SceneError::Cycle { child, parent });
                }
                cursor = self.node(id)?.parent;
            }
        }

        if let Some(old) = self.node(child)?.parent {
            self.node_mut(old)?.children.retain(|&c| c != child);
        }
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(child);
        }
        self.node_mut(child)?.parent = parent;
        Ok(())
    }

    /// Remove `id` and its whole subtree. Returns the number of nodes
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `id` does not exist.
    pub fn despawn(&mut self, id: NodeId) -> Result<usize, SceneError> {
        if let Some(parent) = self.node(id)?.parent {
            self.node_mut(parent)?.children.retain(|&c| c != id);
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let slot = &mut self.slots[next.index() as usize];
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free_indices.push_back(next.index());
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Direct children in insertion order. Empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Set the node's own active flag. Descendants inherit inactivity.
    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<(), SceneError> {
        self.node_mut(id)?.active = active;
        Ok(())
    }

    /// Whether the node and every ancestor is active.
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.get(current) {
                Some(node) if node.active => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform2D> {
        self.get(id).map(|n| &n.transform)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform2D) -> Result<(), SceneError> {
        self.node_mut(id)?.transform = transform;
        Ok(())
    }

    /// Attach a shape (enabled), replacing and returning any previous one.
    pub fn attach_shape(
        &mut self,
        id: NodeId,
        shape: impl Into<AnyShape>,
    ) -> Result<Option<AnyShape>, SceneError> {
        let slot = ShapeSlot {
            shape: shape.into(),
            enabled: true,
        };
        Ok(self.node_mut(id)?.shape.replace(slot).map(|s| s.shape))
    }

    pub fn detach_shape(&mut self, id: NodeId) -> Result<Option<AnyShape>, SceneError> {
        Ok(self.node_mut(id)?.shape.take().map(|s| s.shape))
    }

    /// Enable or disable the node's shape. A node without a shape is left
    /// unchanged.
    pub fn set_shape_enabled(&mut self, id: NodeId, enabled: bool) -> Result<(), SceneError> {
        if let Some(slot) = self.node_mut(id)?.shape.as_mut() {
            slot.enabled = enabled;
        }
        Ok(())
    }

    pub fn shape(&self, id: NodeId) -> Option<&AnyShape> {
        self.get(id)?.shape.as_ref().map(|s| &s.shape)
    }

    pub fn shape_mut(&mut self, id: NodeId) -> Option<&mut AnyShape> {
        self.get_mut(id)?.shape.as_mut().map(|s| &mut s.shape)
    }

    pub fn polygon_mut(&mut self, id: NodeId) -> Option<&mut Polygon> {
        self.shape_mut(id)?.as_polygon_mut()
    }

    pub fn circle(&self, id: NodeId) -> Option<&Circle> {
        self.shape(id)?.as_circle()
    }

    pub fn circle_mut(&mut self, id: NodeId) -> Option<&mut Circle> {
        self.shape_mut(id)?.as_circle_mut()
    }

    /// Run every attached shape's validation hook, in slot order, as a host
    /// does after loading or bulk-editing a scene.
    ///
    /// # Errors
    ///
    /// Stops at the first shape whose change observers fail.
    pub fn validate_all(&mut self) -> Result<(), SceneError> {
        for slot in &mut self.slots {
            if let Some(shape) = slot.node.as_mut().and_then(|n| n.shape.as_mut()) {
                shape.shape.validate()?;
            }
        }
        Ok(())
    }

    // -- internals ----------------------------------------------------------

    fn allocate(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free_indices.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.get(id).ok_or(SceneError::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.get_mut(id).ok_or(SceneError::StaleNode(id))
    }
}

impl SceneGraph for Scene {
    fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Depth-first, pre-order, children in insertion order.
    fn polygons_in_subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        if !self.contains(root) {
            return found;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if node.shape.as_ref().is_some_and(|s| s.shape.as_polygon().is_some()) {
                found.push(id);
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }

    fn polygon(&self, id: NodeId) -> Option<&Polygon> {
        self.shape(id)?.as_polygon()
    }

    fn is_active_and_enabled(&self, id: NodeId) -> bool {
        let enabled = self
            .get(id)
            .and_then(|n| n.shape.as_ref())
            .is_some_and(|s| s.enabled);
        enabled && self.is_active_in_hierarchy(id)
    }

    fn local_to_world(&self, id: NodeId) -> Affine2 {
        let mut world = Affine2::IDENTITY;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.get(current) else {
                break;
            };
            world = node.transform.to_affine() * world;
            cursor = node.parent;
        }
        world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recycled_slot_gets_new_generation() {
        let mut scene = Scene::new();
        let a = scene.spawn("a");
        scene.despawn(a).unwrap();
        let b = scene.spawn("b");
        assert_eq!(b.index(), a.index());
        assert_eq!(b.generation(), a.generation() + 1);
        assert!(!scene.contains(a), "stale id must not resolve");
        assert_eq!(scene.name(b), Some("b"));
    }

    #[test]
    fn despawn_removes_subtree() {
        let mut scene = Scene::new();
        let root = scene.spawn("root");
        let child = scene.spawn_child(root, "child").unwrap();
        let grandchild = scene.spawn_child(child, "grandchild").unwrap();
        let sibling = scene.spawn_child(root, "sibling").unwrap();

        assert_eq!(scene.despawn(child).unwrap(), 2);
        assert!(!scene.contains(grandchild));
        assert_eq!(scene.children(root), &[sibling]);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn spawn_child_of_stale_parent_fails() {
        let mut scene = Scene::new();
        let root = scene.spawn("root");
        scene.despawn(root).unwrap();
        assert!(matches!(
            scene.spawn_child(root, "orphan"),
            Err(SceneError::StaleNode(id)) if id == root
        ));
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut scene = Scene::new();
        let a = scene.spawn("a");
        let b = scene.spawn_child(a, "b").unwrap();
        assert!(matches!(scene.set_parent(a, Some(b)), Err(SceneError::Cycle { .. })));
        assert!(matches!(scene.set_parent(a, Some(a)), Err(SceneError::Cycle { .. })));
    }

    #[test]
    fn reparent_moves_between_child_lists() {
        let mut scene = Scene::new();
        let a = scene.spawn("a");
        let b = scene.spawn("b");
        let c = scene.spawn_child(a, "c").unwrap();
        scene.set_parent(c, Some(b)).unwrap();
        assert!(scene.children(a).is_empty());
        assert_eq!(scene.children(b), &[c]);
        assert_eq!(scene.parent(c), Some(b));
        scene.set_parent(c, None).unwrap();
        assert_eq!(scene.parent(c), None);
        assert!(scene.children(b).is_empty());
    }

    #[test]
    fn inactive_ancestor_hides_descendants() {
        let mut scene = Scene::new();
        let root = scene.spawn("root");
        let child = scene.spawn_child(root, "child").unwrap();
        scene.attach_shape(child, Polygon::new()).unwrap();
        assert!(scene.is_active_and_enabled(child));

        scene.set_active(root, false).unwrap();
        assert!(!scene.is_active_and_enabled(child));
        scene.set_active(root, true).unwrap();
        scene.set_shape_enabled(child, false).unwrap();
        assert!(!scene.is_active_and_enabled(child));
    }

    #[test]
    fn node_without_shape_is_not_enabled() {
        let mut scene = Scene::new();
        let root = scene.spawn("root");
        assert!(!scene.is_active_and_enabled(root));
    }

    #[test]
    fn polygons_are_found_depth_first_including_root() {
        let mut scene = Scene::new();
        let root = scene.spawn("root");
        scene.attach_shape(root, Polygon::new()).unwrap();
        let a = scene.spawn_child(root, "a").unwrap();
        let a1 = scene.spawn_child(a, "a1").unwrap();
        let b = scene.spawn_child(root, "b").unwrap();
        let circle = scene.spawn_child(root, "circle").unwrap();
        scene.attach_shape(a1, Polygon::new()).unwrap();
        scene.attach_shape(b, Polygon::new()).unwrap();
        scene.attach_shape(circle, Circle::new()).unwrap();

        assert_eq!(scene.polygons_in_subtree(root), vec![root, a1, b]);
        assert_eq!(scene.polygons_in_subtree(a), vec![a1]);
    }

    #[test]
    fn world_transform_composes_ancestors() {
        let mut scene = Scene::new();
        let root = scene.spawn("root");
        let child = scene.spawn_child(root, "child").unwrap();
        scene
            .set_transform(root, Transform2D::from_translation(Vec2::new(10.0, 0.0)))
            .unwrap();
        scene
            .set_transform(
                child,
                Transform2D::default().with_scale(Vec2::new(2.0, 2.0)),
            )
            .unwrap();
        let p = scene.transform_point(child, Vec2::new(0.5, 0.5));
        assert!(p.abs_diff_eq(Vec2::new(11.0, 1.0), 1e-6), "got {p:?}");
    }

    #[test]
    fn validate_all_notifies_every_shape() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut scene = Scene::new();
        let count = Rc::new(Cell::new(0));
        for name in ["p", "c"] {
            let id = scene.spawn(name);
            let mut shape: AnyShape = if name == "p" {
                Polygon::new().into()
            } else {
                Circle::new().into()
            };
            let c = Rc::clone(&count);
            shape.changed_mut().subscribe_infallible(move || c.set(c.get() + 1));
            scene.attach_shape(id, shape).unwrap();
        }
        scene.validate_all().unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn selection_membership() {
        let mut scene = Scene::new();
        let a = scene.spawn("a");
        let b = scene.spawn("b");
        let mut selection: SelectionSet = [a].into_iter().collect();
        assert!(selection.contains(a));
        assert!(!selection.contains(b));
        assert!(selection.select(b));
        assert!(!selection.select(b));
        assert!(selection.deselect(a));
        assert_eq!(selection.len(), 1);
    }
}
