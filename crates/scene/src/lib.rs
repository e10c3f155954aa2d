//! Scene graph: an owned tree of transformable nodes carrying meshes and lights.
//!
//! # Invariants
//! - The graph exclusively owns its nodes; the tree never contains cycles.
//! - Traversal visits a parent strictly before any of its children.
//! - A node's world matrix is the product of its ancestors' local matrices
//!   and its own.

mod drawable;
mod graph;
mod inspect;

pub use drawable::{CapsuleGeometry, Drawable, DrawableError, Geometry, PointLight, StandardMaterial};
pub use graph::{Node, SceneError, SceneGraph, Traverse, Visit, WorldLight};
pub use inspect::{NodeInfo, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "orbitview-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
