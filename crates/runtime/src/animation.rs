use glam::Vec3;
use orbitview_common::NodeId;
use orbitview_scene::SceneGraph;

/// A deterministic per-tick mutation of the scene.
pub trait Animation {
    /// Apply one tick. Return false once the animation no longer applies
    /// (for example its node was removed); the loop then drops it.
    fn advance(&mut self, scene: &mut SceneGraph) -> bool;

    /// Short label for logs.
    fn label(&self) -> String;
}

/// Adds a fixed Euler step (radians per tick) to a node's rotation.
///
/// The step is per tick, not per second, so the spin rate follows the
/// host's refresh rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub node: NodeId,
    pub step: Vec3,
}

impl Spin {
    pub fn new(node: NodeId, step: Vec3) -> Self {
        Self { node, step }
    }
}

impl Animation for Spin {
    fn advance(&mut self, scene: &mut SceneGraph) -> bool {
        match scene.get_mut(self.node) {
            Some(node) => {
                node.transform.rotation += self.step;
                true
            }
            None => false,
        }
    }

    fn label(&self) -> String {
        format!("spin({})", self.node)
    }
}
