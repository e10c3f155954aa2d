use crate::drawable::Drawable;
use crate::graph::{SceneGraph, Visit};
use orbitview_common::NodeId;

/// Read-only queries against a scene graph for tooling and debug output.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(graph: &SceneGraph) -> SceneSummary {
        let mut summary = SceneSummary::default();
        for visit in graph.traverse() {
            summary.node_count += 1;
            summary.max_depth = summary.max_depth.max(visit.depth);
            match visit.node.drawable {
                Drawable::Mesh { .. } => summary.mesh_count += 1,
                Drawable::PointLight(_) => summary.light_count += 1,
                Drawable::Empty => {}
            }
        }
        summary
    }

    /// Per-node detail lines in traversal order.
    pub fn nodes(graph: &SceneGraph) -> Vec<NodeInfo> {
        graph.traverse().map(NodeInfo::from_visit).collect()
    }
}

/// Counts over a scene graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneSummary {
    pub node_count: usize,
    pub mesh_count: usize,
    pub light_count: usize,
    pub max_depth: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} meshes={} lights={} depth={}",
            self.node_count, self.mesh_count, self.light_count, self.max_depth
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub depth: usize,
    pub world_position: [f32; 3],
    pub rotation: [f32; 3],
}

impl NodeInfo {
    fn from_visit(visit: Visit<'_>) -> Self {
        let kind = match &visit.node.drawable {
            Drawable::Empty => "group",
            Drawable::Mesh { geometry, .. } => geometry.kind(),
            Drawable::PointLight(_) => "point-light",
        };
        Self {
            id: visit.id,
            name: visit.node.name.clone(),
            kind,
            depth: visit.depth,
            world_position: visit.world_position().to_array(),
            rotation: visit.node.transform.rotation.to_array(),
        }
    }
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:indent$}[{}] {} ({}) pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})",
            "",
            self.id,
            self.name,
            self.kind,
            self.world_position[0],
            self.world_position[1],
            self.world_position[2],
            self.rotation[0],
            self.rotation[1],
            self.rotation[2],
            indent = self.depth * 2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::{CapsuleGeometry, Geometry, PointLight, StandardMaterial};
    use crate::graph::Node;
    use glam::Vec3;

    fn demo_graph() -> SceneGraph {
        let mut g = SceneGraph::new();
        g.add(
            Node::new("lamp", Drawable::PointLight(PointLight::default()))
                .with_position(Vec3::new(5.0, 5.0, 5.0)),
        );
        let capsule = g.add(Node::new(
            "capsule",
            Drawable::mesh(
                Geometry::Capsule(CapsuleGeometry::default()),
                StandardMaterial::default(),
            ),
        ));
        g.add_node(Some(capsule), Node::group("marker")).unwrap();
        g
    }

    #[test]
    fn summary_counts_drawables() {
        let summary = SceneInspector::summary(&demo_graph());
        assert_eq!(
            summary,
            SceneSummary {
                node_count: 3,
                mesh_count: 1,
                light_count: 1,
                max_depth: 1,
            }
        );
        assert!(summary.to_string().contains("meshes=1"));
    }

    #[test]
    fn node_listing_follows_traversal() {
        let nodes = SceneInspector::nodes(&demo_graph());
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["lamp", "capsule", "marker"]);
        assert_eq!(nodes[0].kind, "point-light");
        assert_eq!(nodes[1].kind, "capsule");
        assert!(nodes[2].to_string().starts_with("  ["));
    }
}
