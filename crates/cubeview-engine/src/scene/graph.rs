use std::sync::Arc;

use glam::Mat4;

use super::geometry::Geometry;
use super::material::{Color, Material, Texture};
use super::transform::Transform;

/// Renderable part of a node.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

impl Mesh {
    pub fn new(geometry: Arc<Geometry>, material: Material) -> Self {
        Self { geometry, material }
    }
}

/// Positionable object with optional mesh and child nodes.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn mesh(name: impl Into<String>, geometry: Arc<Geometry>, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh: Some(Mesh::new(geometry, material)),
            ..Self::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first, parent before children.
    pub fn traverse_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    /// Visits every mesh with its world matrix.
    pub fn visit_meshes(&self, parent: Mat4, f: &mut impl FnMut(&Mesh, Mat4)) {
        let world = parent * self.transform.matrix();
        if let Some(mesh) = &self.mesh {
            f(mesh, world);
        }
        for child in &self.children {
            child.visit_meshes(world, f);
        }
    }

    /// Replaces the material of every mesh in this subtree.
    pub fn override_material(&mut self, material: &Material) {
        self.traverse_mut(&mut |node: &mut Node| {
            if let Some(mesh) = node.mesh.as_mut() {
                mesh.material = material.clone();
            }
        });
    }

    pub fn mesh_count(&self) -> usize {
        let mut n = 0;
        self.visit_meshes(Mat4::IDENTITY, &mut |_, _| n += 1);
        n
    }
}

/// What is drawn behind all geometry.
#[derive(Debug, Clone)]
pub enum Background {
    Color(Color),
    /// Stretched to fill the whole surface.
    Texture(Texture),
}

impl Default for Background {
    fn default() -> Self {
        Background::Color(Color::BLACK)
    }
}

/// Handle to a top-level node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId(usize);

/// Flat list of top-level nodes plus background.
///
/// Nodes are never removed, so `NodeId`s stay valid for the graph's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    background: Background,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    pub fn visit_meshes(&self, f: &mut impl FnMut(&Mesh, Mat4)) {
        for node in &self.nodes {
            node.visit_meshes(Mat4::IDENTITY, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn unit_box() -> Arc<Geometry> {
        Arc::new(Geometry::cuboid(1.0, 1.0, 1.0))
    }

    #[test]
    fn add_and_lookup() {
        let mut scene = SceneGraph::new();
        let a = scene.add(Node::mesh("cube", unit_box(), Material::default()));
        let b = scene.add(Node::group("model"));
        assert_ne!(a, b);
        assert_eq!(scene.find("model"), Some(b));
        assert_eq!(scene.node(a).map(|n| n.name.as_str()), Some("cube"));
    }

    #[test]
    fn world_matrix_composes_parent() {
        let child = Node::mesh("part", unit_box(), Material::default())
            .with_transform(Transform::from_position(Vec3::X));
        let root = Node::group("root")
            .with_transform(Transform::from_position(Vec3::Y).with_scale(Vec3::splat(2.0)))
            .with_child(child);

        let mut origins = Vec::new();
        root.visit_meshes(Mat4::IDENTITY, &mut |_, m| origins.push(m.transform_point3(Vec3::ZERO)));
        assert_eq!(origins.len(), 1);
        assert!(origins[0].abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn material_override_reaches_every_part() {
        let mut root = Node::group("model")
            .with_child(Node::mesh("a", unit_box(), Material::default()))
            .with_child(Node::group("g").with_child(Node::mesh("b", unit_box(), Material::default())));
        let red = Material::color(Color::hex(0xFF0000));
        root.override_material(&red);

        let mut colors = Vec::new();
        root.visit_meshes(Mat4::IDENTITY, &mut |mesh, _| colors.push(mesh.material.color));
        assert_eq!(colors, vec![Color::hex(0xFF0000); 2]);
        assert_eq!(root.mesh_count(), 2);
    }
}
