use std::cell::RefCell;
use std::rc::Rc;

use cubeview_engine::scene::{Material, NodeId, SceneGraph, Texture};

#[derive(Debug)]
struct Binding {
    material: Material,
    users: Vec<NodeId>,
}

/// A material shared by several scene nodes.
///
/// Meshes own plain `Material` values, so the share is tracked here: every
/// node bound to it gets the current material, and changing the texture
/// rewrites all of them. Clones refer to the same binding, which lets a load
/// completion update the material after the controller handed it out.
#[derive(Debug, Clone)]
pub struct SharedMaterial(Rc<RefCell<Binding>>);

impl SharedMaterial {
    pub fn new(material: Material) -> Self {
        Self(Rc::new(RefCell::new(Binding {
            material,
            users: Vec::new(),
        })))
    }

    pub fn material(&self) -> Material {
        self.0.borrow().material.clone()
    }

    /// Applies the material to `id` and its subtree and records it as a user.
    pub fn bind(&self, scene: &mut SceneGraph, id: NodeId) {
        let mut binding = self.0.borrow_mut();
        if let Some(node) = scene.node_mut(id) {
            node.override_material(&binding.material);
            if !binding.users.contains(&id) {
                binding.users.push(id);
            }
        }
    }

    pub fn set_texture(&self, scene: &mut SceneGraph, texture: Texture) {
        let mut binding = self.0.borrow_mut();
        binding.material.texture = Some(texture);
        for id in &binding.users {
            if let Some(node) = scene.node_mut(*id) {
                node.override_material(&binding.material);
            }
        }
    }

    pub fn users(&self) -> usize {
        self.0.borrow().users.len()
    }
}
