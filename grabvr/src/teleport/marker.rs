use cgmath::{Matrix4, Vector3, Zero, vec3};
use engine::scene::{Material, NodeId, SceneError, SceneGraph};

/// The landing indicator shown under a valid teleport target.
pub struct TeleportMarker {
    pub node: NodeId,
    position: Vector3<f32>,
    visible: bool,
}

impl TeleportMarker {
    pub fn create(scene: &mut SceneGraph) -> Result<Self, SceneError> {
        let root = scene.root();
        let node = scene.add_node(root, "teleport-marker", Matrix4::from_scale(1.0))?;
        scene.set_material(
            node,
            Some(Material::new("teleport-marker", vec3(0.1, 0.9, 1.0)).into_shared()),
        )?;
        scene.set_visible(node, false)?;
        Ok(Self {
            node,
            position: Vector3::zero(),
            visible: false,
        })
    }

    pub fn show_at(&mut self, scene: &mut SceneGraph, position: Vector3<f32>) {
        self.position = position;
        self.visible = true;
        let _ = scene.set_local_transform(self.node, Matrix4::from_translation(position));
        let _ = scene.set_visible(self.node, true);
        let _ = scene.update_world_matrix(self.node);
    }

    pub fn hide(&mut self, scene: &mut SceneGraph) {
        self.visible = false;
        let _ = scene.set_visible(self.node, false);
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
