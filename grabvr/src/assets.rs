//! Asset intake. Loaders run wherever they like and hand finished nodes over an
//! `AssetSender`; the frame thread admits them into the scene once per frame.

use std::{
    collections::HashMap,
    fmt,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
};

use bitflags::bitflags;
use cgmath::{Matrix4, Vector3};
use engine::{
    assets_log,
    scene::{Material, NodeId, SharedMaterial},
};
use rapier3d::prelude::SharedShape;

use crate::{context::FrameContext, entity::EntityId, physics::BodyParams};

bitflags! {
    pub struct AssetTags: u32 {
        const GRABBABLE = 1 << 0;
        const TELEPORT_SURFACE = 1 << 1;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssetMaterial {
    pub name: String,
    pub color: Vector3<f32>,
}

/// A loaded, ready-to-place node.
#[derive(Clone)]
pub struct AssetNode {
    pub name: String,
    pub transform: Matrix4<f32>,
    pub shape: SharedShape,
    pub material: Option<AssetMaterial>,
    pub tags: AssetTags,
    pub body: BodyParams,
}

impl AssetNode {
    pub fn new(
        name: impl Into<String>,
        transform: Matrix4<f32>,
        shape: SharedShape,
        tags: AssetTags,
    ) -> Self {
        Self {
            name: name.into(),
            transform,
            shape,
            material: None,
            tags,
            body: BodyParams::default(),
        }
    }

    pub fn with_material(mut self, name: impl Into<String>, color: Vector3<f32>) -> Self {
        self.material = Some(AssetMaterial {
            name: name.into(),
            color,
        });
        self
    }

    pub fn with_body(mut self, body: BodyParams) -> Self {
        self.body = body;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssetLoadError {
    pub asset: String,
    pub reason: String,
}

impl AssetLoadError {
    pub fn new(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AssetLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load asset '{}': {}", self.asset, self.reason)
    }
}

impl std::error::Error for AssetLoadError {}

pub type AssetDelivery = Result<AssetNode, AssetLoadError>;

/// Cloneable, `Send` handle for loader threads.
#[derive(Clone)]
pub struct AssetSender {
    sender: Sender<AssetDelivery>,
}

impl AssetSender {
    /// Returns false once the inbox is gone.
    pub fn deliver(&self, node: AssetNode) -> bool {
        self.sender.send(Ok(node)).is_ok()
    }

    pub fn fail(&self, error: AssetLoadError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }
}

/// What one drain admitted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetIntake {
    pub grabbables: Vec<EntityId>,
    pub teleport_surfaces: Vec<NodeId>,
    pub scenery: Vec<NodeId>,
    pub failures: usize,
}

impl AssetIntake {
    pub fn is_empty(&self) -> bool {
        self.grabbables.is_empty()
            && self.teleport_surfaces.is_empty()
            && self.scenery.is_empty()
            && self.failures == 0
    }
}

pub struct AssetInbox {
    sender: Sender<AssetDelivery>,
    receiver: Receiver<AssetDelivery>,
    /// Materials are shared between every node that names the same one.
    materials: HashMap<String, SharedMaterial>,
}

impl AssetInbox {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            materials: HashMap::new(),
        }
    }

    pub fn sender(&self) -> AssetSender {
        AssetSender {
            sender: self.sender.clone(),
        }
    }

    /// Admit everything delivered so far without blocking.
    pub fn drain(&mut self, context: &mut FrameContext) -> AssetIntake {
        let mut intake = AssetIntake::default();
        loop {
            match self.receiver.try_recv() {
                Ok(Ok(node)) => self.admit(context, node, &mut intake),
                Ok(Err(err)) => {
                    assets_log!(ERROR, "{}", err);
                    intake.failures += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        intake
    }

    fn material(&mut self, material: &AssetMaterial) -> SharedMaterial {
        self.materials
            .entry(material.name.clone())
            .or_insert_with(|| Material::new(material.name.clone(), material.color).into_shared())
            .clone()
    }

    fn admit(&mut self, context: &mut FrameContext, node: AssetNode, intake: &mut AssetIntake) {
        let material = node.material.as_ref().map(|m| self.material(m));

        if node.tags.contains(AssetTags::TELEPORT_SURFACE) {
            if node.tags.contains(AssetTags::GRABBABLE) {
                assets_log!(
                    WARN,
                    "'{}' is tagged grabbable and teleport surface; admitting as teleport surface",
                    node.name
                );
            }
            if let Some(surface) =
                context.spawn_teleport_surface(&node.name, node.transform, node.shape, material)
            {
                assets_log!(DEBUG, "admitted teleport surface '{}'", node.name);
                intake.teleport_surfaces.push(surface);
            }
        } else if node.tags.contains(AssetTags::GRABBABLE) {
            if let Some(id) = context.spawn_grabbable(
                &node.name,
                node.transform,
                node.shape,
                node.body,
                material,
            ) {
                assets_log!(DEBUG, "admitted grabbable '{}' as {:?}", node.name, id);
                intake.grabbables.push(id);
            }
        } else {
            match context
                .scene
                .add_node(context.world_group, node.name.clone(), node.transform)
            {
                Ok(scenery) => {
                    let _ = context.scene.set_material(scenery, material);
                    let _ = context.scene.update_world_matrix(scenery);
                    intake.scenery.push(scenery);
                }
                Err(err) => assets_log!(ERROR, "unable to add '{}': {}", node.name, err),
            }
        }
    }
}

impl Default for AssetInbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, vec3};
    use rapier3d::na::Vector3 as NVector3;
    use std::{rc::Rc, thread};

    use crate::config::InteractionConfig;

    fn crate_node(name: &str, x: f32) -> AssetNode {
        AssetNode::new(
            name,
            Matrix4::from_translation(vec3(x, 1.0, -2.0)),
            SharedShape::cuboid(0.2, 0.2, 0.2),
            AssetTags::GRABBABLE,
        )
        .with_material("wood", vec3(0.6, 0.4, 0.2))
    }

    #[test]
    fn test_deliveries_from_another_thread_are_admitted_on_drain() {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        let mut inbox = AssetInbox::new();
        let sender = inbox.sender();

        thread::spawn(move || {
            assert!(sender.deliver(crate_node("crate-a", 0.0)));
            assert!(sender.deliver(crate_node("crate-b", 1.0)));
        })
        .join()
        .unwrap();

        let intake = inbox.drain(&mut context);

        assert_eq!(intake.grabbables.len(), 2);
        assert_eq!(context.grabbables.len(), 2);
        assert_eq!(context.physics.body_count(), 2);
        assert!(inbox.drain(&mut context).is_empty());
    }

    #[test]
    fn test_nodes_naming_the_same_material_share_it() {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        let mut inbox = AssetInbox::new();
        inbox.sender().deliver(crate_node("crate-a", 0.0));
        inbox.sender().deliver(crate_node("crate-b", 1.0));

        let intake = inbox.drain(&mut context);

        let nodes: Vec<NodeId> = intake
            .grabbables
            .iter()
            .map(|id| context.grabbables.get(*id).unwrap().node)
            .collect();
        let a = context.scene.material(nodes[0]).unwrap();
        let b = context.scene.material(nodes[1]).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_asset_tagged_both_ways_becomes_teleport_surface_only() {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        let mut inbox = AssetInbox::new();
        inbox.sender().deliver(AssetNode::new(
            "platform",
            Matrix4::identity(),
            SharedShape::halfspace(NVector3::y_axis()),
            AssetTags::GRABBABLE | AssetTags::TELEPORT_SURFACE,
        ));

        let intake = inbox.drain(&mut context);

        assert_eq!(intake.teleport_surfaces.len(), 1);
        assert!(intake.grabbables.is_empty());
        assert!(context.grabbables.is_empty());
        assert!(context.teleport_surfaces.contains(intake.teleport_surfaces[0]));
        assert!(!context.physics.has_body(intake.teleport_surfaces[0]));
    }

    #[test]
    fn test_failed_loads_insert_nothing() {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        let nodes_before = context.scene.len();
        let mut inbox = AssetInbox::new();
        inbox
            .sender()
            .fail(AssetLoadError::new("statue.glb", "unexpected end of file"));

        let intake = inbox.drain(&mut context);

        assert_eq!(intake.failures, 1);
        assert_eq!(context.scene.len(), nodes_before);
        assert!(context.grabbables.is_empty());
    }

    #[test]
    fn test_untagged_assets_are_plain_scenery() {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        let mut inbox = AssetInbox::new();
        inbox.sender().deliver(AssetNode::new(
            "lamp",
            Matrix4::from_translation(vec3(0.0, 2.0, 0.0)),
            SharedShape::ball(0.1),
            AssetTags::empty(),
        ));

        let intake = inbox.drain(&mut context);

        assert_eq!(intake.scenery.len(), 1);
        assert_eq!(context.scene.parent(intake.scenery[0]), Some(context.world_group));
        assert_eq!(context.physics.body_count(), 0);
    }
}
