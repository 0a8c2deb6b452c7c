use cgmath::{Vector3, Zero};
use std::cell::RefCell;
use std::rc::Rc;

/// Materials are shared between nodes the way loaded meshes share them, so
/// mutating one through a [`SharedMaterial`] affects every node holding it.
pub type SharedMaterial = Rc<RefCell<Material>>;

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Vector3<f32>,
    pub emissive: Vector3<f32>,
}

impl Material {
    pub fn new(name: impl Into<String>, color: Vector3<f32>) -> Self {
        Self {
            name: name.into(),
            color,
            emissive: Vector3::zero(),
        }
    }

    pub fn into_shared(self) -> SharedMaterial {
        Rc::new(RefCell::new(self))
    }

    pub fn is_emissive(&self) -> bool {
        self.emissive != Vector3::zero()
    }

    /// Independent copy of a shared material; edits to the copy stay local.
    pub fn detached_copy(shared: &SharedMaterial) -> SharedMaterial {
        Rc::new(RefCell::new(shared.borrow().clone()))
    }
}
