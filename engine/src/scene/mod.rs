pub mod material;
pub use material::{Material, SharedMaterial};

pub mod scene_graph;
pub use scene_graph::{Node, NodeId, SceneError, SceneGraph};
