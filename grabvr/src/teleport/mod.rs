// Teleport locomotion
//
// While squeeze is held a controller aims at the teleport surfaces; a marker shows
// where the user would land. Releasing squeeze over a valid target moves the
// reference space so the tracking origin sits on that point.

pub mod marker;
pub mod surface;
pub mod teleport_system;

pub use marker::TeleportMarker;
pub use surface::{TeleportSurface, TeleportSurfaceSet};
pub use teleport_system::{TeleportConfig, TeleportHandState, TeleportSystem};
