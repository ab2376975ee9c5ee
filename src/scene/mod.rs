//! Scene graph and setup.
//!
//! A small arena of transform nodes stands in for the host engine's scene
//! graph: the dolly rig, lights, the video screen, controller indicators and
//! loaded models all live here.

mod bootstrap;
mod camera;
mod geometry;
mod graph;
mod rig;

pub use bootstrap::Stage;
pub use camera::PerspectiveCamera;
pub use geometry::{Color, Geometry, Material, Mesh, Topology};
pub use graph::{Node, NodeContent, NodeId, Scene};
pub use rig::DollyRig;
