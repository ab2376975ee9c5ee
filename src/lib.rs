//! # xr-locomotion
//!
//! Controller-driven room locomotion with ray-cast wall avoidance.
//!
//! While the controller's select button is held the user's dolly walks toward
//! where the head is looking. Rays cast from eye height stop the walk short of
//! walls and push the dolly back out when a wall is too close at the side.
//!
//! ## Features
//! - Scene graph with a dolly / camera / head-proxy rig
//! - Box, sphere and triangle-mesh colliders with nearest-hit ray queries
//! - glTF/GLB model loading with progress and a startup barrier
//! - Controller input as a command queue, with desktop emulation
//! - wgpu line renderer, native (winit + egui HUD) and WASM shells
//!
//! ## Example
//! ```rust
//! use xr_locomotion::{ColliderSet, DollyRig, Locomotion, LocomotionConfig, PerspectiveCamera, Scene};
//! use glam::Vec3;
//!
//! let mut scene = Scene::default();
//! let rig = DollyRig::attach(&mut scene, Vec3::ZERO, Vec3::new(0.0, 1.6, 0.0), PerspectiveCamera::default());
//!
//! let mut walls = ColliderSet::new();
//! walls.add_box(Vec3::new(0.0, 1.0, -1.0), Vec3::new(5.0, 2.0, 0.05));
//!
//! let locomotion = Locomotion::new(LocomotionConfig::default());
//! let report = locomotion.step(&mut scene, &rig, Some(&walls), true, 1.0 / 60.0).unwrap();
//! assert!(!report.moved_forward);
//! ```

pub mod assets;
pub mod collision;
pub mod config;
pub mod error;
pub mod frame;
pub mod input;
pub mod locomotion;
pub mod math;
pub mod render;
pub mod scene;
pub mod video;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use assets::{AssetLoader, LoadEvent, LoadState, LoadTracker, ModelData, ModelFormat};
pub use collision::{BoxCollider, Collider, ColliderSet, MeshCollider, Ray, RayHit, SphereCollider};
pub use config::{AppConfig, ColliderConfig, LocomotionConfig, ModelPlacement};
pub use error::{AssetError, ConfigError, RenderError, VideoError};
pub use frame::{FrameClock, FramePhase, FrameRenderer, FrameStatus, FrameView, Session};
pub use input::{DesktopEmulator, EmulatorKey, InputBridge, InputCommand, InputQueue, TargetRayMode};
pub use locomotion::{Locomotion, StepReport};
pub use math::Transform;
pub use scene::{DollyRig, PerspectiveCamera, Scene, Stage};
pub use video::{PlaybackClock, PlaybackGuard, VideoSource};
