//! WebGPU rendering.
//!
//! The frame loop fills a [`LineBatch`] on the CPU; [`DebugRenderer`] uploads
//! and draws it.

pub mod context;
pub mod debug;
pub mod mesh;
pub mod pipeline;

pub use context::GpuContext;
pub use debug::{acquire_frame, DebugRenderer};
pub use mesh::{LineBatch, LineVertex};
pub use pipeline::LinePipeline;
