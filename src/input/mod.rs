//! Controller input: commands queued by event handlers, applied once per frame.

mod command;
mod controller;
mod emulator;

pub use command::{InputCommand, InputQueue, TargetRayMode};
pub use controller::{build_indicator, ControllerState, InputBridge};
pub use emulator::{DesktopEmulator, EmulatorKey};
