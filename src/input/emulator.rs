use glam::{EulerRot, Quat};

use super::command::{InputCommand, TargetRayMode};

/// Stands in for a headset and controller on a desktop.
///
/// Dragging with the right mouse button turns the head; Space or the left
/// button holds select; C and G connect a tracked-pointer or gaze
/// controller and X disconnects it.
pub struct DesktopEmulator {
    pub yaw: f32,
    pub pitch: f32,
    pub rotate_speed: f32,
    pub max_pitch: f32,
    look_pressed: bool,
    select_mouse: bool,
    select_key: bool,
    last_mouse_pos: Option<(f32, f32)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmulatorKey {
    Select,
    ConnectPointer,
    ConnectGaze,
    Disconnect,
}

impl Default for DesktopEmulator {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            rotate_speed: 0.005,
            max_pitch: 85.0_f32.to_radians(),
            look_pressed: false,
            select_mouse: false,
            select_key: false,
            last_mouse_pos: None,
        }
    }
}

impl DesktopEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `0` is the left button, `1` the right one.
    pub fn on_mouse_button(&mut self, button: u8, pressed: bool) -> Option<InputCommand> {
        match button {
            0 => {
                let was = self.select_held();
                self.select_mouse = pressed;
                self.select_edge(was)
            }
            1 => {
                self.look_pressed = pressed;
                None
            }
            _ => None,
        }
    }

    pub fn on_mouse_move(&mut self, x: f32, y: f32) {
        let Some((last_x, last_y)) = self.last_mouse_pos.replace((x, y)) else {
            return;
        };
        if self.look_pressed {
            self.rotate(x - last_x, y - last_y);
        }
    }

    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw -= delta_x * self.rotate_speed;
        self.pitch = (self.pitch - delta_y * self.rotate_speed).clamp(-self.max_pitch, self.max_pitch);
    }

    /// Key repeats while held are ignored.
    pub fn on_key(&mut self, key: EmulatorKey, pressed: bool) -> Option<InputCommand> {
        match key {
            EmulatorKey::Select => {
                let was = self.select_held();
                self.select_key = pressed;
                self.select_edge(was)
            }
            EmulatorKey::ConnectPointer if pressed => Some(InputCommand::Connect(TargetRayMode::TrackedPointer)),
            EmulatorKey::ConnectGaze if pressed => Some(InputCommand::Connect(TargetRayMode::Gaze)),
            EmulatorKey::Disconnect if pressed => {
                self.select_mouse = false;
                self.select_key = false;
                Some(InputCommand::Disconnect)
            }
            _ => None,
        }
    }

    pub fn head_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    fn select_held(&self) -> bool {
        self.select_mouse || self.select_key
    }

    fn select_edge(&self, was_held: bool) -> Option<InputCommand> {
        match (was_held, self.select_held()) {
            (false, true) => Some(InputCommand::SelectStart),
            (true, false) => Some(InputCommand::SelectEnd),
            _ => None,
        }
    }
}
