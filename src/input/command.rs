use std::collections::VecDeque;

/// Pointer mode a controller reports on connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRayMode {
    TrackedPointer,
    Gaze,
    /// Anything else (e.g. `screen`); gets no indicator.
    Other(String),
}

impl From<&str> for TargetRayMode {
    fn from(mode: &str) -> Self {
        match mode {
            "tracked-pointer" => Self::TrackedPointer,
            "gaze" => Self::Gaze,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for TargetRayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrackedPointer => f.write_str("tracked-pointer"),
            Self::Gaze => f.write_str("gaze"),
            Self::Other(mode) => f.write_str(mode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Connect(TargetRayMode),
    Disconnect,
    SelectStart,
    SelectEnd,
}

/// Controller events in arrival order, drained once per frame.
#[derive(Debug, Default)]
pub struct InputQueue {
    pending: VecDeque<InputCommand>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: InputCommand) {
        self.pending.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = InputCommand> + '_ {
        self.pending.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_unknown_modes() {
        assert_eq!(TargetRayMode::from("tracked-pointer"), TargetRayMode::TrackedPointer);
        assert_eq!(TargetRayMode::from("gaze"), TargetRayMode::Gaze);
        assert_eq!(TargetRayMode::from("screen"), TargetRayMode::Other("screen".into()));
        assert_eq!(TargetRayMode::Other("screen".into()).to_string(), "screen");
    }

    #[test]
    fn drain_preserves_order_and_empties() {
        let mut queue = InputQueue::new();
        queue.push(InputCommand::Connect(TargetRayMode::Gaze));
        queue.push(InputCommand::SelectStart);
        queue.push(InputCommand::SelectEnd);

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![
                InputCommand::Connect(TargetRayMode::Gaze),
                InputCommand::SelectStart,
                InputCommand::SelectEnd,
            ]
        );
        assert!(queue.is_empty());
    }
}
