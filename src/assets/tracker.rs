use super::loader::{LoadEvent, LoadId, LoadMessage};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Pending,
    /// Fraction in `[0, 1]`, or `None` when the total size is unknown.
    InProgress(Option<f32>),
    Loaded,
    Failed(String),
}

impl LoadState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Loaded | Self::Failed(_))
    }

    fn fraction(&self) -> f32 {
        match self {
            Self::Pending => 0.0,
            Self::InProgress(fraction) => fraction.unwrap_or(0.0),
            Self::Loaded | Self::Failed(_) => 1.0,
        }
    }
}

#[derive(Debug)]
struct Entry {
    id: LoadId,
    label: String,
    state: LoadState,
}

/// Startup barrier over every required load.
///
/// The barrier opens once all tracked loads are resolved, successfully or
/// not; [`LoadTracker::open_barrier`] reports that transition exactly once.
#[derive(Debug, Default)]
pub struct LoadTracker {
    entries: Vec<Entry>,
    opened: bool,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, id: LoadId, label: impl Into<String>) {
        self.entries.push(Entry {
            id,
            label: label.into(),
            state: LoadState::Pending,
        });
    }

    /// Updates the state of the load `message` belongs to. Messages for
    /// untracked or already resolved loads are ignored and return `false`.
    pub fn apply(&mut self, message: &LoadMessage) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == message.id) else {
            return false;
        };
        if entry.state.is_resolved() {
            return false;
        }

        entry.state = match &message.event {
            LoadEvent::Progress { loaded, total } => LoadState::InProgress(
                total
                    .filter(|&t| t > 0)
                    .map(|t| (*loaded as f32 / t as f32).clamp(0.0, 1.0)),
            ),
            LoadEvent::Loaded(model) => {
                log::info!("loaded {} ({} triangles)", entry.label, model.triangle_count());
                LoadState::Loaded
            }
            LoadEvent::Failed(err) => {
                log::error!("failed to load {}: {err}", entry.label);
                LoadState::Failed(err.to_string())
            }
        };
        true
    }

    pub fn state(&self, id: LoadId) -> Option<&LoadState> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.state)
    }

    pub fn label(&self, id: LoadId) -> Option<&str> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.label.as_str())
    }

    /// Mean completion over all tracked loads; 1.0 with nothing tracked.
    pub fn progress(&self) -> f32 {
        if self.entries.is_empty() {
            return 1.0;
        }
        self.entries.iter().map(|e| e.state.fraction()).sum::<f32>() / self.entries.len() as f32
    }

    pub fn is_resolved(&self) -> bool {
        self.entries.iter().all(|e| e.state.is_resolved())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().filter_map(|e| match &e.state {
            LoadState::Failed(reason) => Some((e.label.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// `true` on the first call after every load resolved, `false` before
    /// and after.
    pub fn open_barrier(&mut self) -> bool {
        if self.opened || !self.is_resolved() {
            return false;
        }
        self.opened = true;
        true
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetLoader;
    use crate::error::AssetError;
    use std::path::PathBuf;

    #[test]
    fn barrier_waits_for_every_load_and_opens_once() {
        let mut loader = AssetLoader::new();
        let room = loader.reporter("redroom.glb");
        let egg = loader.reporter("egg.glb");

        let mut tracker = LoadTracker::new();
        tracker.track(room.id(), "redroom.glb");
        tracker.track(egg.id(), "egg.glb");

        room.progress(50, Some(100));
        for m in loader.poll() {
            tracker.apply(&m);
        }
        assert!((tracker.progress() - 0.25).abs() < 1e-6);
        assert!(!tracker.open_barrier());

        room.finish(Err(AssetError::EmptyModel(PathBuf::from("redroom.glb"))));
        for m in loader.poll() {
            tracker.apply(&m);
        }
        assert!(!tracker.is_resolved());

        egg.finish(Err(AssetError::EmptyModel(PathBuf::from("egg.glb"))));
        for m in loader.poll() {
            tracker.apply(&m);
        }

        assert!(tracker.is_resolved());
        assert_eq!(tracker.failures().count(), 2);
        assert!(tracker.open_barrier());
        assert!(!tracker.open_barrier());
        assert!(tracker.is_open());
    }

    #[test]
    fn resolved_loads_ignore_late_progress() {
        let mut loader = AssetLoader::new();
        let reporter = loader.reporter("egg.glb");
        let id = reporter.id();
        let mut tracker = LoadTracker::new();
        tracker.track(id, "egg.glb");

        drop(reporter);
        let late = LoadMessage {
            id,
            event: LoadEvent::Progress { loaded: 1, total: Some(2) },
        };
        for m in loader.poll() {
            assert!(tracker.apply(&m));
        }
        assert!(!tracker.apply(&late));
        assert!(matches!(tracker.state(id), Some(LoadState::Failed(_))));
    }

    #[test]
    fn nothing_tracked_is_immediately_resolved() {
        let mut tracker = LoadTracker::new();
        assert_eq!(tracker.progress(), 1.0);
        assert!(tracker.open_barrier());
    }
}
