//! The per-frame loop.
//!
//! A [`Session`] owns everything one running room needs. The host calls
//! [`Session::tick`] from its refresh callback; until every model load has
//! resolved the tick only reports loading progress, after which models are
//! placed once and the full frame runs: keep the video playing, apply queued
//! controller input, step locomotion, render.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Quat, Vec3};
use web_time::Instant;

use crate::assets::{AssetLoader, LoadEvent, LoadId, LoadReporter, LoadTracker, ModelData};
use crate::collision::ColliderSet;
use crate::config::{AppConfig, ModelPlacement};
use crate::input::{ControllerState, InputBridge, InputCommand, InputQueue};
use crate::locomotion::{Locomotion, StepReport};
use crate::scene::{DollyRig, Scene, Stage};
use crate::video::{PlaybackGuard, VideoSource};

/// Where the emulated controller sits relative to the dolly.
const CONTROLLER_OFFSET: Vec3 = Vec3::new(0.25, 1.2, -0.3);

/// Seconds between ticks. The first tick after construction or
/// [`FrameClock::reset`] reports zero.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self
            .last
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Read-only snapshot handed to the renderer each frame.
pub struct FrameView<'a> {
    pub scene: &'a Scene,
    pub rig: &'a DollyRig,
    pub colliders: &'a ColliderSet,
    pub controller: Option<&'a ControllerState>,
    /// `Some(fraction)` while models are still loading.
    pub loading: Option<f32>,
    pub last_step: Option<StepReport>,
}

pub trait FrameRenderer {
    fn render(&mut self, view: &FrameView<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePhase {
    Loading { progress: f32 },
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStatus {
    pub phase: FramePhase,
    pub dt: f32,
    pub commands_applied: usize,
    pub video_playing: bool,
    pub step: Option<StepReport>,
}

pub struct Session {
    config: AppConfig,
    stage: Stage,
    input: InputQueue,
    bridge: InputBridge,
    clock: FrameClock,
    video: Box<dyn VideoSource>,
    playback: PlaybackGuard,
    loader: AssetLoader,
    tracker: LoadTracker,
    pending: HashMap<LoadId, ModelPlacement>,
    loaded: Vec<(ModelPlacement, Arc<ModelData>)>,
    locomotion: Locomotion,
    last_step: Option<StepReport>,
}

impl Session {
    pub fn new(config: AppConfig, aspect: f32, video: Box<dyn VideoSource>) -> Self {
        let mut stage = Stage::build(&config, aspect);
        let bridge = InputBridge::new(&mut stage.scene, stage.rig.dolly, CONTROLLER_OFFSET);
        let locomotion = Locomotion::new(config.locomotion);

        Self {
            config,
            stage,
            input: InputQueue::new(),
            bridge,
            clock: FrameClock::new(),
            video,
            playback: PlaybackGuard::new(),
            loader: AssetLoader::new(),
            tracker: LoadTracker::new(),
            pending: HashMap::new(),
            loaded: Vec::new(),
            locomotion,
            last_step: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn tracker(&self) -> &LoadTracker {
        &self.tracker
    }

    pub fn controller(&self) -> Option<&ControllerState> {
        self.bridge.controller()
    }

    pub fn video(&self) -> &dyn VideoSource {
        self.video.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.tracker.is_open()
    }

    /// Reads every configured model from disk on worker threads.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_models_from_disk(&mut self) {
        for placement in self.config.assets.models.clone() {
            let path = self.config.assets.resolve(&placement);
            log::info!("loading {}", path.display());
            let id = self.loader.load_file(path);
            self.track(id, placement);
        }
    }

    /// Registers a load the caller performs itself (e.g. a browser fetch) and
    /// returns the handle to report through.
    pub fn begin_load(&mut self, placement: ModelPlacement) -> LoadReporter {
        let path = self.config.assets.resolve(&placement);
        let reporter = self.loader.reporter(path);
        self.track(reporter.id(), placement);
        reporter
    }

    /// Decodes a model that is already in memory.
    pub fn load_bytes(&mut self, placement: ModelPlacement, bytes: &[u8]) -> LoadId {
        let id = self.loader.load_bytes(placement.file.clone(), bytes);
        self.track(id, placement);
        id
    }

    fn track(&mut self, id: LoadId, placement: ModelPlacement) {
        self.tracker.track(id, placement.file.clone());
        self.pending.insert(id, placement);
    }

    pub fn push_input(&mut self, command: InputCommand) {
        self.input.push(command);
    }

    pub fn set_head_rotation(&mut self, rotation: Quat) {
        self.stage.rig.set_head_rotation(&mut self.stage.scene, rotation);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.stage.rig.set_aspect(&mut self.stage.scene, width as f32 / height as f32);
        }
    }

    pub fn tick(&mut self, renderer: &mut dyn FrameRenderer) -> FrameStatus {
        let dt = self.clock.tick();
        self.tick_with_delta(dt, renderer)
    }

    /// One frame with an explicit elapsed time.
    pub fn tick_with_delta(&mut self, dt: f32, renderer: &mut dyn FrameRenderer) -> FrameStatus {
        self.poll_loads();

        if !self.tracker.is_open() {
            if self.tracker.open_barrier() {
                self.place_loaded_models();
            } else {
                let progress = self.tracker.progress();
                renderer.render(&self.view(Some(progress)));
                return FrameStatus {
                    phase: FramePhase::Loading { progress },
                    dt,
                    commands_applied: 0,
                    video_playing: self.video.is_playing(),
                    step: None,
                };
            }
        }

        let video_playing = self.playback.ensure_playing(self.video.as_mut());
        self.video.advance(dt);

        let commands_applied = self.bridge.drain(&mut self.stage.scene, &mut self.input);

        self.last_step = if self.bridge.controller().is_some() {
            self.locomotion.step(
                &mut self.stage.scene,
                &self.stage.rig,
                Some(&self.stage.colliders),
                self.bridge.select_pressed(),
                dt,
            )
        } else {
            None
        };

        renderer.render(&self.view(None));

        FrameStatus {
            phase: FramePhase::Running,
            dt,
            commands_applied,
            video_playing,
            step: self.last_step,
        }
    }

    fn poll_loads(&mut self) {
        for message in self.loader.poll() {
            if !self.tracker.apply(&message) {
                continue;
            }
            if let LoadEvent::Loaded(model) = message.event {
                let Some(placement) = self.pending.remove(&message.id) else {
                    continue;
                };
                if self.tracker.is_open() {
                    log::info!("placing late load {}", placement.file);
                    self.stage.place_model(&placement, model);
                } else {
                    self.loaded.push((placement, model));
                }
            } else if message.event.is_final() {
                self.pending.remove(&message.id);
            }
        }
    }

    fn place_loaded_models(&mut self) {
        for (placement, model) in std::mem::take(&mut self.loaded) {
            self.stage.place_model(&placement, model);
        }

        let failed = self.tracker.failures().count();
        if failed > 0 {
            log::warn!("starting with {failed} model(s) missing");
        }
        log::info!(
            "all loads resolved; {} colliders, dolly at {:?}",
            self.stage.colliders.len(),
            self.stage.dolly_position()
        );
    }

    fn view(&self, loading: Option<f32>) -> FrameView<'_> {
        FrameView {
            scene: &self.stage.scene,
            rig: &self.stage.rig,
            colliders: &self.stage.colliders,
            controller: self.bridge.controller(),
            loading,
            last_step: self.last_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::tests::triangle_gltf;
    use crate::video::PlaybackClock;

    struct Discard;

    impl FrameRenderer for Discard {
        fn render(&mut self, _view: &FrameView<'_>) {}
    }

    #[test]
    fn first_clock_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(), 0.0);
        assert!(clock.tick() >= 0.0);
        clock.reset();
        assert_eq!(clock.tick(), 0.0);
    }

    #[test]
    fn loaded_models_are_placed_once_the_barrier_opens() {
        let mut config = AppConfig::default();
        config.assets.models.clear();
        let mut session = Session::new(config, 1.0, Box::new(PlaybackClock::new()));
        session.load_bytes(ModelPlacement::new("triangle.gltf", Vec3::ZERO).collidable(), &triangle_gltf());
        assert!(session.stage().colliders.is_empty());

        let status = session.tick_with_delta(0.0, &mut Discard);
        assert_eq!(status.phase, FramePhase::Running);
        assert_eq!(session.stage().colliders.len(), 1);
        assert!(session.stage().scene.find("triangle.gltf").is_some());

        session.tick_with_delta(0.0, &mut Discard);
        assert_eq!(session.stage().colliders.len(), 1);
    }

    #[test]
    fn loads_started_after_startup_are_placed_when_they_resolve() {
        let mut config = AppConfig::default();
        config.assets.models.clear();
        let mut session = Session::new(config, 1.0, Box::new(PlaybackClock::new()));
        assert_eq!(session.tick_with_delta(0.0, &mut Discard).phase, FramePhase::Running);

        session.load_bytes(ModelPlacement::new("late.gltf", Vec3::ZERO).collidable(), &triangle_gltf());
        for _ in 0..3 {
            assert_eq!(session.tick_with_delta(0.0, &mut Discard).phase, FramePhase::Running);
        }

        assert!(session.stage().scene.find("late.gltf").is_some());
        assert_eq!(session.stage().colliders.len(), 1);
        assert!(session.loaded.is_empty());
    }
}
