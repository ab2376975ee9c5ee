use std::time::{Duration, Instant};

use glam::{Quat, Vec3};
use xr_locomotion::{
    AppConfig, ColliderConfig, FramePhase, FrameRenderer, FrameView, InputCommand, LoadState, ModelPlacement,
    PlaybackClock, Session, TargetRayMode, VideoError, VideoSource,
};

#[derive(Default)]
struct Recorder {
    frames: usize,
    loading: Vec<f32>,
    dolly: Vec<Vec3>,
}

impl FrameRenderer for Recorder {
    fn render(&mut self, view: &FrameView<'_>) {
        self.frames += 1;
        if let Some(progress) = view.loading {
            self.loading.push(progress);
        }
        if let Some(position) = view.scene.world_position(view.rig.dolly) {
            self.dolly.push(position);
        }
    }
}

fn empty_room() -> AppConfig {
    let mut config = AppConfig::default();
    config.assets.models.clear();
    config
}

fn session(config: AppConfig) -> Session {
    Session::new(config, 16.0 / 9.0, Box::new(PlaybackClock::new()))
}

#[test]
fn nothing_to_load_runs_on_the_first_tick() {
    let mut session = session(empty_room());
    let mut recorder = Recorder::default();

    let status = session.tick_with_delta(0.016, &mut recorder);

    assert_eq!(status.phase, FramePhase::Running);
    assert!(status.video_playing);
    assert!(session.is_running());
    assert_eq!(recorder.frames, 1);
    assert!(recorder.loading.is_empty());
}

#[test]
fn failed_loads_still_open_the_barrier() {
    let mut session = session(empty_room());
    session.load_bytes(ModelPlacement::new("egg.fbx", Vec3::ZERO), b"Kaydara FBX Binary  \x00");
    let mut recorder = Recorder::default();

    let status = session.tick_with_delta(0.016, &mut recorder);

    assert_eq!(status.phase, FramePhase::Running);
    assert_eq!(session.tracker().failures().count(), 1);
    assert!(session.stage().scene.find("egg.fbx").is_none());
}

#[test]
fn pending_loads_hold_the_loop_in_loading() {
    let mut session = session(empty_room());
    let reporter = session.begin_load(ModelPlacement::new("redroom.glb", Vec3::ZERO).collidable());
    let id = reporter.id();
    let mut recorder = Recorder::default();

    session.push_input(InputCommand::Connect(TargetRayMode::Gaze));
    session.push_input(InputCommand::SelectStart);

    reporter.progress(25, Some(100));
    let status = session.tick_with_delta(0.5, &mut recorder);
    assert_eq!(status.phase, FramePhase::Loading { progress: 0.25 });
    assert_eq!(status.commands_applied, 0);
    assert!(session.controller().is_none());
    assert_eq!(session.stage().dolly_position(), Vec3::new(0.0, 0.0, -2.0));

    drop(reporter);
    let status = session.tick_with_delta(0.5, &mut recorder);
    assert_eq!(status.phase, FramePhase::Running);
    // Input queued while loading is applied on the first running frame.
    assert_eq!(status.commands_applied, 2);
    assert!(status.step.is_some());
    assert_eq!(recorder.loading, vec![0.25]);
    assert!(matches!(session.tracker().state(id), Some(LoadState::Failed(_))));
}

#[test]
fn held_select_walks_the_dolly_until_a_wall() {
    let mut config = empty_room();
    // Wall face 3 m ahead of the dolly's starting point at z = -2.
    config.colliders.push(ColliderConfig::Box {
        center: Vec3::new(0.0, 1.0, -5.1),
        half_extents: Vec3::new(5.0, 2.0, 0.1),
    });
    let mut session = session(config);
    let mut recorder = Recorder::default();

    session.push_input(InputCommand::Connect(TargetRayMode::TrackedPointer));
    session.push_input(InputCommand::SelectStart);
    for _ in 0..100 {
        session.tick_with_delta(0.05, &mut recorder);
    }

    let z = session.stage().dolly_position().z;
    // Stops once the wall is inside the 1.3 m limit: never closer than one step past it.
    assert!(z < -3.5, "dolly stopped early at z = {z}");
    assert!(z > -5.0 + 1.3 - 0.1 - 1e-4, "dolly walked into the wall at z = {z}");
    assert!(recorder.dolly.iter().all(|p| p.y == 0.0));

    session.push_input(InputCommand::SelectEnd);
    let status = session.tick_with_delta(0.05, &mut recorder);
    assert!(status.step.is_none());
}

#[test]
fn head_turn_steers_the_walk() {
    let mut session = session(empty_room());
    let mut recorder = Recorder::default();
    session.set_head_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));

    session.push_input(InputCommand::Connect(TargetRayMode::Gaze));
    session.push_input(InputCommand::SelectStart);
    session.tick_with_delta(0.5, &mut recorder);

    let position = session.stage().dolly_position();
    assert!((position - Vec3::new(-1.0, 0.0, -2.0)).length() < 1e-5);
}

#[test]
fn no_controller_means_no_locomotion() {
    let mut session = session(empty_room());
    let mut recorder = Recorder::default();

    session.push_input(InputCommand::SelectStart);
    let status = session.tick_with_delta(0.5, &mut recorder);

    assert!(status.step.is_none());
    assert_eq!(session.stage().dolly_position(), Vec3::new(0.0, 0.0, -2.0));
}

#[test]
fn disconnect_stops_the_walk_and_reconnect_starts_fresh() {
    let mut session = session(empty_room());
    let mut recorder = Recorder::default();

    session.push_input(InputCommand::Connect(TargetRayMode::TrackedPointer));
    session.push_input(InputCommand::SelectStart);
    session.tick_with_delta(0.1, &mut recorder);

    session.push_input(InputCommand::Disconnect);
    session.push_input(InputCommand::Connect(TargetRayMode::TrackedPointer));
    let before = session.stage().dolly_position();
    let status = session.tick_with_delta(0.1, &mut recorder);

    assert!(!session.controller().unwrap().select_pressed);
    assert!(status.step.is_none());
    assert_eq!(session.stage().dolly_position(), before);
}

struct Blocked;

impl VideoSource for Blocked {
    fn is_playing(&self) -> bool {
        false
    }

    fn play(&mut self) -> Result<(), VideoError> {
        Err(VideoError("autoplay blocked".into()))
    }
}

#[test]
fn video_failures_do_not_stop_the_frame() {
    let mut session = Session::new(empty_room(), 1.0, Box::new(Blocked));
    let mut recorder = Recorder::default();

    let status = session.tick_with_delta(0.016, &mut recorder);
    assert!(!status.video_playing);
    assert_eq!(recorder.frames, 1);
}

#[test]
fn missing_model_file_resolves_in_the_background() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = empty_room();
    config.assets.base_path = dir.path().to_path_buf();
    config.assets.models.push(ModelPlacement::new("missing.glb", Vec3::ZERO).collidable());

    let mut session = session(config);
    session.load_models_from_disk();
    let mut recorder = Recorder::default();

    let deadline = Instant::now() + Duration::from_secs(10);
    while !session.is_running() {
        assert!(Instant::now() < deadline, "load never resolved");
        session.tick(&mut recorder);
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(session.tracker().failures().count(), 1);
    assert!(session.stage().colliders.is_empty());
}
