//! Keeps the screen's video source playing.

use crate::error::VideoError;

pub trait VideoSource {
    fn is_playing(&self) -> bool;

    fn play(&mut self) -> Result<(), VideoError>;

    /// Called once per frame with the elapsed time. Sources with their own
    /// clock ignore it.
    fn advance(&mut self, _dt: f32) {}

    /// Seconds of playback so far, for the HUD.
    fn current_time(&self) -> f64 {
        0.0
    }
}

/// Native stand-in for a video element: a playhead that advances with the
/// frame clock once started.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    playing: bool,
    position: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }
}

impl VideoSource for PlaybackClock {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) -> Result<(), VideoError> {
        self.playing = true;
        Ok(())
    }

    fn advance(&mut self, dt: f32) {
        if self.playing && dt.is_finite() && dt > 0.0 {
            self.position += f64::from(dt);
        }
    }

    fn current_time(&self) -> f64 {
        self.position
    }
}

/// Calls [`VideoSource::play`] whenever the source is paused. A run of
/// consecutive failures is logged once.
#[derive(Debug, Default)]
pub struct PlaybackGuard {
    failing: bool,
}

impl PlaybackGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the source is playing afterwards.
    pub fn ensure_playing(&mut self, source: &mut dyn VideoSource) -> bool {
        if source.is_playing() {
            self.failing = false;
            return true;
        }

        match source.play() {
            Ok(()) => {
                if self.failing {
                    log::info!("video playback resumed");
                }
                self.failing = false;
                true
            }
            Err(err) => {
                if !self.failing {
                    log::warn!("video playback failed: {err}");
                }
                self.failing = true;
                false
            }
        }
    }

    pub fn is_failing(&self) -> bool {
        self.failing
    }
}
