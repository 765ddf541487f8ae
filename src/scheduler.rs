//! The frame loop.
//!
//! The host calls [`FrameScheduler::tick`] once per display refresh and keeps
//! requesting redraws until the tick reports [`TickOutcome::Cancelled`].
//!
//! Rotation is integrated over wall-clock time, not frame count: a late tick
//! simply sees a larger elapsed time, so the view turns at the same speed at
//! 20 fps and at 144 fps.
//!
//! ```ignore
//! let mut scheduler = FrameScheduler::new(&config);
//! let stop = scheduler.cancel_token();
//!
//! // In the redraw handler:
//! match scheduler.tick(Instant::now(), &mut rig, &mut input, &mut target) {
//!     TickOutcome::Cancelled => {}
//!     _ => window.request_redraw(),
//! }
//!
//! // Anywhere else, even another thread:
//! stop.cancel();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::camera::{Camera, Orientation, SceneTransform};
use crate::config::ViewConfig;
use crate::interaction::InteractionController;
use crate::render::RenderTarget;

/// Shared stop flag for a frame loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Whether the view is turning by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    Autonomous,
    Manual,
}

/// Status line for the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStatus {
    pub mode: RotationMode,
    /// Seconds until autonomous rotation resumes; 0 while autonomous.
    pub idle_countdown_secs: f32,
    /// Rendered frames per second.
    pub fps: f32,
    /// Frames rendered since the loop (re)started.
    pub frame: u64,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// A frame was drawn.
    Rendered(FrameStatus),
    /// Too early under the frame limit; nothing changed.
    Throttled,
    /// The loop was cancelled; nothing was drawn.
    Cancelled,
}

/// Orientation plus camera: everything the scheduler moves each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub orientation: Orientation,
    pub camera: Camera,
    /// Camera distance at zoom 1.0.
    pub base_distance: f32,
}

impl CameraRig {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            orientation: Orientation::default(),
            camera: Camera::new(
                config.camera_tilt_degrees.to_radians(),
                config.base_camera_distance,
                config.camera_fov_degrees.to_radians(),
            ),
            base_distance: config.base_camera_distance,
        }
    }

    pub fn transform(&self) -> SceneTransform {
        SceneTransform {
            orientation: self.orientation,
            camera: self.camera,
        }
    }
}

/// Frame-rate measurement over fixed windows.
#[derive(Debug, Clone)]
struct FpsCounter {
    fps: f32,
    frames: u64,
    window_frames: u64,
    window_start: Option<Instant>,
    interval: Duration,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            fps: 0.0,
            frames: 0,
            window_frames: 0,
            window_start: None,
            interval: Duration::from_millis(500),
        }
    }

    fn record(&mut self, now: Instant) {
        self.frames += 1;
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            self.window_frames = self.frames;
            return;
        };
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.interval {
            let frames_since = self.frames - self.window_frames;
            self.fps = frames_since as f32 / elapsed.as_secs_f32();
            self.window_frames = self.frames;
            self.window_start = Some(now);
        }
    }
}

/// Drives rotation, zoom and drawing.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    last_tick: Option<Instant>,
    min_interval: Option<Duration>,
    resume_threshold: Duration,
    angular_speed: f32,
    zoom_smoothing: f32,
    cancel: CancelToken,
    fps: FpsCounter,
}

impl FrameScheduler {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            last_tick: None,
            min_interval: config.min_frame_interval(),
            resume_threshold: config.resume_threshold(),
            angular_speed: config.angular_speed,
            zoom_smoothing: config.zoom_smoothing_factor,
            cancel: CancelToken::new(),
            fps: FpsCounter::new(),
        }
    }

    /// A handle that stops this loop.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Start over with a fresh token. The next tick has zero elapsed time,
    /// so the pause does not show up as a jump in rotation.
    pub fn restart(&mut self) -> CancelToken {
        self.cancel = CancelToken::new();
        self.last_tick = None;
        self.fps = FpsCounter::new();
        self.cancel.clone()
    }

    /// Change the frame limit; 0 removes it.
    pub fn set_frame_rate_limit(&mut self, limit: u32) {
        self.min_interval = (limit > 0).then(|| Duration::from_nanos(1_000_000_000 / u64::from(limit)));
    }

    /// Rotation mode at `now`.
    ///
    /// The view is manual while a drag is held or the last interaction is
    /// younger than the resume threshold.
    pub fn mode(&self, interaction: &InteractionController, now: Instant) -> RotationMode {
        if interaction.is_dragging() {
            return RotationMode::Manual;
        }
        match interaction.idle_time(now) {
            Some(idle) if idle <= self.resume_threshold => RotationMode::Manual,
            _ => RotationMode::Autonomous,
        }
    }

    /// The outcome a tick at `now` would return without drawing, if any.
    ///
    /// `None` means the next tick renders, so a host can pull new state
    /// only for frames that will actually be shown.
    pub fn hold(&self, now: Instant) -> Option<TickOutcome> {
        if self.cancel.is_cancelled() {
            return Some(TickOutcome::Cancelled);
        }
        match (self.min_interval, self.last_tick) {
            (Some(min), Some(last)) if now.saturating_duration_since(last) < min => Some(TickOutcome::Throttled),
            _ => None,
        }
    }

    /// Run one frame.
    pub fn tick<T: RenderTarget>(
        &mut self,
        now: Instant,
        rig: &mut CameraRig,
        interaction: &mut InteractionController,
        target: &mut T,
    ) -> TickOutcome {
        if let Some(outcome) = self.hold(now) {
            return outcome;
        }

        let elapsed = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);

        let mode = self.mode(interaction, now);
        if mode == RotationMode::Autonomous {
            rig.orientation.advance(self.angular_speed, elapsed.as_secs_f32());
        }

        let zoom = interaction.smooth_zoom(self.zoom_smoothing);
        rig.camera.distance = rig.base_distance / zoom;

        target.set_camera_transform(&rig.transform());
        if let Err(e) = target.render_frame() {
            log::warn!("render failed, continuing: {}", e);
        }
        self.fps.record(now);

        let idle_countdown_secs = match (mode, interaction.idle_time(now)) {
            (RotationMode::Manual, Some(idle)) => self.resume_threshold.saturating_sub(idle).as_secs_f32(),
            (RotationMode::Manual, None) => self.resume_threshold.as_secs_f32(),
            (RotationMode::Autonomous, _) => 0.0,
        };

        TickOutcome::Rendered(FrameStatus {
            mode,
            idle_countdown_secs,
            fps: self.fps.fps,
            frame: self.fps.frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FrameRecorder;
    use glam::Vec2;

    struct Harness {
        scheduler: FrameScheduler,
        rig: CameraRig,
        input: InteractionController,
        target: FrameRecorder,
    }

    impl Harness {
        fn new(config: ViewConfig) -> Self {
            Self {
                scheduler: FrameScheduler::new(&config),
                rig: CameraRig::new(&config),
                input: InteractionController::new(&config),
                target: FrameRecorder::new(),
            }
        }

        fn tick(&mut self, now: Instant) -> TickOutcome {
            self.scheduler.tick(now, &mut self.rig, &mut self.input, &mut self.target)
        }
    }

    #[test]
    fn first_tick_has_no_elapsed_time() {
        let mut h = Harness::new(ViewConfig::default());
        let outcome = h.tick(Instant::now());
        assert!(matches!(outcome, TickOutcome::Rendered(FrameStatus { mode: RotationMode::Autonomous, .. })));
        assert_eq!(h.rig.orientation.spin, 0.0);
        assert_eq!(h.target.frames, 1);
    }

    #[test]
    fn rotation_is_frame_rate_independent() {
        let config = ViewConfig {
            angular_speed: 1.0,
            ..Default::default()
        };
        let t0 = Instant::now();

        let mut coarse = Harness::new(config.clone());
        coarse.tick(t0);
        coarse.tick(t0 + Duration::from_millis(500));

        let mut fine = Harness::new(config);
        for i in 0..=5 {
            fine.tick(t0 + Duration::from_millis(100 * i));
        }

        assert!((coarse.rig.orientation.spin - 0.5).abs() < 1e-5);
        assert!((coarse.rig.orientation.spin - fine.rig.orientation.spin).abs() < 1e-5);
    }

    #[test]
    fn manual_mode_suppresses_rotation_until_idle() {
        let config = ViewConfig {
            angular_speed: 1.0,
            auto_rotate_resume_threshold_ms: 1_000,
            ..Default::default()
        };
        let mut h = Harness::new(config);
        let t0 = Instant::now();
        h.tick(t0);

        h.input.drag_start(Vec2::ZERO, t0);
        let delta = h.input.drag_move(Vec2::new(100.0, 0.0), t0).unwrap();
        h.rig.orientation.rotate(delta);
        h.input.drag_end();
        let manual_angle = h.rig.orientation.spin;

        let outcome = h.tick(t0 + Duration::from_millis(600));
        let TickOutcome::Rendered(status) = outcome else {
            panic!("expected a frame");
        };
        assert_eq!(status.mode, RotationMode::Manual);
        assert!((status.idle_countdown_secs - 0.4).abs() < 1e-3);
        assert_eq!(h.rig.orientation.spin, manual_angle);

        h.tick(t0 + Duration::from_millis(1_000));
        assert_eq!(h.rig.orientation.spin, manual_angle);

        // Resumes from the manual angle, advancing only by this tick's elapsed time.
        h.tick(t0 + Duration::from_millis(1_100));
        assert!((h.rig.orientation.spin - (manual_angle + 0.1)).abs() < 1e-5);
    }

    #[test]
    fn held_drag_stays_manual() {
        let config = ViewConfig {
            auto_rotate_resume_threshold_ms: 10,
            ..Default::default()
        };
        let mut h = Harness::new(config);
        let t0 = Instant::now();
        h.input.drag_start(Vec2::ZERO, t0);
        assert_eq!(h.scheduler.mode(&h.input, t0 + Duration::from_secs(5)), RotationMode::Manual);
    }

    #[test]
    fn frame_limit_throttles() {
        let config = ViewConfig {
            frame_rate_limit: 10,
            ..Default::default()
        };
        let mut h = Harness::new(config);
        let t0 = Instant::now();
        assert!(matches!(h.tick(t0), TickOutcome::Rendered(_)));
        assert_eq!(h.tick(t0 + Duration::from_millis(50)), TickOutcome::Throttled);
        assert!(matches!(h.tick(t0 + Duration::from_millis(100)), TickOutcome::Rendered(_)));
        assert_eq!(h.target.frames, 2);

        h.scheduler.set_frame_rate_limit(0);
        assert!(matches!(h.tick(t0 + Duration::from_millis(101)), TickOutcome::Rendered(_)));
    }

    #[test]
    fn hold_predicts_the_next_tick() {
        let config = ViewConfig {
            frame_rate_limit: 10,
            ..Default::default()
        };
        let mut h = Harness::new(config);
        let t0 = Instant::now();
        assert_eq!(h.scheduler.hold(t0), None);
        h.tick(t0);

        assert_eq!(h.scheduler.hold(t0 + Duration::from_millis(50)), Some(TickOutcome::Throttled));
        assert_eq!(h.scheduler.hold(t0 + Duration::from_millis(100)), None);

        h.scheduler.cancel_token().cancel();
        assert_eq!(h.scheduler.hold(t0 + Duration::from_millis(100)), Some(TickOutcome::Cancelled));
        assert_eq!(h.target.frames, 1);
    }

    #[test]
    fn cancel_stops_and_restart_resumes() {
        let mut h = Harness::new(ViewConfig::default());
        let token = h.scheduler.cancel_token();
        let t0 = Instant::now();
        h.tick(t0);

        token.cancel();
        assert!(!h.scheduler.is_running());
        assert_eq!(h.tick(t0 + Duration::from_millis(16)), TickOutcome::Cancelled);
        assert_eq!(h.target.frames, 1);

        let spin = h.rig.orientation.spin;
        h.scheduler.restart();
        h.tick(t0 + Duration::from_secs(60));
        assert_eq!(h.rig.orientation.spin, spin);
        assert_eq!(h.target.frames, 2);
    }

    #[test]
    fn zoom_moves_camera() {
        let mut h = Harness::new(ViewConfig::default());
        let t0 = Instant::now();
        for _ in 0..10 {
            h.input.wheel(Vec2::ZERO, 1.0, t0);
        }
        h.tick(t0);
        let expected = 1570.0 / h.input.current_zoom();
        assert!((h.rig.camera.distance - expected).abs() < 1e-2);
        assert!(h.rig.camera.distance < 1570.0);
        assert_eq!(h.target.transform.unwrap().camera.distance, h.rig.camera.distance);
    }

    #[test]
    fn fps_is_measured() {
        let mut h = Harness::new(ViewConfig::default());
        let t0 = Instant::now();
        let mut last = None;
        for i in 0..=30 {
            last = Some(h.tick(t0 + Duration::from_millis(20 * i)));
        }
        let Some(TickOutcome::Rendered(status)) = last else {
            panic!("expected a frame");
        };
        assert!((status.fps - 50.0).abs() < 1.0);
        assert_eq!(status.frame, 31);
    }
}
