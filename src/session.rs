//! Per-view state, owned by the host.
//!
//! A [`RenderSession`] holds every buffer and accumulator a view needs and is
//! handed to the host by value. Nothing lives in globals, so two sessions
//! never share state.

use std::time::Instant;

use winit::event::WindowEvent;

use crate::alpha::VoxelAlphaBuffer;
use crate::config::ViewConfig;
use crate::decay::{DecayLadder, PixelDecayPainter};
use crate::error::{ConfigError, ViewError};
use crate::interaction::InteractionController;
use crate::lattice::ParticleLattice;
use crate::pixels::PixelBuffer;
use crate::render::RenderTarget;
use crate::scheduler::{CameraRig, CancelToken, FrameScheduler, FrameStatus, RotationMode, TickOutcome};
use crate::snapshot::{Frame, Snapshot2D, Snapshot3D};
use crate::source::StateSource;

/// Everything one view owns.
pub struct RenderSession {
    config: ViewConfig,
    pixels: PixelBuffer,
    painter: PixelDecayPainter,
    lattice: ParticleLattice,
    alpha: VoxelAlphaBuffer,
    interaction: InteractionController,
    rig: CameraRig,
    scheduler: FrameScheduler,
    last_status: Option<FrameStatus>,
}

impl RenderSession {
    /// Create a session with a flat-view buffer of `width * height` pixels.
    pub fn new(config: ViewConfig, width: usize, height: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "render session: {}x{} pixels, frame limit {}, ladder {:?}",
            width,
            height,
            config.frame_rate_limit,
            config.decay_ladder
        );
        Ok(Self {
            pixels: PixelBuffer::new(width, height),
            painter: PixelDecayPainter::new(
                width,
                height,
                DecayLadder::new(config.decay_ladder.clone()),
                config.brand_color,
            ),
            lattice: ParticleLattice::new(config.cell_spacing, config.plane_spacing),
            alpha: VoxelAlphaBuffer::new(config.lit_opacity),
            interaction: InteractionController::new(&config),
            rig: CameraRig::new(&config),
            scheduler: FrameScheduler::new(&config),
            last_status: None,
            config,
        })
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn painter(&self) -> &PixelDecayPainter {
        &self.painter
    }

    pub fn lattice(&self) -> &ParticleLattice {
        &self.lattice
    }

    pub fn alpha(&self) -> &VoxelAlphaBuffer {
        &self.alpha
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut InteractionController {
        &mut self.interaction
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    /// Status of the last rendered frame.
    pub fn status(&self) -> Option<FrameStatus> {
        self.last_status
    }

    /// Rotation mode right now.
    pub fn mode(&self, now: Instant) -> RotationMode {
        self.scheduler.mode(&self.interaction, now)
    }

    // ========== State in ==========

    /// Decode a frame from the state source and hand it to the renderer.
    ///
    /// On error the frame is skipped: buffers keep their previous contents
    /// and the renderer is not touched.
    pub fn present<T: RenderTarget>(&mut self, frame: &Frame, target: &mut T) -> Result<(), ViewError> {
        match frame {
            Frame::Flat(snapshot) => self.present_flat(snapshot, target),
            Frame::Volume(snapshot) => self.present_volume(snapshot, target),
            Frame::PackedVolume(layers) => {
                let snapshot = Snapshot3D::from_packed(layers, self.config.unit_bit_width)
                    .inspect_err(|e| log::warn!("skipping packed volume frame: {}", e))?;
                self.present_volume(&snapshot, target)
            }
        }
    }

    pub fn present_flat<T: RenderTarget>(&mut self, snapshot: &Snapshot2D, target: &mut T) -> Result<(), ViewError> {
        if let Err(e) = self.painter.paint(&mut self.pixels, snapshot) {
            log::warn!("skipping flat frame: {}", e);
            return Err(e);
        }
        target.write_pixels(&self.pixels);
        Ok(())
    }

    pub fn present_volume<T: RenderTarget>(&mut self, snapshot: &Snapshot3D, target: &mut T) -> Result<(), ViewError> {
        if let Err(e) = self.alpha.update(&mut self.lattice, snapshot, target) {
            log::warn!("skipping volume frame: {}", e);
            return Err(e);
        }
        self.alpha.flush(target);
        Ok(())
    }

    /// Drop the particle lattice so the next volume frame rebuilds it.
    pub fn reset_lattice(&mut self) {
        self.lattice.reset();
    }

    /// Reallocate the flat-view buffer, clearing all fade trails.
    pub fn resize_pixels(&mut self, width: usize, height: usize) {
        self.pixels.resize(width, height);
        self.painter.resize(width, height);
    }

    // ========== Input ==========

    /// Feed a window event to the interaction controller, applying any
    /// rotation it produces.
    pub fn handle_window_event(&mut self, event: &WindowEvent, now: Instant) {
        if let Some(delta) = self.interaction.handle_window_event(event, now) {
            self.rig.orientation.rotate(delta);
        }
    }

    // ========== Frame loop ==========

    /// Pull the next frame from `source`, present it and tick, all only if
    /// this tick will render.
    ///
    /// A throttled or cancelled tick leaves the source untouched, so state
    /// advances at the rendered frame rate and a paused view consumes no
    /// frames. Frame errors are logged and the tick still runs.
    pub fn advance<S, T>(&mut self, now: Instant, source: &mut S, target: &mut T) -> TickOutcome
    where
        S: StateSource + ?Sized,
        T: RenderTarget,
    {
        if let Some(outcome) = self.scheduler.hold(now) {
            return outcome;
        }
        if let Some(frame) = source.next_frame() {
            let _ = self.present(&frame, target);
        }
        self.tick(now, target)
    }

    pub fn tick<T: RenderTarget>(&mut self, now: Instant, target: &mut T) -> TickOutcome {
        let outcome = self.scheduler.tick(now, &mut self.rig, &mut self.interaction, target);
        if let TickOutcome::Rendered(status) = outcome {
            self.last_status = Some(status);
        }
        outcome
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.scheduler.cancel_token()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Stop the frame loop.
    pub fn stop(&self) {
        self.scheduler.cancel_token().cancel();
    }

    /// Restart a stopped frame loop.
    pub fn restart(&mut self) -> CancelToken {
        self.scheduler.restart()
    }

    pub fn set_frame_rate_limit(&mut self, limit: u32) {
        self.config.frame_rate_limit = limit;
        self.scheduler.set_frame_rate_limit(limit);
    }
}
