//! The renderer capability the core draws through.
//!
//! The core never talks to a GPU directly. Everything it needs from a
//! renderer is in [`RenderTarget`]; [`crate::gpu::GpuRenderer`] implements it
//! with wgpu, and [`FrameRecorder`] implements it headlessly.

use glam::Vec3;

use crate::camera::SceneTransform;
use crate::pixels::PixelBuffer;

/// Something that can show a frame.
pub trait RenderTarget {
    /// Error returned by [`RenderTarget::render_frame`].
    type Error: std::fmt::Display;

    /// Register the particle positions. Called once per lattice build.
    fn upload_particles(&mut self, positions: &[Vec3]);

    /// Replace the per-particle opacity channel.
    fn update_opacity(&mut self, alphas: &[f32]);

    /// Replace the flat-view image.
    fn write_pixels(&mut self, pixels: &PixelBuffer);

    /// Set the transform shared by the planes and the particle system.
    fn set_camera_transform(&mut self, transform: &SceneTransform);

    /// Draw the current scene.
    fn render_frame(&mut self) -> Result<(), Self::Error>;
}

/// A headless target that records what it was asked to do.
///
/// Useful for tests and for driving a session without a window.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    /// Every particle upload, in order.
    pub uploads: Vec<Vec<Vec3>>,
    /// The most recent opacity channel.
    pub opacity: Vec<f32>,
    /// Number of opacity updates received.
    pub opacity_updates: usize,
    /// The most recent flat image.
    pub pixels: Option<PixelBuffer>,
    /// The most recent transform.
    pub transform: Option<SceneTransform>,
    /// Number of frames rendered.
    pub frames: usize,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderTarget for FrameRecorder {
    type Error = std::convert::Infallible;

    fn upload_particles(&mut self, positions: &[Vec3]) {
        self.uploads.push(positions.to_vec());
    }

    fn update_opacity(&mut self, alphas: &[f32]) {
        self.opacity.clear();
        self.opacity.extend_from_slice(alphas);
        self.opacity_updates += 1;
    }

    fn write_pixels(&mut self, pixels: &PixelBuffer) {
        self.pixels = Some(pixels.clone());
    }

    fn set_camera_transform(&mut self, transform: &SceneTransform) {
        self.transform = Some(*transform);
    }

    fn render_frame(&mut self) -> Result<(), Self::Error> {
        self.frames += 1;
        Ok(())
    }
}
