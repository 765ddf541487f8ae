//! # lifeview
//!
//! Real-time viewer for binary cellular-automaton state, in 2D and 3D.
//!
//! The automaton runs elsewhere. lifeview pulls finished frames from a
//! [`StateSource`], decodes their packed bit rows, and draws them:
//!
//! - **Flat view**: each cell is one pixel. Cells that die fade through a
//!   short brightness ladder instead of vanishing.
//! - **Volume view**: each cell is a particle on a fixed lattice, lit cells
//!   opaque and dead cells invisible. The lattice turns on its own and stops
//!   while the user drags, resuming after a quiet spell.
//!
//! ## Quick Start
//!
//! ```ignore
//! use lifeview::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     Viewer::new(ViewConfig::default())
//!         .with_source(SweepSource::new(GridDims::new(8, 32, 32)))
//!         .run()
//! }
//! ```
//!
//! ## Headless use
//!
//! Everything except the window lives in a [`RenderSession`] that drives any
//! [`RenderTarget`]. [`FrameRecorder`] records what a GPU would have been
//! told, which is how the tests run without one:
//!
//! ```
//! use lifeview::prelude::*;
//!
//! let mut session = RenderSession::new(ViewConfig::default(), 8, 2).unwrap();
//! let mut target = FrameRecorder::new();
//! let frame = Frame::Flat(Snapshot2D::from_cells(8, &[true; 16]).unwrap());
//! session.present(&frame, &mut target).unwrap();
//! assert_eq!(target.pixels.unwrap().pixel(0, 0), [0x77, 0xCA, 0xE6, 255]);
//! ```
//!
//! ## Packed rows
//!
//! Rows arrive as integers holding `unit_width` cells each, most significant
//! bit first. A width of 53 keeps every unit exactly representable as a
//! double, which is what producers written for JavaScript hosts emit.

pub mod alpha;
pub mod camera;
pub mod config;
pub mod decay;
pub mod error;
pub mod gpu;
pub mod interaction;
pub mod lattice;
pub mod pixels;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod source;
pub mod unpack;
mod viewer;

pub use alpha::VoxelAlphaBuffer;
pub use camera::{Camera, Orientation, RotationDelta, SceneTransform};
pub use config::{ScreenRect, ViewConfig};
pub use decay::{CellFade, DecayLadder, PixelDecayPainter};
pub use error::{ConfigError, GpuError, SourceError, ViewError, ViewerError};
pub use glam::{Vec2, Vec3};
pub use interaction::InteractionController;
pub use lattice::ParticleLattice;
pub use pixels::PixelBuffer;
pub use render::{FrameRecorder, RenderTarget};
pub use scheduler::{CameraRig, CancelToken, FrameScheduler, FrameStatus, RotationMode, TickOutcome};
pub use session::RenderSession;
pub use snapshot::{Frame, GridDims, PackedRow, Snapshot2D, Snapshot3D};
pub use source::{ReplaySource, StateSource, SweepSource};
pub use viewer::Viewer;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use lifeview::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ViewConfig;
    pub use crate::error::{ViewError, ViewerError};
    pub use crate::render::{FrameRecorder, RenderTarget};
    pub use crate::scheduler::{RotationMode, TickOutcome};
    pub use crate::session::RenderSession;
    pub use crate::snapshot::{Frame, GridDims, Snapshot2D, Snapshot3D};
    pub use crate::source::{ReplaySource, StateSource, SweepSource};
    pub use crate::viewer::Viewer;
    pub use crate::{Vec2, Vec3};
}
