//! Fixed particle positions for the volume view.
//!
//! One particle per cell, grid layers stacked as parallel planes along Z.
//! The lattice is built lazily on the first volume frame, registered with the
//! renderer once, and then left alone: later frames only touch opacity.

use glam::Vec3;

use crate::render::RenderTarget;
use crate::snapshot::GridDims;

/// Ordered particle positions, plane-major, then row, then column.
#[derive(Debug, Clone)]
pub struct ParticleLattice {
    positions: Vec<Vec3>,
    dims: Option<GridDims>,
    cell_spacing: f32,
    plane_spacing: f32,
}

impl ParticleLattice {
    pub fn new(cell_spacing: f32, plane_spacing: f32) -> Self {
        Self {
            positions: Vec::new(),
            dims: None,
            cell_spacing,
            plane_spacing,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Dimensions the lattice was built for.
    pub fn dims(&self) -> Option<GridDims> {
        self.dims
    }

    /// Z offset of plane `plane` out of `layers`, centered on the origin.
    pub fn plane_z(&self, plane: usize, layers: usize) -> f32 {
        (plane as f32 - layers as f32 / 2.0) * self.plane_spacing
    }

    /// Build and register the lattice if it is empty.
    ///
    /// Returns `true` when a build happened. A non-empty lattice is never
    /// rebuilt here, whatever `dims` says; call [`ParticleLattice::reset`]
    /// first to change size. A zero-volume grid builds nothing and leaves
    /// the lattice empty for the next frame.
    pub fn ensure_built<T: RenderTarget>(&mut self, dims: GridDims, target: &mut T) -> bool {
        if !self.is_empty() || dims.volume() == 0 {
            return false;
        }

        let GridDims { layers, height, width } = dims;
        let half_h = height as f32 / 2.0;
        let half_w = width as f32 / 2.0;
        self.positions.reserve(dims.volume());
        for plane in 0..layers {
            let z = self.plane_z(plane, layers);
            for x in 0..height {
                for y in 0..width {
                    self.positions.push(Vec3::new(
                        (x as f32 - half_h) * self.cell_spacing,
                        (y as f32 - half_w) * self.cell_spacing,
                        z,
                    ));
                }
            }
        }
        self.dims = Some(dims);

        log::debug!(
            "built particle lattice: {} particles ({} x {} x {})",
            self.positions.len(),
            layers,
            height,
            width
        );
        target.upload_particles(&self.positions);
        true
    }

    /// Discard the lattice so the next volume frame rebuilds it.
    pub fn reset(&mut self) {
        if !self.is_empty() {
            log::debug!("particle lattice reset ({} particles dropped)", self.positions.len());
        }
        self.positions.clear();
        self.dims = None;
    }
}
