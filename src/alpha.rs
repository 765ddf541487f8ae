//! Per-particle opacity for the volume view.

use crate::error::ViewError;
use crate::lattice::ParticleLattice;
use crate::render::RenderTarget;
use crate::snapshot::Snapshot3D;

/// Opacity channel aligned with a [`ParticleLattice`].
///
/// Rewritten from scratch every volume frame: a live cell gets the lit
/// opacity, anything else 0. There is no fade in this path.
#[derive(Debug, Clone)]
pub struct VoxelAlphaBuffer {
    values: Vec<f32>,
    lit_opacity: f32,
    dirty: bool,
}

impl VoxelAlphaBuffer {
    pub fn new(lit_opacity: f32) -> Self {
        Self {
            values: Vec::new(),
            lit_opacity,
            dirty: false,
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn lit_opacity(&self) -> f32 {
        self.lit_opacity
    }

    /// Whether the values changed since the renderer last received them.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute opacities from `snapshot`.
    ///
    /// Builds the lattice first if it does not exist yet. A snapshot whose
    /// size differs from an existing lattice is rejected and the previous
    /// values are kept.
    pub fn update<T: RenderTarget>(
        &mut self,
        lattice: &mut ParticleLattice,
        snapshot: &Snapshot3D,
        target: &mut T,
    ) -> Result<(), ViewError> {
        let dims = snapshot.dims()?;
        if lattice.is_empty() {
            log::debug!("opacity update before lattice exists, building it now");
            lattice.ensure_built(dims, target);
        }
        if let Some(built) = lattice.dims() {
            if built != dims {
                return Err(ViewError::shape("volume size", built.volume(), dims.volume()));
            }
        }

        let lit = self.lit_opacity;
        self.values.clear();
        self.values
            .extend(snapshot.iter_cells().map(|alive| if alive { lit } else { 0.0 }));
        debug_assert_eq!(self.values.len(), lattice.len());
        self.dirty = true;
        Ok(())
    }

    /// Send the values to the renderer if they changed.
    pub fn flush<T: RenderTarget>(&mut self, target: &mut T) {
        if self.dirty {
            target.update_opacity(&self.values);
            self.dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FrameRecorder;
    use crate::snapshot::GridDims;

    #[test]
    fn opacity_aligns_with_lattice_order() {
        let mut lattice = ParticleLattice::new(3.0, 10.0);
        let mut alpha = VoxelAlphaBuffer::new(0.8);
        let mut target = FrameRecorder::new();
        let snapshot = Snapshot3D::from_fn(GridDims::new(3, 2, 2), |layer, _, _| layer == 0);

        alpha.update(&mut lattice, &snapshot, &mut target).unwrap();

        assert_eq!(alpha.values().len(), 12);
        assert_eq!(&alpha.values()[..4], &[0.8; 4]);
        assert_eq!(&alpha.values()[4..], &[0.0; 8]);
        assert_eq!(lattice.len(), 12);
    }

    #[test]
    fn lattice_is_built_lazily_once() {
        let mut lattice = ParticleLattice::new(1.0, 1.0);
        let mut alpha = VoxelAlphaBuffer::new(0.5);
        let mut target = FrameRecorder::new();
        let snapshot = Snapshot3D::from_fn(GridDims::new(2, 2, 2), |_, r, c| r == c);

        alpha.update(&mut lattice, &snapshot, &mut target).unwrap();
        alpha.update(&mut lattice, &snapshot, &mut target).unwrap();
        assert_eq!(target.uploads.len(), 1);
    }

    #[test]
    fn size_change_without_reset_is_rejected() {
        let mut lattice = ParticleLattice::new(1.0, 1.0);
        let mut alpha = VoxelAlphaBuffer::new(0.8);
        let mut target = FrameRecorder::new();
        alpha
            .update(&mut lattice, &Snapshot3D::from_fn(GridDims::new(1, 2, 2), |_, _, _| true), &mut target)
            .unwrap();

        let bigger = Snapshot3D::from_fn(GridDims::new(1, 3, 3), |_, _, _| false);
        let err = alpha.update(&mut lattice, &bigger, &mut target).unwrap_err();
        assert!(matches!(err, ViewError::ShapeMismatch { what: "volume size", .. }));
        assert_eq!(alpha.values(), &[0.8; 4]);
    }

    #[test]
    fn empty_volume_does_not_pin_lattice_size() {
        let mut lattice = ParticleLattice::new(1.0, 1.0);
        let mut alpha = VoxelAlphaBuffer::new(0.8);
        let mut target = FrameRecorder::new();

        alpha.update(&mut lattice, &Snapshot3D::new(Vec::new()), &mut target).unwrap();
        assert!(alpha.values().is_empty());
        assert!(lattice.is_empty());

        let snapshot = Snapshot3D::from_fn(GridDims::new(1, 2, 2), |_, _, _| true);
        alpha.update(&mut lattice, &snapshot, &mut target).unwrap();
        assert_eq!(alpha.values(), &[0.8; 4]);
        assert_eq!(target.uploads.len(), 1);
        assert_eq!(target.uploads[0].len(), 4);
    }

    #[test]
    fn flush_only_when_dirty() {
        let mut lattice = ParticleLattice::new(1.0, 1.0);
        let mut alpha = VoxelAlphaBuffer::new(0.8);
        let mut target = FrameRecorder::new();
        alpha
            .update(&mut lattice, &Snapshot3D::from_fn(GridDims::new(1, 1, 2), |_, _, c| c == 1), &mut target)
            .unwrap();
        assert!(alpha.is_dirty());

        alpha.flush(&mut target);
        alpha.flush(&mut target);
        assert_eq!(target.opacity_updates, 1);
        assert_eq!(target.opacity, vec![0.0, 0.8]);
        assert!(!alpha.is_dirty());
    }
}
