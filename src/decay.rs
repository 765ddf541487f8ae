//! Flat-view painter with fading trails for cells that just died.
//!
//! Each cell carries an explicit [`CellFade`] state in a side array parallel
//! to the pixel buffer; the pixel bytes are always derived from that state.
//! With the default ladder a cell that dies shows alpha
//! `255 → 180 → 140 → 100 → 50` and then settles on opaque black.

use crate::error::ViewError;
use crate::pixels::PixelBuffer;
use crate::snapshot::Snapshot2D;

/// Terminal color of a dead cell.
const BLANK: [u8; 4] = [0, 0, 0, 255];

/// Live cells are always opaque, whatever the ladder's first rung holds.
const LIVE_ALPHA: u8 = 255;

/// Per-cell visual state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellFade {
    Alive,
    /// Index into the decay ladder; rung 0 stands for the live cell.
    Fading(u8),
    #[default]
    Dead,
}

/// Ordered alpha rungs; rung 0 is the live slot and fading starts at rung 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecayLadder {
    rungs: Vec<u8>,
}

impl DecayLadder {
    /// Build a ladder; an empty list falls back to a single opaque rung.
    pub fn new(rungs: Vec<u8>) -> Self {
        if rungs.is_empty() {
            Self { rungs: vec![255] }
        } else {
            Self { rungs }
        }
    }

    pub fn rungs(&self) -> &[u8] {
        &self.rungs
    }

    /// State of a cell after one more dead tick.
    pub fn step_dead(&self, state: CellFade) -> CellFade {
        let next = match state {
            CellFade::Alive => 1,
            CellFade::Fading(rung) => usize::from(rung) + 1,
            CellFade::Dead => return CellFade::Dead,
        };
        if next < self.rungs.len() {
            u8::try_from(next).map_or(CellFade::Dead, CellFade::Fading)
        } else {
            CellFade::Dead
        }
    }

    /// Pixel bytes for a state. A rung outside the ladder paints as dead.
    pub fn rgba(&self, state: CellFade, brand: [u8; 3]) -> [u8; 4] {
        let [r, g, b] = brand;
        match state {
            CellFade::Alive => [r, g, b, LIVE_ALPHA],
            CellFade::Fading(rung) => match self.rungs.get(usize::from(rung)) {
                Some(&alpha) => [r, g, b, alpha],
                None => BLANK,
            },
            CellFade::Dead => BLANK,
        }
    }
}

impl Default for DecayLadder {
    fn default() -> Self {
        Self::new(vec![255, 180, 140, 100, 50])
    }
}

/// Paints decoded flat snapshots into a [`PixelBuffer`].
#[derive(Debug, Clone)]
pub struct PixelDecayPainter {
    ladder: DecayLadder,
    brand: [u8; 3],
    states: Vec<CellFade>,
    width: usize,
    height: usize,
}

impl PixelDecayPainter {
    /// A painter for a buffer of `width * height` pixels, every cell dead.
    pub fn new(width: usize, height: usize, ladder: DecayLadder, brand: [u8; 3]) -> Self {
        Self {
            ladder,
            brand,
            states: vec![CellFade::Dead; width * height],
            width,
            height,
        }
    }

    pub fn ladder(&self) -> &DecayLadder {
        &self.ladder
    }

    /// Replace the ladder; cells on rungs the new ladder lacks finish as dead.
    pub fn set_ladder(&mut self, ladder: DecayLadder) {
        self.ladder = ladder;
    }

    /// Current state of cell `(x, y)`.
    pub fn state(&self, x: usize, y: usize) -> CellFade {
        self.states[y * self.width + x]
    }

    /// Forget all fade state, for a buffer of the new size.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.states.clear();
        self.states.resize(width * height, CellFade::Dead);
    }

    /// Advance every cell covered by `snapshot` one tick and repaint it.
    ///
    /// On error nothing is written, so the previous frame stays on screen.
    /// Pixels outside the snapshot's extent are left as they are.
    pub fn paint(&mut self, pixels: &mut PixelBuffer, snapshot: &Snapshot2D) -> Result<(), ViewError> {
        if pixels.width() != self.width || pixels.height() != self.height {
            return Err(ViewError::shape("pixel buffer size", self.width * self.height, pixels.width() * pixels.height()));
        }
        if snapshot.width > self.width {
            return Err(ViewError::shape("grid width", self.width, snapshot.width));
        }
        if snapshot.height > self.height {
            return Err(ViewError::shape("grid height", self.height, snapshot.height));
        }
        let cells = snapshot.decode()?;

        for (y, row) in cells.chunks(snapshot.width.max(1)).enumerate() {
            for (x, &alive) in row.iter().enumerate() {
                let slot = &mut self.states[y * self.width + x];
                *slot = if alive { CellFade::Alive } else { self.ladder.step_dead(*slot) };
                pixels.set_pixel(x, y, self.ladder.rgba(*slot, self.brand));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRAND: [u8; 3] = [0x77, 0xCA, 0xE6];

    fn painter(width: usize, height: usize) -> (PixelDecayPainter, PixelBuffer) {
        (
            PixelDecayPainter::new(width, height, DecayLadder::default(), BRAND),
            PixelBuffer::new(width, height),
        )
    }

    fn single(alive: bool) -> Snapshot2D {
        let mut cells = vec![false; 8];
        cells[0] = alive;
        Snapshot2D::from_cells(8, &cells).unwrap()
    }

    #[test]
    fn live_cell_gets_brand_color() {
        let (mut painter, mut pixels) = painter(8, 1);
        painter.paint(&mut pixels, &single(true)).unwrap();
        assert_eq!(pixels.pixel(0, 0), [0x77, 0xCA, 0xE6, 255]);
        assert_eq!(pixels.pixel(1, 0), BLANK);
    }

    #[test]
    fn dead_cell_walks_the_ladder_then_rests() {
        let (mut painter, mut pixels) = painter(8, 1);
        painter.paint(&mut pixels, &single(true)).unwrap();

        let mut alphas = Vec::new();
        for _ in 0..8 {
            painter.paint(&mut pixels, &single(false)).unwrap();
            alphas.push(pixels.pixel(0, 0));
        }
        let [r, g, b] = BRAND;
        assert_eq!(
            alphas,
            vec![
                [r, g, b, 180],
                [r, g, b, 140],
                [r, g, b, 100],
                [r, g, b, 50],
                BLANK,
                BLANK,
                BLANK,
                BLANK,
            ]
        );
        assert_eq!(painter.state(0, 0), CellFade::Dead);
    }

    #[test]
    fn resurrection_from_any_rung() {
        for dead_ticks in 0..7 {
            let (mut painter, mut pixels) = painter(8, 1);
            painter.paint(&mut pixels, &single(true)).unwrap();
            for _ in 0..dead_ticks {
                painter.paint(&mut pixels, &single(false)).unwrap();
            }
            painter.paint(&mut pixels, &single(true)).unwrap();
            assert_eq!(pixels.pixel(0, 0), [0x77, 0xCA, 0xE6, 255], "after {dead_ticks} dead ticks");
        }
    }

    #[test]
    fn shape_error_leaves_buffer_untouched() {
        let (mut painter, mut pixels) = painter(8, 2);
        painter.paint(&mut pixels, &Snapshot2D::from_cells(8, &[true; 16]).unwrap()).unwrap();
        let before = pixels.clone();

        let mut broken = Snapshot2D::from_cells(8, &[false; 16]).unwrap();
        broken.rows[1] = crate::snapshot::PackedRow::from_bytes(&[0, 0]);
        assert!(painter.paint(&mut pixels, &broken).is_err());
        assert_eq!(pixels, before);
        assert_eq!(painter.state(3, 1), CellFade::Alive);
    }

    #[test]
    fn grid_larger_than_buffer_is_rejected() {
        let (mut painter, mut pixels) = painter(8, 1);
        let err = painter.paint(&mut pixels, &Snapshot2D::from_cells(16, &[true; 16]).unwrap()).unwrap_err();
        assert_eq!(err, ViewError::ShapeMismatch { what: "grid width", expected: 8, got: 16 });
    }

    #[test]
    fn pixels_outside_grid_are_untouched() {
        let (mut painter, mut pixels) = painter(16, 2);
        pixels.set_pixel(12, 0, [1, 2, 3, 4]);
        painter.paint(&mut pixels, &Snapshot2D::from_cells(8, &[true; 8]).unwrap()).unwrap();
        assert_eq!(pixels.pixel(12, 0), [1, 2, 3, 4]);
        assert_eq!(pixels.pixel(0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn shortened_ladder_finishes_unknown_rungs_as_dead() {
        let ladder = DecayLadder::default();
        let short = DecayLadder::new(vec![255, 100]);
        let state = ladder.step_dead(ladder.step_dead(CellFade::Alive));
        assert_eq!(state, CellFade::Fading(2));
        assert_eq!(short.rgba(state, BRAND), BLANK);
        assert_eq!(short.step_dead(state), CellFade::Dead);
    }

    #[test]
    fn live_cell_is_opaque_whatever_the_first_rung() {
        let ladder = DecayLadder::new(vec![200, 100]);
        let [r, g, b] = BRAND;
        assert_eq!(ladder.rgba(CellFade::Alive, BRAND), [r, g, b, 255]);
        assert_eq!(ladder.rgba(ladder.step_dead(CellFade::Alive), BRAND), [r, g, b, 100]);

        let mut painter = PixelDecayPainter::new(8, 1, ladder, BRAND);
        let mut pixels = PixelBuffer::new(8, 1);
        painter.paint(&mut pixels, &single(true)).unwrap();
        assert_eq!(pixels.pixel(0, 0)[3], 255);
    }

    #[test]
    fn single_rung_ladder_dies_immediately() {
        let ladder = DecayLadder::new(vec![255]);
        assert_eq!(ladder.step_dead(CellFade::Alive), CellFade::Dead);
    }
}
