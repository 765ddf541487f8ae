//! State sources.
//!
//! The automaton lives elsewhere; the viewer only pulls finished frames from
//! a [`StateSource`] once per tick.

use std::path::Path;

use crate::error::SourceError;
use crate::snapshot::{Frame, GridDims, Snapshot3D};

/// Produces one frame per tick.
pub trait StateSource {
    /// The next frame, or `None` to keep showing the current one.
    fn next_frame(&mut self) -> Option<Frame>;
}

impl<F> StateSource for F
where
    F: FnMut() -> Option<Frame>,
{
    fn next_frame(&mut self) -> Option<Frame> {
        self()
    }
}

/// Plays back recorded frames in a loop.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    frames: Vec<Frame>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(frames: Vec<Frame>) -> Result<Self, SourceError> {
        if frames.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(Self { frames, cursor: 0 })
    }

    /// Parse a JSON array of frames.
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl StateSource for ReplaySource {
    fn next_frame(&mut self) -> Option<Frame> {
        let frame = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Some(frame)
    }
}

/// A lit band sweeping through a volume, one row per frame.
///
/// Needs no automaton, which makes it handy for checking a renderer.
#[derive(Debug, Clone)]
pub struct SweepSource {
    dims: GridDims,
    step: usize,
}

impl SweepSource {
    pub fn new(dims: GridDims) -> Self {
        Self { dims, step: 0 }
    }
}

impl StateSource for SweepSource {
    fn next_frame(&mut self) -> Option<Frame> {
        let height = self.dims.height.max(1);
        let row = self.step % height;
        self.step += 1;
        Some(Frame::Volume(Snapshot3D::from_fn(self.dims, |layer, r, c| {
            (r + layer) % height == row || (c + layer) % height == row
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_loops() {
        let mut source = ReplaySource::from_json_str(r#"[{ "volume": [[[1]]] }, { "volume": [[[0]]] }]"#).unwrap();
        assert_eq!(source.len(), 2);
        let frames: Vec<Frame> = (0..3).filter_map(|_| source.next_frame()).collect();
        assert_eq!(frames[0], frames[2]);
        assert_ne!(frames[0], frames[1]);
    }

    #[test]
    fn empty_replay_is_rejected() {
        assert!(matches!(ReplaySource::from_json_str("[]"), Err(SourceError::Empty)));
    }

    #[test]
    fn sweep_keeps_dimensions() {
        let dims = GridDims::new(3, 4, 4);
        let mut source = SweepSource::new(dims);
        for _ in 0..5 {
            let Some(Frame::Volume(volume)) = source.next_frame() else {
                panic!("expected a volume frame");
            };
            assert_eq!(volume.dims().unwrap(), dims);
        }
    }

    #[test]
    fn closures_are_sources() {
        let mut calls = 0;
        let mut source = || -> Option<Frame> {
            calls += 1;
            None
        };
        assert_eq!(source.next_frame(), None);
        drop(source);
        assert_eq!(calls, 1);
    }
}
