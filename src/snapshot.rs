//! Grid snapshots handed over by a state source.
//!
//! A snapshot is immutable once produced and fully replaces the previous one;
//! the core never diffs snapshots. Shape checks happen here so that painters
//! can reject a malformed frame before touching any buffer.

use serde::{Deserialize, Serialize};

use crate::error::ViewError;
use crate::unpack;

/// One row of a 2D grid in packed form.
///
/// Each entry is a unit of `unit_width` cells; for byte-packed rows a unit is
/// a single character code holding 8 cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackedRow(pub Vec<u64>);

impl PackedRow {
    /// Row from raw bytes, 8 cells each.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|&b| u64::from(b)).collect())
    }

    /// Row from a character string, one character code per unit.
    ///
    /// Codes above 255 are kept as-is and rejected at decode time.
    pub fn from_chars(text: &str) -> Self {
        Self(text.chars().map(|c| u64::from(u32::from(c))).collect())
    }

    /// Row from cells, packed `unit_width` per unit.
    pub fn pack(cells: &[bool], unit_width: u32) -> Result<Self, ViewError> {
        unpack::pack_bits(cells, unit_width).map(Self)
    }

    /// Number of cells this row decodes to.
    pub fn decoded_width(&self, unit_width: u32) -> usize {
        self.0.len() * unit_width as usize
    }

    /// Decode every unit into `unit_width` cells.
    pub fn decode(&self, unit_width: u32) -> Result<Vec<bool>, ViewError> {
        unpack::unpack_row(&self.0, unit_width)
    }
}

fn default_unit_width() -> u32 {
    unpack::BYTE_UNIT_WIDTH
}

/// A flat grid: explicit dimensions plus one packed row per grid row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot2D {
    /// Cells per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Cells per packed unit; byte rows by default.
    #[serde(default = "default_unit_width")]
    pub unit_width: u32,
    /// Packed rows, top to bottom.
    pub rows: Vec<PackedRow>,
}

impl Snapshot2D {
    pub fn new(width: usize, height: usize, rows: Vec<PackedRow>) -> Self {
        Self {
            width,
            height,
            unit_width: unpack::BYTE_UNIT_WIDTH,
            rows,
        }
    }

    /// Pack a row-major cell grid into byte rows.
    ///
    /// Byte rows hold whole bytes, so `width` must be a non-zero multiple of
    /// 8 and `cells` must fill every row.
    pub fn from_cells(width: usize, cells: &[bool]) -> Result<Self, ViewError> {
        let unit = unpack::BYTE_UNIT_WIDTH as usize;
        if width == 0 || width % unit != 0 {
            return Err(ViewError::shape("row width", width.next_multiple_of(unit).max(unit), width));
        }
        if cells.len() % width != 0 {
            return Err(ViewError::shape("cell count", cells.len().next_multiple_of(width), cells.len()));
        }
        let rows = cells
            .chunks(width)
            .map(|row| PackedRow::pack(row, unpack::BYTE_UNIT_WIDTH))
            .collect::<Result<Vec<_>, _>>()?;
        let height = rows.len();
        Ok(Self::new(width, height, rows))
    }

    /// Decode every row into one row-major cell vector of `width * height`.
    ///
    /// The whole snapshot is validated before anything is returned, so a
    /// shape error never yields a partial grid.
    pub fn decode(&self) -> Result<Vec<bool>, ViewError> {
        if self.rows.len() != self.height {
            return Err(ViewError::shape("row count", self.height, self.rows.len()));
        }
        let mut cells = Vec::with_capacity(self.width * self.height);
        for row in &self.rows {
            let decoded_width = row.decoded_width(self.unit_width);
            if decoded_width != self.width {
                return Err(ViewError::shape("row width", self.width, decoded_width));
            }
            for &unit in &row.0 {
                unpack::unpack_unit_into(unit, self.unit_width, &mut cells)?;
            }
        }
        Ok(cells)
    }
}

/// Dimensions of a 3D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDims {
    /// Number of planes.
    pub layers: usize,
    /// Rows per plane.
    pub height: usize,
    /// Cells per row.
    pub width: usize,
}

impl GridDims {
    pub fn new(layers: usize, height: usize, width: usize) -> Self {
        Self { layers, height, width }
    }

    /// Total number of cells.
    pub fn volume(&self) -> usize {
        self.layers * self.height * self.width
    }
}

/// A volumetric grid of raw 0/1 cells indexed `[layer][row][col]`.
///
/// Dimensions are inferred from the array shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot3D {
    pub cells: Vec<Vec<Vec<u8>>>,
}

impl Snapshot3D {
    pub fn new(cells: Vec<Vec<Vec<u8>>>) -> Self {
        Self { cells }
    }

    /// Build a grid of the given size from a predicate over `(layer, row, col)`.
    pub fn from_fn(dims: GridDims, mut alive: impl FnMut(usize, usize, usize) -> bool) -> Self {
        let cells = (0..dims.layers)
            .map(|l| {
                (0..dims.height)
                    .map(|r| (0..dims.width).map(|c| u8::from(alive(l, r, c))).collect())
                    .collect()
            })
            .collect();
        Self { cells }
    }

    /// Expand hex-compatible packed layers, each integer holding `unit_width` cells.
    pub fn from_packed(layers: &[Vec<Vec<u64>>], unit_width: u32) -> Result<Self, ViewError> {
        let mut cells = Vec::with_capacity(layers.len());
        for layer in layers {
            let mut rows = Vec::with_capacity(layer.len());
            for units in layer {
                let row = unpack::unpack_row(units, unit_width)?;
                rows.push(row.into_iter().map(u8::from).collect());
            }
            cells.push(rows);
        }
        Ok(Self { cells })
    }

    /// Infer and check the grid's dimensions.
    ///
    /// Every layer must have the same number of rows, every row the same
    /// number of columns, and every cell must be 0 or 1.
    pub fn dims(&self) -> Result<GridDims, ViewError> {
        let layers = self.cells.len();
        let height = self.cells.first().map_or(0, Vec::len);
        let width = self
            .cells
            .first()
            .and_then(|layer| layer.first())
            .map_or(0, Vec::len);

        for layer in &self.cells {
            if layer.len() != height {
                return Err(ViewError::shape("layer height", height, layer.len()));
            }
            for row in layer {
                if row.len() != width {
                    return Err(ViewError::shape("row width", width, row.len()));
                }
                if let Some(&bad) = row.iter().find(|&&v| v > 1) {
                    return Err(ViewError::InvalidCell(bad));
                }
            }
        }
        Ok(GridDims::new(layers, height, width))
    }

    /// Cells in plane-major, then row, then column order.
    pub fn iter_cells(&self) -> impl Iterator<Item = bool> + '_ {
        self.cells.iter().flatten().flatten().map(|&v| v == 1)
    }
}

/// One frame of state from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frame {
    Flat(Snapshot2D),
    Volume(Snapshot3D),
    /// Volume layers as packed integer rows, expanded with the session's
    /// configured unit width.
    PackedVolume(Vec<Vec<Vec<u64>>>),
}
