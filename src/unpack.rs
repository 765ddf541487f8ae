//! Bit unpacking for packed cell rows.
//!
//! State sources ship rows compactly: either one byte per 8 cells, or one
//! integer per fixed-width unit of cells (53 in the hex-compatible format,
//! which keeps every unit inside a double-precision integer). Bits are read
//! most significant first, so the leftmost cell is the highest bit of the
//! unit. A unit whose natural binary form is shorter than the unit width is
//! left-padded with dead cells.

use crate::error::ViewError;

/// Cells per byte in byte-packed rows.
pub const BYTE_UNIT_WIDTH: u32 = 8;

/// Decode one packed unit into exactly `width` cells.
///
/// Fails with [`ViewError::UnitOverflow`] when `value` needs more than
/// `width` bits or `width` exceeds 64.
pub fn unpack_unit(value: u64, width: u32) -> Result<Vec<bool>, ViewError> {
    let mut cells = Vec::with_capacity(width as usize);
    unpack_unit_into(value, width, &mut cells)?;
    Ok(cells)
}

/// Append the `width` cells of one packed unit to `out`.
pub fn unpack_unit_into(value: u64, width: u32, out: &mut Vec<bool>) -> Result<(), ViewError> {
    if width > u64::BITS || (width < u64::BITS && value >> width != 0) {
        return Err(ViewError::UnitOverflow { value, width });
    }
    out.extend((0..width).rev().map(|bit| value >> bit & 1 == 1));
    Ok(())
}

/// Decode a row of integer units, each holding `width` cells.
pub fn unpack_row(units: &[u64], width: u32) -> Result<Vec<bool>, ViewError> {
    let mut cells = Vec::with_capacity(units.len() * width as usize);
    for &unit in units {
        unpack_unit_into(unit, width, &mut cells)?;
    }
    Ok(cells)
}

/// Decode a byte-packed row, 8 cells per byte.
pub fn unpack_bytes(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|&byte| (0..BYTE_UNIT_WIDTH).rev().map(move |bit| byte >> bit & 1 == 1))
        .collect()
}

/// Pack cells into units of `width` bits, the inverse of [`unpack_row`].
///
/// A trailing partial unit is padded on the right with dead cells so that
/// every unit decodes to the full width. Fails with
/// [`ViewError::UnitWidth`] when `width` is 0 or above 64.
pub fn pack_bits(cells: &[bool], width: u32) -> Result<Vec<u64>, ViewError> {
    if !(1..=u64::BITS).contains(&width) {
        return Err(ViewError::UnitWidth(width));
    }
    Ok(cells.chunks(width as usize).map(|chunk| pack_chunk(chunk, width)).collect())
}

/// Pack cells 8 per byte, the inverse of [`unpack_bytes`].
pub fn pack_bytes(cells: &[bool]) -> Vec<u8> {
    cells
        .chunks(BYTE_UNIT_WIDTH as usize)
        .map(|chunk| pack_chunk(chunk, BYTE_UNIT_WIDTH) as u8)
        .collect()
}

fn pack_chunk(chunk: &[bool], width: u32) -> u64 {
    let value = chunk.iter().fold(0u64, |acc, &alive| (acc << 1) | u64::from(alive));
    value << (width as usize - chunk.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn short_value_is_left_padded() {
        assert_eq!(unpack_unit(0b101, 6).unwrap(), vec![false, false, false, true, false, true]);
    }

    #[test]
    fn zero_decodes_to_all_dead() {
        assert_eq!(unpack_unit(0, 53).unwrap(), vec![false; 53]);
    }

    #[test]
    fn full_width_units_decode() {
        assert_eq!(unpack_unit(u64::MAX, 64).unwrap(), vec![true; 64]);
        assert_eq!(unpack_unit((1 << 53) - 1, 53).unwrap(), vec![true; 53]);
    }

    #[test]
    fn overflowing_unit_is_rejected() {
        let err = unpack_unit(0b1_0000_0000, 8).unwrap_err();
        assert_eq!(err, ViewError::UnitOverflow { value: 256, width: 8 });
        assert!(unpack_unit(0, 65).is_err());
    }

    #[test]
    fn bytes_decode_msb_first() {
        assert_eq!(
            unpack_bytes(&[0b1000_0001, 0x00]),
            [vec![true, false, false, false, false, false, false, true], vec![false; 8]].concat()
        );
    }

    #[test]
    fn random_rows_round_trip() {
        let mut rng = rand::thread_rng();
        for width in [8u32, 53, 64] {
            let units = rng.gen_range(1..6);
            let row: Vec<bool> = (0..units * width as usize).map(|_| rng.gen()).collect();
            assert_eq!(unpack_row(&pack_bits(&row, width).unwrap(), width).unwrap(), row);
        }
        let row: Vec<bool> = (0..40).map(|_| rng.gen()).collect();
        assert_eq!(unpack_bytes(&pack_bytes(&row)), row);
    }

    #[test]
    fn partial_unit_is_padded_right() {
        let packed = pack_bits(&[true, true], 8).unwrap();
        assert_eq!(packed, vec![0b1100_0000]);
        assert_eq!(pack_bytes(&[true; 9]), vec![0xFF, 0b1000_0000]);
    }

    #[test]
    fn packing_rejects_unusable_widths() {
        assert_eq!(pack_bits(&[true], 0), Err(ViewError::UnitWidth(0)));
        assert_eq!(pack_bits(&[true], 65), Err(ViewError::UnitWidth(65)));
        assert_eq!(pack_bits(&[true], 64).unwrap(), vec![1 << 63]);
    }
}
