use super::format::{Color, IndexedImage};
use crate::constants::{
    CLUT_COUNT_OFFSET, CLUT_ENTRIES_OFFSET, CLUT_ENTRY_SIZE, DATA_MARKER, INDEX_BIAS,
    MARKER_SIZE, MAX_CLUT_REGION_SIZE,
};
use log::{debug, error, info, warn};
use thiserror::Error;

/// Distance from the bitmap block start to the width field.
const BLOCK_WIDTH_OFFSET: usize = 2;
const BLOCK_HEIGHT_OFFSET: usize = 4;
const BLOCK_MARKER_OFFSET: usize = 6;
const BLOCK_PIXELS_OFFSET: usize = 26;

/// Shift applied when the bitmap tag sits two bytes before its usual place.
const SHORT_LAYOUT_CORRECTION: usize = 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Wrong bitmap magic at block offset 0x{0:X}")]
    LayoutMismatch(usize),
    #[error(
        "Section truncated: {field} needs bytes up to 0x{needed:X}, only 0x{available:X} available"
    )]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("Section declares an empty {0}x{1} image")]
    EmptyImage(u16, u16),
}

fn slice_at<'a>(
    data: &'a [u8],
    start: usize,
    len: usize,
    field: &'static str,
) -> Result<&'a [u8], DecodeError> {
    data.get(start..start + len).ok_or(DecodeError::Truncated {
        field,
        needed: start + len,
        available: data.len(),
    })
}

fn read_u16_be(data: &[u8], at: usize, field: &'static str) -> Result<u16, DecodeError> {
    let bytes = slice_at(data, at, 2, field)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Offset of the bitmap block for a section with `clut_items` colours.
///
/// The palette region is always laid out for the full 224 entry table, so
/// this does not shrink with the stored count.
pub fn bitmap_block_offset(clut_items: u8) -> usize {
    let items = clut_items as usize;
    items * CLUT_ENTRY_SIZE + (MAX_CLUT_REGION_SIZE - items) + CLUT_ENTRIES_OFFSET
}

/// Rebuilds the palette and indices of the section that starts at `section[0]`.
///
/// `section` must begin with the palette marker; everything after it may
/// belong to the rest of the blob.
pub fn decode_section(section: &[u8]) -> Result<IndexedImage, DecodeError> {
    let clut_items = *section
        .get(CLUT_COUNT_OFFSET)
        .ok_or(DecodeError::Truncated {
            field: "palette count",
            needed: CLUT_COUNT_OFFSET + 1,
            available: section.len(),
        })?;

    let mut block = bitmap_block_offset(clut_items);
    if section.get(block + BLOCK_MARKER_OFFSET) != Some(&DATA_MARKER[0]) {
        debug!("Bitmap magic not at 0x{:X}, trying two bytes earlier", block);
        block -= SHORT_LAYOUT_CORRECTION;
    }

    let magic = slice_at(section, block + BLOCK_MARKER_OFFSET, MARKER_SIZE, "bitmap magic")?;
    if magic != DATA_MARKER {
        return Err(DecodeError::LayoutMismatch(block));
    }

    let width = read_u16_be(section, block + BLOCK_WIDTH_OFFSET, "width")?;
    let height = read_u16_be(section, block + BLOCK_HEIGHT_OFFSET, "height")?;
    info!("Format: {}x{}@{}", width, height, clut_items);
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage(width, height));
    }

    let entries = slice_at(
        section,
        CLUT_ENTRIES_OFFSET,
        clut_items as usize * CLUT_ENTRY_SIZE,
        "palette",
    )?;
    let palette: Vec<Color> = entries
        .chunks_exact(CLUT_ENTRY_SIZE)
        .map(|rgb| Color::new(rgb[0], rgb[1], rgb[2]))
        .collect();

    let pixel_start = block + BLOCK_PIXELS_OFFSET;
    let pixel_count = width as usize * height as usize;
    let stored = slice_at(section, pixel_start, pixel_count, "bitmap")?;

    let mut indices = Vec::with_capacity(pixel_count);
    for (position, &byte) in stored.iter().enumerate() {
        let index = byte.wrapping_sub(INDEX_BIAS);
        if index >= clut_items {
            warn!(
                "Warning clut #{} @0x{:X} is out of table range!",
                index,
                pixel_start + position
            );
        }
        indices.push(index);
    }

    Ok(IndexedImage {
        width,
        height,
        palette,
        indices,
    })
}

/// Logs the failure the same way for every caller that skips a section.
pub(crate) fn report_skipped(offset: usize, err: &DecodeError) {
    error!("Section @0x{:X}: {}, skipping...", offset, err);
}
