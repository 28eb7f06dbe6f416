use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use memchr::memmem;
use thiserror::Error;

use super::format::{Image, IndexedImage};
use crate::constants::{
    CLUT_COUNT_OFFSET, CLUT_ENTRIES_OFFSET, CLUT_ENTRY_SIZE, CLUT_MARKER, DATA_MARKER,
    DATA_NEEDLE, DATA_SCAN_LIMIT, DIMENSIONS_SIZE, INDEX_BIAS, MARKER_SIZE, MAX_CLUT_COLORS,
};
use crate::palette::{build_palette, PaletteError};

/// Bytes between the end of the "logo" hit and the end of the palette region.
const REGION_TAIL_BACKUP: usize = 8;

const PADDING_BYTE: u8 = 0x20;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error("Cannot open {} for writing", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "rk_logo_data section not found within 0x{:X} bytes of the palette @0x{:X}",
        DATA_SCAN_LIMIT,
        .0
    )]
    SectionNotFound(u64),
    #[error(
        "Image has {colors} colors ({needed} bytes) but the section reserves only {reserved} bytes"
    )]
    PaletteRegionTooSmall {
        colors: usize,
        needed: usize,
        reserved: usize,
    },
    #[error("Palette has {} colors, the section holds at most {}", .0, MAX_CLUT_COLORS)]
    PaletteTooLarge(usize),
    #[error("Expected {expected} pixel indices, got {actual}")]
    IndexCountMismatch { expected: usize, actual: usize },
    #[error("Bitmap would end at 0x{end:X}, past the end of the image (0x{len:X} bytes)")]
    SectionOverrun { end: u64, len: u64 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Where an existing section lives and how much space it reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    pub offset: u64,
    /// Colour count stored in the section before encoding.
    pub original_count: u8,
    /// Bytes after the count byte that belong to the palette region.
    pub reserved: usize,
    /// The byte right after the palette region is zero and gets doubled.
    pub double_zero: bool,
    pub stream_len: u64,
}

impl SectionLayout {
    /// First byte after the palette entries and their padding.
    pub fn region_end(&self) -> u64 {
        self.offset + CLUT_ENTRIES_OFFSET as u64 + self.reserved as u64
    }

    /// Bytes `write_section` emits for a `width`x`height` bitmap.
    pub fn encoded_len(&self, width: u16, height: u16) -> u64 {
        let terminator = if self.double_zero { 2 } else { 0 };
        (CLUT_ENTRIES_OFFSET
            + self.reserved
            + terminator
            + DIMENSIONS_SIZE
            + MARKER_SIZE
            + DIMENSIONS_SIZE
            + width as usize * height as usize) as u64
    }
}

/// Inspects the section at `offset` without modifying the stream.
///
/// The palette region is sized from the position of the bitmap tag, searched
/// within `DATA_SCAN_LIMIT` bytes after the original palette entries.
pub fn locate_section<S: Read + Seek>(
    stream: &mut S,
    offset: u64,
) -> Result<SectionLayout, EncodeError> {
    let stream_len = stream.seek(SeekFrom::End(0))?;

    stream.seek(SeekFrom::Start(offset + CLUT_COUNT_OFFSET as u64))?;
    let mut count = [0u8; 1];
    stream.read_exact(&mut count)?;
    let original_count = count[0];
    info!("Original number of colors: {}", original_count);

    let original_entries = original_count as usize * CLUT_ENTRY_SIZE;
    stream.seek(SeekFrom::Current(original_entries as i64))?;

    let mut window = Vec::with_capacity(DATA_SCAN_LIMIT);
    stream
        .by_ref()
        .take(DATA_SCAN_LIMIT as u64)
        .read_to_end(&mut window)?;

    let hit = memmem::find(&window, DATA_NEEDLE).ok_or(EncodeError::SectionNotFound(offset))?;
    let reserved = (original_entries + hit + DATA_NEEDLE.len())
        .checked_sub(REGION_TAIL_BACKUP)
        .ok_or(EncodeError::SectionNotFound(offset))?;
    debug!(
        "Bitmap tag found 0x{:X} bytes after the palette, reserved region {} bytes",
        hit, reserved
    );

    let mut layout = SectionLayout {
        offset,
        original_count,
        reserved,
        double_zero: false,
        stream_len,
    };

    stream.seek(SeekFrom::Start(layout.region_end()))?;
    let mut next = [0u8; 1];
    layout.double_zero = stream.read(&mut next)? == 1 && next[0] == 0;

    Ok(layout)
}

/// Serializes `indexed` into the byte run that replaces the section.
fn section_bytes(
    layout: &SectionLayout,
    indexed: &IndexedImage,
) -> Result<Vec<u8>, EncodeError> {
    let colors = indexed.palette.len();
    if colors > MAX_CLUT_COLORS {
        return Err(EncodeError::PaletteTooLarge(colors));
    }

    let needed = colors * CLUT_ENTRY_SIZE;
    if needed > layout.reserved {
        return Err(EncodeError::PaletteRegionTooSmall {
            colors,
            needed,
            reserved: layout.reserved,
        });
    }

    let expected = indexed.width as usize * indexed.height as usize;
    if indexed.indices.len() != expected {
        return Err(EncodeError::IndexCountMismatch {
            expected,
            actual: indexed.indices.len(),
        });
    }

    let end = layout.offset + layout.encoded_len(indexed.width, indexed.height);
    if end > layout.stream_len {
        return Err(EncodeError::SectionOverrun {
            end,
            len: layout.stream_len,
        });
    }

    let mut bytes = Vec::with_capacity((end - layout.offset) as usize);
    bytes.extend_from_slice(&CLUT_MARKER);
    bytes.push(colors as u8);
    for color in &indexed.palette {
        bytes.extend_from_slice(&color.to_bytes());
    }
    bytes.resize(CLUT_ENTRIES_OFFSET + layout.reserved, PADDING_BYTE);

    if layout.double_zero {
        bytes.extend_from_slice(&[0, 0]);
    }

    let mut dimensions = [0u8; DIMENSIONS_SIZE];
    dimensions[..2].copy_from_slice(&indexed.width.to_be_bytes());
    dimensions[2..].copy_from_slice(&indexed.height.to_be_bytes());

    bytes.extend_from_slice(&dimensions);
    bytes.extend_from_slice(&DATA_MARKER);
    bytes.extend_from_slice(&dimensions);
    bytes.extend(indexed.indices.iter().map(|&index| index.wrapping_add(INDEX_BIAS)));

    Ok(bytes)
}

/// Overwrites the section described by `layout` with `indexed`.
///
/// Every check runs before the first byte is written, so a failure leaves
/// the stream untouched. The stream length never changes.
pub fn write_section<S: Write + Seek>(
    stream: &mut S,
    layout: &SectionLayout,
    indexed: &IndexedImage,
) -> Result<(), EncodeError> {
    let bytes = section_bytes(layout, indexed)?;

    stream.seek(SeekFrom::Start(layout.offset))?;
    stream.write_all(&bytes)?;
    stream.flush()?;

    info!(
        "Written CLUT header. Number of colors: {}",
        indexed.palette.len()
    );
    debug!("Wrote {} bytes @0x{:X}", bytes.len(), layout.offset);
    Ok(())
}

pub fn encode_into<S: Read + Write + Seek>(
    stream: &mut S,
    offset: u64,
    indexed: &IndexedImage,
) -> Result<SectionLayout, EncodeError> {
    let layout = locate_section(stream, offset)?;
    write_section(stream, &layout, indexed)?;
    Ok(layout)
}

/// Indexes `image` and writes it into the kernel image at `path`.
///
/// The palette is built before the file is opened: an image with too many
/// colours never touches the target.
pub fn encode_file<P: AsRef<Path>>(
    path: P,
    offset: u64,
    image: &Image,
) -> Result<SectionLayout, EncodeError> {
    let indexed = build_palette(image)?;

    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| EncodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Writing image @0x{:X}...", offset);
    encode_into(&mut file, offset, &indexed)
}
