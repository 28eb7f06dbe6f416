//! Fixed byte layout of the boot logo section.

/// Tag in front of the colour look-up table.
pub const CLUT_MARKER: [u8; 16] = *b"logo_RKlogo_clut";

/// Tag in front of the palette-indexed bitmap.
pub const DATA_MARKER: [u8; 16] = *b"logo_RKlogo_data";

/// Prefix shared by both tags. The encoder looks for it after the palette.
pub const DATA_NEEDLE: &[u8] = b"logo";

pub const MARKER_SIZE: usize = 16;
pub const CLUT_COUNT_OFFSET: usize = 0x10;
pub const CLUT_ENTRIES_OFFSET: usize = 0x11;
pub const CLUT_ENTRY_SIZE: usize = 3;

pub const MAX_CLUT_COLORS: usize = 224;
pub const MAX_CLUT_REGION_SIZE: usize = MAX_CLUT_COLORS * CLUT_ENTRY_SIZE;

/// Stored pixel bytes are `index + INDEX_BIAS` to stay printable.
pub const INDEX_BIAS: u8 = 32;

/// How far past the original palette the encoder searches for the bitmap tag.
pub const DATA_SCAN_LIMIT: usize = 0x500;

/// Width and height, big-endian u16 each.
pub const DIMENSIONS_SIZE: usize = 4;

/// Triplets per line in generated PPM files.
pub const PPM_TRIPLETS_PER_LINE: usize = 6;
