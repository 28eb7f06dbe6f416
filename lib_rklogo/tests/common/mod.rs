#![allow(dead_code)]

use lib_rklogo::constants::{CLUT_MARKER, DATA_MARKER, INDEX_BIAS};
use lib_rklogo::image::decoder::bitmap_block_offset;
use lib_rklogo::{Color, Image};

pub const FILLER: u8 = 0xAA;
pub const GAP: usize = 100;
pub const TAIL: usize = 64;

pub const BLACK: Color = Color::new(0, 0, 0);
pub const WHITE: Color = Color::new(255, 255, 255);
pub const RED: Color = Color::new(255, 0, 0);
pub const TEAL: Color = Color::new(0, 128, 128);
pub const GOLD: Color = Color::new(212, 175, 55);

/// A boot logo section as it sits in a kernel image.
///
/// With `short` set, the bitmap tag is two bytes earlier than the full table
/// layout puts it.
pub fn section(palette: &[Color], width: u16, height: u16, indices: &[u8], short: bool) -> Vec<u8> {
    let mut data = CLUT_MARKER.to_vec();
    data.push(palette.len() as u8);
    for color in palette {
        data.extend_from_slice(&color.to_bytes());
    }

    let mut block = bitmap_block_offset(palette.len() as u8);
    if short {
        block -= 2;
    }
    data.resize(block + 2, 0x20);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&DATA_MARKER);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend(indices.iter().map(|&index| index + INDEX_BIAS));
    data
}

/// Kernel image holding `sections`, each preceded by `GAP` filler bytes.
pub fn blob(sections: &[Vec<u8>]) -> (Vec<u8>, Vec<usize>) {
    let mut data = Vec::new();
    let mut offsets = Vec::new();
    for section in sections {
        data.extend(std::iter::repeat(FILLER).take(GAP));
        offsets.push(data.len());
        data.extend_from_slice(section);
    }
    data.extend(std::iter::repeat(FILLER).take(TAIL));
    (data, offsets)
}

/// Stripes of `colors` cycling along each row, shifted by one per row.
pub fn striped(width: u16, height: u16, colors: &[Color]) -> Image {
    let pixels = (0..height as usize)
        .flat_map(|y| (0..width as usize).map(move |x| (x / 3 + y) % colors.len()))
        .map(|i| colors[i])
        .collect();
    Image::new(width, height, pixels).unwrap()
}
