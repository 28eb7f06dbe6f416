use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::constants::MAX_CLUT_COLORS;
use crate::image::format::{Color, Image, IndexedImage};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaletteError {
    #[error(
        "Image has more than {} colors (color #{} at pixel {}). \
         Use ppmquant or pnmquant to reduce the number of colors",
        MAX_CLUT_COLORS,
        .0,
        .1
    )]
    Overflow(usize, usize),
}

/// Reduces an image to a colour look-up table and one index per pixel.
///
/// # Parameters
/// - `image`: the RGB image to index.
///
/// # Returns
/// An `IndexedImage` whose palette lists colours in first-seen row-major
/// order. The same image always yields the same palette and indices.
///
/// # Errors
/// - Returns `PaletteError::Overflow` when the image needs more than
///   `MAX_CLUT_COLORS` distinct colours. Nothing is truncated.
pub fn build_palette(image: &Image) -> Result<IndexedImage, PaletteError> {
    let mut lookup: HashMap<Color, u8> = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity(image.pixels().len());

    for (position, &color) in image.pixels().iter().enumerate() {
        if let Some(&index) = lookup.get(&color) {
            indices.push(index);
            continue;
        }

        if palette.len() >= MAX_CLUT_COLORS {
            return Err(PaletteError::Overflow(palette.len() + 1, position));
        }

        let index = palette.len() as u8;
        palette.push(color);
        lookup.insert(color, index);
        indices.push(index);
    }

    debug!(
        "Indexed {}x{} image into {} colors",
        image.width(),
        image.height(),
        palette.len()
    );

    Ok(IndexedImage {
        width: image.width(),
        height: image.height(),
        palette,
        indices,
    })
}
