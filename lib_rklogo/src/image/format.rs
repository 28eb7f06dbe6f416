use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image dimensions must be non-zero, got {0}x{1}")]
    EmptyDimensions(u16, u16),
    #[error("Pixel buffer holds {actual} pixels, {width}x{height} needs {expected}")]
    PixelCountMismatch {
        width: u16,
        height: u16,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Row-major RGB raster, origin top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u16,
    height: u16,
    pixels: Vec<Color>,
}

impl Image {
    pub fn new(width: u16, height: u16, pixels: Vec<Color>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyDimensions(width, height));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ImageError::PixelCountMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.pixels.chunks(self.width as usize)
    }
}

/// Palette plus one palette index per pixel.
///
/// Produced by [`crate::palette::build_palette`] for encoding and by the
/// section decoder when reading a blob. Indices are not checked against the
/// palette length here: sections found in the wild may reference entries past
/// the stored colour count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: u16,
    pub height: u16,
    pub palette: Vec<Color>,
    pub indices: Vec<u8>,
}

impl IndexedImage {
    pub fn color_at(&self, index: u8) -> Color {
        self.palette
            .get(index as usize)
            .copied()
            .unwrap_or(Color::BLACK)
    }

    /// Expands indices back into colours.
    ///
    /// Indices outside the palette are painted black, which is what the
    /// zero-filled 224 entry table of the firmware yields for them. The
    /// section decoder already warns about each of them.
    pub fn expand(&self) -> Result<Image, ImageError> {
        let pixels = self
            .indices
            .iter()
            .map(|&index| self.color_at(index))
            .collect();

        Image::new(self.width, self.height, pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_rejects_zero_dimensions() {
        assert_eq!(
            Image::new(0, 4, vec![]),
            Err(ImageError::EmptyDimensions(0, 4))
        );
    }

    #[test]
    fn test_image_rejects_short_pixel_buffer() {
        let result = Image::new(2, 2, vec![Color::BLACK; 3]);
        assert!(matches!(
            result,
            Err(ImageError::PixelCountMismatch {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_rows_split_by_width() {
        let red = Color::new(255, 0, 0);
        let image = Image::new(2, 2, vec![Color::BLACK, red, red, Color::BLACK]).unwrap();
        let rows: Vec<_> = image.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], &[red, Color::BLACK]);
    }

    #[test]
    fn test_expand_out_of_range_index_is_black() {
        let indexed = IndexedImage {
            width: 2,
            height: 1,
            palette: vec![Color::new(1, 2, 3)],
            indices: vec![0, 7],
        };
        let image = indexed.expand().unwrap();
        assert_eq!(image.pixels(), &[Color::new(1, 2, 3), Color::BLACK]);
    }
}
