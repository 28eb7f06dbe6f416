//! Plain (ASCII) PPM loading and writing.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use log::debug;
use thiserror::Error;

use super::format::{Color, Image, ImageError};
use crate::constants::PPM_TRIPLETS_PER_LINE;

#[derive(Error, Debug)]
pub enum PpmError {
    #[error("Not a PNM file: expected 'P' magic")]
    InvalidMagic,
    #[error("Image type P{0} is not supported. Please use ASCII PPM (P3)")]
    UnsupportedSubtype(char),
    #[error("Unexpected end of file while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("Invalid {field}: unexpected character {found:?}")]
    InvalidNumber { field: &'static str, found: char },
    #[error("Invalid {0}: value does not fit")]
    NumberTooLarge(&'static str),
    #[error("Invalid maxval {0}, expected 1..=65535")]
    InvalidMaxval(u32),
    #[error("Invalid image dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("Sample value {value} exceeds maxval {maxval}")]
    SampleOutOfRange { value: u32, maxval: u32 },
    #[error("Invalid image")]
    Image(#[from] ImageError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

struct Tokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn skip_separators(&mut self) {
        while let Some(byte) = self.peek() {
            if byte == b'#' {
                // Comments run to end of line
                while let Some(byte) = self.next_byte() {
                    if byte == b'\n' {
                        break;
                    }
                }
            } else if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn number(&mut self, field: &'static str) -> Result<u32, PpmError> {
        self.skip_separators();

        let first = self.peek().ok_or(PpmError::UnexpectedEof(field))?;
        if !first.is_ascii_digit() {
            return Err(PpmError::InvalidNumber {
                field,
                found: first as char,
            });
        }

        let mut value: u32 = 0;
        while let Some(byte) = self.peek().filter(u8::is_ascii_digit) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u32::from(byte - b'0')))
                .ok_or(PpmError::NumberTooLarge(field))?;
            self.pos += 1;
        }
        Ok(value)
    }
}

/// Rescales a sample from `[0, maxval]` to `[0, 255]`, rounding to nearest.
pub fn scale_sample(value: u32, maxval: u32) -> u8 {
    ((255 * value + maxval / 2) / maxval) as u8
}

/// Reads an ASCII PPM stream into an RGB image.
pub fn read_ppm<R: Read>(mut reader: R) -> Result<Image, PpmError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let mut tokens = Tokenizer::new(&data);

    match tokens.next_byte() {
        Some(b'P') => {}
        Some(_) => return Err(PpmError::InvalidMagic),
        None => return Err(PpmError::UnexpectedEof("magic")),
    }
    match tokens.next_byte() {
        Some(b'3') => {}
        Some(subtype) => return Err(PpmError::UnsupportedSubtype(subtype as char)),
        None => return Err(PpmError::UnexpectedEof("image type")),
    }

    let width = tokens.number("width")?;
    let height = tokens.number("height")?;
    let max_dimension = u32::from(u16::MAX);
    if width == 0 || height == 0 || width > max_dimension || height > max_dimension {
        return Err(PpmError::InvalidDimensions(width, height));
    }

    let maxval = tokens.number("maxval")?;
    if maxval == 0 || maxval > 65535 {
        return Err(PpmError::InvalidMaxval(maxval));
    }
    debug!("PPM header: {}x{} maxval {}", width, height, maxval);

    let mut sample = || -> Result<u8, PpmError> {
        let value = tokens.number("pixel data")?;
        if value > maxval {
            return Err(PpmError::SampleOutOfRange { value, maxval });
        }
        Ok(scale_sample(value, maxval))
    };

    let pixel_count = width as usize * height as usize;
    // An ASCII triplet takes at least 6 bytes; never reserve past what was read
    let mut pixels = Vec::with_capacity(pixel_count.min(data.len() / 6));
    for _ in 0..pixel_count {
        let red = sample()?;
        let green = sample()?;
        let blue = sample()?;
        pixels.push(Color::new(red, green, blue));
    }

    Ok(Image::new(width as u16, height as u16, pixels)?)
}

pub fn load_ppm<P: AsRef<Path>>(path: P) -> Result<Image, PpmError> {
    let file = File::open(path)?;
    read_ppm(file)
}

/// Writes an image as ASCII PPM with maxval 255.
///
/// Triplets within a row are separated by two spaces and wrapped after every
/// sixth one; each row ends with its own newline.
pub fn write_ppm<W: Write>(image: &Image, mut out: W) -> io::Result<()> {
    write!(out, "P3\n{} {}\n255\n", image.width(), image.height())?;

    for row in image.rows() {
        for (column, color) in row.iter().enumerate() {
            write!(out, "{} {} {}", color.red, color.green, color.blue)?;
            if (column + 1) % PPM_TRIPLETS_PER_LINE == 0 {
                out.write_all(b"\n")?;
            } else {
                out.write_all(b"  ")?;
            }
        }
        out.write_all(b"\n")?;
    }

    out.flush()
}

pub fn save_ppm<P: AsRef<Path>>(image: &Image, path: P) -> io::Result<()> {
    let file = File::create(path)?;
    write_ppm(image, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Color = Color::new(0, 0, 0);
    const WHITE: Color = Color::new(255, 255, 255);
    const RED: Color = Color::new(255, 0, 0);

    #[test]
    fn test_read_two_by_two() {
        let source = b"P3\n2 2\n255\n0 0 0  255 255 255\n255 0 0  0 0 0\n";
        let image = read_ppm(&source[..]).unwrap();

        assert_eq!((image.width(), image.height()), (2, 2));
        assert_eq!(image.pixels(), &[BLACK, WHITE, RED, BLACK]);
    }

    #[test]
    fn test_read_skips_comments() {
        let source = b"P3\n# created by hand\n1 1 # size\n255\n# pixel\n1 2 3\n";
        let image = read_ppm(&source[..]).unwrap();
        assert_eq!(image.pixels(), &[Color::new(1, 2, 3)]);
    }

    #[test]
    fn test_read_rescales_maxval() {
        let source = b"P3 1 1 15 15 7 0";
        let image = read_ppm(&source[..]).unwrap();
        // (255 * 7 + 7) / 15 = 119
        assert_eq!(image.pixels(), &[Color::new(255, 119, 0)]);
    }

    #[test]
    fn test_scale_sample_rounding() {
        assert_eq!(scale_sample(0, 1), 0);
        assert_eq!(scale_sample(1, 1), 255);
        assert_eq!(scale_sample(1, 2), 128);
        assert_eq!(scale_sample(65535, 65535), 255);
    }

    #[test]
    fn test_read_rejects_missing_magic() {
        let result = read_ppm(&b"Q3 1 1 255 0 0 0"[..]);
        assert!(matches!(result, Err(PpmError::InvalidMagic)));
    }

    #[test]
    fn test_read_rejects_binary_ppm() {
        let result = read_ppm(&b"P6\n1 1\n255\n\x00\x00\x00"[..]);
        assert!(matches!(result, Err(PpmError::UnsupportedSubtype('6'))));
    }

    #[test]
    fn test_read_reports_truncated_pixels() {
        let result = read_ppm(&b"P3\n2 1\n255\n0 0 0 1 1"[..]);
        assert!(matches!(result, Err(PpmError::UnexpectedEof("pixel data"))));
    }

    #[test]
    fn test_read_rejects_empty_stream() {
        let result = read_ppm(&b""[..]);
        assert!(matches!(result, Err(PpmError::UnexpectedEof("magic"))));
    }

    #[test]
    fn test_read_rejects_sample_above_maxval() {
        let result = read_ppm(&b"P3 1 1 100 101 0 0"[..]);
        assert!(matches!(
            result,
            Err(PpmError::SampleOutOfRange {
                value: 101,
                maxval: 100
            })
        ));
    }

    #[test]
    fn test_read_huge_header_with_short_body() {
        let result = read_ppm(&b"P3 65535 65535 255 0 0 0"[..]);
        assert!(matches!(result, Err(PpmError::UnexpectedEof("pixel data"))));
    }

    #[test]
    fn test_read_rejects_zero_maxval() {
        let result = read_ppm(&b"P3 1 1 0 0 0 0"[..]);
        assert!(matches!(result, Err(PpmError::InvalidMaxval(0))));
    }

    #[test]
    fn test_read_rejects_oversized_dimensions() {
        let result = read_ppm(&b"P3 70000 1 255"[..]);
        assert!(matches!(result, Err(PpmError::InvalidDimensions(70000, 1))));
    }

    #[test]
    fn test_read_rejects_garbage_number() {
        let result = read_ppm(&b"P3 x 1 255"[..]);
        assert!(matches!(
            result,
            Err(PpmError::InvalidNumber {
                field: "width",
                found: 'x'
            })
        ));
    }

    #[test]
    fn test_write_header_and_pixels() {
        let image = Image::new(2, 1, vec![Color::new(10, 20, 30), Color::new(40, 50, 60)]).unwrap();
        let mut out = Vec::new();
        write_ppm(&image, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "P3\n2 1\n255\n10 20 30  40 50 60  \n"
        );
    }

    #[test]
    fn test_write_wraps_after_six_triplets() {
        let image = Image::new(7, 1, vec![Color::new(1, 1, 1); 7]).unwrap();
        let mut out = Vec::new();
        write_ppm(&image, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[3], "1 1 1  1 1 1  1 1 1  1 1 1  1 1 1  1 1 1");
        assert_eq!(lines[4], "1 1 1  ");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_written_ppm_reads_back() {
        let pixels: Vec<Color> = (0..21u8).map(|i| Color::new(i, 255 - i, i / 2)).collect();
        let image = Image::new(7, 3, pixels).unwrap();
        let mut out = Vec::new();
        write_ppm(&image, &mut out).unwrap();

        assert_eq!(read_ppm(&out[..]).unwrap(), image);
    }
}
