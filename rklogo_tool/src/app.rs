use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lib_rklogo::address::{parse_address, AddressError};
use lib_rklogo::image::encoder::{encode_file, EncodeError, SectionLayout};
use lib_rklogo::image::ppm::{load_ppm, PpmError};
use lib_rklogo::image::scanner::{extract_file, ExtractSummary};
use log::info;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("File {} doesn't exist", .0.display())]
    MissingInput(PathBuf),

    #[error("Unrecognised file format: {}, expected .ppm or .img", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Cannot read image")]
    Ppm(#[from] PpmError),

    #[error("Cannot write logo")]
    Encode(#[from] EncodeError),

    #[error("Cannot access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Conversion direction, picked from the input file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `.ppm` into an existing kernel image at the given offset.
    Encode(u32),
    /// `.img` into a directory of `.ppm` files.
    Extract,
}

#[derive(Debug)]
pub enum Outcome {
    Encoded(SectionLayout),
    Extracted(ExtractSummary),
}

pub fn direction(input: &Path) -> Result<Direction, AppError> {
    match input.extension().and_then(|ext| ext.to_str()) {
        Some("ppm") => Ok(Direction::Encode(parse_address(input)?)),
        Some("img") => Ok(Direction::Extract),
        _ => Err(AppError::UnsupportedExtension(input.to_path_buf())),
    }
}

pub fn run(input: &Path, output: &Path) -> Result<Outcome, AppError> {
    if !input.is_file() {
        return Err(AppError::MissingInput(input.to_path_buf()));
    }

    match direction(input)? {
        Direction::Encode(address) => {
            info!("Reading image...");
            let image = load_ppm(input)?;
            let layout = encode_file(output, u64::from(address), &image)?;
            Ok(Outcome::Encoded(layout))
        }
        Direction::Extract => {
            fs::create_dir_all(output).map_err(|source| AppError::Io {
                path: output.to_path_buf(),
                source,
            })?;
            let summary = extract_file(input, output).map_err(|source| AppError::Io {
                path: input.to_path_buf(),
                source,
            })?;
            Ok(Outcome::Extracted(summary))
        }
    }
}
