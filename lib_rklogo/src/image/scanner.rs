use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info};
use memchr::memmem;
use thiserror::Error;

use super::decoder::{decode_section, report_skipped, DecodeError};
use super::format::ImageError;
use super::ppm::save_ppm;
use crate::constants::CLUT_MARKER;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Section could not be decoded")]
    Decode(#[from] DecodeError),
    #[error("Section holds an invalid image")]
    Image(#[from] ImageError),
    #[error("Cannot write {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
}

/// Outcome of scanning one blob.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub found: usize,
    pub written: Vec<PathBuf>,
    pub skipped: usize,
}

/// Offsets of every palette marker in `blob`, left to right.
///
/// Matches never overlap: scanning resumes right after each 16 byte hit.
pub fn find_sections(blob: &[u8]) -> Vec<usize> {
    memmem::find_iter(blob, &CLUT_MARKER).collect()
}

/// `00ABCDEF.ppm` for a section at 0xABCDEF.
pub fn output_file_name(offset: usize) -> String {
    format!("{:08X}.ppm", offset)
}

/// Decodes the section at `offset` and writes it into `out_dir`.
pub fn extract_section(
    blob: &[u8],
    offset: usize,
    out_dir: &Path,
) -> Result<PathBuf, ExtractError> {
    info!("Processing an image @0x{:X}", offset);
    let indexed = decode_section(&blob[offset..])?;
    let image = indexed.expand()?;

    let path = out_dir.join(output_file_name(offset));
    save_ppm(&image, &path).map_err(|err| ExtractError::Io(path.clone(), err))?;
    Ok(path)
}

/// Extracts every section of `blob` into `out_dir`.
///
/// A section that fails to decode or write is logged and skipped; the scan
/// always runs to the end of the blob.
pub fn extract_all(blob: &[u8], out_dir: &Path) -> ExtractSummary {
    let mut summary = ExtractSummary::default();

    for offset in find_sections(blob) {
        summary.found += 1;
        match extract_section(blob, offset, out_dir) {
            Ok(path) => {
                info!("Written {}", path.display());
                summary.written.push(path);
            }
            Err(ExtractError::Decode(err)) => {
                report_skipped(offset, &err);
                summary.skipped += 1;
            }
            Err(err) => {
                error!("Section @0x{:X}: {}", offset, err);
                summary.skipped += 1;
            }
        }
    }

    summary
}

/// Reads the whole blob at `path` into memory and extracts it.
pub fn extract_file<P: AsRef<Path>>(path: P, out_dir: &Path) -> io::Result<ExtractSummary> {
    let blob = fs::read(path)?;
    info!("Read {} bytes of data", blob.len());
    Ok(extract_all(&blob, out_dir))
}
