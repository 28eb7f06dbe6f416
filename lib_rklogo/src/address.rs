use std::path::Path;

use thiserror::Error;

const ADDRESS_DIGITS: usize = 8;
const PPM_SUFFIX: &str = ".ppm";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Cannot read address from {0:?}. Use 32bit hex format i.e. 1234ABCD.ppm")]
    InvalidFileName(String),
    #[error("Address 0x00000000 is not a valid section offset")]
    ZeroAddress,
}

/// Parses the section offset encoded in a `1234ABCD.ppm` file name.
///
/// Only the base name is looked at; it must be exactly eight hex digits
/// followed by `.ppm`.
pub fn parse_address<P: AsRef<Path>>(path: P) -> Result<u32, AddressError> {
    let name = path
        .as_ref()
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let invalid = || AddressError::InvalidFileName(name.to_string());

    let digits = name.strip_suffix(PPM_SUFFIX).ok_or_else(invalid)?;
    if digits.len() != ADDRESS_DIGITS || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    match u32::from_str_radix(digits, 16).map_err(|_| invalid())? {
        0 => Err(AddressError::ZeroAddress),
        address => Ok(address),
    }
}
