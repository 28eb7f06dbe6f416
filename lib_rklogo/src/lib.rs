pub mod address;
pub mod constants;
pub mod image;
pub mod palette;

use log::*;
use std::io::Write;

pub use crate::address::parse_address;
pub use crate::image::format::{Color, Image, IndexedImage};
pub use crate::image::ppm::{load_ppm, read_ppm, save_ppm, write_ppm};
pub use crate::image::{
    decode_section, encode_file, encode_into, extract_all, extract_file, find_sections,
};
pub use crate::palette::build_palette;

/// Sends log records to stderr, `level` and above.
pub fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}
