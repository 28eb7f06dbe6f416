pub mod decoder;
pub mod encoder;
pub mod format;
pub mod ppm;
pub mod scanner;

pub use decoder::decode_section;
pub use encoder::{encode_file, encode_into};
pub use scanner::{extract_all, extract_file, find_sections};
