//! Secure QR payload parsing

pub mod parser;
pub mod types;

pub use parser::{decode_document_base64, delimiter_positions, parse_document, split_document};
pub use types::*;
