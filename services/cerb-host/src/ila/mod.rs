//! ILA CSV trace decoding
//!
//! Turns a Vivado integrated-logic-analyzer export of the RFDC AXI-Stream
//! bus into complex IQ samples.

pub mod capture;
pub mod decoder;
mod error;

pub use capture::{find_data_column, parse_capture, CaptureFile, CaptureRow};
pub use decoder::{
    decode, decode_capture, decode_file, decode_word, encode_row, encode_word, normalize,
};
pub use error::{FormatReason, IlaError};
