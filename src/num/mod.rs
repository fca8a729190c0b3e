//! ITF8 and LTF8 variable-length integer codecs.
//!
//! These are the only encoders in this crate allowed to touch the slice
//! header's byte stream directly, to keep endianness and framing concerns in
//! one place (§9 "ITF8/LTF8").

mod itf8;
mod ltf8;

pub use itf8::{itf8_size_of, read_itf8, write_itf8};
pub use ltf8::{ltf8_size_of, read_ltf8, write_ltf8};
