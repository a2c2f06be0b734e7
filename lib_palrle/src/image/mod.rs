pub mod blit;
pub mod decoder;
pub mod encoder;
pub mod format;
mod segment;

pub use blit::blit;
pub use decoder::{decode, decode_with_mask, DecodeError, DecodedImage};
pub use encoder::{encode, encode_masked, EncodeError};
