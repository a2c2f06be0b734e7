use super::format::EncodedImage;
use log::{debug, info};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Encoded data truncated: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("Failed to parse header")]
    Header(#[from] bincode::Error),
    #[error("Declared size {declared} does not match data length {actual}")]
    SizeMismatch { declared: usize, actual: usize },
    #[error("Inconsistent pitch: hpitch={hpitch} vpitch={vpitch}")]
    InconsistentPitch { hpitch: u16, vpitch: u16 },
    #[error("Crop region {hpitch}x{vpitch} at ({x}, {y}) exceeds image size {width}x{height}")]
    CropOutOfBounds {
        x: u16,
        y: u16,
        hpitch: u16,
        vpitch: u16,
        width: u16,
        height: u16,
    },
    #[error("Row #{row} has invalid offset {offset}")]
    BadRowOffset { row: usize, offset: u32 },
    #[error("Row #{row} covers more than {hpitch} pixels")]
    RowOverrun { row: usize, hpitch: usize },
    #[error("Row #{row} ends after {covered} of {hpitch} pixels")]
    RowUnderrun {
        row: usize,
        covered: usize,
        hpitch: usize,
    },
    #[error("Row #{row} has {extra} bytes past its last segment")]
    TrailingRowBytes { row: usize, extra: usize },
    #[error("Target buffer holds {actual} pixels, expected at least {expected}")]
    TargetTooSmall { expected: usize, actual: usize },
}

/// A fully expanded image: one palette index per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
    /// `true` for every pixel the encoded image stores.
    pub mask: Option<Vec<bool>>,
}

/// Expands an encoded image into a `width * height` index buffer.
/// Pixels outside the stored runs keep index 0.
pub fn decode(encoded: &EncodedImage) -> Result<DecodedImage, DecodeError> {
    decode_image(encoded, false)
}

/// Same as [`decode`], also reporting which pixels were stored.
pub fn decode_with_mask(encoded: &EncodedImage) -> Result<DecodedImage, DecodeError> {
    decode_image(encoded, true)
}

fn decode_image(encoded: &EncodedImage, with_mask: bool) -> Result<DecodedImage, DecodeError> {
    info!("Starting decoding");

    let width = encoded.width() as usize;
    let height = encoded.height() as usize;
    let mut pixels = vec![0u8; width * height];
    let mut mask = with_mask.then(|| vec![false; width * height]);
    debug!(
        "Image dimensions: width={} height={}, crop {}x{} at ({}, {})",
        width,
        height,
        encoded.hpitch(),
        encoded.vpitch(),
        encoded.xoffset(),
        encoded.yoffset()
    );

    let xoffset = encoded.xoffset() as usize;
    let yoffset = encoded.yoffset() as usize;
    encoded.walk_rows(0..encoded.vpitch() as usize, |x, y, color| {
        let index = (yoffset + y) * width + xoffset + x;
        pixels[index] = color;
        if let Some(mask) = mask.as_mut() {
            mask[index] = true;
        }
    })?;

    info!("Decoding completed successfully");
    Ok(DecodedImage {
        width: encoded.width(),
        height: encoded.height(),
        pixels,
        mask,
    })
}
