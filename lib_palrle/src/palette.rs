use std::collections::HashMap;

use log::{debug, error};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Invalid pixel data length: expected multiple of 4 bytes, got {0}")]
    InvalidPixelDataLength(usize),
    #[error("Palette overflow: maximum 256 colors supported, attempted to add color #{0}")]
    PaletteOverflow(usize),
    #[error("Invalid palette index: {0} exceeds palette size of {1}")]
    InvalidPaletteIndex(usize, usize),
    #[error("Mask holds {actual} entries for {expected} pixels")]
    MaskSizeMismatch { expected: usize, actual: usize },
}

/// An RGBA image split into what the encoder consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    /// Unique opaque colors, as little-endian packed RGBA.
    pub palette: Vec<u32>,
    /// Palette index for each pixel, 0 where the pixel is transparent.
    pub indices: Vec<u8>,
    /// `false` where alpha is 0.
    pub mask: Vec<bool>,
}

/// Builds a palette from a raw RGBA8 buffer.
///
/// Fully transparent pixels are masked out and take no palette slot. Colors
/// are numbered in order of first appearance.
///
/// # Errors
/// - Returns `PaletteError::InvalidPixelDataLength` if input length is not a multiple of 4
/// - Returns `PaletteError::PaletteOverflow` if more than 256 unique colors are found
pub fn index_rgba(rgba: &[u8]) -> Result<IndexedImage, PaletteError> {
    if rgba.len() % 4 != 0 {
        error!("RGBA buffer of {} bytes is not a whole number of pixels", rgba.len());
        return Err(PaletteError::InvalidPixelDataLength(rgba.len()));
    }

    let pixel_count = rgba.len() / 4;
    let mut unique_colors = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity(pixel_count);
    let mut mask = Vec::with_capacity(pixel_count);

    for pixel in rgba.chunks_exact(4) {
        if pixel[3] == 0 {
            indices.push(0);
            mask.push(false);
            continue;
        }

        let color = u32::from_le_bytes([pixel[0], pixel[1], pixel[2], pixel[3]]);
        let index = match unique_colors.get(&color) {
            Some(&index) => index,
            None => {
                if palette.len() >= 256 {
                    error!("Palette overflow at color #{}", palette.len() + 1);
                    return Err(PaletteError::PaletteOverflow(palette.len() + 1));
                }
                let index = palette.len() as u8;
                palette.push(color);
                unique_colors.insert(color, index);
                index
            }
        };
        indices.push(index);
        mask.push(true);
    }
    debug!(
        "Indexed {} pixels into {} colors",
        pixel_count,
        palette.len()
    );

    Ok(IndexedImage {
        palette,
        indices,
        mask,
    })
}

/// Expands palette indices back into RGBA8. Masked-out pixels become
/// transparent black.
///
/// # Errors
/// - Returns `PaletteError::InvalidPaletteIndex` if a visible index exceeds the palette size
/// - Returns `PaletteError::MaskSizeMismatch` if the mask length differs from the pixel count
pub fn expand_rgba(
    pixels: &[u8],
    mask: Option<&[bool]>,
    palette: &[u32],
) -> Result<Vec<u8>, PaletteError> {
    if let Some(mask) = mask {
        if mask.len() != pixels.len() {
            error!("Mask of {} entries for {} pixels", mask.len(), pixels.len());
            return Err(PaletteError::MaskSizeMismatch {
                expected: pixels.len(),
                actual: mask.len(),
            });
        }
    }

    let mut rgba = Vec::with_capacity(pixels.len() * 4);
    for (position, &index) in pixels.iter().enumerate() {
        if mask.is_some_and(|mask| !mask[position]) {
            rgba.extend_from_slice(&[0; 4]);
            continue;
        }

        let color = palette.get(index as usize).ok_or_else(|| {
            error!("Pixel #{} uses index {} past the palette", position, index);
            PaletteError::InvalidPaletteIndex(index as usize, palette.len())
        })?;
        rgba.extend_from_slice(&color.to_le_bytes());
    }

    Ok(rgba)
}
