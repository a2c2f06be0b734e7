use log::{debug, error, info};
use thiserror::Error;

use super::format::{EncodedImage, Header};
use crate::constants::{HEADER_SIZE, MAX_LITERAL, MAX_REPEAT, MAX_SKIP, MIN_REPEAT, WORD_SIZE};

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Expected {expected} pixels, got {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },
    #[error("Expected {expected} mask entries, got {actual}")]
    MaskSizeMismatch { expected: usize, actual: usize },
    #[error("Palette of {0} colors exceeds the limit of 65535")]
    PaletteTooLarge(usize),
    #[error("Encoded image of {0} bytes does not fit a 32-bit size field")]
    TooLarge(usize),
    #[error("Failed to serialize header")]
    HeaderSerialization(#[from] bincode::Error),
}

/// Visible area of the image, in full-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

/// Encodes an image in which every pixel is visible.
pub fn encode(
    width: u16,
    height: u16,
    pixels: &[u8],
    palette: &[u32],
) -> Result<EncodedImage, EncodeError> {
    encode_image(width, height, pixels, None, palette)
}

/// Encodes an image keeping only the pixels whose `mask` entry is `true`.
/// The result is cropped to the bounding box of those pixels.
pub fn encode_masked(
    width: u16,
    height: u16,
    pixels: &[u8],
    mask: &[bool],
    palette: &[u32],
) -> Result<EncodedImage, EncodeError> {
    encode_image(width, height, pixels, Some(mask), palette)
}

fn encode_image(
    width: u16,
    height: u16,
    pixels: &[u8],
    mask: Option<&[bool]>,
    palette: &[u32],
) -> Result<EncodedImage, EncodeError> {
    info!("Starting encoding");

    let full_width = width as usize;
    let area = full_width * height as usize;
    if pixels.len() != area {
        error!("Expected {} pixels for {}x{}, got {}", area, width, height, pixels.len());
        return Err(EncodeError::PixelCountMismatch {
            expected: area,
            actual: pixels.len(),
        });
    }
    if let Some(mask) = mask {
        if mask.len() != area {
            error!("Expected {} mask entries, got {}", area, mask.len());
            return Err(EncodeError::MaskSizeMismatch {
                expected: area,
                actual: mask.len(),
            });
        }
    }
    let palette_count = u16::try_from(palette.len()).map_err(|_| {
        error!("Palette size {} exceeds 65535 colors", palette.len());
        EncodeError::PaletteTooLarge(palette.len())
    })?;

    let bounds = match mask {
        Some(mask) => bounding_box(full_width, height as usize, mask),
        None if area > 0 => Some(Bounds {
            x: 0,
            y: 0,
            width: full_width,
            height: height as usize,
        }),
        None => None,
    };
    let bounds = bounds.unwrap_or(Bounds {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    });
    debug!("Visible bounds: {:?}", bounds);

    // Worst case per row is a one-pixel literal after every skip plus a
    // closing segment, which stays under two bytes per pixel.
    let capacity = HEADER_SIZE
        + (palette.len() + bounds.height) * WORD_SIZE
        + bounds.height * (2 * bounds.width + 2);
    let mut bytes = Vec::with_capacity(capacity);
    bytes.resize(HEADER_SIZE, 0);

    for color in palette {
        bytes.extend_from_slice(&color.to_le_bytes());
    }
    debug!("Palette written with {} colors", palette.len());

    let table_start = bytes.len();
    bytes.resize(table_start + bounds.height * WORD_SIZE, 0);

    for row in 0..bounds.height {
        let offset = bytes.len() - HEADER_SIZE;
        let offset = u32::try_from(offset).map_err(|_| {
            error!("Row #{} starts beyond the 32-bit offset range", row);
            EncodeError::TooLarge(bytes.len())
        })?;
        let slot = table_start + row * WORD_SIZE;
        bytes[slot..slot + WORD_SIZE].copy_from_slice(&offset.to_le_bytes());

        let start = (bounds.y + row) * full_width + bounds.x;
        let span = start..start + bounds.width;
        encode_row(&mut bytes, &pixels[span.clone()], mask.map(|mask| &mask[span]));
    }
    debug!("{} rows written", bounds.height);

    let size = u32::try_from(bytes.len()).map_err(|_| {
        error!("Encoded size {} does not fit 32 bits", bytes.len());
        EncodeError::TooLarge(bytes.len())
    })?;
    let header = Header {
        size,
        width,
        height,
        // Bounds lie inside a u16-sized image.
        xoffset: bounds.x as u16,
        yoffset: bounds.y as u16,
        hpitch: bounds.width as u16,
        vpitch: bounds.height as u16,
        palette_count,
    };
    bytes[..HEADER_SIZE].copy_from_slice(&header.to_bytes()?);
    bytes.shrink_to_fit();

    info!(
        "Encoding completed successfully: {} bytes for {} pixels",
        size, area
    );
    Ok(EncodedImage::from_parts(header, bytes))
}

fn bounding_box(width: usize, height: usize, mask: &[bool]) -> Option<Bounds> {
    let (mut left, mut top) = (usize::MAX, usize::MAX);
    let (mut right, mut bottom) = (0, 0);

    for y in 0..height {
        for (x, _) in mask[y * width..(y + 1) * width]
            .iter()
            .enumerate()
            .filter(|&(_, &visible)| visible)
        {
            left = left.min(x);
            right = right.max(x);
            top = top.min(y);
            bottom = bottom.max(y);
        }
    }

    (top != usize::MAX).then(|| Bounds {
        x: left,
        y: top,
        width: right - left + 1,
        height: bottom - top + 1,
    })
}

/// Appends the segments of one cropped row.
fn encode_row(out: &mut Vec<u8>, pixels: &[u8], mask: Option<&[bool]>) {
    let visible = |x: usize| mask.map_or(true, |mask| mask[x]);
    let width = pixels.len();
    let mut x = 0;

    while x < width {
        let mut skip = 0;
        while x < width && !visible(x) {
            skip += 1;
            x += 1;
        }
        while skip > MAX_SKIP {
            out.extend_from_slice(&[MAX_SKIP as u8, 0]);
            skip -= MAX_SKIP;
        }
        if x == width {
            out.extend_from_slice(&[skip as u8, 0]);
            break;
        }

        let repeat = repeat_len(pixels, mask, x);
        if repeat >= MIN_REPEAT {
            out.extend_from_slice(&[skip as u8, repeat as u8, pixels[x]]);
            x += repeat;
            continue;
        }

        let start = x;
        while x < width
            && visible(x)
            && x - start < MAX_LITERAL
            && repeat_len(pixels, mask, x) < MIN_REPEAT
        {
            x += 1;
        }
        let len = x - start;
        out.extend_from_slice(&[skip as u8, (len as u8).wrapping_neg()]);
        out.extend_from_slice(&pixels[start..x]);
    }
}

/// Length of the visible same-color span starting at `start`, capped at
/// [`MAX_REPEAT`].
fn repeat_len(pixels: &[u8], mask: Option<&[bool]>, start: usize) -> usize {
    let color = pixels[start];
    (start..pixels.len())
        .take(MAX_REPEAT)
        .take_while(|&x| pixels[x] == color && mask.map_or(true, |mask| mask[x]))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_bytes(pixels: &[u8], mask: Option<&[bool]>) -> Vec<u8> {
        let mut out = Vec::new();
        encode_row(&mut out, pixels, mask);
        out
    }

    #[test]
    fn test_run_selection() {
        let row = [5, 5, 5, 5, 1, 2, 5, 5, 5, 5, 5];
        assert_eq!(
            row_bytes(&row, None),
            vec![0, 4, 5, 0, 0xFE, 1, 2, 0, 5, 5]
        );
    }

    #[test]
    fn test_short_spans_stay_literal() {
        let row = [1, 1, 2, 2, 3];
        assert_eq!(row_bytes(&row, None), vec![0, 0xFB, 1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_repeat_cap() {
        let row = vec![9u8; 300];
        assert_eq!(
            row_bytes(&row, None),
            vec![0, 127, 9, 0, 127, 9, 0, 46, 9]
        );
    }

    #[test]
    fn test_literal_cap() {
        let row: Vec<u8> = (0..200).map(|i| (i % 2) as u8).collect();
        let bytes = row_bytes(&row, None);

        assert_eq!(&bytes[..2], &[0, 0x80]);
        assert_eq!(&bytes[2..130], &row[..128]);
        assert_eq!(&bytes[130..132], &[0, (72u8).wrapping_neg()]);
        assert_eq!(bytes.len(), 2 + 128 + 2 + 72);
    }

    #[test]
    fn test_skips_and_closing_segment() {
        let row = [7, 0, 0, 7, 7, 7, 0];
        let mask = [true, false, false, true, true, true, false];
        assert_eq!(
            row_bytes(&row, Some(&mask)),
            vec![0, 0xFF, 7, 2, 3, 7, 1, 0]
        );
    }

    #[test]
    fn test_masked_pixels_break_repeats() {
        let row = [4, 4, 4, 4];
        let mask = [true, true, false, true];
        assert_eq!(
            row_bytes(&row, Some(&mask)),
            vec![0, 0xFE, 4, 4, 1, 0xFF, 4]
        );
    }

    #[test]
    fn test_long_skip_chains() {
        let mut mask = vec![false; 600];
        mask[0] = true;
        mask[599] = true;
        let row = vec![3u8; 600];
        assert_eq!(
            row_bytes(&row, Some(&mask)),
            vec![0, 0xFF, 3, 255, 0, 255, 0, 88, 0xFF, 3]
        );
    }

    #[test]
    fn test_bounding_box() {
        #[rustfmt::skip]
        let mask = [
            false, false, false, false,
            false, true,  false, false,
            false, false, true,  false,
        ];
        assert_eq!(
            bounding_box(4, 3, &mask),
            Some(Bounds {
                x: 1,
                y: 1,
                width: 2,
                height: 2
            })
        );
        assert_eq!(bounding_box(4, 3, &[false; 12]), None);
    }

    #[test]
    fn test_pixel_count_mismatch() {
        let result = encode(2, 2, &[0; 3], &[]);
        assert!(matches!(
            result,
            Err(EncodeError::PixelCountMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_mask_size_mismatch() {
        let result = encode_masked(2, 2, &[0; 4], &[true; 5], &[]);
        assert!(matches!(
            result,
            Err(EncodeError::MaskSizeMismatch {
                expected: 4,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_encoded_layout() {
        let encoded = encode(11, 1, &[5, 5, 5, 5, 1, 2, 5, 5, 5, 5, 5], &[0xFF00FF00]).unwrap();

        assert_eq!(encoded.size() as usize, encoded.as_bytes().len());
        assert_eq!(encoded.size() as usize, HEADER_SIZE + 4 + 4 + 10);
        assert_eq!(encoded.row_offsets().collect::<Vec<_>>(), vec![8]);
        assert_eq!(&encoded.data()[8..], &[0, 4, 5, 0, 0xFE, 1, 2, 0, 5, 5]);
    }
}
