use log::{debug, error};

use super::decoder::DecodeError;
use super::format::EncodedImage;

/// Draws `encoded` into `target` with its full-image origin at
/// `(dest_x, dest_y)`.
///
/// Only stored pixels are written, so the target shows through masked-out
/// areas. Pixels landing outside `target_width x target_height` are dropped.
pub fn blit(
    encoded: &EncodedImage,
    dest_x: i32,
    dest_y: i32,
    target: &mut [u8],
    target_width: usize,
    target_height: usize,
) -> Result<(), DecodeError> {
    let expected = target_width.saturating_mul(target_height);
    if target.len() < expected {
        error!(
            "Target buffer holds {} pixels, {}x{} needs {}",
            target.len(),
            target_width,
            target_height,
            expected
        );
        return Err(DecodeError::TargetTooSmall {
            expected,
            actual: target.len(),
        });
    }

    let origin_x = i64::from(encoded.xoffset()) + i64::from(dest_x);
    let origin_y = i64::from(encoded.yoffset()) + i64::from(dest_y);
    let vpitch = i64::from(encoded.vpitch());

    // Rows entirely above or below the target are never walked.
    let first_row = (-origin_y).clamp(0, vpitch) as usize;
    let last_row = (target_height as i64 - origin_y).clamp(0, vpitch) as usize;
    if first_row >= last_row {
        debug!("Blit at ({}, {}) misses the target", dest_x, dest_y);
        return Ok(());
    }

    let (mut written, mut clipped) = (0usize, 0usize);
    encoded.walk_rows(first_row..last_row, |x, y, color| {
        let tx = origin_x + x as i64;
        if tx < 0 || tx >= target_width as i64 {
            clipped += 1;
            return;
        }
        let ty = (origin_y + y as i64) as usize;
        target[ty * target_width + tx as usize] = color;
        written += 1;
    })?;
    debug!(
        "Blit at ({}, {}): {} pixels written, {} clipped",
        dest_x, dest_y, written, clipped
    );

    Ok(())
}
