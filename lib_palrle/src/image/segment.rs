use std::cmp::Ordering;

use log::error;

use super::decoder::DecodeError;

/// Reads one row's `(skip, run, payload)` segments and reports each visible
/// pixel as `put(x, color)`.
///
/// The stream must cover exactly `hpitch` pixels and end right after the
/// segment that reaches `hpitch`.
pub(crate) fn walk_row(
    stream: &[u8],
    row: usize,
    hpitch: usize,
    mut put: impl FnMut(usize, u8),
) -> Result<(), DecodeError> {
    let underrun = |covered: usize| {
        error!("Row #{} ends after {} of {} pixels", row, covered, hpitch);
        DecodeError::RowUnderrun {
            row,
            covered,
            hpitch,
        }
    };
    let overrun = || {
        error!("Row #{} covers more than {} pixels", row, hpitch);
        DecodeError::RowOverrun { row, hpitch }
    };

    let mut cursor = 0;
    let mut x = 0;
    while x < hpitch {
        let (skip, run) = match stream.get(cursor..cursor + 2) {
            Some(&[skip, run]) => (skip as usize, run as i8),
            _ => return Err(underrun(x)),
        };
        cursor += 2;

        x += skip;
        if x > hpitch {
            return Err(overrun());
        }

        match run.cmp(&0) {
            Ordering::Greater => {
                let len = run as usize;
                let color = *stream.get(cursor).ok_or_else(|| underrun(x))?;
                cursor += 1;
                if x + len > hpitch {
                    return Err(overrun());
                }
                for offset in 0..len {
                    put(x + offset, color);
                }
                x += len;
            }
            Ordering::Less => {
                let len = run.unsigned_abs() as usize;
                let colors = stream
                    .get(cursor..cursor + len)
                    .ok_or_else(|| underrun(x))?;
                cursor += len;
                if x + len > hpitch {
                    return Err(overrun());
                }
                for (offset, &color) in colors.iter().enumerate() {
                    put(x + offset, color);
                }
                x += len;
            }
            Ordering::Equal => {}
        }
    }

    if cursor != stream.len() {
        error!(
            "Row #{} has {} bytes past its last segment",
            row,
            stream.len() - cursor
        );
        return Err(DecodeError::TrailingRowBytes {
            row,
            extra: stream.len() - cursor,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(stream: &[u8], hpitch: usize) -> Result<Vec<(usize, u8)>, DecodeError> {
        let mut pixels = Vec::new();
        walk_row(stream, 0, hpitch, |x, color| pixels.push((x, color)))?;
        Ok(pixels)
    }

    #[test]
    fn test_repeat_and_literal() {
        let pixels = collect(&[0, 3, 7, 1, 0xFE, 1, 2], 6).unwrap();
        assert_eq!(pixels, vec![(0, 7), (1, 7), (2, 7), (4, 1), (5, 2)]);
    }

    #[test]
    fn test_literal_of_128() {
        let mut stream = vec![0, 0x80];
        stream.extend(0..128u8);
        let pixels = collect(&stream, 128).unwrap();
        assert_eq!(pixels.len(), 128);
        assert_eq!(pixels[127], (127, 127));
    }

    #[test]
    fn test_chained_skips_close_row() {
        let pixels = collect(&[255, 0, 45, 0], 300).unwrap();
        assert!(pixels.is_empty());
    }

    #[test]
    fn test_overrun() {
        assert!(matches!(
            collect(&[0, 5, 1], 4),
            Err(DecodeError::RowOverrun { row: 0, hpitch: 4 })
        ));
        assert!(matches!(
            collect(&[5, 0], 4),
            Err(DecodeError::RowOverrun { .. })
        ));
    }

    #[test]
    fn test_underrun() {
        assert!(matches!(
            collect(&[0, 2, 1], 4),
            Err(DecodeError::RowUnderrun {
                covered: 2,
                hpitch: 4,
                ..
            })
        ));
        assert!(matches!(
            collect(&[0, 0xFD, 1], 3),
            Err(DecodeError::RowUnderrun { covered: 0, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        assert!(matches!(
            collect(&[0, 2, 1, 0, 0], 2),
            Err(DecodeError::TrailingRowBytes { row: 0, extra: 2 })
        ));
    }
}
