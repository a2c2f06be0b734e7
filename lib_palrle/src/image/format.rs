use std::ops::Range;

use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::decoder::DecodeError;
use super::segment::walk_row;
use crate::constants::{HEADER_SIZE, WORD_SIZE};

/// Fixed-size record at the start of every encoded image.
///
/// Serialized with bincode's fixed-int little-endian encoding, which packs the
/// fields back to back into exactly [`HEADER_SIZE`] bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub size: u32,
    pub width: u16,
    pub height: u16,
    pub xoffset: u16,
    pub yoffset: u16,
    pub hpitch: u16,
    pub vpitch: u16,
    pub palette_count: u16,
}

impl Header {
    pub fn is_empty(&self) -> bool {
        self.hpitch == 0 || self.vpitch == 0
    }

    /// Byte length of the palette section.
    pub(crate) fn palette_len(&self) -> usize {
        self.palette_count as usize * WORD_SIZE
    }

    /// Byte length of the palette plus the row offset table.
    pub(crate) fn tables_len(&self) -> usize {
        self.palette_len() + self.vpitch as usize * WORD_SIZE
    }

    pub(crate) fn to_bytes(self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&self)
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// An immutable palette RLE image: the packed header followed by the palette,
/// the row offset table and the row segment streams.
///
/// Values only come out of the encoder or out of [`EncodedImage::from_bytes`],
/// so every row stream is known to cover exactly `hpitch` pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    header: Header,
    bytes: Vec<u8>,
}

impl EncodedImage {
    pub(crate) fn from_parts(header: Header, bytes: Vec<u8>) -> Self {
        Self { header, bytes }
    }

    /// Parses and fully validates an encoded blob from an untrusted source.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        if bytes.len() < HEADER_SIZE {
            error!("Encoded data shorter than the header: {} bytes", bytes.len());
            return Err(DecodeError::Truncated {
                needed: HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let header = Header::from_bytes(&bytes[..HEADER_SIZE])?;
        debug!("Header parsed: {:?}", header);

        if header.size as usize != bytes.len() {
            error!(
                "Declared size {} does not match buffer length {}",
                header.size,
                bytes.len()
            );
            return Err(DecodeError::SizeMismatch {
                declared: header.size as usize,
                actual: bytes.len(),
            });
        }

        if (header.hpitch == 0) != (header.vpitch == 0) {
            error!(
                "Only one pitch is zero: hpitch={} vpitch={}",
                header.hpitch, header.vpitch
            );
            return Err(DecodeError::InconsistentPitch {
                hpitch: header.hpitch,
                vpitch: header.vpitch,
            });
        }

        let crop_right = header.xoffset as usize + header.hpitch as usize;
        let crop_bottom = header.yoffset as usize + header.vpitch as usize;
        if crop_right > header.width as usize || crop_bottom > header.height as usize {
            error!("Crop region exceeds image bounds: {:?}", header);
            return Err(DecodeError::CropOutOfBounds {
                x: header.xoffset,
                y: header.yoffset,
                hpitch: header.hpitch,
                vpitch: header.vpitch,
                width: header.width,
                height: header.height,
            });
        }

        let data_len = bytes.len() - HEADER_SIZE;
        if data_len < header.tables_len() {
            error!(
                "Palette and row tables need {} bytes, only {} present",
                header.tables_len(),
                data_len
            );
            return Err(DecodeError::Truncated {
                needed: HEADER_SIZE + header.tables_len(),
                actual: bytes.len(),
            });
        }

        if header.is_empty() && data_len != header.tables_len() {
            error!(
                "Empty image carries {} bytes past its palette",
                data_len - header.tables_len()
            );
            return Err(DecodeError::SizeMismatch {
                declared: bytes.len(),
                actual: HEADER_SIZE + header.tables_len(),
            });
        }

        let image = Self { header, bytes };
        image.check_row_offsets()?;
        image.walk_rows(0..header.vpitch as usize, |_, _, _| {})?;
        debug!("Encoded image validated: {} rows", header.vpitch);

        Ok(image)
    }

    fn check_row_offsets(&self) -> Result<(), DecodeError> {
        let data_len = self.data().len();
        let tables_len = self.header.tables_len();
        // Row 0 starts right after the tables, the rest strictly increase.
        let mut lowest = tables_len;
        for (row, offset) in self.row_offsets().enumerate() {
            let position = offset as usize;
            let misplaced_first = row == 0 && position != tables_len;
            if misplaced_first || position < lowest || position >= data_len {
                error!("Row #{} has invalid offset {}", row, offset);
                return Err(DecodeError::BadRowOffset { row, offset });
            }
            lowest = position + 1;
        }
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn size(&self) -> u32 {
        self.header.size
    }

    pub fn width(&self) -> u16 {
        self.header.width
    }

    pub fn height(&self) -> u16 {
        self.header.height
    }

    pub fn xoffset(&self) -> u16 {
        self.header.xoffset
    }

    pub fn yoffset(&self) -> u16 {
        self.header.yoffset
    }

    pub fn hpitch(&self) -> u16 {
        self.header.hpitch
    }

    pub fn vpitch(&self) -> u16 {
        self.header.vpitch
    }

    /// True when no pixel is visible and only the palette is stored.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Everything after the header. Row offsets are relative to its start.
    pub fn data(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }

    pub fn palette(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        words(&self.data()[..self.header.palette_len()])
    }

    pub fn row_offsets(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        words(&self.data()[self.header.palette_len()..self.header.tables_len()])
    }

    fn row_offset(&self, row: usize) -> usize {
        let at = self.header.palette_len() + row * WORD_SIZE;
        let word = &self.data()[at..at + WORD_SIZE];
        u32::from_le_bytes([word[0], word[1], word[2], word[3]]) as usize
    }

    fn row_stream(&self, row: usize) -> &[u8] {
        let start = self.row_offset(row);
        let end = if row + 1 < self.header.vpitch as usize {
            self.row_offset(row + 1)
        } else {
            self.data().len()
        };
        &self.data()[start..end]
    }

    /// Calls `put(x, y, color)` for every visible pixel of the given cropped
    /// rows. Coordinates are local to the crop rectangle.
    pub(crate) fn walk_rows(
        &self,
        rows: Range<usize>,
        mut put: impl FnMut(usize, usize, u8),
    ) -> Result<(), DecodeError> {
        let hpitch = self.header.hpitch as usize;
        for y in rows {
            walk_row(self.row_stream(y), y, hpitch, |x, color| put(x, y, color))?;
        }
        Ok(())
    }
}

fn words(bytes: &[u8]) -> impl ExactSizeIterator<Item = u32> + '_ {
    bytes
        .chunks_exact(WORD_SIZE)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
}
