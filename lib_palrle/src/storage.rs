use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, error, info};
use thiserror::Error;

use crate::constants::HEADER_SIZE;
use crate::image::format::{EncodedImage, Header};
use crate::image::DecodeError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid encoded image: {0}")]
    Format(#[from] DecodeError),
}

impl EncodedImage {
    /// Writes the record as is. `size` is the first header field, so records
    /// can be concatenated without extra framing.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.as_bytes())
    }

    /// Reads exactly one record and validates it.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, StorageError> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        read_record(header, &mut reader)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        info!("Saved {} bytes to {}", self.size(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let image = Self::read_from(BufReader::new(File::open(path)?))?;
        info!("Loaded {} bytes from {}", image.size(), path.display());
        Ok(image)
    }
}

/// Writes records back to back.
pub fn write_packed<W: Write>(images: &[EncodedImage], mut writer: W) -> io::Result<()> {
    for image in images {
        image.write_to(&mut writer)?;
    }
    debug!("Packed {} images", images.len());
    Ok(())
}

/// Reads records until the stream ends cleanly between two of them.
pub fn read_packed<R: Read>(mut reader: R) -> Result<Vec<EncodedImage>, StorageError> {
    let mut images = Vec::new();
    let mut header = [0u8; HEADER_SIZE];
    while fill_or_eof(&mut reader, &mut header)? {
        images.push(read_record(header, &mut reader)?);
    }
    debug!("Unpacked {} images", images.len());
    Ok(images)
}

fn read_record<R: Read>(
    header: [u8; HEADER_SIZE],
    reader: &mut R,
) -> Result<EncodedImage, StorageError> {
    let size = Header::from_bytes(&header).map_err(DecodeError::from)?.size as usize;
    if size < HEADER_SIZE {
        error!("Declared size {} is smaller than the header", size);
        return Err(DecodeError::SizeMismatch {
            declared: size,
            actual: HEADER_SIZE,
        }
        .into());
    }

    let mut bytes = header.to_vec();
    let body = (size - HEADER_SIZE) as u64;
    reader.by_ref().take(body).read_to_end(&mut bytes)?;
    if bytes.len() != size {
        error!("Stream ended after {} of {} bytes", bytes.len(), size);
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("record truncated after {} of {} bytes", bytes.len(), size),
        )
        .into());
    }

    Ok(EncodedImage::from_bytes(bytes)?)
}

/// Fills `buf` completely, or returns `false` if the stream was already at its
/// end. A partially filled buffer is an `UnexpectedEof` error.
fn fill_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("header truncated after {} bytes", filled),
                ))
            }
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(true)
}
