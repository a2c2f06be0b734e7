pub mod constants;
pub mod image;
pub mod palette;
pub mod storage;

use log::*;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub use crate::image::format::{EncodedImage, Header};
pub use crate::image::{
    blit, decode, decode_with_mask, encode, encode_masked, DecodeError, DecodedImage, EncodeError,
};
pub use crate::palette::{expand_rgba, index_rgba, IndexedImage, PaletteError};
pub use crate::storage::{read_packed, write_packed, StorageError};

/// Sends this crate's debug log to `path`.
pub fn init_logging(path: impl AsRef<Path>) -> io::Result<()> {
    let target = Box::new(File::create(path)?);

    env_logger::Builder::new()
        .target(env_logger::Target::Pipe(target))
        .filter(Some("lib_palrle"), LevelFilter::Debug)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init()
        .map_err(|err| io::Error::new(io::ErrorKind::AlreadyExists, err))
}
