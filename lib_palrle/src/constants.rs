pub const FILE_EXT: &str = "prle";

/// Size of the packed header: `u32` size followed by seven `u16` fields.
pub const HEADER_SIZE: usize = 18;
/// Size of one palette color and of one row offset.
pub const WORD_SIZE: usize = std::mem::size_of::<u32>();

/// Shortest same-color span worth a repeated run.
pub const MIN_REPEAT: usize = 3;
pub const MAX_REPEAT: usize = 127;
pub const MAX_LITERAL: usize = 128;
pub const MAX_SKIP: usize = 255;
