#![allow(dead_code)]

pub const PALETTE: [u32; 4] = [0xFF000000, 0xFF0000FF, 0xFF00FF00, 0xFFFF0000];

/// 8x6 sprite with a transparent border and a diagonal hole.
pub const SPRITE_WIDTH: u16 = 8;
pub const SPRITE_HEIGHT: u16 = 6;

#[rustfmt::skip]
pub const SPRITE: [u8; 48] = [
    0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 1, 1, 1, 1, 0, 0,
    0, 2, 2, 3, 1, 1, 1, 0,
    0, 2, 0, 3, 3, 3, 3, 0,
    0, 0, 1, 2, 3, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0,
];

#[rustfmt::skip]
pub const SPRITE_MASK: [bool; 48] = [
    false, false, false, false, false, false, false, false,
    false, false, true,  true,  true,  true,  false, false,
    false, true,  true,  true,  true,  true,  true,  false,
    false, true,  false, true,  true,  true,  true,  false,
    false, false, true,  true,  true,  false, false, false,
    false, false, false, false, false, false, false, false,
];

/// Deterministic noise so literal and repeated runs both show up.
pub fn noise(width: usize, height: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..width * height)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let value = (state >> 16) as u8;
            // Bias toward a few indices to form runs.
            if value < 160 {
                value % 3
            } else {
                value
            }
        })
        .collect()
}

pub fn noise_mask(width: usize, height: usize, seed: u32) -> Vec<bool> {
    noise(width, height, seed.wrapping_add(7))
        .into_iter()
        .map(|value| value != 1)
        .collect()
}
