use crate::board::MAX_BOARD_SIZE;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::OnceLock;

/// Fixed seed so hash-derived behavior is reproducible under tests.
const ZOBRIST_SEED: u64 = 42;

static KEYS: OnceLock<Box<[u32]>> = OnceLock::new();

fn keys() -> &'static [u32] {
    KEYS.get_or_init(|| {
        let mut rng = ChaCha8Rng::seed_from_u64(ZOBRIST_SEED);
        (0..MAX_BOARD_SIZE * MAX_BOARD_SIZE)
            .map(|_| rng.next_u32())
            .collect()
    })
}

/// Zobrist key for a box on the given square.
pub fn key(square: usize) -> u32 {
    keys()[square]
}

/// Zobrist hash of a box configuration: XOR of the per-square keys.
pub fn hash_of(boxes: &[u16]) -> u32 {
    boxes
        .iter()
        .fold(0, |hash, &square| hash ^ key(square as usize))
}
