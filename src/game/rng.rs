/// Linear congruential generator seeded from the room.
///
/// `s = (s * 1103515245 + 12345) & 0x7fffffff`, yielding `s / 0x7fffffff`.
/// Identical seeds give identical maps, events and therefore identical games.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

const MODULUS_MASK: u64 = 0x7fff_ffff;

impl SeededRng {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed & MODULUS_MASK,
        }
    }

    /// Generator for one turn of a room. Keeps event draws independent of how
    /// many values map generation consumed.
    #[must_use]
    pub const fn for_turn(seed: u32, turn: u32) -> Self {
        Self::new((seed as u64).wrapping_add((turn as u64).wrapping_mul(7919)))
    }

    /// Next value in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345)
            & MODULUS_MASK;
        self.state as f64 / MODULUS_MASK as f64
    }

    /// Index in `0..len`. `len` must be non-zero.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn next_index(&mut self, len: usize) -> usize {
        let idx = (self.next_f64() * len as f64).floor() as usize;
        idx.min(len.saturating_sub(1))
    }
}
