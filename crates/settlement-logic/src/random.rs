//! Seeded pseudo-random number generator
//!
//! Drives dev-mode decisions and random fallbacks. Same seed, game and
//! stream always give the same sequence, so a dev-mode game can be replayed.

/// xorshift64* generator
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a generator for one game from a platform seed
    pub fn new(seed: u64, game_index: u64) -> Self {
        let mut state = seed.wrapping_add(0x9e3779b97f4a7c15);
        state ^= game_index.wrapping_mul(0x517cc1b727220a95);
        // xorshift never leaves the all-zero state
        if state == 0 {
            state = 0x2545f4914f6cdd1d;
        }

        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }
        rng
    }

    /// Independent stream for one seat in one round
    pub fn for_seat(&self, seat: u32, round: u32) -> Self {
        let mut state = self.state;
        state ^= (seat as u64).wrapping_mul(0x9e3779b97f4a7c15);
        state ^= (round as u64).wrapping_mul(0xbf58476d1ce4e5b9).rotate_left(17);
        if state == 0 {
            state = 0x2545f4914f6cdd1d;
        }

        let mut rng = Self { state };
        rng.next_u64();
        rng
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Value in [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// Value in [0, max], e.g. a token count for an endowment of `max`
    pub fn next_inclusive(&mut self, max: u32) -> u32 {
        match max.checked_add(1) {
            Some(bound) => self.next_range(bound),
            None => self.next_u32(),
        }
    }
}
