//! Fast linear congruential pseudo random number generator.
//!
//! Every owner keeps its own state so that rendering order between voices
//! never changes what a voice produces.

// Based on MIT-licensed code (c) 2012 by Olivier Gillet (ol.gillet@gmail.com)

pub const DEFAULT_SEED: u32 = 0x21;

#[derive(Debug, Clone)]
pub struct Random {
    state: u32,
}

impl Default for Random {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl Random {
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    #[inline]
    pub fn seed(&mut self, seed: u32) {
        self.state = seed;
    }

    #[inline]
    pub fn get_word(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Uniform value in 0.0..1.0.
    #[inline]
    pub fn get_float(&mut self) -> f32 {
        self.get_word() as f32 / 4294967296.0
    }

    /// Uniform value in -1.0..1.0.
    #[inline]
    pub fn get_bipolar(&mut self) -> f32 {
        self.get_float() * 2.0 - 1.0
    }
}
