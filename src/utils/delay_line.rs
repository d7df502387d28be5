//! Circular delay line with a logical length and a fractional remainder.
//!
//! The physical storage has a fixed capacity. The models address it through
//! their own cursors, which are always kept below `delay() + 1`, so a loop
//! holds `delay() + 1` samples. Changing the length never changes the capacity.

// Based on MIT-licensed code (c) 2014 by Olivier Gillet (ol.gillet@gmail.com)

#[allow(unused_imports)]
use num_traits::float::Float;

/// Shortest logical length accepted by [`DelayLine::set_delay`].
pub const MIN_DELAY: usize = 1;

#[derive(Debug, Clone)]
pub struct DelayLine<const MAX_DELAY: usize> {
    delay: usize,
    delay_frac: f32,
    delay_total: f32,
    line: [f32; MAX_DELAY],
}

impl<const MAX_DELAY: usize> Default for DelayLine<MAX_DELAY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX_DELAY: usize> DelayLine<MAX_DELAY> {
    pub fn new() -> Self {
        Self {
            delay: MIN_DELAY,
            delay_frac: 0.0,
            delay_total: MIN_DELAY as f32,
            line: [0.0; MAX_DELAY],
        }
    }

    /// Clears the stored samples, keeps the length.
    pub fn reset(&mut self) {
        for elem in self.line.iter_mut() {
            *elem = 0.0;
        }
    }

    pub fn max_delay(&self) -> usize {
        MAX_DELAY
    }

    /// Sets the real-valued length and returns the value actually used.
    ///
    /// The length is clamped to `MIN_DELAY..=MAX_DELAY - 1`, non-finite
    /// values fall back to the minimum.
    #[inline]
    pub fn set_delay(&mut self, total: f32) -> f32 {
        let max = (MAX_DELAY - 1) as f32;
        let total = if total.is_finite() {
            total.clamp(MIN_DELAY as f32, max)
        } else {
            MIN_DELAY as f32
        };
        let delay = total.floor();
        self.delay = delay as usize;
        self.delay_frac = total - delay;
        self.delay_total = total;

        total
    }

    /// Integral logical length.
    #[inline]
    pub fn delay(&self) -> usize {
        self.delay
    }

    #[inline]
    pub fn delay_frac(&self) -> f32 {
        self.delay_frac
    }

    #[inline]
    pub fn delay_total(&self) -> f32 {
        self.delay_total
    }

    #[inline]
    pub fn read(&self, pos: usize) -> f32 {
        self.line[pos]
    }

    #[inline]
    pub fn write(&mut self, pos: usize, sample: f32) {
        self.line[pos] = sample;
    }

    #[inline]
    pub fn add(&mut self, pos: usize, sample: f32) {
        self.line[pos] += sample;
    }

    /// Moves a cursor one step, wrapping to 0 once it passes the length.
    #[inline]
    pub fn advance(&self, pos: usize) -> usize {
        let next = pos + 1;
        if next > self.delay {
            0
        } else {
            next
        }
    }

    /// Cursor `n` steps after `pos` within the loop.
    #[inline]
    pub fn offset(&self, pos: usize, n: usize) -> usize {
        (pos + n) % (self.delay + 1)
    }

    /// Brings a cursor back into the loop after the length changed.
    #[inline]
    pub fn wrap(&self, pos: usize) -> usize {
        pos % (self.delay + 1)
    }

    /// Linear interpolation between `pos` and the following cursor position.
    #[inline]
    pub fn read_interpolated(&self, pos: usize, t: f32) -> f32 {
        let a = self.line[pos];
        let b = self.line[self.advance(pos)];

        a + (b - a) * t
    }

    /// Fills the whole loop from a generator.
    pub fn fill(&mut self, mut generator: impl FnMut() -> f32) {
        for elem in self.line[..=self.delay].iter_mut() {
            *elem = generator();
        }
    }
}
