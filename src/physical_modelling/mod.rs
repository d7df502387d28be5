//! Physical modelling voices.

pub mod banded_waveguide;
pub mod karplus_strong;
pub mod mesh;
pub mod waveguide;
pub mod woodwind;

use crate::utils::crossfade;
use crate::utils::units::sanitize;

/// Bound applied to samples written back into a feedback loop.
pub const LOOP_LIMIT: f32 = 2.0;

/// Common lifecycle of every model.
///
/// `start` must leave the model in a silent state that is safe to trigger
/// right away. `render` always fills the whole output slice.
pub trait PhysicalModel {
    fn start(&mut self);

    fn stop(&mut self);

    /// `velocity` is normalized to 0.0..1.0.
    fn note_on(&mut self, velocity: f32);

    fn note_off(&mut self, velocity: f32);

    fn is_active(&self) -> bool;

    fn set_frequency(&mut self, frequency: f32);

    fn render(&mut self, out: &mut [f32]);
}

/// Maps a normalized velocity onto an output gain in 0.2..1.0.
#[inline]
pub fn velocity_gain(velocity: f32) -> f32 {
    0.2 + 0.8 * sanitize(velocity, 0.0, 1.0, 0.0)
}

/// Runs a model at an integer fraction of the sample rate.
///
/// The skipped samples are filled either by holding the last value or by a
/// linear blend between the last two model samples, one sample late.
#[derive(Debug, Clone)]
pub struct Downsampler {
    factor: usize,
    phase: usize,
    samples: [f32; 2],
}

impl Default for Downsampler {
    fn default() -> Self {
        Self {
            factor: 1,
            phase: 0,
            samples: [0.0; 2],
        }
    }
}

impl Downsampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.phase = 0;
        self.samples = [0.0; 2];
    }

    pub fn set_factor(&mut self, factor: usize) {
        self.factor = factor.max(1);
        if self.phase >= self.factor {
            self.phase = 0;
        }
    }

    #[inline]
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// True when the model has to compute a new sample for this output sample.
    #[inline]
    pub fn needs_sample(&self) -> bool {
        self.phase == 0
    }

    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.samples[1] = self.samples[0];
        self.samples[0] = sample;
    }

    #[inline]
    pub fn next_blended(&mut self) -> f32 {
        let fade = (self.phase + 1) as f32 / self.factor as f32;
        self.tick();
        crossfade(self.samples[1], self.samples[0], fade)
    }

    #[inline]
    pub fn next_held(&mut self) -> f32 {
        self.tick();
        self.samples[0]
    }

    #[inline]
    fn tick(&mut self) {
        self.phase += 1;
        if self.phase >= self.factor {
            self.phase = 0;
        }
    }
}

/// Smallest power-of-two factor up to `max_factor` for which
/// `length(factor)` fits below `capacity`.
pub fn select_downsampling(
    capacity: usize,
    max_factor: usize,
    length: impl Fn(usize) -> f32,
) -> usize {
    let mut factor = 1;
    while factor < max_factor && length(factor) > (capacity - 1) as f32 {
        factor *= 2;
    }
    factor
}
