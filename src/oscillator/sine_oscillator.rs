//! Wavetable sine oscillator, used as vibrato source.

// Based on MIT-licensed code (c) 2016 by Emilie Gillet (emilie.o.gillet@gmail.com)

#[allow(unused_imports)]
use num_traits::float::Float;
use spin::Once;

use crate::utils::interpolate;

pub const LUT_SINE_SIZE: usize = 512;

static LUT_SINE: Once<[f32; LUT_SINE_SIZE + 1]> = Once::new();

fn lut_sine() -> &'static [f32; LUT_SINE_SIZE + 1] {
    LUT_SINE.call_once(|| {
        let mut table = [0.0; LUT_SINE_SIZE + 1];
        for (i, sample) in table.iter_mut().enumerate() {
            let phase = i as f32 / LUT_SINE_SIZE as f32;
            *sample = (2.0 * core::f32::consts::PI * phase).sin();
        }
        table
    })
}

/// Sine of a phase in 0.0..1.0.
#[inline]
pub fn sine(phase: f32) -> f32 {
    interpolate(lut_sine(), phase, LUT_SINE_SIZE as f32)
}

#[derive(Debug, Default, Clone)]
pub struct SineOscillator {
    phase: f32,
}

impl SineOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) {
        self.phase = 0.0;
    }

    /// Next sample for a frequency normalized to the sample rate.
    #[inline]
    pub fn next(&mut self, mut frequency: f32) -> f32 {
        if frequency >= 0.5 {
            frequency = 0.5;
        }

        self.phase += frequency;

        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sine(self.phase)
    }
}
