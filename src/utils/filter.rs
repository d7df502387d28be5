//! Zero-delay-feedback state variable filter, DC blocker and allpass blend.

// Based on MIT-licensed code (c) 2014 by Olivier Gillet (ol.gillet@gmail.com)

#[allow(unused_imports)]
use num_traits::float::Float;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    LowPass,
    BandPass,
}

const M_PI_F: f32 = core::f32::consts::PI;

/// Prewarped integrator gain for a normalized frequency.
#[inline]
pub fn tan(f: f32) -> f32 {
    // Clip coefficient to about 100.
    let f = f.clamp(0.0, 0.497);
    (M_PI_F * f).tan()
}

/// First order allpass written in place on a delay line tap:
/// `y = a * y_prev + x - a * x`.
#[inline]
pub fn allpass(coefficient: f32, y_prev: f32, x: f32) -> f32 {
    coefficient * y_prev + x - coefficient * x
}

#[derive(Debug, Default, Clone)]
pub struct DcBlocker {
    pole: f32,
    x: f32,
    y: f32,
}

impl DcBlocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self, pole: f32) {
        self.x = 0.0;
        self.y = 0.0;
        self.pole = pole;
    }

    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> f32 {
        let old_x = self.x;
        self.x = sample;
        self.y = self.y * self.pole + self.x - old_x;

        self.y
    }
}

#[derive(Debug, Default, Clone)]
pub struct Svf {
    g: f32,
    r: f32,
    h: f32,
    state_1: f32,
    state_2: f32,
}

impl Svf {
    pub fn reset(&mut self) {
        self.state_1 = 0.0;
        self.state_2 = 0.0;
    }

    /// Sets frequency (normalized to the sample rate) and damping `k = 1 / Q`.
    #[inline]
    pub fn set_f_damping(&mut self, f: f32, damping: f32) {
        self.g = tan(f);
        self.r = damping.max(0.0);
        self.h = 1.0 / (1.0 + self.r * self.g + self.g * self.g);
    }

    #[inline]
    pub fn process(&mut self, in_: f32, mode: FilterMode) -> f32 {
        let hp = (in_ - self.r * self.state_1 - self.g * self.state_1 - self.state_2) * self.h;
        let bp = self.g * hp + self.state_1;
        self.state_1 = self.g * hp + bp;
        let lp = self.g * bp + self.state_2;
        self.state_2 = self.g * bp + lp;

        match mode {
            FilterMode::LowPass => lp,
            FilterMode::BandPass => bp,
        }
    }

    #[inline]
    pub fn process_buffer(&mut self, in_out: &mut [f32], mode: FilterMode) {
        for sample in in_out.iter_mut() {
            *sample = self.process(*sample, mode);
        }
    }
}
