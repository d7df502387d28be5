//! Constant-power stereo panning.

#[allow(unused_imports)]
use num_traits::float::Float;

use crate::utils::units::sanitize;

#[derive(Debug, Clone)]
pub struct Pan {
    volume_l: f32,
    volume_r: f32,
}

impl Default for Pan {
    fn default() -> Self {
        let mut pan = Self {
            volume_l: 0.0,
            volume_r: 0.0,
        };
        pan.set(1.0, 0.5);
        pan
    }
}

impl Pan {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pan` runs from 0.0 (left) to 1.0 (right), 0.5 is center.
    pub fn set(&mut self, volume: f32, pan: f32) {
        let angle = sanitize(pan, 0.0, 1.0, 0.5) * core::f32::consts::FRAC_PI_2;
        let volume = sanitize(volume, 0.0, 1.0, 1.0);
        self.volume_l = volume * angle.cos();
        self.volume_r = volume * angle.sin();
    }

    #[inline]
    pub fn render(&self, in_: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        let iter = in_.iter().zip(out_l.iter_mut().zip(out_r.iter_mut()));
        for (sample, (left, right)) in iter {
            *left = *sample * self.volume_l;
            *right = *sample * self.volume_r;
        }
    }

    pub fn volume_l(&self) -> f32 {
        self.volume_l
    }

    pub fn volume_r(&self) -> f32 {
        self.volume_r
    }
}
