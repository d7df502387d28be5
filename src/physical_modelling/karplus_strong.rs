//! Karplus-Strong plucked string.

use super::{velocity_gain, PhysicalModel};
use crate::envelope::{Adsr, AdsrParameters};
use crate::utils::delay_line::DelayLine;
use crate::utils::random::{Random, DEFAULT_SEED};
use crate::utils::units::{sanitize, sanitize_frequency};
use crate::SAMPLE_RATE;

pub const KS_DELAY_SIZE: usize = 1024;

const MIN_LENGTH: f32 = 2.0;

/// Loss applied on every pass through the loop.
const LOOP_GAIN: f32 = 0.998;

const DEFAULT_ATTENUATION: f32 = 0.995;

#[derive(Debug, Clone)]
pub struct KarplusStrong {
    line: DelayLine<KS_DELAY_SIZE>,
    cursor: usize,
    random: Random,
    envelope: Adsr,

    frequency: f32,
    /// Averaging weight of the loop filter, 0.0..0.5.
    k: f32,
    velocity: f32,
}

impl Default for KarplusStrong {
    fn default() -> Self {
        Self::new()
    }
}

impl KarplusStrong {
    pub fn new() -> Self {
        let mut ks = Self {
            line: DelayLine::new(),
            cursor: 0,
            random: Random::default(),
            envelope: Adsr::new(),
            frequency: 0.0,
            k: 0.5 * DEFAULT_ATTENUATION,
            velocity: 0.0,
        };
        ks.set_frequency(220.0);
        ks
    }

    /// `attenuation` in 0.0..1.0. 1.0 gives the strongest averaging and the
    /// fastest decay of the upper partials.
    pub fn set_attenuation(&mut self, attenuation: f32) {
        self.k = 0.5 * sanitize(attenuation, 0.0, 1.0, DEFAULT_ATTENUATION);
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = sanitize(velocity, 0.0, 1.0, 0.0);
    }

    pub fn set_envelope(&mut self, parameters: AdsrParameters) {
        self.envelope.update(parameters);
    }

    pub fn averaging(&self) -> f32 {
        self.k
    }

    pub fn delay_length(&self) -> usize {
        self.line.delay()
    }

    pub fn delay_fraction(&self) -> f32 {
        self.line.delay_frac()
    }

    /// Fills the loop with a noise burst.
    pub fn pluck(&mut self) {
        let gain = velocity_gain(self.velocity);
        let random = &mut self.random;
        self.line.fill(|| gain * random.get_bipolar());
        self.cursor = 0;
    }
}

impl PhysicalModel for KarplusStrong {
    fn start(&mut self) {
        self.line.reset();
        self.cursor = 0;
        self.random.seed(DEFAULT_SEED);
        let parameters = *self.envelope.parameters();
        self.envelope.init(parameters);
    }

    fn stop(&mut self) {
        self.envelope.idle();
    }

    fn note_on(&mut self, velocity: f32) {
        self.set_velocity(velocity);
        self.envelope.attack();
        self.pluck();
    }

    fn note_off(&mut self, _velocity: f32) {
        self.envelope.release();
    }

    fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    fn set_frequency(&mut self, frequency: f32) {
        let frequency = sanitize_frequency(frequency);
        self.frequency = frequency;
        self.line.set_delay((SAMPLE_RATE / frequency).max(MIN_LENGTH));
        self.cursor = self.line.wrap(self.cursor);
    }

    #[inline]
    fn render(&mut self, out: &mut [f32]) {
        let frac = self.line.delay_frac();
        for sample in out.iter_mut() {
            let next = self.line.advance(self.cursor);
            let y0 = self.line.read(self.cursor);
            let y1 = self.line.read(next);
            *sample = y0 + (y1 - y0) * frac;
            self.line
                .write(self.cursor, LOOP_GAIN * ((1.0 - self.k) * y0 + self.k * y1));
            self.cursor = next;
        }
        self.envelope.apply(out);
    }
}
