//! Bidirectional digital waveguide: a plucked or struck string, or a tube.
//!
//! Two delay lines carry the left and right travelling waves. They are
//! reflected into each other at the nut and at the bridge, the left wave goes
//! through a stiffness allpass, and both are fine tuned by linear
//! interpolation between adjacent taps.

#[allow(unused_imports)]
use num_traits::float::Float;

use super::{select_downsampling, velocity_gain, Downsampler, PhysicalModel, LOOP_LIMIT};
use crate::envelope::{Adsr, AdsrParameters};
use crate::exciter::{Exciter, ExciterKind};
use crate::utils::crossfade;
use crate::utils::delay_line::DelayLine;
use crate::utils::filter::allpass;
use crate::utils::units::{sanitize, sanitize_frequency};
use crate::SAMPLE_RATE;

pub const WAVEGUIDE_DELAY_SIZE: usize = 256;

const MAX_DOWNSAMPLING: usize = 4;
const MIN_LENGTH: f32 = 4.0;
const OUTPUT_GAIN: f32 = 0.75;
const DEFAULT_REFLECTION: f32 = -0.99;
const DEFAULT_EXCITE_LOCATION: f32 = 0.25;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WaveguideShape {
    /// Inverting reflection at the nut.
    #[default]
    String,
    /// Non-inverting reflection at the nut.
    Tube,
}

impl WaveguideShape {
    #[inline]
    fn nut_reflection(self) -> f32 {
        match self {
            Self::String => -1.0,
            Self::Tube => 1.0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Cursors {
    l: usize,
    l_2: usize,
    r: usize,
    r_2: usize,
    bridge: usize,
    nut: usize,
}

#[derive(Debug, Clone)]
pub struct Waveguide {
    delay_l: DelayLine<WAVEGUIDE_DELAY_SIZE>,
    delay_r: DelayLine<WAVEGUIDE_DELAY_SIZE>,
    cursors: Cursors,

    downsampler: Downsampler,
    exciter: Exciter,
    envelope: Adsr,

    frequency: f32,
    reflection: f32,
    stiffness: f32,
    shape: WaveguideShape,
    excite_location: f32,
    excite_pos: usize,
    velocity: f32,
    impulse_solo: bool,
}

impl Default for Waveguide {
    fn default() -> Self {
        Self::new()
    }
}

impl Waveguide {
    pub fn new() -> Self {
        let mut waveguide = Self {
            delay_l: DelayLine::new(),
            delay_r: DelayLine::new(),
            cursors: Cursors::default(),
            downsampler: Downsampler::new(),
            exciter: Exciter::new(),
            envelope: Adsr::new(),
            frequency: 0.0,
            reflection: DEFAULT_REFLECTION,
            stiffness: 1.0,
            shape: WaveguideShape::String,
            excite_location: DEFAULT_EXCITE_LOCATION,
            excite_pos: 0,
            velocity: 0.0,
            impulse_solo: false,
        };
        waveguide.set_frequency(220.0);
        waveguide
    }

    pub fn set_reflection(&mut self, reflection: f32) {
        self.reflection = sanitize(reflection, -1.0, 1.0, DEFAULT_REFLECTION);
    }

    pub fn set_stiffness(&mut self, stiffness: f32) {
        self.stiffness = sanitize(stiffness, 0.0, 1.0, 1.0);
    }

    pub fn set_shape(&mut self, shape: WaveguideShape) {
        self.shape = shape;
    }

    /// Excitation point as a fraction of the string length.
    pub fn set_excite_position(&mut self, location: f32) {
        self.excite_location = sanitize(location, 0.0, 1.0, DEFAULT_EXCITE_LOCATION);
        self.update_excite_position();
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.exciter.set_brightness(brightness);
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = sanitize(velocity, 0.0, 1.0, 0.0);
    }

    pub fn set_exciter(&mut self, kind: ExciterKind) {
        self.exciter.set_kind(kind);
    }

    /// Outputs the raw excitation instead of the string.
    pub fn set_impulse_solo(&mut self, solo: bool) {
        self.impulse_solo = solo;
    }

    pub fn set_envelope(&mut self, parameters: AdsrParameters) {
        self.envelope.update(parameters);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn delay_length(&self) -> usize {
        self.delay_l.delay()
    }

    pub fn delay_fraction(&self) -> f32 {
        self.delay_l.delay_frac()
    }

    pub fn downsampling(&self) -> usize {
        self.downsampler.factor()
    }

    fn update_excite_position(&mut self) {
        let total = self.delay_l.delay_total();
        self.excite_pos = ((self.excite_location * total) as usize).min(self.delay_l.delay());
        self.place_cursors();
    }

    /// Derives every cursor from the nut so they stay consistent after a
    /// length change.
    fn place_cursors(&mut self) {
        let line = &self.delay_l;
        let delay = line.delay();
        let nut = line.wrap(self.cursors.nut);
        let excite = self.excite_pos.min(delay);
        let l = line.offset(nut, excite);
        let r = line.offset(nut, delay - excite);

        self.cursors = Cursors {
            l,
            l_2: line.advance(l),
            r,
            r_2: line.advance(r),
            bridge: line.offset(nut, delay),
            nut,
        };
    }

    #[inline]
    fn advance_cursors(&mut self) {
        let line = &self.delay_l;
        let c = &mut self.cursors;
        c.l = line.advance(c.l);
        c.l_2 = line.advance(c.l_2);
        c.r = line.advance(c.r);
        c.r_2 = line.advance(c.r_2);
        c.bridge = line.advance(c.bridge);
        c.nut = line.advance(c.nut);
    }

    #[inline]
    fn step(&mut self) -> f32 {
        let c = self.cursors;

        let excitation = if self.exciter.is_active() {
            let e = self.exciter.next();
            let left = self.delay_l.read(c.l) + e;
            self.delay_l.write(c.l, left.clamp(-LOOP_LIMIT, LOOP_LIMIT));
            let right = self.delay_r.read(c.r) + e;
            self.delay_r.write(c.r, right.clamp(-LOOP_LIMIT, LOOP_LIMIT));
            e
        } else {
            0.0
        };

        // Nut and bridge reflections.
        let nut = self.shape.nut_reflection() * self.delay_l.read(c.nut);
        self.delay_r
            .write(c.bridge, nut.clamp(-LOOP_LIMIT, LOOP_LIMIT));
        let bridge = self.reflection * self.delay_r.read(c.nut);
        self.delay_l
            .write(c.bridge, bridge.clamp(-LOOP_LIMIT, LOOP_LIMIT));

        // Stiffness.
        let y = allpass(self.stiffness, self.delay_l.read(c.l_2), self.delay_l.read(c.l));
        self.delay_l.write(c.l_2, y.clamp(-LOOP_LIMIT, LOOP_LIMIT));

        // Fractional length.
        let t = 1.0 - self.delay_l.delay_frac();
        let left = crossfade(self.delay_l.read(c.l), self.delay_l.read(c.l_2), t)
            .clamp(-LOOP_LIMIT, LOOP_LIMIT);
        self.delay_l.write(c.l, left);
        let right = crossfade(self.delay_r.read(c.r), self.delay_r.read(c.r_2), t)
            .clamp(-LOOP_LIMIT, LOOP_LIMIT);
        self.delay_r.write(c.r, right);

        self.advance_cursors();

        if self.impulse_solo {
            excitation
        } else {
            velocity_gain(self.velocity) * OUTPUT_GAIN * (left + right)
        }
    }
}

impl PhysicalModel for Waveguide {
    fn start(&mut self) {
        self.delay_l.reset();
        self.delay_r.reset();
        self.cursors = Cursors::default();
        self.downsampler.reset();
        self.exciter.init();
        let parameters = *self.envelope.parameters();
        self.envelope.init(parameters);
        self.place_cursors();
    }

    fn stop(&mut self) {
        self.reflection = 0.0;
        self.exciter.stop();
        self.envelope.idle();
    }

    fn note_on(&mut self, velocity: f32) {
        self.set_velocity(velocity);
        self.envelope.attack();
        self.cursors.nut = 0;
        self.update_excite_position();
        self.exciter.trigger();
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

        let length = |factor: usize| SAMPLE_RATE / frequency / 2.0 / factor as f32 + 1.0;
        let factor = select_downsampling(WAVEGUIDE_DELAY_SIZE, MAX_DOWNSAMPLING, length);
        self.downsampler.set_factor(factor);

        let total = length(factor).max(MIN_LENGTH);
        self.delay_l.set_delay(total);
        self.delay_r.set_delay(total);
        self.update_excite_position();
    }

    #[inline]
    fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            if self.downsampler.needs_sample() {
                let s = self.step();
                self.downsampler.push(s);
            }
            *sample = self.downsampler.next_blended();
        }
        self.envelope.apply(out);
    }
}
