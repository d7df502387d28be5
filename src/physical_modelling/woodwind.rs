//! Reed woodwind: a breath signal drives a reed delay line with a cubic
//! saturation, coupled to a low-passed bore delay line.

#[allow(unused_imports)]
use num_traits::float::Float;

use super::{select_downsampling, Downsampler, PhysicalModel, LOOP_LIMIT};
use crate::envelope::{Adsr, AdsrParameters};
use crate::oscillator::sine_oscillator::SineOscillator;
use crate::utils::delay_line::DelayLine;
use crate::utils::filter::DcBlocker;
use crate::utils::one_pole;
use crate::utils::random::{Random, DEFAULT_SEED};
use crate::utils::units::{sanitize, sanitize_frequency};
use crate::SAMPLE_RATE;

pub const WOODWIND_DELAY_SIZE: usize = 256;

const MAX_DOWNSAMPLING: usize = 4;
const NOISE_GAIN: f32 = 0.0085;
const VIBRATO_GAIN: f32 = 0.008;
const VIBRATO_FREQUENCY: f32 = 5.0;
const DC_BLOCKER_POLE: f32 = 0.99;

/// Feedback and filter coefficients of the bore.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WoodwindCoefficients {
    /// One-pole low-pass coefficient, 0.0..1.0.
    pub low_pass: f32,
    /// Bore output fed into the reed line.
    pub r_1: f32,
    /// Bore output added after the reed.
    pub r_2: f32,
}

impl Default for WoodwindCoefficients {
    fn default() -> Self {
        Self {
            low_pass: 0.6,
            r_1: 0.42,
            r_2: 0.53,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Woodwind {
    bore: DelayLine<WOODWIND_DELAY_SIZE>,
    reed: DelayLine<WOODWIND_DELAY_SIZE>,
    bore_in: usize,
    bore_out: usize,
    reed_in: usize,
    reed_out: usize,
    bore_sample: f32,
    flute: f32,

    dc_blocker: DcBlocker,
    downsampler: Downsampler,
    random: Random,
    vibrato: SineOscillator,
    envelope: Adsr,

    frequency: f32,
    coefficients: WoodwindCoefficients,
}

impl Default for Woodwind {
    fn default() -> Self {
        Self::new()
    }
}

impl Woodwind {
    pub fn new() -> Self {
        let mut woodwind = Self {
            bore: DelayLine::new(),
            reed: DelayLine::new(),
            bore_in: 0,
            bore_out: 0,
            reed_in: 0,
            reed_out: 0,
            bore_sample: 0.0,
            flute: 0.0,
            dc_blocker: DcBlocker::new(),
            downsampler: Downsampler::new(),
            random: Random::default(),
            vibrato: SineOscillator::new(),
            envelope: Adsr::new(),
            frequency: 0.0,
            coefficients: WoodwindCoefficients::default(),
        };
        woodwind.dc_blocker.init(DC_BLOCKER_POLE);
        woodwind.set_frequency(440.0);
        woodwind
    }

    pub fn set_coefficients(&mut self, coefficients: WoodwindCoefficients) {
        let defaults = WoodwindCoefficients::default();
        self.coefficients = WoodwindCoefficients {
            low_pass: sanitize(coefficients.low_pass, 0.0, 1.0, defaults.low_pass),
            r_1: sanitize(coefficients.r_1, -1.0, 1.0, defaults.r_1),
            r_2: sanitize(coefficients.r_2, -1.0, 1.0, defaults.r_2),
        };
    }

    pub fn set_envelope(&mut self, parameters: AdsrParameters) {
        self.envelope.update(parameters);
    }

    pub fn bore_length(&self) -> usize {
        self.bore.delay()
    }

    pub fn reed_length(&self) -> usize {
        self.reed.delay()
    }

    pub fn downsampling(&self) -> usize {
        self.downsampler.factor()
    }

    /// Starts the air column from its input end.
    pub fn blow(&mut self) {
        self.reed_in = self.reed.delay();
        self.reed_out = 0;
        self.bore_in = self.bore.delay();
        self.bore_out = 0;
    }

    #[inline]
    fn step(&mut self, breath: f32) -> f32 {
        let c = self.coefficients;

        let reed_in = breath + c.r_1 * self.bore_sample;
        self.reed
            .write(self.reed_in, reed_in.clamp(-LOOP_LIMIT, LOOP_LIMIT));
        self.reed_in = self.reed.advance(self.reed_in);
        self.reed_out = self.reed.advance(self.reed_out);

        let x = self.reed.read(self.reed_out).clamp(-1.0, 1.0);
        let reed = x - x * x * x + c.r_2 * self.bore_sample;

        one_pole(&mut self.flute, reed, c.low_pass);
        self.flute = self.flute.clamp(-LOOP_LIMIT, LOOP_LIMIT);

        self.bore.write(self.bore_in, self.flute);
        self.bore_in = self.bore.advance(self.bore_in);
        self.bore_out = self.bore.advance(self.bore_out);
        self.bore_sample = self.bore.read(self.bore_out);

        self.dc_blocker
            .process_sample(self.flute)
            .clamp(-LOOP_LIMIT, LOOP_LIMIT)
    }
}

impl PhysicalModel for Woodwind {
    fn start(&mut self) {
        self.bore.reset();
        self.reed.reset();
        self.bore_sample = 0.0;
        self.flute = 0.0;
        self.dc_blocker.init(DC_BLOCKER_POLE);
        self.downsampler.reset();
        self.random.seed(DEFAULT_SEED);
        self.vibrato.init();
        let parameters = *self.envelope.parameters();
        self.envelope.init(parameters);
        self.blow();
    }

    fn stop(&mut self) {
        self.envelope.idle();
    }

    fn note_on(&mut self, _velocity: f32) {
        self.envelope.attack();
        self.blow();
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

        let length = |factor: usize| SAMPLE_RATE / frequency / factor as f32;
        let factor = select_downsampling(WOODWIND_DELAY_SIZE, MAX_DOWNSAMPLING, |factor| {
            length(factor) / 2.0
        });
        self.downsampler.set_factor(factor);

        let total = length(factor);
        self.bore.set_delay(total / 2.0);
        self.reed.set_delay(total / 4.0);

        // Keep each input one step behind its output.
        self.bore_out = self.bore.wrap(self.bore_out);
        self.bore_in = self.bore.offset(self.bore_out, self.bore.delay());
        self.reed_out = self.reed.wrap(self.reed_out);
        self.reed_in = self.reed.offset(self.reed_out, self.reed.delay());
    }

    #[inline]
    fn render(&mut self, out: &mut [f32]) {
        let vibrato_frequency = VIBRATO_FREQUENCY / SAMPLE_RATE;
        for sample in out.iter_mut() {
            let am = self.envelope.next();
            let noise = self.random.get_bipolar();
            let vibrato = self.vibrato.next(vibrato_frequency);
            let breath = am + NOISE_GAIN * noise * am + VIBRATO_GAIN * vibrato * am;

            if self.downsampler.needs_sample() {
                let s = self.step(breath);
                self.downsampler.push(s);
            }
            *sample = self.downsampler.next_held();
        }
    }
}
