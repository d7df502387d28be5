//! Banded waveguide: one delay loop per resonant mode, each closed through a
//! band-pass filter tuned to the mode frequency.
//!
//! Mode ratios come from the resonator kind (bars, plates, membranes). The
//! loops are coupled by feeding a share of the combined output back into each
//! of them once per period.

#[allow(unused_imports)]
use num_traits::float::Float;

use super::{select_downsampling, velocity_gain, Downsampler, PhysicalModel, LOOP_LIMIT};
use crate::envelope::{Adsr, AdsrParameters};
use crate::exciter::{Exciter, ExciterKind};
use crate::utils::delay_line::DelayLine;
use crate::utils::filter::{FilterMode, Svf};
use crate::utils::units::{sanitize, sanitize_frequency};
use crate::SAMPLE_RATE;

pub const BANDED_DELAY_SIZE: usize = 512;
pub const NUM_MODES: usize = 3;

const MAX_DOWNSAMPLING: usize = 8;
const MIN_LENGTH: f32 = 4.0;
const MAX_MODE_FREQUENCY: f32 = SAMPLE_RATE * 0.45;
const MODE_RESONANCE: f32 = 0.4999;
const DEFAULT_MODE_MIX: f32 = 0.1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ResonatorKind {
    /// Free-free uniform bar (glockenspiel, vibraphone).
    #[default]
    UniformBar,
    /// Undercut bar tuned close to 1:4:10 (marimba).
    TunedBar,
    Plate,
    Membrane,
}

impl ResonatorKind {
    /// Frequency ratios of the modes relative to the fundamental.
    pub fn ratios(self) -> [f32; NUM_MODES] {
        match self {
            Self::UniformBar => [1.0, 2.756, 5.404],
            Self::TunedBar => [1.0, 4.019_839, 10.718_499],
            Self::Plate => [1.0, 3.16, 2.24],
            Self::Membrane => [1.0, 1.58, 2.55],
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index % 4 {
            0 => Self::UniformBar,
            1 => Self::TunedBar,
            2 => Self::Plate,
            _ => Self::Membrane,
        }
    }
}

/// Output weight of each mode for a brightness in 0.0..1.0.
pub fn mix_factors(brightness: f32) -> [f32; NUM_MODES] {
    let b = sanitize(brightness, 0.0, 1.0, 1.0);
    [
        1.0 - 0.2 * b.clamp(0.8, 1.0),
        1.2 * b.clamp(0.0, 0.5),
        0.3 * b,
    ]
}

#[derive(Debug, Clone, Default)]
struct Mode {
    delay: DelayLine<BANDED_DELAY_SIZE>,
    filter: Svf,
    downsampler: Downsampler,
    ratio: f32,
    mix: f32,
    in_: usize,
    out: usize,
    tuner_1: usize,
    tuner_2: usize,
}

impl Mode {
    fn reset(&mut self) {
        self.delay.reset();
        self.filter.reset();
        self.downsampler.reset();
        self.place_cursors(1);
    }

    /// Input sits one step behind the output, the tuning taps two and three
    /// steps after the input.
    fn place_cursors(&mut self, out: usize) {
        let delay = self.delay.delay();
        self.out = self.delay.wrap(out);
        self.in_ = self.delay.offset(self.out, delay);
        self.tuner_1 = self.delay.offset(self.in_, 2);
        self.tuner_2 = self.delay.offset(self.in_, 3);
    }

    fn tune(&mut self, frequency: f32, damping: f32) {
        let f = (frequency * self.ratio).min(MAX_MODE_FREQUENCY);
        let length = |factor: usize| SAMPLE_RATE / (f * factor as f32);
        let factor = select_downsampling(BANDED_DELAY_SIZE, MAX_DOWNSAMPLING, length);
        self.downsampler.set_factor(factor);
        self.delay.set_delay(length(factor).max(MIN_LENGTH));
        self.filter
            .set_f_damping(f * factor as f32 / SAMPLE_RATE, damping);
        self.place_cursors(self.out);
    }
}

#[derive(Debug, Clone)]
pub struct BandedWaveguide {
    modes: [Mode; NUM_MODES],

    exciter: Exciter,
    envelope: Adsr,

    frequency: f32,
    brightness: f32,
    harmonic: f32,
    mode_mix: f32,
    reflection_adjust: f32,
    resonator: ResonatorKind,
    velocity: f32,
    impulse_solo: bool,
}

impl Default for BandedWaveguide {
    fn default() -> Self {
        Self::new()
    }
}

impl BandedWaveguide {
    pub fn new() -> Self {
        let mut banded = Self {
            modes: Default::default(),
            exciter: Exciter::new(),
            envelope: Adsr::new(),
            frequency: 220.0,
            brightness: 1.0,
            harmonic: 0.0,
            mode_mix: DEFAULT_MODE_MIX,
            reflection_adjust: 0.0,
            resonator: ResonatorKind::default(),
            velocity: 0.0,
            impulse_solo: false,
        };
        banded.set_brightness(1.0);
        banded.set_frequency(220.0);
        banded
    }

    /// Moves energy from the fundamental towards the upper modes.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = sanitize(brightness, 0.0, 1.0, 1.0);
        let mix = mix_factors(self.brightness);
        for (mode, m) in self.modes.iter_mut().zip(mix) {
            mode.mix = m;
        }
    }

    /// Stretches the upper mode ratios, -1.0..1.0.
    pub fn set_harmonic(&mut self, harmonic: f32) {
        self.harmonic = sanitize(harmonic, -1.0, 1.0, 0.0);
        self.retune();
    }

    /// Amount of combined output fed back into every mode.
    pub fn set_mode_mix(&mut self, mode_mix: f32) {
        self.mode_mix = sanitize(mode_mix, 0.0, 1.0, DEFAULT_MODE_MIX);
    }

    /// Extra damping of the mode filters.
    pub fn set_reflection_adjust(&mut self, adjust: f32) {
        self.reflection_adjust = sanitize(adjust, 0.0, MODE_RESONANCE, 0.0);
        self.retune();
    }

    pub fn set_resonator(&mut self, resonator: ResonatorKind) {
        self.resonator = resonator;
        self.retune();
    }

    pub fn set_exciter(&mut self, kind: ExciterKind) {
        self.exciter.set_kind(kind);
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = sanitize(velocity, 0.0, 1.0, 0.0);
    }

    pub fn set_impulse_solo(&mut self, solo: bool) {
        self.impulse_solo = solo;
    }

    pub fn set_envelope(&mut self, parameters: AdsrParameters) {
        self.envelope.update(parameters);
    }

    pub fn mix_factors(&self) -> [f32; NUM_MODES] {
        let mut mix = [0.0; NUM_MODES];
        for (m, mode) in mix.iter_mut().zip(self.modes.iter()) {
            *m = mode.mix;
        }
        mix
    }

    pub fn mode_delay_length(&self, mode: usize) -> usize {
        self.modes[mode].delay.delay()
    }

    pub fn mode_delay_total(&self, mode: usize) -> f32 {
        self.modes[mode].delay.delay_total()
    }

    pub fn mode_downsampling(&self, mode: usize) -> usize {
        self.modes[mode].downsampler.factor()
    }

    fn retune(&mut self) {
        let stretch = 1.0 + self.harmonic * 0.5;
        let ratios = self.resonator.ratios();
        let damping = 2.0 - 2.0 * (MODE_RESONANCE - self.reflection_adjust);
        for (j, mode) in self.modes.iter_mut().enumerate() {
            mode.ratio = if j == 0 { 1.0 } else { ratios[j] * stretch };
            mode.tune(self.frequency, damping);
        }
    }

    #[inline]
    fn process_sample(&mut self, excitation: f32) -> f32 {
        let mut stepped = [false; NUM_MODES];
        let mut combined = 0.0;
        let mut mix_sum = 0.0;

        for (j, mode) in self.modes.iter_mut().enumerate() {
            if mode.downsampler.needs_sample() {
                stepped[j] = true;
                let y = mode.delay.read(mode.out);
                mode.downsampler.push(y);
            }
            combined += mode.mix * mode.downsampler.next_blended();
            mix_sum += mode.mix;
        }

        let feedback = if mix_sum > 0.0 {
            combined / mix_sum
        } else {
            0.0
        };

        for (j, mode) in self.modes.iter_mut().enumerate() {
            if !stepped[j] {
                continue;
            }

            let y = mode.delay.read(mode.out);
            let filtered = mode.filter.process(y + excitation, FilterMode::BandPass);
            mode.delay
                .write(mode.in_, filtered.clamp(-LOOP_LIMIT, LOOP_LIMIT));

            // Fractional length, lowest mode only.
            if j == 0 {
                let frac = mode.delay.delay_frac();
                let t1 = mode.delay.read(mode.tuner_1);
                let t2 = mode.delay.read(mode.tuner_2);
                mode.delay.write(mode.tuner_2, frac * t1 + (1.0 - frac) * t2);
                mode.tuner_1 = mode.delay.advance(mode.tuner_1);
                mode.tuner_2 = mode.delay.advance(mode.tuner_2);
            }

            mode.in_ = mode.delay.advance(mode.in_);
            mode.out = mode.delay.advance(mode.out);

            if mode.out == 0 {
                let d = mode.delay.read(0);
                mode.delay
                    .write(0, self.mode_mix * feedback + (1.0 - self.mode_mix) * d);
            }
        }

        if self.impulse_solo {
            excitation
        } else {
            combined * velocity_gain(self.velocity)
        }
    }
}

impl PhysicalModel for BandedWaveguide {
    fn start(&mut self) {
        for mode in self.modes.iter_mut() {
            mode.reset();
        }
        self.exciter.init();
        let parameters = *self.envelope.parameters();
        self.envelope.init(parameters);
    }

    fn stop(&mut self) {
        self.exciter.stop();
        self.envelope.idle();
    }

    fn note_on(&mut self, velocity: f32) {
        self.set_velocity(velocity);
        self.envelope.attack();
        for mode in self.modes.iter_mut() {
            mode.place_cursors(1);
        }
        self.exciter.trigger();
    }

    fn note_off(&mut self, _velocity: f32) {
        self.envelope.release();
    }

    fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    fn set_frequency(&mut self, frequency: f32) {
        self.frequency = sanitize_frequency(frequency);
        self.retune();
    }

    #[inline]
    fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            let excitation = self.exciter.next();
            *sample = self.process_sample(excitation);
        }
        self.envelope.apply(out);
    }
}
