//! ADSR amplitude envelope.
//!
//! Every stage approaches its target geometrically. The per-sample rate is
//! derived from the stage duration so that the stage threshold is reached
//! after the requested time.

#[allow(unused_imports)]
use num_traits::float::Float;

use crate::utils::units::sanitize;
use crate::SAMPLE_RATE;

/// Fraction of the remaining distance at which a stage is considered done.
const STAGE_EPSILON: f32 = 0.001;

/// Absolute level below which a releasing envelope becomes idle.
const IDLE_LEVEL: f32 = 0.0001;

/// Longest stage duration in seconds.
const MAX_STAGE_TIME: f32 = 60.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AdsrStage {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Stage durations in seconds and the sustain level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParameters {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for AdsrParameters {
    fn default() -> Self {
        Self {
            attack: 0.0,
            decay: 2.0,
            sustain: 1.0,
            release: 1.0,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Adsr {
    parameters: AdsrParameters,

    // Rate constants.
    ka: f32,
    kd: f32,
    kr: f32,

    // Stage thresholds.
    d_trigger: f32,
    s_trigger: f32,

    stage: AdsrStage,
    value: f32,
}

impl Adsr {
    pub fn new() -> Self {
        let mut adsr = Self::default();
        adsr.init(AdsrParameters::default());
        adsr
    }

    pub fn init(&mut self, parameters: AdsrParameters) {
        self.stage = AdsrStage::Idle;
        self.value = 0.0;
        self.update(parameters);
    }

    /// Recomputes the rate constants without touching stage or value.
    pub fn update(&mut self, parameters: AdsrParameters) {
        let sustain = sanitize(parameters.sustain, 0.0, 1.0, 1.0);
        self.parameters = AdsrParameters {
            sustain,
            ..parameters
        };
        self.ka = rate(parameters.attack);
        self.kd = rate(parameters.decay);
        self.kr = rate(parameters.release);
        self.d_trigger = 1.0 - STAGE_EPSILON;
        self.s_trigger = sustain + (1.0 - sustain) * STAGE_EPSILON;
    }

    /// Starts the attack stage from the current value.
    pub fn attack(&mut self) {
        self.stage = AdsrStage::Attack;
    }

    /// Enters the release stage. Does nothing when idle.
    pub fn release(&mut self) {
        if self.stage != AdsrStage::Idle {
            self.stage = AdsrStage::Release;
        }
    }

    /// Silences the envelope immediately.
    pub fn idle(&mut self) {
        self.stage = AdsrStage::Idle;
        self.value = 0.0;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        match self.stage {
            AdsrStage::Idle => {}
            AdsrStage::Attack => {
                self.value += self.ka * (1.0 - self.value);
                if self.value >= self.d_trigger {
                    self.value = 1.0;
                    self.stage = AdsrStage::Decay;
                }
            }
            AdsrStage::Decay => {
                let sustain = self.parameters.sustain;
                self.value += self.kd * (sustain - self.value);
                if self.value <= self.s_trigger {
                    if sustain <= 0.0 {
                        self.idle();
                    } else {
                        self.value = sustain;
                        self.stage = AdsrStage::Sustain;
                    }
                }
            }
            AdsrStage::Sustain => {
                // Follows sustain level changes made while the note is held.
                self.value += self.kd * (self.parameters.sustain - self.value);
            }
            AdsrStage::Release => {
                self.value -= self.kr * self.value;
                if self.value <= IDLE_LEVEL {
                    self.idle();
                }
            }
        }

        self.value
    }

    /// Fills `out` with consecutive envelope values.
    #[inline]
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next();
        }
    }

    /// Multiplies `in_out` by the envelope.
    #[inline]
    pub fn apply(&mut self, in_out: &mut [f32]) {
        for sample in in_out.iter_mut() {
            *sample *= self.next();
        }
    }

    #[inline]
    pub fn stage(&self) -> AdsrStage {
        self.stage
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.stage != AdsrStage::Idle
    }

    pub fn parameters(&self) -> &AdsrParameters {
        &self.parameters
    }
}

/// Per-sample rate reaching `STAGE_EPSILON` of the remaining distance after
/// `time` seconds.
fn rate(time: f32) -> f32 {
    let time = sanitize(time, 0.0, MAX_STAGE_TIME, 0.0);
    if time <= 0.0 {
        return 1.0;
    }
    let samples = (time * SAMPLE_RATE).max(1.0);
    1.0 - STAGE_EPSILON.powf(1.0 / samples)
}
