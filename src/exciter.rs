//! Excitation impulses played once per note.
//!
//! The impulse shapes are computed on first use and shared by every voice.

#[allow(unused_imports)]
use num_traits::float::Float;
use spin::Once;

use crate::utils::interpolate;
use crate::utils::random::Random;
use crate::utils::units::sanitize;

pub const IMPULSE_LENGTH: usize = 64;
pub const NUM_EXCITERS: usize = 4;

const MALLET_LENGTH: usize = 48;
const PLUCK_RISE: usize = 24;
const PLUCK_FALL: usize = 8;
const PICK_LENGTH: usize = 16;
const IMPULSE_PEAK: f32 = 0.5;
const BLOW_PEAK: f32 = 0.25;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExciterKind {
    #[default]
    Mallet,
    Pluck,
    Pick,
    Blow,
}

impl ExciterKind {
    pub fn index(self) -> usize {
        match self {
            Self::Mallet => 0,
            Self::Pluck => 1,
            Self::Pick => 2,
            Self::Blow => 3,
        }
    }

    /// Wraps around so that any controller value selects a valid kind.
    pub fn from_index(index: usize) -> Self {
        match index % NUM_EXCITERS {
            0 => Self::Mallet,
            1 => Self::Pluck,
            2 => Self::Pick,
            _ => Self::Blow,
        }
    }
}

type ImpulseTables = [[f32; IMPULSE_LENGTH]; NUM_EXCITERS];

static IMPULSES: Once<ImpulseTables> = Once::new();

#[inline]
fn impulses() -> &'static ImpulseTables {
    IMPULSES.call_once(build_impulses)
}

fn build_impulses() -> ImpulseTables {
    let mut tables = [[0.0; IMPULSE_LENGTH]; NUM_EXCITERS];
    let pi = core::f32::consts::PI;

    // Mallet: raised half sine.
    for (i, sample) in tables[0].iter_mut().take(MALLET_LENGTH).enumerate() {
        *sample = IMPULSE_PEAK * (pi * i as f32 / MALLET_LENGTH as f32).sin();
    }

    // Pluck: slow rise, sharp release of the string.
    for (i, sample) in tables[1].iter_mut().take(PLUCK_RISE + PLUCK_FALL).enumerate() {
        *sample = if i < PLUCK_RISE {
            IMPULSE_PEAK * i as f32 / PLUCK_RISE as f32
        } else {
            IMPULSE_PEAK * (PLUCK_RISE + PLUCK_FALL - i) as f32 / PLUCK_FALL as f32
        };
    }

    // Pick: a single short bipolar cycle.
    for (i, sample) in tables[2].iter_mut().take(PICK_LENGTH).enumerate() {
        *sample = IMPULSE_PEAK * (2.0 * pi * i as f32 / PICK_LENGTH as f32).sin();
    }

    // Blow: Hann-windowed noise burst.
    let mut random = Random::default();
    for (i, sample) in tables[3].iter_mut().enumerate() {
        let window = 0.5 - 0.5 * (2.0 * pi * i as f32 / IMPULSE_LENGTH as f32).cos();
        *sample = BLOW_PEAK * window * random.get_bipolar();
    }

    tables
}

/// Plays one impulse table at a variable rate.
#[derive(Debug, Clone)]
pub struct Exciter {
    kind: ExciterKind,
    phase: f32,
    rate: f32,
    active: bool,
}

impl Default for Exciter {
    fn default() -> Self {
        Self {
            kind: ExciterKind::default(),
            phase: 0.0,
            rate: 1.0,
            active: false,
        }
    }
}

impl Exciter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) {
        self.phase = 0.0;
        self.active = false;
    }

    pub fn trigger(&mut self) {
        self.phase = 0.0;
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Selects the impulse shape. A running impulse is cut.
    pub fn set_kind(&mut self, kind: ExciterKind) {
        self.kind = kind;
        self.stop();
    }

    pub fn kind(&self) -> ExciterKind {
        self.kind
    }

    /// Brightness 0.0..1.0 speeds up playback, shortening the impulse.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.rate = 0.5 + sanitize(brightness, 0.0, 1.0, 0.5);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }

        let last = (IMPULSE_LENGTH - 1) as f32;
        let table = &impulses()[self.kind.index()];
        let sample = interpolate(table, self.phase / last, last);

        self.phase += self.rate;
        if self.phase >= last {
            self.active = false;
        }

        sample
    }
}
