//! Pitch and controller unit conversions.

#[allow(unused_imports)]
use num_traits::float::Float;

use crate::SAMPLE_RATE;

/// Lowest frequency any model is tuned to.
pub const MIN_FREQUENCY: f32 = 8.0;

/// Highest frequency any model is tuned to.
pub const MAX_FREQUENCY: f32 = SAMPLE_RATE / 4.0;

/// Pitch bend range in semitones for a full wheel deflection.
pub const PITCH_BEND_RANGE: f32 = 2.0;

const LOG_MAP_MIN: f32 = 200.0;
const LOG_MAP_MAX: f32 = 15000.0;

#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    (semitones / 12.0).exp2()
}

/// Equal tempered frequency of a (possibly fractional) MIDI note.
#[inline]
pub fn midi_to_frequency(note: f32) -> f32 {
    440.0 * semitones_to_ratio(note - 69.0)
}

/// Converts a 14-bit pitch wheel value (center 8192) to semitones.
#[inline]
pub fn pitch_bend(value: u16) -> f32 {
    let value = value.min(16383) as f32;
    (value - 8192.0) / 8192.0 * PITCH_BEND_RANGE
}

/// Maps a 7-bit controller value linearly onto `a..b`.
#[inline]
pub fn midi_map(value: u8, a: f32, b: f32) -> f32 {
    let x = value.min(127) as f32 / 127.0;
    a + (b - a) * x
}

/// Maps 0.0..1.0 exponentially onto the audible cutoff range.
#[inline]
pub fn logmap(x: f32) -> f32 {
    let x = sanitize(x, 0.0, 1.0, 0.0);
    LOG_MAP_MIN * (LOG_MAP_MAX / LOG_MAP_MIN).powf(x)
}

/// Replaces unusable frequencies so that derived delay lengths stay finite.
#[inline]
pub fn sanitize_frequency(frequency: f32) -> f32 {
    if frequency.is_finite() && frequency > MIN_FREQUENCY {
        frequency.min(MAX_FREQUENCY)
    } else {
        MIN_FREQUENCY
    }
}

/// Clamps a control value to `min..=max`. NaN and infinities are replaced by
/// `default`.
#[inline]
pub fn sanitize(value: f32, min: f32, max: f32, default: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}
