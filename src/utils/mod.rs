//! Utility functions.
//!
//! Small numeric helpers shared by the models, the delay line primitive,
//! filters, the pseudo random generator and unit conversions.

pub mod delay_line;
pub mod filter;
pub mod random;
pub mod units;

#[allow(unused_imports)]
use num_traits::float::Float;

/// Table lookup with linear interpolation, `index` normalized to 0.0..1.0.
#[inline]
pub fn interpolate(table: &[f32], mut index: f32, size: f32) -> f32 {
    index = index.clamp(0.0, 1.0);
    index *= size;
    let index_integral = index as usize;
    let index_fractional = index - (index_integral as f32);
    let a = table[index_integral];
    let b = table[(index_integral + 1).min(table.len() - 1)];

    a + (b - a) * index_fractional
}

#[inline]
pub fn one_pole(out: &mut f32, in_: f32, coefficient: f32) {
    *out += coefficient * (in_ - *out);
}

#[inline]
pub fn crossfade(a: f32, b: f32, fade: f32) -> f32 {
    a + (b - a) * fade
}

/// Adds `in_` to `out`.
#[inline]
pub fn accumulate(out: &mut [f32], in_: &[f32]) {
    for (sample_out, sample_in) in out.iter_mut().zip(in_.iter()) {
        *sample_out += *sample_in;
    }
}
