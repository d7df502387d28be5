//! Oscillators used for modulation.

pub mod sine_oscillator;
