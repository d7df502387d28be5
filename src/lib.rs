#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

pub mod envelope;
pub mod exciter;
pub mod oscillator;
pub mod pan;
pub mod patch;
pub mod physical_modelling;
pub mod synth;
pub mod utils;
pub mod voice;

/// Fixed processing sample rate in Hz.
pub const SAMPLE_RATE: f32 = 48000.0;

/// Number of voice slots in the pool.
pub const NUM_VOICES: usize = 16;

/// Number of patch slots, one per MIDI channel.
pub const NUM_CHANNELS: usize = 16;

/// Largest block rendered in one pass. Longer requests are split.
pub const MAX_BLOCK_SIZE: usize = 64;
