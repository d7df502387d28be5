//! Per-channel patch state.
//!
//! A patch selects the model kind played on a MIDI channel and holds the
//! parameters shared by all voices of that channel. Parameter changes reach
//! the voices as [`Control`] broadcasts.

use crate::envelope::AdsrParameters;
use crate::exciter::ExciterKind;
use crate::physical_modelling::banded_waveguide::ResonatorKind;
use crate::physical_modelling::waveguide::WaveguideShape;
use crate::physical_modelling::woodwind::WoodwindCoefficients;
use crate::NUM_VOICES;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    #[default]
    Waveguide,
    BandedWaveguide,
    KarplusStrong,
    Woodwind,
    Mesh,
    /// Inert placeholder, never produces sound.
    Dummy,
}

impl PatchKind {
    /// Lowest note whose delay line still fits the model's capacity.
    pub fn lowest_note(self) -> u8 {
        match self {
            Self::Waveguide => 25,
            Self::BandedWaveguide => 24,
            Self::KarplusStrong => 31,
            Self::Woodwind => 24,
            Self::Mesh | Self::Dummy => 0,
        }
    }

    /// Number of voices the model can afford when this patch is selected.
    pub fn polyphony(self) -> usize {
        match self {
            Self::Waveguide => 8,
            Self::BandedWaveguide => 6,
            Self::KarplusStrong => NUM_VOICES,
            Self::Woodwind => 8,
            Self::Mesh => 4,
            Self::Dummy => NUM_VOICES,
        }
    }

    /// Controls applied when a voice starts playing this patch.
    pub fn start_controls(self) -> &'static [Control] {
        match self {
            Self::Waveguide => &[
                Control::Pan,
                Control::Envelope,
                Control::Frequency,
                Control::Reflection,
                Control::Stiffness,
                Control::Shape,
                Control::Exciter,
                Control::Brightness,
                Control::ExcitePosition,
                Control::ImpulseSolo,
            ],
            Self::BandedWaveguide => &[
                Control::Pan,
                Control::Envelope,
                Control::Resonator,
                Control::Harmonic,
                Control::ReflectionAdjust,
                Control::Frequency,
                Control::Brightness,
                Control::ModeMix,
                Control::Exciter,
                Control::ImpulseSolo,
            ],
            Self::KarplusStrong => &[
                Control::Pan,
                Control::Envelope,
                Control::Frequency,
                Control::Attenuation,
            ],
            Self::Woodwind => &[
                Control::Pan,
                Control::Envelope,
                Control::Frequency,
                Control::Coefficients,
            ],
            Self::Mesh => &[Control::Pan, Control::Attenuation, Control::Exciter],
            Self::Dummy => &[],
        }
    }

    /// Controls refreshed right before the model is excited.
    pub fn note_on_controls(self) -> &'static [Control] {
        match self {
            Self::Waveguide => &[
                Control::Exciter,
                Control::Reflection,
                Control::ImpulseSolo,
                Control::ExcitePosition,
            ],
            Self::BandedWaveguide => &[
                Control::Brightness,
                Control::Exciter,
                Control::ImpulseSolo,
                Control::Harmonic,
                Control::Frequency,
                Control::ReflectionAdjust,
                Control::Resonator,
            ],
            Self::KarplusStrong | Self::Woodwind | Self::Mesh | Self::Dummy => &[],
        }
    }
}

/// One parameter group of a patch, copied into the voices when broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Frequency,
    Pan,
    Envelope,
    Reflection,
    Stiffness,
    Shape,
    ExcitePosition,
    Exciter,
    ImpulseSolo,
    Brightness,
    Harmonic,
    ModeMix,
    ReflectionAdjust,
    Resonator,
    Attenuation,
    Coefficients,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// Output level, 0.0..1.0.
    pub volume: f32,
    /// Stereo position, 0.0 (left) .. 1.0 (right).
    pub pan: f32,
    /// Pitch offset in semitones.
    pub bend: f32,
    /// Bridge reflection coefficient of the waveguide.
    pub reflection: f32,
    /// Stiffness allpass coefficient, 0.0..1.0.
    pub stiffness: f32,
    /// Excitation point as a fraction of the string length.
    pub excite_position: f32,
    pub brightness: f32,
    pub harmonic: f32,
    pub mode_mix: f32,
    pub reflection_adjust: f32,
    pub attenuation: f32,
    pub envelope: AdsrParameters,
    pub shape: WaveguideShape,
    pub exciter: ExciterKind,
    pub resonator: ResonatorKind,
    pub impulse_solo: bool,
    pub coefficients: WoodwindCoefficients,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pan: 0.5,
            bend: 0.0,
            reflection: -0.99,
            stiffness: 1.0,
            excite_position: 0.25,
            brightness: 0.5,
            harmonic: 0.0,
            mode_mix: 0.1,
            reflection_adjust: 0.0,
            attenuation: 0.995,
            envelope: AdsrParameters::default(),
            shape: WaveguideShape::String,
            exciter: ExciterKind::Mallet,
            resonator: ResonatorKind::UniformBar,
            impulse_solo: false,
            coefficients: WoodwindCoefficients::default(),
        }
    }
}

impl Parameters {
    /// Default settings of each patch kind.
    pub fn for_kind(kind: PatchKind) -> Self {
        let defaults = Self::default();
        match kind {
            PatchKind::BandedWaveguide => Self {
                brightness: 1.0,
                ..defaults
            },
            PatchKind::KarplusStrong => Self {
                envelope: AdsrParameters {
                    attack: 0.0,
                    decay: 1.0,
                    sustain: 1.0,
                    release: 1.0,
                },
                ..defaults
            },
            PatchKind::Woodwind => Self {
                volume: 0.3,
                attenuation: 0.99,
                envelope: AdsrParameters {
                    attack: 0.2,
                    decay: 2.0,
                    sustain: 1.0,
                    release: 1.0,
                },
                ..defaults
            },
            PatchKind::Mesh => Self {
                attenuation: 0.99,
                ..defaults
            },
            PatchKind::Waveguide | PatchKind::Dummy => defaults,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    kind: PatchKind,
    pub parameters: Parameters,
}

impl Patch {
    pub fn new(kind: PatchKind) -> Self {
        Self {
            kind,
            parameters: Parameters::for_kind(kind),
        }
    }

    pub fn kind(&self) -> PatchKind {
        self.kind
    }
}
