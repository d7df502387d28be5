//! Voice slot: a model instance bound to a note and to the patch of a channel.

use crate::pan::Pan;
use crate::patch::{Control, Parameters, Patch, PatchKind};
use crate::physical_modelling::banded_waveguide::BandedWaveguide;
use crate::physical_modelling::karplus_strong::KarplusStrong;
use crate::physical_modelling::mesh::Mesh;
use crate::physical_modelling::waveguide::Waveguide;
use crate::physical_modelling::woodwind::Woodwind;
use crate::physical_modelling::PhysicalModel;
use crate::utils::units::midi_to_frequency;

/// Model state of a voice, one variant per patch kind.
#[derive(Debug, Clone)]
pub enum VoiceModel {
    Waveguide(Waveguide),
    BandedWaveguide(BandedWaveguide),
    KarplusStrong(KarplusStrong),
    Woodwind(Woodwind),
    Mesh(Mesh),
    Dummy,
}

impl VoiceModel {
    pub fn new(kind: PatchKind) -> Self {
        match kind {
            PatchKind::Waveguide => Self::Waveguide(Waveguide::new()),
            PatchKind::BandedWaveguide => Self::BandedWaveguide(BandedWaveguide::new()),
            PatchKind::KarplusStrong => Self::KarplusStrong(KarplusStrong::new()),
            PatchKind::Woodwind => Self::Woodwind(Woodwind::new()),
            PatchKind::Mesh => Self::Mesh(Mesh::new()),
            PatchKind::Dummy => Self::Dummy,
        }
    }

    pub fn kind(&self) -> PatchKind {
        match self {
            Self::Waveguide(_) => PatchKind::Waveguide,
            Self::BandedWaveguide(_) => PatchKind::BandedWaveguide,
            Self::KarplusStrong(_) => PatchKind::KarplusStrong,
            Self::Woodwind(_) => PatchKind::Woodwind,
            Self::Mesh(_) => PatchKind::Mesh,
            Self::Dummy => PatchKind::Dummy,
        }
    }

    pub fn model(&self) -> Option<&dyn PhysicalModel> {
        match self {
            Self::Waveguide(m) => Some(m),
            Self::BandedWaveguide(m) => Some(m),
            Self::KarplusStrong(m) => Some(m),
            Self::Woodwind(m) => Some(m),
            Self::Mesh(m) => Some(m),
            Self::Dummy => None,
        }
    }

    pub fn model_mut(&mut self) -> Option<&mut dyn PhysicalModel> {
        match self {
            Self::Waveguide(m) => Some(m),
            Self::BandedWaveguide(m) => Some(m),
            Self::KarplusStrong(m) => Some(m),
            Self::Woodwind(m) => Some(m),
            Self::Mesh(m) => Some(m),
            Self::Dummy => None,
        }
    }

    /// Copies a parameter group into the model. Groups the model does not
    /// have are ignored.
    fn apply(&mut self, control: Control, p: &Parameters) {
        match self {
            Self::Waveguide(m) => match control {
                Control::Envelope => m.set_envelope(p.envelope),
                Control::Reflection => m.set_reflection(p.reflection),
                Control::Stiffness => m.set_stiffness(p.stiffness),
                Control::Shape => m.set_shape(p.shape),
                Control::ExcitePosition => m.set_excite_position(p.excite_position),
                Control::Exciter => m.set_exciter(p.exciter),
                Control::ImpulseSolo => m.set_impulse_solo(p.impulse_solo),
                Control::Brightness => m.set_brightness(p.brightness),
                _ => {}
            },
            Self::BandedWaveguide(m) => match control {
                Control::Envelope => m.set_envelope(p.envelope),
                Control::Brightness => m.set_brightness(p.brightness),
                Control::Harmonic => m.set_harmonic(p.harmonic),
                Control::ModeMix => m.set_mode_mix(p.mode_mix),
                Control::ReflectionAdjust => m.set_reflection_adjust(p.reflection_adjust),
                Control::Resonator => m.set_resonator(p.resonator),
                Control::Exciter => m.set_exciter(p.exciter),
                Control::ImpulseSolo => m.set_impulse_solo(p.impulse_solo),
                _ => {}
            },
            Self::KarplusStrong(m) => match control {
                Control::Envelope => m.set_envelope(p.envelope),
                Control::Attenuation => m.set_attenuation(p.attenuation),
                _ => {}
            },
            Self::Woodwind(m) => match control {
                Control::Envelope => m.set_envelope(p.envelope),
                Control::Coefficients => m.set_coefficients(p.coefficients),
                _ => {}
            },
            Self::Mesh(m) => match control {
                Control::Attenuation => m.set_attenuation(p.attenuation),
                Control::Exciter => m.set_exciter(p.exciter),
                _ => {}
            },
            Self::Dummy => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct Voice {
    index: usize,
    note: u8,
    channel: Option<usize>,
    model: VoiceModel,
    pan: Pan,
}

impl Voice {
    /// Creates an unassigned slot holding the inert placeholder.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            note: 0,
            channel: None,
            model: VoiceModel::Dummy,
            pan: Pan::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    /// Channel of the owning patch, `None` for a free slot.
    pub fn channel(&self) -> Option<usize> {
        self.channel
    }

    pub fn kind(&self) -> PatchKind {
        self.model.kind()
    }

    pub fn model(&self) -> &VoiceModel {
        &self.model
    }

    pub fn pan(&self) -> &Pan {
        &self.pan
    }

    #[inline]
    pub fn matches(&self, channel: usize, note: u8) -> bool {
        self.channel == Some(channel) && self.note == note
    }

    /// Binds the slot to a note of a channel.
    pub fn assign(&mut self, channel: usize, note: u8) {
        self.channel = Some(channel);
        self.note = note;
    }

    /// Prepares the model for the patch and copies all its parameters.
    pub fn start(&mut self, patch: &Patch) {
        log::debug!(
            "start voice {} channel {:?} note {}",
            self.index,
            self.channel,
            self.note
        );

        if self.model.kind() != patch.kind() {
            self.model = VoiceModel::new(patch.kind());
        }
        if let Some(model) = self.model.model_mut() {
            model.start();
        }
        for control in patch.kind().start_controls() {
            self.apply(*control, patch);
        }
    }

    pub fn stop(&mut self) {
        log::debug!(
            "stop voice {} channel {:?} note {}",
            self.index,
            self.channel,
            self.note
        );

        if let Some(model) = self.model.model_mut() {
            model.stop();
        }
    }

    /// Stops the voice and replaces it with the inert placeholder.
    pub fn clear(&mut self) {
        self.stop();
        self.model = VoiceModel::Dummy;
        self.channel = None;
        self.note = 0;
    }

    /// Excites the model. Returns `false` when the note is below the range
    /// the model can play, the voice then stays silent.
    pub fn note_on(&mut self, velocity: u8, patch: &Patch) -> bool {
        if self.note < patch.kind().lowest_note() {
            log::debug!("note {} too low for {:?}", self.note, patch.kind());
            return false;
        }

        for control in patch.kind().note_on_controls() {
            self.apply(*control, patch);
        }
        if let Some(model) = self.model.model_mut() {
            model.note_on(velocity.min(127) as f32 / 127.0);
        }

        true
    }

    pub fn note_off(&mut self, velocity: u8) {
        if let Some(model) = self.model.model_mut() {
            model.note_off(velocity.min(127) as f32 / 127.0);
        }
    }

    pub fn is_active(&self) -> bool {
        self.channel.is_some() && self.model.model().is_some_and(|m| m.is_active())
    }

    /// Copies one parameter group of the patch into this voice.
    pub fn apply(&mut self, control: Control, patch: &Patch) {
        let p = &patch.parameters;
        match control {
            Control::Pan => self.pan.set(p.volume, p.pan),
            Control::Frequency => {
                let frequency = midi_to_frequency(self.note as f32 + p.bend);
                if let Some(model) = self.model.model_mut() {
                    model.set_frequency(frequency);
                }
            }
            _ => self.model.apply(control, p),
        }
    }

    /// Renders the model into `mono` and pans it into the stereo outputs.
    /// All three slices must have the same length.
    pub fn render(&mut self, mono: &mut [f32], out_l: &mut [f32], out_r: &mut [f32]) {
        match self.model.model_mut() {
            Some(model) => {
                model.render(mono);
                self.pan.render(mono, out_l, out_r);
            }
            None => {
                out_l.fill(0.0);
                out_r.fill(0.0);
            }
        }
    }
}
