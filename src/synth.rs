//! Voice manager and stereo mixer.
//!
//! Maps (channel, note) pairs onto a fixed pool of voices, allocates slots
//! round robin within the polyphony limit, broadcasts patch changes to all
//! voices of a channel and sums every active voice into a stereo block.

use crate::exciter::ExciterKind;
use crate::patch::{Control, Parameters, Patch, PatchKind};
use crate::physical_modelling::banded_waveguide::ResonatorKind;
use crate::utils::accumulate;
use crate::utils::filter::{FilterMode, Svf};
use crate::utils::units::{pitch_bend, sanitize};
use crate::voice::Voice;
use crate::{MAX_BLOCK_SIZE, NUM_CHANNELS, NUM_VOICES, SAMPLE_RATE};

/// Selection state shared by the front panel controls.
#[derive(Debug, Clone)]
pub struct SynthContext {
    current_patch: usize,
    polyphony: usize,
    exciter: ExciterKind,
    resonator: ResonatorKind,
}

impl Default for SynthContext {
    fn default() -> Self {
        Self {
            current_patch: 0,
            polyphony: NUM_VOICES,
            exciter: ExciterKind::default(),
            resonator: ResonatorKind::default(),
        }
    }
}

impl SynthContext {
    pub fn current_patch(&self) -> usize {
        self.current_patch
    }

    pub fn polyphony(&self) -> usize {
        self.polyphony
    }

    pub fn exciter(&self) -> ExciterKind {
        self.exciter
    }

    pub fn resonator(&self) -> ResonatorKind {
        self.resonator
    }
}

/// Highest output filter cutoff, normalized to the sample rate.
const MAX_CUTOFF: f32 = 0.497;

/// Master low-pass applied to the mix.
#[derive(Debug, Clone, Default)]
struct OutputFilter {
    left: Svf,
    right: Svf,
    enabled: bool,
}

impl OutputFilter {
    fn set(&mut self, cutoff: f32, resonance: f32) {
        let f = sanitize(cutoff / SAMPLE_RATE, 0.0, MAX_CUTOFF, MAX_CUTOFF);
        let damping = 2.0 - 2.0 * sanitize(resonance, 0.0, 0.99, 0.0);
        self.left.set_f_damping(f, damping);
        self.right.set_f_damping(f, damping);
        if !self.enabled {
            self.left.reset();
            self.right.reset();
            self.enabled = true;
        }
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        if self.enabled {
            self.left.process_buffer(left, FilterMode::LowPass);
            self.right.process_buffer(right, FilterMode::LowPass);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Synth {
    patches: [Option<Patch>; NUM_CHANNELS],
    voices: [Voice; NUM_VOICES],
    voice_index: usize,
    context: SynthContext,
    output_filter: OutputFilter,

    mono: [f32; MAX_BLOCK_SIZE],
    left: [f32; MAX_BLOCK_SIZE],
    right: [f32; MAX_BLOCK_SIZE],
}

impl Default for Synth {
    fn default() -> Self {
        Self::new()
    }
}

impl Synth {
    pub fn new() -> Self {
        Self {
            patches: Default::default(),
            voices: core::array::from_fn(Voice::new),
            voice_index: 0,
            context: SynthContext::default(),
            output_filter: OutputFilter::default(),
            mono: [0.0; MAX_BLOCK_SIZE],
            left: [0.0; MAX_BLOCK_SIZE],
            right: [0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Installs a patch with default parameters on a channel. Voices still
    /// playing the previous patch of that channel are silenced.
    pub fn set_patch(&mut self, channel: usize, kind: PatchKind) -> bool {
        if channel >= NUM_CHANNELS {
            log::warn!("bad channel number {}", channel);
            return false;
        }
        if self.patches[channel].is_some() {
            self.stop_voices(channel);
        }
        self.patches[channel] = Some(Patch::new(kind));
        true
    }

    pub fn patch(&self, channel: usize) -> Option<&Patch> {
        self.patches.get(channel)?.as_ref()
    }

    pub fn context(&self) -> &SynthContext {
        &self.context
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn polyphony(&self) -> usize {
        self.context.polyphony
    }

    /// Limits the number of slots used by allocation, 1..=NUM_VOICES.
    pub fn set_polyphony(&mut self, polyphony: usize) {
        self.context.polyphony = polyphony.clamp(1, NUM_VOICES);
        if self.voice_index >= self.context.polyphony {
            self.voice_index = 0;
        }
    }

    /// Makes a channel the current patch and adopts the polyphony its model
    /// can afford.
    pub fn select_patch(&mut self, channel: usize) -> bool {
        let Some(kind) = self.patch(channel).map(Patch::kind) else {
            log::warn!("no patch on channel {}", channel);
            return false;
        };
        self.context.current_patch = channel;
        self.set_polyphony(kind.polyphony());
        log::debug!("current patch {} {:?}", channel, kind);
        true
    }

    /// Selects the next channel holding a patch.
    pub fn next_patch(&mut self) -> bool {
        for i in 1..=NUM_CHANNELS {
            let channel = (self.context.current_patch + i) % NUM_CHANNELS;
            if self.patches[channel].is_some() {
                return self.select_patch(channel);
            }
        }
        false
    }

    pub fn set_exciter(&mut self, exciter: ExciterKind) {
        self.context.exciter = exciter;
        let channel = self.context.current_patch;
        self.update_patch(channel, |p| p.exciter = exciter, Control::Exciter);
    }

    pub fn set_resonator(&mut self, resonator: ResonatorKind) {
        self.context.resonator = resonator;
        let channel = self.context.current_patch;
        self.update_patch(channel, |p| p.resonator = resonator, Control::Resonator);
    }

    /// Enables the master low-pass. `resonance` in 0.0..1.0.
    pub fn set_output_filter(&mut self, cutoff: f32, resonance: f32) {
        self.output_filter.set(cutoff, resonance);
    }

    pub fn bypass_output_filter(&mut self) {
        self.output_filter.enabled = false;
    }

    /// Finds the voice playing a note on a channel.
    pub fn lookup(&self, channel: usize, note: u8) -> Option<usize> {
        self.voices.iter().position(|v| v.matches(channel, note))
    }

    /// Takes the next slot in round-robin order, stops whatever it was
    /// playing and starts it with the channel's patch.
    pub fn allocate(&mut self, channel: usize, note: u8) -> Option<usize> {
        if channel >= NUM_CHANNELS {
            log::warn!("bad channel number {}", channel);
            return None;
        }
        let Some(patch) = self.patches[channel].as_ref() else {
            log::warn!("no patch defined for channel {}", channel);
            return None;
        };

        let index = self.voice_index;
        self.voice_index += 1;
        if self.voice_index >= self.context.polyphony {
            self.voice_index = 0;
        }

        let voice = &mut self.voices[index];
        if voice.channel().is_some() {
            voice.stop();
        }
        voice.assign(channel, note);
        voice.start(patch);

        Some(index)
    }

    /// Allocates a voice for the note and excites it.
    pub fn note_on(&mut self, channel: usize, note: u8, velocity: u8) -> Option<usize> {
        let index = self.allocate(channel, note)?;
        let patch = self.patches[channel].as_ref()?;
        self.voices[index].note_on(velocity, patch);
        Some(index)
    }

    pub fn note_off(&mut self, channel: usize, note: u8, velocity: u8) {
        if let Some(index) = self.lookup(channel, note) {
            self.voices[index].note_off(velocity);
        }
    }

    /// Calls `f` for every voice owned by the channel's patch.
    pub fn update_voices(&mut self, channel: usize, mut f: impl FnMut(&mut Voice, &Patch)) {
        let Some(patch) = self.patches.get(channel).and_then(Option::as_ref) else {
            return;
        };
        for voice in self.voices.iter_mut() {
            if voice.channel() == Some(channel) {
                f(voice, patch);
            }
        }
    }

    /// Broadcasts a parameter group of the channel's patch to its voices.
    pub fn apply_control(&mut self, channel: usize, control: Control) {
        self.update_voices(channel, |voice, patch| voice.apply(control, patch));
    }

    /// Changes patch parameters and broadcasts the affected group.
    pub fn update_patch(
        &mut self,
        channel: usize,
        f: impl FnOnce(&mut Parameters),
        control: Control,
    ) -> bool {
        match self.patches.get_mut(channel).and_then(Option::as_mut) {
            Some(patch) => {
                f(&mut patch.parameters);
                self.apply_control(channel, control);
                true
            }
            None => false,
        }
    }

    /// Applies a 14-bit pitch wheel value to every voice of the channel.
    pub fn pitch_bend(&mut self, channel: usize, value: u16) -> bool {
        let bend = pitch_bend(value);
        self.update_patch(channel, |p| p.bend = bend, Control::Frequency)
    }

    /// Silences all voices of the channel and frees their slots.
    pub fn stop_voices(&mut self, channel: usize) {
        for voice in self.voices.iter_mut() {
            if voice.channel() == Some(channel) {
                voice.clear();
            }
        }
    }

    /// Fills both outputs with the sum of all active voices.
    pub fn render(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let size = out_l.len().min(out_r.len());
        out_l.fill(0.0);
        out_r.fill(0.0);

        let mut offset = 0;
        while offset < size {
            let n = (size - offset).min(MAX_BLOCK_SIZE);
            let block_l = &mut out_l[offset..offset + n];
            let block_r = &mut out_r[offset..offset + n];

            for voice in self.voices.iter_mut() {
                if !voice.is_active() {
                    continue;
                }
                voice.render(
                    &mut self.mono[..n],
                    &mut self.left[..n],
                    &mut self.right[..n],
                );
                accumulate(block_l, &self.left[..n]);
                accumulate(block_r, &self.right[..n]);
            }

            self.output_filter.process(block_l, block_r);
            offset += n;
        }
    }
}
