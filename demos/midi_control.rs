//! Polyphonic synth with MIDI note and parameter control.

use audio_midi_shell::{AudioGenerator, AudioMidiShell};
use simple_logger::SimpleLogger;

use pm_synth_dsp::patch::{Control, Parameters, PatchKind};
use pm_synth_dsp::synth::Synth;
use pm_synth_dsp::utils::units::{logmap, midi_map};

const SAMPLE_RATE: u32 = 48000;
const BLOCK_SIZE: usize = 32;

const PATCHES: [PatchKind; 5] = [
    PatchKind::Waveguide,
    PatchKind::BandedWaveguide,
    PatchKind::KarplusStrong,
    PatchKind::Woodwind,
    PatchKind::Mesh,
];

fn main() -> ! {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()
        .unwrap();

    AudioMidiShell::run_forever(SAMPLE_RATE, BLOCK_SIZE, App::new());
}

#[derive(Debug)]
struct App {
    synth: Box<Synth>,
}

impl App {
    pub fn new() -> Self {
        Self {
            synth: Box::new(Synth::new()),
        }
    }

    fn update(&mut self, f: impl FnOnce(&mut Parameters), control: Control) {
        let channel = self.synth.context().current_patch();
        self.synth.update_patch(channel, f, control);
    }
}

impl AudioGenerator for App {
    fn init(&mut self, _block_size: usize) {
        for (channel, kind) in PATCHES.iter().enumerate() {
            self.synth.set_patch(channel, *kind);
        }
        self.synth.select_patch(0);
    }

    fn process(&mut self, samples_left: &mut [f32], samples_right: &mut [f32]) {
        self.synth.render(samples_left, samples_right);
    }

    fn process_midi(&mut self, message: Vec<u8>) {
        if message.len() < 3 {
            return;
        }
        let channel = self.synth.context().current_patch();

        match message[0] & 0xF0 {
            0x80 => {
                // Note off
                self.synth.note_off(channel, message[1], message[2]);
                log::info!("Note off: {}", message[1]);
            }
            0x90 if message[2] == 0 => {
                self.synth.note_off(channel, message[1], 0);
                log::info!("Note off: {}", message[1]);
            }
            0x90 => {
                // Note on
                self.synth.note_on(channel, message[1], message[2]);
                log::info!("Note on: {}", message[1]);
            }
            0xE0 => {
                // Pitch bend
                let value = (message[2] as u16) << 7 | message[1] as u16;
                self.synth.pitch_bend(channel, value);
            }
            0xB0 => {
                // Control change
                let value = message[2];
                match message[1] {
                    21 => {
                        let index = (midi_map(value, 0.0, 4.0) + 0.5) as usize;
                        self.synth.select_patch(index);
                        log::info!("Patch: {:?}", PATCHES[index.min(PATCHES.len() - 1)]);
                    }
                    22 => {
                        let reflection = midi_map(value, -1.0, -0.9);
                        self.update(|p| p.reflection = reflection, Control::Reflection);
                        log::info!("Reflection: {}", reflection);
                    }
                    23 => {
                        let stiffness = midi_map(value, 0.0, 1.0);
                        self.update(|p| p.stiffness = stiffness, Control::Stiffness);
                        log::info!("Stiffness: {}", stiffness);
                    }
                    24 => {
                        let brightness = midi_map(value, 0.0, 1.0);
                        self.update(|p| p.brightness = brightness, Control::Brightness);
                        log::info!("Brightness: {}", brightness);
                    }
                    25 => {
                        let position = midi_map(value, 0.0, 0.5);
                        self.update(|p| p.excite_position = position, Control::ExcitePosition);
                        log::info!("Excite position: {}", position);
                    }
                    26 => {
                        let mode_mix = midi_map(value, 0.0, 1.0);
                        self.update(|p| p.mode_mix = mode_mix, Control::ModeMix);
                        log::info!("Mode mix: {}", mode_mix);
                    }
                    27 => {
                        let attenuation = midi_map(value, 0.9, 1.0);
                        self.update(|p| p.attenuation = attenuation, Control::Attenuation);
                        log::info!("Attenuation: {}", attenuation);
                    }
                    28 => {
                        let volume = midi_map(value, 0.0, 1.0);
                        self.update(|p| p.volume = volume, Control::Pan);
                        log::info!("Volume: {}", volume);
                    }
                    29 => {
                        if value == 127 {
                            self.synth.bypass_output_filter();
                            log::info!("Output filter: off");
                        } else {
                            let cutoff = logmap(midi_map(value, 0.0, 1.0));
                            self.synth.set_output_filter(cutoff, 0.3);
                            log::info!("Output filter: {} Hz", cutoff);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}
