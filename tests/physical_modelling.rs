mod analysis;

use pm_synth_dsp::envelope::AdsrParameters;
use pm_synth_dsp::exciter::ExciterKind;
use pm_synth_dsp::physical_modelling::banded_waveguide::{
    mix_factors, BandedWaveguide, ResonatorKind,
};
use pm_synth_dsp::physical_modelling::karplus_strong::KarplusStrong;
use pm_synth_dsp::physical_modelling::mesh::Mesh;
use pm_synth_dsp::physical_modelling::waveguide::{Waveguide, WaveguideShape};
use pm_synth_dsp::physical_modelling::woodwind::{Woodwind, WoodwindCoefficients};
use pm_synth_dsp::physical_modelling::PhysicalModel;
use pm_synth_dsp::SAMPLE_RATE;

const BLOCK_SIZE: usize = 24;

fn render(model: &mut impl PhysicalModel, duration: f32) -> Vec<f32> {
    let mut data = Vec::new();
    let mut out = [0.0; BLOCK_SIZE];

    for _ in 0..(duration * SAMPLE_RATE) as usize / BLOCK_SIZE {
        model.render(&mut out);
        data.extend_from_slice(&out);
    }

    data
}

fn assert_bounded(data: &[f32], name: &str) {
    for (i, x) in data.iter().enumerate() {
        assert!(x.is_finite(), "{name}: sample {i} is not finite");
        assert!(x.abs() < 4.0, "{name}: sample {i} is {x}");
    }
}

fn waveguide(frequency: f32) -> Waveguide {
    let mut model = Waveguide::new();
    model.start();
    model.set_frequency(frequency);
    model.set_reflection(-0.99);
    model.set_stiffness(1.0);
    model.set_excite_position(0.25);
    model
}

fn banded(frequency: f32, brightness: f32) -> BandedWaveguide {
    let mut model = BandedWaveguide::new();
    model.start();
    model.set_frequency(frequency);
    model.set_brightness(brightness);
    model
}

#[test]
fn silent_until_triggered() {
    let mut waveguide = Waveguide::new();
    let mut banded = BandedWaveguide::new();
    let mut ks = KarplusStrong::new();
    let mut woodwind = Woodwind::new();
    let mut mesh = Mesh::new();

    let models: [&mut dyn PhysicalModel; 5] =
        [&mut waveguide, &mut banded, &mut ks, &mut woodwind, &mut mesh];

    let mut out = [1.0; BLOCK_SIZE];
    for model in models {
        model.render(&mut out);
        assert!(out.iter().all(|x| *x == 0.0));
        assert!(!model.is_active());

        model.start();
        model.set_frequency(440.0);
        model.render(&mut out);
        assert!(out.iter().all(|x| *x == 0.0));
    }
}

#[test]
fn waveguide_pluck() {
    let mut model = waveguide(220.0);
    model.set_exciter(ExciterKind::Pluck);
    model.note_on(1.0);
    assert!(model.is_active());

    let data = render(&mut model, 4.0);
    wav_writer::write("physical_modelling/waveguide_pluck.wav", &data).ok();
    assert_bounded(&data, "waveguide");

    let expected = (SAMPLE_RATE / 220.0) as i32;
    let lag = analysis::period(&data[4800..9600], 150, 300) as i32;
    assert!((lag - expected).abs() <= 6, "period {lag}, expected {expected}");

    // Decays without growing.
    let windows: Vec<f32> = data.chunks(4800).map(analysis::peak).collect();
    for pair in windows[1..].windows(2) {
        assert!(pair[1] <= pair[0] * 1.1, "{} > {}", pair[1], pair[0]);
    }
    assert!(windows[windows.len() - 1] < 0.5 * windows[1]);
}

#[test]
fn waveguide_tube_and_stiffness() {
    let mut model = waveguide(110.0);
    model.set_shape(WaveguideShape::Tube);
    model.set_stiffness(0.3);
    model.set_exciter(ExciterKind::Blow);
    model.note_on(0.7);

    let data = render(&mut model, 2.0);
    wav_writer::write("physical_modelling/waveguide_tube.wav", &data).ok();
    assert_bounded(&data, "tube");
    assert!(analysis::rms(&data) > 0.0);
}

#[test]
fn waveguide_low_note() {
    let mut model = waveguide(40.0);
    assert_eq!(model.downsampling(), 4);
    model.note_on(1.0);

    let data = render(&mut model, 2.0);
    assert_bounded(&data, "low waveguide");
    assert!(analysis::rms(&data) > 0.0);
}

#[test]
fn waveguide_impulse_solo() {
    let mut model = waveguide(220.0);
    model.set_impulse_solo(true);
    model.note_on(1.0);

    let data = render(&mut model, 0.1);
    // Only the impulse is heard, the string is silent once it ends.
    assert!(analysis::peak(&data[..64]) > 0.0);
    assert_eq!(analysis::peak(&data[256..]), 0.0);
}

#[test]
fn waveguide_note_off() {
    let mut model = waveguide(220.0);
    model.set_envelope(AdsrParameters {
        attack: 0.0,
        decay: 1.0,
        sustain: 1.0,
        release: 0.05,
    });
    model.note_on(1.0);
    render(&mut model, 0.2);

    model.note_off(0.0);
    render(&mut model, 1.0);
    assert!(!model.is_active());
}

#[test]
fn waveguide_stop() {
    let mut model = waveguide(220.0);
    model.note_on(1.0);
    render(&mut model, 0.1);

    model.stop();
    assert!(!model.is_active());
    let data = render(&mut model, 0.1);
    assert_eq!(analysis::peak(&data), 0.0);
}

#[test]
fn banded_brightness() {
    let dark = mix_factors(0.0);
    assert!((dark[0] - 0.84).abs() < 1e-6);
    assert_eq!(dark[1], 0.0);
    assert_eq!(dark[2], 0.0);
    let bright = mix_factors(1.0);
    assert!((bright[0] - 0.8).abs() < 1e-6);
    assert!((bright[1] - 0.6).abs() < 1e-6);
    assert!((bright[2] - 0.3).abs() < 1e-6);

    let frequency = 440.0;
    let mut ratios = Vec::new();

    for brightness in [0.0, 1.0] {
        let mut model = banded(frequency, brightness);
        model.note_on(1.0);
        let data = render(&mut model, 1.0);
        wav_writer::write(
            &format!("physical_modelling/banded_brightness_{brightness}.wav"),
            &data,
        )
        .ok();
        assert_bounded(&data, "banded");

        let mode_1 = SAMPLE_RATE / model.mode_delay_length(1) as f32;
        let e_0 = analysis::band_power(&data, frequency * 0.95, frequency * 1.05);
        let e_1 = analysis::band_power(&data, mode_1 * 0.95, mode_1 * 1.05);
        if brightness == 0.0 {
            assert!(e_0 > e_1);
        }
        ratios.push(e_1 / e_0);
    }

    assert!(ratios[1] > ratios[0], "ratios {ratios:?}");
}

#[test]
fn banded_mode_mix() {
    let mut outputs = Vec::new();

    for mode_mix in [0.0, 1.0] {
        let mut model = banded(330.0, 1.0);
        model.set_mode_mix(mode_mix);
        model.note_on(1.0);
        let data = render(&mut model, 10.0);
        assert_bounded(&data, "banded mode mix");
        outputs.push(data);
    }

    assert!(outputs[0]
        .iter()
        .zip(outputs[1].iter())
        .any(|(a, b)| (a - b).abs() > 1e-6));
}

#[test]
fn banded_resonators() {
    for index in 0..4 {
        let mut model = banded(261.6, 0.8);
        model.set_resonator(ResonatorKind::from_index(index));
        model.set_exciter(ExciterKind::from_index(index));
        model.note_on(0.8);
        let data = render(&mut model, 1.0);
        wav_writer::write(
            &format!("physical_modelling/banded_resonator_{index}.wav"),
            &data,
        )
        .ok();
        assert_bounded(&data, "banded resonator");
        assert!(analysis::rms(&data) > 0.0);
    }
}

#[test]
fn karplus_strong_attenuation() {
    let mut energies = Vec::new();

    for attenuation in [0.2, 0.99, 1.0] {
        let mut model = KarplusStrong::new();
        model.start();
        model.set_frequency(440.0);
        model.set_attenuation(attenuation);
        model.set_envelope(AdsrParameters {
            attack: 0.0,
            decay: 1.0,
            sustain: 1.0,
            release: 1.0,
        });
        model.note_on(1.0);

        let data = render(&mut model, 1.0);
        wav_writer::write(
            &format!("physical_modelling/karplus_strong_{attenuation}.wav"),
            &data,
        )
        .ok();
        assert_bounded(&data, "karplus strong");
        energies.push(analysis::energy(&data[1024..]));
    }

    // Stronger averaging loses the upper partials faster.
    assert!(energies[1] < energies[0], "energies {energies:?}");
    assert!(energies[2] < energies[1], "energies {energies:?}");
}

#[test]
fn karplus_strong_length() {
    let mut model = KarplusStrong::new();
    model.set_attenuation(0.99);
    assert!((model.averaging() - 0.495).abs() < 1e-6);

    model.set_frequency(440.0);
    assert_eq!(model.delay_length(), 109);
    assert!((model.delay_fraction() - (SAMPLE_RATE / 440.0 - 109.0)).abs() < 1e-4);
}

#[test]
fn woodwind_blow() {
    let mut model = Woodwind::new();
    model.start();
    model.set_frequency(220.0);
    model.set_envelope(AdsrParameters {
        attack: 0.2,
        decay: 2.0,
        sustain: 1.0,
        release: 0.2,
    });
    model.note_on(1.0);
    assert!(model.is_active());

    let mut data = render(&mut model, 1.0);
    model.set_frequency(330.0);
    data.extend(render(&mut model, 1.0));
    model.note_off(0.0);
    data.extend(render(&mut model, 2.0));

    wav_writer::write("physical_modelling/woodwind.wav", &data).ok();
    assert_bounded(&data, "woodwind");
    assert!(analysis::rms(&data[..SAMPLE_RATE as usize]) > 0.0);
    assert!(!model.is_active());
}

#[test]
fn mesh_strike() {
    let mut model = Mesh::new();
    model.start();
    model.set_attenuation(0.99);
    model.set_exciter(ExciterKind::Mallet);
    model.note_on(1.0);
    assert!(model.is_active());

    let data = render(&mut model, 2.0);
    wav_writer::write("physical_modelling/mesh.wav", &data).ok();
    assert_bounded(&data, "mesh");
    assert!(analysis::rms(&data) > 0.0);
}

#[test]
fn mesh_goes_quiet() {
    let mut model = Mesh::new();
    model.start();
    model.set_attenuation(0.5);
    model.note_on(1.0);

    render(&mut model, 5.0);
    assert!(!model.is_active());
}

#[test]
fn bounded_over_long_notes() {
    let mut waveguide = waveguide(55.0);
    let mut banded = banded(110.0, 1.0);
    banded.set_mode_mix(1.0);
    let mut ks = KarplusStrong::new();
    ks.start();
    ks.set_frequency(55.0);
    ks.set_attenuation(0.0);
    let mut woodwind = Woodwind::new();
    woodwind.start();
    woodwind.set_frequency(110.0);
    let mut mesh = Mesh::new();
    mesh.start();
    mesh.set_attenuation(0.99);

    let models: [&mut dyn PhysicalModel; 5] =
        [&mut waveguide, &mut banded, &mut ks, &mut woodwind, &mut mesh];

    let mut out = [0.0; BLOCK_SIZE];
    for model in models {
        model.note_on(1.0);
        for block in 0..(10.0 * SAMPLE_RATE) as usize / BLOCK_SIZE {
            // Retrigger every second.
            if block % 2000 == 1999 {
                model.note_on(1.0);
            }
            model.render(&mut out);
            assert_bounded(&out, "long note");
        }
    }
}

#[test]
fn frequency_change_while_playing() {
    let mut waveguide = waveguide(220.0);
    let mut banded = banded(220.0, 0.5);
    let mut ks = KarplusStrong::new();
    ks.start();
    ks.set_frequency(220.0);

    let models: [&mut dyn PhysicalModel; 3] = [&mut waveguide, &mut banded, &mut ks];

    let mut out = [0.0; BLOCK_SIZE];
    for model in models {
        model.note_on(1.0);
        for (i, frequency) in [220.0, 50.0, 1000.0, 30.0, 440.0, 0.0, f32::NAN]
            .into_iter()
            .enumerate()
        {
            model.set_frequency(frequency);
            for _ in 0..(i + 1) * 50 {
                model.render(&mut out);
                assert_bounded(&out, "frequency change");
            }
        }
    }
}

/// Plays a model for 10 seconds, retriggering every second, and checks that
/// the output stays finite and below 4.
fn assert_bounded_note(model: &mut dyn PhysicalModel, name: &str) {
    let mut out = [0.0; BLOCK_SIZE];
    model.note_on(1.0);
    for block in 0..(10.0 * SAMPLE_RATE) as usize / BLOCK_SIZE {
        if block % 2000 == 1999 {
            model.note_on(1.0);
        }
        model.render(&mut out);
        assert_bounded(&out, name);
    }
}

#[test]
fn waveguide_bounded_at_range_limits() {
    for shape in [WaveguideShape::String, WaveguideShape::Tube] {
        for reflection in [-1.0, 1.0] {
            for stiffness in [0.0, 1.0] {
                for frequency in [40.0, 110.0] {
                    let mut model = waveguide(frequency);
                    model.set_shape(shape);
                    model.set_reflection(reflection);
                    model.set_stiffness(stiffness);
                    model.set_excite_position(0.0);
                    let name = format!(
                        "waveguide {shape:?} reflection {reflection} stiffness {stiffness} {frequency} Hz"
                    );
                    assert_bounded_note(&mut model, &name);
                }
            }
        }
    }
}

#[test]
fn banded_bounded_at_range_limits() {
    for brightness in [0.0, 1.0] {
        for mode_mix in [0.0, 1.0] {
            for harmonic in [-1.0, 1.0] {
                let mut model = banded(110.0, brightness);
                model.set_mode_mix(mode_mix);
                model.set_harmonic(harmonic);
                model.set_reflection_adjust(1.0);
                model.set_resonator(ResonatorKind::Membrane);
                model.set_frequency(110.0);
                let name =
                    format!("banded brightness {brightness} mode mix {mode_mix} harmonic {harmonic}");
                assert_bounded_note(&mut model, &name);
            }
        }
    }
}

#[test]
fn woodwind_bounded_at_range_limits() {
    for low_pass in [0.0, 1.0] {
        for r_1 in [-1.0, 1.0] {
            for r_2 in [-1.0, 1.0] {
                let mut model = Woodwind::new();
                model.start();
                model.set_frequency(440.0);
                model.set_coefficients(WoodwindCoefficients { low_pass, r_1, r_2 });
                let name = format!("woodwind low pass {low_pass} r_1 {r_1} r_2 {r_2}");
                assert_bounded_note(&mut model, &name);
            }
        }
    }
}

#[test]
fn karplus_strong_and_mesh_bounded_at_range_limits() {
    for attenuation in [0.0, 1.0] {
        let mut ks = KarplusStrong::new();
        ks.start();
        ks.set_frequency(55.0);
        ks.set_attenuation(attenuation);
        assert_bounded_note(&mut ks, &format!("karplus strong {attenuation}"));

        let mut mesh = Mesh::new();
        mesh.start();
        mesh.set_attenuation(attenuation);
        assert_bounded_note(&mut mesh, &format!("mesh {attenuation}"));
    }
}

#[test]
fn non_finite_settings() {
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        let mut waveguide = waveguide(220.0);
        waveguide.set_reflection(bad);
        waveguide.set_stiffness(bad);
        waveguide.set_excite_position(bad);
        waveguide.set_brightness(bad);
        waveguide.set_velocity(bad);
        waveguide.set_envelope(AdsrParameters {
            attack: bad,
            decay: bad,
            sustain: bad,
            release: bad,
        });

        let mut banded = banded(220.0, bad);
        banded.set_harmonic(bad);
        banded.set_mode_mix(bad);
        banded.set_reflection_adjust(bad);
        banded.set_velocity(bad);
        banded.set_frequency(bad);

        let mut ks = KarplusStrong::new();
        ks.start();
        ks.set_attenuation(bad);
        ks.set_velocity(bad);
        ks.set_frequency(bad);

        let mut woodwind = Woodwind::new();
        woodwind.start();
        woodwind.set_coefficients(WoodwindCoefficients {
            low_pass: bad,
            r_1: bad,
            r_2: bad,
        });

        let mut mesh = Mesh::new();
        mesh.start();
        mesh.set_attenuation(bad);
        mesh.set_velocity(bad);

        let models: [&mut dyn PhysicalModel; 5] =
            [&mut waveguide, &mut banded, &mut ks, &mut woodwind, &mut mesh];

        let mut out = [0.0; BLOCK_SIZE];
        for model in models {
            // Velocity is the only setting the trait passes in directly.
            model.note_on(bad);
            for _ in 0..100 {
                model.render(&mut out);
                assert_bounded(&out, &format!("settings {bad}"));
            }
        }
    }
}
