//! Signal measurements shared by the tests.

#![allow(dead_code)]

use pm_synth_dsp::SAMPLE_RATE;

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|x| x * x).sum();
    (sum / samples.len() as f32).sqrt()
}

pub fn energy(samples: &[f32]) -> f64 {
    samples.iter().map(|x| (*x as f64) * (*x as f64)).sum()
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0, |m, x| m.max(x.abs()))
}

/// Lag in `min_lag..=max_lag` with the highest normalized autocorrelation.
pub fn period(samples: &[f32], min_lag: usize, max_lag: usize) -> usize {
    let mut best_lag = min_lag;
    let mut best = f64::MIN;

    for lag in min_lag..=max_lag {
        let n = samples.len() - lag;
        let mut sum = 0.0;
        let mut norm_a = 0.0;
        let mut norm_b = 0.0;
        for i in 0..n {
            let a = samples[i] as f64;
            let b = samples[i + lag] as f64;
            sum += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }
        let r = sum / (norm_a * norm_b).sqrt().max(1e-20);
        if r > best {
            best = r;
            best_lag = lag;
        }
    }

    best_lag
}

/// Power at a single frequency (Goertzel).
pub fn goertzel(samples: &[f32], frequency: f32) -> f64 {
    let w = 2.0 * std::f64::consts::PI * frequency as f64 / SAMPLE_RATE as f64;
    let coefficient = 2.0 * w.cos();
    let mut s_1 = 0.0;
    let mut s_2 = 0.0;
    for x in samples {
        let s = *x as f64 + coefficient * s_1 - s_2;
        s_2 = s_1;
        s_1 = s;
    }
    s_1 * s_1 + s_2 * s_2 - coefficient * s_1 * s_2
}

/// Summed power over `low..=high` in 2 Hz steps.
pub fn band_power(samples: &[f32], low: f32, high: f32) -> f64 {
    let mut f = low;
    let mut sum = 0.0;
    while f <= high {
        sum += goertzel(samples, f);
        f += 2.0;
    }
    sum
}
