use crate::polyfit;
use num::complex::Complex32;
use wlan_core::preamble::{
    active_bins, active_bins_by_frequency, is_null_bin, long_training_freq, shifted_subcarrier,
    short_training_freq, S0_BINS,
};

const S0_GAIN_SCALE: f32 = 0.054127; // sqrt(12)/64
const S0_METRIC_SCALE: f32 = 0.1;
const S1_GAIN_SCALE: f32 = 0.11267; // sqrt(52)/64
const S1_METRIC_SCALE: f32 = 1.0 / 52.0;

/// Per-bin channel gain estimate from one short-training repetition:
/// `G[bin] = X[bin] * conj(S0[bin]) * sqrt(12)/64`, zero outside the 12
/// S0 bins.
pub fn s0_gain(x: &[Complex32; 64]) -> [Complex32; 64] {
    let s0 = short_training_freq();
    let mut g = [Complex32::new(0.0, 0.0); 64];
    for &bin in S0_BINS.iter() {
        g[bin] = x[bin] * s0[bin].conj() * S0_GAIN_SCALE;
    }
    g
}

/// Complex short-training detection statistic: sum of adjacent-bin
/// products within each of the two 6-bin S0 groups (no wraparound
/// between groups). Its argument gives the fractional-sample timing
/// offset; [`s0_metric`] is its magnitude.
pub fn s0_metric_complex(g: &[Complex32; 64]) -> Complex32 {
    const GROUPS: [[usize; 6]; 2] = [[40, 44, 48, 52, 56, 60], [4, 8, 12, 16, 20, 24]];
    let mut acc = Complex32::new(0.0, 0.0);
    for group in GROUPS.iter() {
        for w in group.windows(2) {
            acc += g[w[1]] * g[w[0]].conj();
        }
    }
    acc * S0_METRIC_SCALE
}

/// Short-training detection metric magnitude, used as the acquisition
/// threshold statistic.
pub fn s0_metric(g: &[Complex32; 64]) -> f32 {
    s0_metric_complex(g).norm()
}

/// Coarse carrier-frequency-offset estimate from two consecutive S0
/// repetitions' gain estimates, normalized to radians/sample over the
/// 16-sample S0 period.
pub fn cfo_from_s0(g0a: &[Complex32; 64], g0b: &[Complex32; 64]) -> f32 {
    let mut g_hat = Complex32::new(0.0, 0.0);
    for &bin in S0_BINS.iter() {
        g_hat += g0b[bin] * g0a[bin].conj();
    }
    4.0 * g_hat.arg() / 64.0
}

/// Per-bin channel gain estimate from one long-training repetition:
/// `G[bin] = X[bin] * conj(S1[bin]) * sqrt(52)/64`, zero on NULL bins.
pub fn s1_gain(x: &[Complex32; 64]) -> [Complex32; 64] {
    let s1 = long_training_freq();
    let mut g = [Complex32::new(0.0, 0.0); 64];
    for bin in active_bins() {
        g[bin] = x[bin] * s1[bin].conj() * S1_GAIN_SCALE;
    }
    g
}

/// Complex long-training detection statistic: cyclic sum over all 64
/// bins of adjacent-bin products (NULL bins contribute zero since their
/// gain is zero). Its argument tracks residual timing/phase error at
/// the S1 boundary; [`s1_metric`] is its magnitude.
pub fn s1_metric_complex(g: &[Complex32; 64]) -> Complex32 {
    let mut s_hat = Complex32::new(0.0, 0.0);
    for i in 0..64 {
        s_hat += g[(i + 1) % 64] * g[i].conj();
    }
    s_hat * S1_METRIC_SCALE
}

/// Long-training detection metric magnitude, used as the acquisition
/// threshold statistic.
pub fn s1_metric(g: &[Complex32; 64]) -> f32 {
    s1_metric_complex(g).norm()
}

/// Fine carrier-frequency-offset estimate from two consecutive S1
/// repetitions' gain estimates, normalized to radians/sample over the
/// full 64-sample symbol period.
pub fn cfo_from_s1(g1a: &[Complex32; 64], g1b: &[Complex32; 64]) -> f32 {
    let mut g_hat = Complex32::new(0.0, 0.0);
    for i in 0..64 {
        g_hat += g1b[i] * g1a[i].conj();
    }
    g_hat.arg() / 64.0
}

/// Per-subcarrier equalizer gain `R[k]`, fit from `g1b` (the second
/// long-training gain estimate) via a degree-2 least-squares polynomial
/// on magnitude and unwrapped phase separately, both evaluated over the
/// fftshifted frequency axis `f = k'/64`.
pub fn equalizer_from_s1(g1b: &[Complex32; 64]) -> [Complex32; 64] {
    let bins: Vec<usize> = active_bins_by_frequency().collect();

    let freqs: Vec<f32> = bins.iter().map(|&bin| shifted_subcarrier(bin) as f32 / 64.0).collect();
    let mags: Vec<f32> = bins.iter().map(|&bin| g1b[bin].norm()).collect();

    let mut phases: Vec<f32> = bins.iter().map(|&bin| g1b[bin].arg()).collect();
    for i in 1..phases.len() {
        while phases[i] - phases[i - 1] > std::f32::consts::PI {
            phases[i] -= 2.0 * std::f32::consts::PI;
        }
        while phases[i] - phases[i - 1] < -std::f32::consts::PI {
            phases[i] += 2.0 * std::f32::consts::PI;
        }
    }

    let mut mag_coeffs = [0.0f32; 3];
    polyfit::fit(&freqs, &mags, &mut mag_coeffs);
    let mut phase_coeffs = [0.0f32; 3];
    polyfit::fit(&freqs, &phases, &mut phase_coeffs);

    let mut r = [Complex32::new(0.0, 0.0); 64];
    for (bin, slot) in r.iter_mut().enumerate() {
        if is_null_bin(bin) {
            continue;
        }
        let f = shifted_subcarrier(bin) as f32 / 64.0;
        let a = polyfit::eval(&mag_coeffs, f);
        let theta = polyfit::eval(&phase_coeffs, f);
        let gain = S1_GAIN_SCALE / (a + 1e-12);
        *slot = Complex32::from_polar(gain, -theta);
    }
    r
}
