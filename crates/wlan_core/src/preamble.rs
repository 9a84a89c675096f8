use num::complex::Complex32;

/// Non-DC, non-edge FFT bin indices carrying the short training sequence
/// (every 4th subcarrier in {-24,...,-4,4,...,24}), in the order the
/// channel estimator and CFO estimator iterate over them.
pub const S0_BINS: [usize; 12] = [40, 44, 48, 52, 56, 60, 4, 8, 12, 16, 20, 24];

/// All 52 non-NULL FFT bins (pilots + data), in ascending bin order.
pub fn active_bins() -> impl Iterator<Item = usize> {
    (0..64usize).filter(|&bin| !is_null_bin(bin))
}

/// All 52 non-NULL FFT bins in ascending *frequency* order (`-26..-1`
/// then `1..26`): bins 38..=63 followed by bins 1..=26. Used wherever a
/// polynomial is fit across the subcarrier frequency axis, since
/// unwrapping phase requires walking frequency low-to-high rather than
/// raw bin index low-to-high.
pub fn active_bins_by_frequency() -> impl Iterator<Item = usize> {
    (38..=63usize).chain(1..=26usize)
}

/// The 48 DATA-carrying bins, in the same traversal order the receiver
/// uses both to read SIGNAL field hard decisions and to demodulate DATA
/// field subcarriers: ascending frequency (bins 38..=63 then 1..=26),
/// skipping the 4 pilot bins.
pub fn data_bins_by_frequency() -> impl Iterator<Item = usize> {
    active_bins_by_frequency().filter(|&bin| !is_pilot_bin(bin))
}

pub fn is_null_bin(bin: usize) -> bool {
    bin == 0 || (27..=37).contains(&bin)
}

pub fn is_pilot_bin(bin: usize) -> bool {
    matches!(bin, 7 | 21 | 43 | 57)
}

/// Signed subcarrier frequency index for raw FFT bin `bin`: bins `0..=31`
/// map to `0..=31`, bins `32..=63` map to `-32..=-1` (standard
/// unshifted-FFT negative-frequency wraparound, no fftshift involved).
pub fn shifted_subcarrier(bin: usize) -> i32 {
    if bin > 31 {
        bin as i32 - 64
    } else {
        bin as i32
    }
}

/// 64-point frequency-domain short training sequence (S0), nonzero on
/// `S0_BINS`, each value `+-(1+j) * sqrt(13/6)`.
pub fn short_training_freq() -> [Complex32; 64] {
    let scale = (13.0f32 / 6.0).sqrt();
    let signs: [f32; 12] = [1.0, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0];
    let mut s0 = [Complex32::new(0.0, 0.0); 64];
    for (&bin, &sign) in S0_BINS.iter().zip(signs.iter()) {
        s0[bin] = Complex32::new(sign * scale, sign * scale);
    }
    s0
}

const L_NEG: [f32; 26] = [
    1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0, -1.0,
    1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0,
];
const L_POS: [f32; 26] = [
    1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0, -1.0,
    -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0,
];

/// 64-point frequency-domain long training sequence (S1), unity-magnitude
/// BPSK on all 52 active bins.
pub fn long_training_freq() -> [Complex32; 64] {
    let mut s1 = [Complex32::new(0.0, 0.0); 64];
    for (i, &v) in L_NEG.iter().enumerate() {
        s1[38 + i] = Complex32::new(v, 0.0);
    }
    for (i, &v) in L_POS.iter().enumerate() {
        s1[1 + i] = Complex32::new(v, 0.0);
    }
    s1
}
