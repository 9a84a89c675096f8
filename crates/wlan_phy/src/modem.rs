use num::complex::Complex32;
use wlan_core::Modulation;

/// Maps `n` Gray-coded bits (MSB first) onto an odd amplitude level on a
/// `{-(2^n-1), ..., -1, 1, ..., 2^n-1}` rail, matching the 802.11a
/// constellation ordering for BPSK/QPSK/16-QAM/64-QAM.
fn gray_decode(bits: u8, _n: u32) -> u32 {
    let mut value = bits as u32;
    let mut mask = value >> 1;
    while mask != 0 {
        value ^= mask;
        mask >>= 1;
    }
    value
}

fn level(bits: u8, n: u32) -> f32 {
    let decoded = gray_decode(bits, n);
    (2 * decoded) as f32 - ((1u32 << n) - 1) as f32
}

fn gray_encode(value: u32) -> u32 {
    value ^ (value >> 1)
}

/// Inverse of [`level`]: nearest odd rail index -> its `n`-bit Gray code.
fn level_to_bits(x: f32, n: u32) -> u8 {
    let span = (1i32 << n) - 1;
    let raw = ((x.round() as i32 + span) / 2).clamp(0, span);
    gray_encode(raw as u32) as u8
}

fn kmod(modulation: Modulation) -> f32 {
    match modulation {
        Modulation::Bpsk => 1.0,
        Modulation::Qpsk => std::f32::consts::FRAC_1_SQRT_2,
        Modulation::Qam16 => 1.0 / 10f32.sqrt(),
        Modulation::Qam64 => 1.0 / 42f32.sqrt(),
    }
}

fn bits_per_rail(modulation: Modulation) -> u32 {
    match modulation {
        Modulation::Bpsk => 1,
        Modulation::Qpsk => 1,
        Modulation::Qam16 => 2,
        Modulation::Qam64 => 3,
    }
}

/// Modulates `nbpsc` bits (packed in the low bits of `symbol`, MSB first)
/// onto a single complex constellation point.
pub fn modulate(modulation: Modulation, symbol: u8) -> Complex32 {
    let k = kmod(modulation);
    if modulation == Modulation::Bpsk {
        let bit = symbol & 0x01;
        return Complex32::new(if bit == 1 { 1.0 } else { -1.0 } * k, 0.0);
    }
    let n = bits_per_rail(modulation);
    let i_bits = (symbol >> n) & ((1 << n) - 1);
    let q_bits = symbol & ((1 << n) - 1);
    Complex32::new(level(i_bits, n) * k, level(q_bits, n) * k)
}

/// Hard-decision demodulation, returning `nbpsc` bits packed MSB first.
pub fn demodulate(modulation: Modulation, x: Complex32) -> u8 {
    let k = kmod(modulation);
    if modulation == Modulation::Bpsk {
        return if x.re >= 0.0 { 1 } else { 0 };
    }
    let n = bits_per_rail(modulation);
    let i_bits = level_to_bits(x.re / k, n);
    let q_bits = level_to_bits(x.im / k, n);
    (i_bits << n) | q_bits
}
