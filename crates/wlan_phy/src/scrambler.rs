use wlan_core::Lfsr7;

/// Scrambles a bit-per-element buffer (each element a single 0/1 bit) in
/// place with the length-127 data scrambler sequence, starting from
/// `seed`. Applied to the whole SERVICE+PSDU+tail+pad bit stream on
/// transmit. Self-inverse in isolation, but receive-side descrambling
/// does not call this directly -- see [`descramble_frame`].
pub fn scramble_frame(seed: u8, bits: &mut [u8]) {
    let mut lfsr = Lfsr7::new(seed);
    for bit in bits.iter_mut() {
        *bit ^= lfsr.advance();
    }
}

/// Packs 7 bits (MSB-first) into a byte.
fn pack7(bits: &[u8]) -> u8 {
    let mut value = 0u8;
    for &bit in &bits[0..7] {
        value = (value << 1) | (bit & 1);
    }
    value
}

/// Descrambles a decoded-but-still-scrambled SERVICE+PSDU+tail+pad bit
/// stream in place, without knowing the transmitter's scrambler seed.
///
/// SERVICE's first 7 raw bits are always zero by convention, so the 7
/// scrambled bits the receiver observes there are exactly the
/// scrambler's own output for those 7 steps. Packing them MSB-first
/// yields the scrambler's register state after those 7 steps directly
/// -- no need to invert back to the original seed -- so a fresh
/// [`Lfsr7`] initialized to that value continues the same sequence for
/// bit 7 onward. Bits `0..7` are zeroed, matching their known raw value.
pub fn descramble_frame(bits: &mut [u8]) {
    assert!(bits.len() >= 7);
    let resume_state = pack7(bits);
    let mut lfsr = Lfsr7::new(resume_state);
    for bit in bits[7..].iter_mut() {
        *bit ^= lfsr.advance();
    }
    bits[0..7].fill(0);
}
