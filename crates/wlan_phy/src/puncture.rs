use wlan_core::CodeRate;

/// "Soft" neutral value for a punctured bit: equidistant from the 0/255
/// soft-bit rails used throughout the receive chain, so the Viterbi
/// decoder sees a punctured position as carrying no information.
pub const SOFT_NEUTRAL: u8 = 128;

fn matrix_for(code_rate: CodeRate) -> &'static [bool] {
    const TWO_THIRDS: [bool; 4] = [true, true, true, false];
    const THREE_QUARTERS: [bool; 6] = [true, true, false, true, true, false];
    match (code_rate.numerator, code_rate.denominator) {
        (1, 2) => &[true, true],
        (2, 3) => &TWO_THIRDS,
        (3, 4) => &THREE_QUARTERS,
        _ => panic!("unsupported code rate {}/{}", code_rate.numerator, code_rate.denominator),
    }
}

/// Drops bits at positions the puncturing matrix marks `false`, cycling
/// the matrix over `encoded` (rate-1/2 encoder output).
pub fn puncture(encoded: &[u8], code_rate: CodeRate) -> Vec<u8> {
    let matrix = matrix_for(code_rate);
    encoded
        .iter()
        .enumerate()
        .filter(|(i, _)| matrix[i % matrix.len()])
        .map(|(_, &bit)| bit)
        .collect()
}

/// Reinserts `SOFT_NEUTRAL` soft-bit placeholders at the positions the
/// puncturing matrix dropped, producing `ndata_out` rate-1/2 soft bits.
pub fn depuncture(punctured: &[u8], code_rate: CodeRate, ndata_out: usize) -> Vec<u8> {
    let matrix = matrix_for(code_rate);
    let mut out = Vec::with_capacity(ndata_out);
    let mut src = punctured.iter();
    for i in 0..ndata_out {
        if matrix[i % matrix.len()] {
            out.push(*src.next().expect("depuncture source exhausted"));
        } else {
            out.push(SOFT_NEUTRAL);
        }
    }
    out
}
